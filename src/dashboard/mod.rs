pub mod api;
pub mod client;
pub mod db;
pub mod error;
pub mod poller;
pub mod route;
pub mod serialization;
pub mod session;
pub mod types;
pub mod views;

// 重新导出客户端入口
pub use client::{ClientConfig, DashboardClient};

// 重新导出错误类型
pub use error::{ClientError, ClientResult};

// 重新导出路由守卫相关类型
pub use route::{guard, GuardDecision, Navigator, Route, SessionState};
