//! 视图控制器
//!
//! 每个页面对应一个控制器：持有页面状态，调用 API 网关，读写会话存储。
//! 轮询类页面通过 `start_polling` 返回 [`PollHandle`](crate::dashboard::poller::PollHandle)，
//! 句柄被 drop 时轮询停止。

pub mod ask;
pub mod auth;
pub mod cache;
pub mod connect;
pub mod dashboard;
pub mod export;
pub mod health;
pub mod insights;
pub mod performance;
pub mod settings;

pub use ask::{AskView, QueryHistoryEntry, QueryResult, HISTORY_LIMIT, SUGGESTIONS};
pub use auth::AuthView;
pub use cache::CacheAnalytics;
pub use connect::{ConnectForm, ConnectView, DbType};
pub use dashboard::{DashboardSnapshot, HitRateVerdict, RecentQueryRow};
pub use health::{HealthReading, HealthStatus};
pub use insights::InsightsView;
pub use performance::PerformanceSnapshot;
pub use settings::SettingsView;
