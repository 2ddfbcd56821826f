pub mod dashboard;

// 重新导出常用类型和函数，方便外部使用
pub use dashboard::{
    api::{ApiClient, AuthExpiredHandler, ReqwestTransport, Transport},
    session::{MemorySessionStore, SessionStore, SqliteSessionStore},
    ClientConfig, ClientError, ClientResult, DashboardClient, Route,
};
