//! 会话模块
//!
//! 管理认证 token、数据库连接上下文和用户偏好设置的本地持久化

pub mod dao;
pub mod models;
pub mod store;

// 重新导出主要类型
pub use dao::SqliteSessionStore;
pub use models::{keys, AuthSession, ConnectionContext, Preferences};
pub use store::{MemorySessionStore, SessionStore};
