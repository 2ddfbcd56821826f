//! 认证失效回调接口

/// 任意接口返回 401 时由网关同步调用（token 已被清理之后）
pub trait AuthExpiredHandler: Send + Sync {
    fn on_auth_expired(&self);
}

/// 默认空实现（无操作）
pub struct EmptyAuthExpiredHandler;

impl AuthExpiredHandler for EmptyAuthExpiredHandler {
    fn on_auth_expired(&self) {}
}
