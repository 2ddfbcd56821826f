//! 客户端错误类型
//!
//! 所有经过 API 网关的失败都会以 [`ClientError`] 的形式返回给调用方视图。

use thiserror::Error;

/// 客户端统一错误
#[derive(Debug, Error)]
pub enum ClientError {
    /// 凭证被拒绝或 token 失效（HTTP 401），会话已被清理
    #[error("认证失败: {0}")]
    Auth(String),

    /// 本地校验失败，请求不会发往后端
    #[error("参数校验失败: {0}")]
    Validation(String),

    /// 后端返回的非 2xx（非 401）响应，消息取自 `detail` 字段
    #[error("{0}")]
    Request(String),

    /// 请求未能完成（没有收到响应）
    #[error("网络请求失败: {0}")]
    Network(String),

    /// JSON 编解码失败：请求体无法序列化，或 2xx 响应体与接口约定的结构不符
    #[error("JSON 编解码失败: {0}")]
    Decode(String),

    /// 路由守卫拒绝进入页面，调用方应跳转到 `0`
    #[error("无权访问该页面，已重定向到 {0}")]
    Redirect(&'static str),

    /// 本地会话存储读写失败
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ClientError {
    /// 是否为认证失效错误
    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Auth(_))
    }
}

/// 客户端操作的结果类型
pub type ClientResult<T> = std::result::Result<T, ClientError>;
