//! API 网关模块
//!
//! 封装对后端 REST 接口（`/api`）的全部调用

pub mod client;
pub mod listener;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

// 重新导出主要类型
pub use client::ApiClient;
pub use listener::{AuthExpiredHandler, EmptyAuthExpiredHandler};
pub use transport::{ApiRequest, RawResponse, ReqwestTransport, RequestBody, Transport};
