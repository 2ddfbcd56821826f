//! HTTP 传输层
//!
//! 网关只依赖 [`Transport`]，生产环境使用 reqwest，测试中替换为脚本化实现。

use crate::dashboard::error::ClientError;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

/// 请求体
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    /// 表单编码（application/x-www-form-urlencoded）
    Form(Vec<(String, String)>),
}

/// 发往后端的一次请求
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// 相对 API 根路径的路径，例如 `/ask`
    pub path: String,
    /// 存在时以 `Authorization: Bearer <token>` 发送
    pub bearer_token: Option<String>,
    pub body: RequestBody,
}

/// 原始 HTTP 响应
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 传输层接口：只负责把请求送达并取回响应，不解释状态码
#[async_trait]
pub trait Transport: Send + Sync {
    /// 没有收到响应时返回 [`ClientError::Network`]
    async fn execute(&self, request: ApiRequest) -> Result<RawResponse, ClientError>;
}

/// 基于 reqwest 的传输实现
pub struct ReqwestTransport {
    client: reqwest::Client,
    api_base_url: String,
}

impl ReqwestTransport {
    pub fn new(api_base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(format!("创建 HTTP 客户端失败: {}", e)))?;
        Ok(Self::with_client(client, api_base_url))
    }

    /// 使用外部配置好的 reqwest 客户端
    pub fn with_client(client: reqwest::Client, api_base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> Result<RawResponse, ClientError> {
        let url = format!("{}{}", self.api_base_url, request.path);
        debug!("[HTTP] {} {}", request.method, url);

        let mut builder = self.client.request(request.method.clone(), &url);
        if let Some(token) = &request.bearer_token {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(fields) => builder.form(fields),
        };

        let response = builder.send().await.map_err(|e| {
            error!("[HTTP] {} {} 请求失败: {}", request.method, url, e);
            ClientError::Network(e.to_string())
        })?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        // body 读取中断同样视为没有拿到完整响应
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(format!("读取响应 body 失败: {}", e)))?;

        Ok(RawResponse {
            status: status.as_u16(),
            status_text,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let t = ReqwestTransport::with_client(reqwest::Client::new(), "http://localhost:8000/api/");
        assert_eq!(t.api_base_url, "http://localhost:8000/api");
    }

    #[test]
    fn success_range() {
        let mut raw = RawResponse {
            status: 204,
            status_text: "No Content".into(),
            body: Vec::new(),
        };
        assert!(raw.is_success());
        raw.status = 401;
        assert!(!raw.is_success());
    }

    #[tokio::test]
    #[ignore]
    async fn unreachable_backend_is_network_error() {
        let t = ReqwestTransport::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = t
            .execute(ApiRequest {
                method: Method::GET,
                path: "/health".into(),
                bearer_token: None,
                body: RequestBody::Empty,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
    }
}
