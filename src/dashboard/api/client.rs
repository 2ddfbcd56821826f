//! API 网关客户端
//!
//! 客户端与后端之间唯一的边界：所有网络调用都从这里发出。
//! 负责附加认证头、统一解析错误，并在 401 时清理会话、通知认证失效回调。
//! 不做任何自动重试。

use crate::dashboard::api::listener::{AuthExpiredHandler, EmptyAuthExpiredHandler};
use crate::dashboard::api::transport::{ApiRequest, RawResponse, RequestBody, Transport};
use crate::dashboard::error::{ClientError, ClientResult};
use crate::dashboard::session::{AuthSession, SessionStore};
use crate::dashboard::types::{
    AskRequest, AskResponse, CacheStats, ChartDataRequest, ChartDataResponse, ConnectRequest,
    ConnectResponse, DisconnectResponse, ErrorBody, FederatedLoginRequest, HealthResponse,
    HistoryItem, LoginRequest, RegisterRequest, SchemaResponse, TenantStats, TokenResponse,
    UserResponse,
};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, RwLock};
use tracing::{debug, error, info, warn};

/// 单次调用的描述
struct Endpoint {
    name: &'static str,
    method: Method,
    path: String,
    body: RequestBody,
    /// 响应体包含 token 等敏感信息时不打印
    redact: bool,
}

impl Endpoint {
    fn get(name: &'static str, path: String) -> Self {
        Self {
            name,
            method: Method::GET,
            path,
            body: RequestBody::Empty,
            redact: false,
        }
    }

    fn post_json<B: Serialize>(name: &'static str, path: &str, body: &B) -> ClientResult<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ClientError::Decode(format!("序列化请求失败: {}", e)))?;
        Ok(Self {
            name,
            method: Method::POST,
            path: path.to_string(),
            body: RequestBody::Json(value),
            redact: false,
        })
    }

    fn redacted(mut self) -> Self {
        self.redact = true;
        self
    }
}

/// 租户相关接口要求 tenant_id 非空，否则不发请求
fn require_tenant(tenant_id: &str) -> ClientResult<&str> {
    let tenant_id = tenant_id.trim();
    if tenant_id.is_empty() {
        return Err(ClientError::Validation("未连接数据库（缺少 tenant_id）".to_string()));
    }
    Ok(tenant_id)
}

/// 拼接租户路径，tenant_id 作为单个路径段编码
fn tenant_path(prefix: &str, tenant_id: &str) -> String {
    format!("{}/{}", prefix, urlencoding::encode(tenant_id))
}

/// 从错误响应中提取提示信息：优先 `detail`，否则用状态文本
fn error_message(raw: &RawResponse) -> String {
    serde_json::from_slice::<ErrorBody>(&raw.body)
        .ok()
        .and_then(|body| body.detail_text())
        .unwrap_or_else(|| {
            if raw.status_text.is_empty() {
                format!("HTTP {}", raw.status)
            } else {
                raw.status_text.clone()
            }
        })
}

/// API 网关客户端
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    store: Arc<dyn SessionStore>,
    auth_expired: RwLock<Arc<dyn AuthExpiredHandler>>,
}

impl ApiClient {
    /// 创建网关客户端（使用默认空认证失效回调）
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn SessionStore>) -> Self {
        Self::with_handler(transport, store, Arc::new(EmptyAuthExpiredHandler))
    }

    pub fn with_handler(
        transport: Arc<dyn Transport>,
        store: Arc<dyn SessionStore>,
        handler: Arc<dyn AuthExpiredHandler>,
    ) -> Self {
        Self {
            transport,
            store,
            auth_expired: RwLock::new(handler),
        }
    }

    /// 注册认证失效回调
    pub fn set_auth_expired_handler(&self, handler: Arc<dyn AuthExpiredHandler>) {
        let mut slot = self
            .auth_expired
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = handler;
    }

    fn auth_expired_handler(&self) -> Arc<dyn AuthExpiredHandler> {
        self.auth_expired
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    async fn send<T: DeserializeOwned>(&self, endpoint: Endpoint) -> ClientResult<T> {
        let bearer_token = AuthSession::load(self.store.as_ref()).await.access_token;
        info!("[ApiClient] 📡 {} {} {}", endpoint.name, endpoint.method, endpoint.path);
        debug!(
            "[ApiClient]   携带认证头: {}",
            if bearer_token.is_some() { "是" } else { "否" }
        );

        let request = ApiRequest {
            method: endpoint.method,
            path: endpoint.path,
            bearer_token,
            body: endpoint.body,
        };
        let raw = self.transport.execute(request).await.map_err(|e| {
            error!("[ApiClient] {} 请求失败: {}", endpoint.name, e);
            e
        })?;

        self.handle_response(endpoint.name, endpoint.redact, raw).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        operation: &str,
        redact: bool,
        raw: RawResponse,
    ) -> ClientResult<T> {
        if redact {
            debug!("[ApiClient] {} 响应状态: {}（响应体已隐藏）", operation, raw.status);
        } else {
            debug!(
                "[ApiClient] {} 响应状态: {}, Body: {}",
                operation,
                raw.status,
                String::from_utf8_lossy(&raw.body)
            );
        }

        if raw.status == 401 {
            let message = error_message(&raw);
            warn!("[ApiClient] {} 认证失效(401): {}", operation, message);
            if let Err(e) = AuthSession::clear(self.store.as_ref()).await {
                error!("[ApiClient] 清理 access token 失败: {:?}", e);
            }
            self.auth_expired_handler().on_auth_expired();
            return Err(ClientError::Auth(message));
        }

        if !raw.is_success() {
            let message = error_message(&raw);
            error!(
                "[ApiClient] {} 请求失败，HTTP状态: {}, 错误: {}",
                operation, raw.status, message
            );
            return Err(ClientError::Request(message));
        }

        serde_json::from_slice(&raw.body).map_err(|e| {
            error!("[ApiClient] {} 反序列化失败: {:?}", operation, e);
            ClientError::Decode(e.to_string())
        })
    }

    // ========== 认证 ==========

    pub async fn register(&self, request: &RegisterRequest) -> ClientResult<UserResponse> {
        self.send(Endpoint::post_json("注册", "/auth/register", request)?)
            .await
    }

    /// 账号密码登录（表单编码）
    pub async fn login(&self, request: &LoginRequest) -> ClientResult<TokenResponse> {
        let endpoint = Endpoint {
            name: "登录",
            method: Method::POST,
            path: "/auth/login".to_string(),
            body: RequestBody::Form(vec![
                ("username".to_string(), request.username.clone()),
                ("password".to_string(), request.password.clone()),
            ]),
            redact: true,
        };
        self.send(endpoint).await
    }

    /// 第三方登录：用提供方 token 换取 access token
    pub async fn federated_login(&self, provider_token: &str) -> ClientResult<TokenResponse> {
        let request = FederatedLoginRequest {
            token: provider_token.to_string(),
        };
        self.send(Endpoint::post_json("第三方登录", "/auth/google", &request)?.redacted())
            .await
    }

    // ========== 数据库连接 ==========

    pub async fn connect_database(&self, request: &ConnectRequest) -> ClientResult<ConnectResponse> {
        self.send(Endpoint::post_json("连接数据库", "/connect-db", request)?)
            .await
    }

    pub async fn disconnect_tenant(&self, tenant_id: &str) -> ClientResult<DisconnectResponse> {
        let tenant_id = require_tenant(tenant_id)?;
        let endpoint = Endpoint {
            name: "断开连接",
            method: Method::DELETE,
            path: tenant_path("/disconnect", tenant_id),
            body: RequestBody::Empty,
            redact: false,
        };
        self.send(endpoint).await
    }

    // ========== 提问 ==========

    pub async fn ask_question(&self, request: &AskRequest) -> ClientResult<AskResponse> {
        require_tenant(&request.tenant_id)?;
        self.send(Endpoint::post_json("提问", "/ask", request)?).await
    }

    // ========== 健康检查与统计 ==========

    pub async fn get_health(&self) -> ClientResult<HealthResponse> {
        self.send(Endpoint::get("健康检查", "/health".to_string()))
            .await
    }

    pub async fn get_tenant_health(&self, tenant_id: &str) -> ClientResult<HealthResponse> {
        let tenant_id = require_tenant(tenant_id)?;
        self.send(Endpoint::get("租户健康检查", tenant_path("/health", tenant_id)))
            .await
    }

    pub async fn get_cache_stats(&self) -> ClientResult<CacheStats> {
        self.send(Endpoint::get("全局缓存统计", "/cache/stats".to_string()))
            .await
    }

    pub async fn get_tenant_stats(&self, tenant_id: &str) -> ClientResult<TenantStats> {
        let tenant_id = require_tenant(tenant_id)?;
        self.send(Endpoint::get("租户统计", tenant_path("/stats", tenant_id)))
            .await
    }

    pub async fn get_tenant_history(&self, tenant_id: &str) -> ClientResult<Vec<HistoryItem>> {
        let tenant_id = require_tenant(tenant_id)?;
        self.send(Endpoint::get("租户历史", tenant_path("/history", tenant_id)))
            .await
    }

    // ========== Schema 与图表 ==========

    pub async fn get_schema(&self, tenant_id: &str) -> ClientResult<SchemaResponse> {
        let tenant_id = require_tenant(tenant_id)?;
        self.send(Endpoint::get("获取Schema", tenant_path("/schema", tenant_id)))
            .await
    }

    pub async fn get_chart_data(&self, request: &ChartDataRequest) -> ClientResult<ChartDataResponse> {
        require_tenant(&request.tenant_id)?;
        self.send(Endpoint::post_json("图表数据", "/insights/chart-data", request)?)
            .await
    }
}
