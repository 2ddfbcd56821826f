//! 登录/注册视图控制器

use crate::dashboard::api::ApiClient;
use crate::dashboard::error::{ClientError, ClientResult};
use crate::dashboard::session::{AuthSession, SessionStore};
use crate::dashboard::types::{LoginRequest, RegisterRequest, TokenResponse};
use std::sync::Arc;
use tracing::info;

fn required(field: &str, value: &str) -> ClientResult<()> {
    if value.trim().is_empty() {
        return Err(ClientError::Validation(format!("{} 不能为空", field)));
    }
    Ok(())
}

pub struct AuthView {
    api: Arc<ApiClient>,
}

impl AuthView {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    async fn store_token(&self, token: TokenResponse) -> ClientResult<()> {
        if token.access_token.is_empty() {
            return Err(ClientError::Decode("响应中缺少 access_token".to_string()));
        }
        AuthSession::save_token(self.api.store().as_ref(), &token.access_token).await?;
        Ok(())
    }

    /// 账号密码登录，成功后保存 access token
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<()> {
        required("邮箱", email)?;
        required("密码", password)?;

        info!("[AuthView] 🔐 正在登录: {}", email.trim());
        let token = self
            .api
            .login(&LoginRequest {
                username: email.trim().to_string(),
                password: password.to_string(),
            })
            .await?;
        self.store_token(token).await?;
        info!("[AuthView] ✅ 登录成功");
        Ok(())
    }

    /// 注册账号；后端只返回账户信息，注册后用同一凭证登录
    pub async fn register(&self, email: &str, password: &str, full_name: &str) -> ClientResult<()> {
        required("邮箱", email)?;
        required("密码", password)?;
        required("姓名", full_name)?;

        let user = self
            .api
            .register(&RegisterRequest {
                email: email.trim().to_string(),
                password: password.to_string(),
                full_name: full_name.trim().to_string(),
            })
            .await?;
        info!("[AuthView] ✅ 注册成功，用户ID: {}", user.id);

        self.login(email, password).await
    }

    /// 第三方登录：提供方 token 由外部 OAuth 流程取得
    pub async fn federated_login(&self, provider_token: &str) -> ClientResult<()> {
        required("第三方登录 token", provider_token)?;
        let token = self.api.federated_login(provider_token.trim()).await?;
        self.store_token(token).await?;
        info!("[AuthView] ✅ 第三方登录成功");
        Ok(())
    }

    /// 登出：清理认证和连接上下文，保留偏好设置
    pub async fn logout(&self) -> ClientResult<()> {
        self.api.store().clear(true).await?;
        info!("[AuthView] 👋 已登出");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::api::testing::{json_response, ScriptedTransport};
    use crate::dashboard::session::{keys, MemorySessionStore, SessionStore};
    use serde_json::json;

    fn setup() -> (Arc<ScriptedTransport>, Arc<MemorySessionStore>, AuthView) {
        let transport = Arc::new(ScriptedTransport::new());
        let store = Arc::new(MemorySessionStore::new());
        let api = Arc::new(ApiClient::new(transport.clone(), store.clone()));
        (transport, store, AuthView::new(api))
    }

    #[tokio::test]
    async fn login_stores_token() {
        let (transport, store, view) = setup();
        transport.push("/auth/login", json_response(200, json!({"access_token": "tok"})));

        view.login(" a@b.c ", "pw").await.unwrap();
        assert_eq!(store.get(keys::ACCESS_TOKEN).await.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn empty_fields_never_reach_backend() {
        let (transport, _store, view) = setup();
        let err = view.login("", "pw").await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        let err = view.register("a@b.c", "pw", "  ").await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn rejected_login_leaves_no_token() {
        let (transport, store, view) = setup();
        transport.push(
            "/auth/login",
            json_response(401, json!({"detail": "Incorrect email or password"})),
        );

        let err = view.login("a@b.c", "bad").await.unwrap_err();
        assert!(err.is_auth());
        assert!(store.get(keys::ACCESS_TOKEN).await.is_none());
    }

    #[tokio::test]
    async fn register_then_login() {
        let (transport, store, view) = setup();
        transport.push(
            "/auth/register",
            json_response(200, json!({"id": 7, "email": "a@b.c", "full_name": "A"})),
        );
        transport.push("/auth/login", json_response(200, json!({"access_token": "tok"})));

        view.register("a@b.c", "pw", "A").await.unwrap();
        assert_eq!(transport.requests_to("/auth/register"), 1);
        assert_eq!(transport.requests_to("/auth/login"), 1);
        assert_eq!(store.get(keys::ACCESS_TOKEN).await.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn federated_login_and_logout() {
        let (transport, store, view) = setup();
        transport.push("/auth/google", json_response(200, json!({"access_token": "g-tok"})));
        store.set(keys::PREF_AUTO_CONNECT, "true").await.unwrap();

        view.federated_login("provider-id-token").await.unwrap();
        store.set(keys::TENANT_ID, "t1").await.unwrap();
        assert_eq!(store.get(keys::ACCESS_TOKEN).await.as_deref(), Some("g-tok"));

        view.logout().await.unwrap();
        assert!(store.get(keys::ACCESS_TOKEN).await.is_none());
        assert!(store.get(keys::TENANT_ID).await.is_none());
        assert_eq!(store.get(keys::PREF_AUTO_CONNECT).await.as_deref(), Some("true"));
    }
}
