//! 仪表盘客户端
//!
//! 把会话存储、API 网关、导航器和各个视图控制器组装在一起的入口。

use crate::dashboard::api::{ApiClient, ReqwestTransport, Transport};
use crate::dashboard::error::{ClientError, ClientResult};
use crate::dashboard::poller::PollHandle;
use crate::dashboard::route::{Navigator, Route, APP_PATH, ENTRY_PATH};
use crate::dashboard::session::{ConnectionContext, SessionStore, SqliteSessionStore};
use crate::dashboard::views::health::{self, HealthReading, DEFAULT_SLOW_THRESHOLD_MS};
use crate::dashboard::views::{
    cache, dashboard, performance, AskView, AuthView, CacheAnalytics, ConnectForm, ConnectView,
    DashboardSnapshot, InsightsView, PerformanceSnapshot, SettingsView,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// 客户端配置
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// 后端 API 基础地址（包含 `/api` 前缀）
    pub api_base_url: String,
    /// 会话存储使用的本地 SQLite 数据库 URL
    ///
    /// 例如：`sqlite://nlsql_session.db?mode=rwc`
    pub session_db_url: String,
    /// 仪表盘、缓存、性能页的轮询间隔
    pub analytics_poll_interval: Duration,
    /// 数据库健康小组件的轮询间隔
    pub health_poll_interval: Duration,
    /// 超过该延迟（毫秒）视为慢连接
    pub slow_latency_threshold_ms: f64,
    /// 单次请求超时
    pub request_timeout: Duration,
    /// Google 登录的 client id（构建时注入）
    pub google_client_id: Option<String>,
}

impl ClientConfig {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            session_db_url: "sqlite://nlsql_session.db?mode=rwc".to_string(),
            analytics_poll_interval: Duration::from_secs(10),
            health_poll_interval: Duration::from_secs(30),
            slow_latency_threshold_ms: DEFAULT_SLOW_THRESHOLD_MS,
            request_timeout: Duration::from_secs(30),
            google_client_id: option_env!("GOOGLE_CLIENT_ID").map(str::to_string),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8000/api")
    }
}

/// 仪表盘客户端
pub struct DashboardClient {
    config: ClientConfig,
    api: Arc<ApiClient>,
    navigator: Arc<Navigator>,
}

impl DashboardClient {
    /// 打开 SQLite 会话存储并创建 HTTP 传输层
    pub async fn open(config: ClientConfig) -> ClientResult<Self> {
        let store = SqliteSessionStore::connect(&config.session_db_url).await?;
        let transport = ReqwestTransport::new(config.api_base_url.clone(), config.request_timeout)?;
        info!(
            "[Client] 🚀 初始化完成，API: {}，会话库: {}",
            config.api_base_url, config.session_db_url
        );
        Ok(Self::with_parts(config, Arc::new(transport), Arc::new(store)))
    }

    /// 用自定义的传输层和会话存储组装客户端；导航器注册为认证失效回调
    pub fn with_parts(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let navigator = Arc::new(Navigator::new(store.clone()));
        let api = Arc::new(ApiClient::with_handler(
            transport,
            store,
            navigator.clone(),
        ));
        Self {
            config,
            api,
            navigator,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        self.api.store()
    }

    pub fn navigator(&self) -> &Arc<Navigator> {
        &self.navigator
    }

    /// 导航到指定路径（经过路由守卫）
    pub async fn navigate(&self, path: &str) -> Route {
        self.navigator.navigate(path).await
    }

    // ========== 认证 ==========

    /// 登录并跳转到登录后的目标页
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Route> {
        AuthView::new(self.api.clone()).login(email, password).await?;
        Ok(self.navigator.navigate_after_login().await)
    }

    pub async fn register(&self, email: &str, password: &str, full_name: &str) -> ClientResult<Route> {
        AuthView::new(self.api.clone())
            .register(email, password, full_name)
            .await?;
        Ok(self.navigator.navigate_after_login().await)
    }

    /// 是否配置了第三方登录（Google client id 在构建时注入）
    pub fn federated_login_enabled(&self) -> bool {
        self.google_client_id().is_some()
    }

    pub fn google_client_id(&self) -> Option<&str> {
        self.config
            .google_client_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }

    /// 第三方登录；未配置 Google client id 时不发请求
    pub async fn federated_login(&self, provider_token: &str) -> ClientResult<Route> {
        if !self.federated_login_enabled() {
            return Err(ClientError::Validation("未配置 Google client id".to_string()));
        }
        AuthView::new(self.api.clone())
            .federated_login(provider_token)
            .await?;
        Ok(self.navigator.navigate_after_login().await)
    }

    pub async fn logout(&self) -> ClientResult<Route> {
        AuthView::new(self.api.clone()).logout().await?;
        Ok(self.navigator.navigate(ENTRY_PATH).await)
    }

    // ========== 数据库连接 ==========

    /// 连接数据库，成功后进入主界面
    pub async fn connect(&self, form: &ConnectForm) -> ClientResult<(ConnectionContext, Route)> {
        let ctx = ConnectView::new(self.api.clone()).connect(form).await?;
        let route = self.navigator.navigate(APP_PATH).await;
        Ok((ctx, route))
    }

    /// 断开数据库连接并回到入口页；返回是否真的断开了一个连接
    ///
    /// 断开是设置页上的操作，但没有连接时也允许调用（直接返回 false）
    pub async fn disconnect(&self) -> ClientResult<bool> {
        let disconnected = SettingsView::mount(self.api.clone())
            .await
            .disconnect()
            .await?;
        self.navigator.navigate(ENTRY_PATH).await;
        Ok(disconnected)
    }

    // ========== 视图 ==========

    /// 进入受保护页面：先经过路由守卫，被重定向时拒绝挂载
    pub async fn enter(&self, route: Route) -> ClientResult<()> {
        let landed = self.navigator.navigate(route.path()).await;
        if landed != route {
            warn!(
                "[Client] 无法进入 {}，已重定向到 {}",
                route.path(),
                landed.path()
            );
            return Err(ClientError::Redirect(landed.path()));
        }
        Ok(())
    }

    pub async fn ask_view(&self) -> ClientResult<AskView> {
        self.enter(Route::AskQuery).await?;
        Ok(AskView::mount(self.api.clone()).await)
    }

    pub async fn insights_view(&self) -> ClientResult<InsightsView> {
        self.enter(Route::Insights).await?;
        Ok(InsightsView::mount(self.api.clone()).await)
    }

    pub async fn settings_view(&self) -> ClientResult<SettingsView> {
        self.enter(Route::Settings).await?;
        Ok(SettingsView::mount(self.api.clone()).await)
    }

    pub async fn start_dashboard_polling(&self) -> ClientResult<PollHandle<DashboardSnapshot>> {
        self.enter(Route::Dashboard).await?;
        Ok(dashboard::start_polling(
            self.api.clone(),
            self.config.analytics_poll_interval,
        ))
    }

    pub async fn start_cache_polling(&self) -> ClientResult<PollHandle<CacheAnalytics>> {
        self.enter(Route::CacheAnalytics).await?;
        Ok(cache::start_polling(
            self.api.clone(),
            self.config.analytics_poll_interval,
        ))
    }

    pub async fn start_performance_polling(&self) -> ClientResult<PollHandle<PerformanceSnapshot>> {
        self.enter(Route::Performance).await?;
        Ok(performance::start_polling(
            self.api.clone(),
            self.config.analytics_poll_interval,
        ))
    }

    /// 健康小组件挂在主界面布局上，按 `/app` 的访问要求守卫
    pub async fn start_health_polling(&self) -> ClientResult<PollHandle<HealthReading>> {
        self.enter(Route::Dashboard).await?;
        Ok(health::start_polling(
            self.api.clone(),
            self.config.health_poll_interval,
            self.config.slow_latency_threshold_ms,
        ))
    }
}
