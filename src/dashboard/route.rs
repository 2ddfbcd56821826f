//! 路由守卫
//!
//! 在任何受保护视图渲染之前，根据会话状态决定放行还是重定向。

use crate::dashboard::api::listener::AuthExpiredHandler;
use crate::dashboard::session::{AuthSession, ConnectionContext, SessionStore};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// 公共入口页
pub const ENTRY_PATH: &str = "/";
/// 数据库连接页
pub const CONNECT_PATH: &str = "/connect";
/// 主界面
pub const APP_PATH: &str = "/app";

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    AuthenticatedNoConnection,
    AuthenticatedConnected,
}

impl SessionState {
    /// 从会话存储推导当前状态
    pub async fn resolve(store: &dyn SessionStore) -> Self {
        if !AuthSession::load(store).await.is_authenticated() {
            return SessionState::Unauthenticated;
        }
        match ConnectionContext::tenant_id(store).await {
            Some(_) => SessionState::AuthenticatedConnected,
            None => SessionState::AuthenticatedNoConnection,
        }
    }
}

/// 访问某个路由所需的最低状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Public,
    Authenticated,
    Connected,
}

/// 已知路由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Entry,
    Connect,
    Dashboard,
    AskQuery,
    CacheAnalytics,
    Performance,
    Insights,
    Settings,
    NotFound,
}

impl Route {
    /// 解析路径（忽略查询串和末尾斜杠）
    pub fn parse(path: &str) -> Self {
        let path = path.split(&['?', '#'][..]).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Route::Entry,
            "/connect" => Route::Connect,
            "/app" => Route::Dashboard,
            "/app/query" => Route::AskQuery,
            "/app/cache" => Route::CacheAnalytics,
            "/app/performance" => Route::Performance,
            "/app/insights" => Route::Insights,
            "/app/settings" => Route::Settings,
            _ => Route::NotFound,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Entry | Route::NotFound => ENTRY_PATH,
            Route::Connect => CONNECT_PATH,
            Route::Dashboard => APP_PATH,
            Route::AskQuery => "/app/query",
            Route::CacheAnalytics => "/app/cache",
            Route::Performance => "/app/performance",
            Route::Insights => "/app/insights",
            Route::Settings => "/app/settings",
        }
    }

    pub fn requirement(&self) -> Requirement {
        match self {
            Route::Entry | Route::NotFound => Requirement::Public,
            Route::Connect => Requirement::Authenticated,
            _ => Requirement::Connected,
        }
    }
}

/// 守卫判定结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// 放行
    Render(Route),
    /// 重定向；`from` 保存原始请求路径，用于登录后跳回
    Redirect { to: &'static str, from: Option<String> },
}

/// 路由守卫（纯函数）
pub fn guard(path: &str, state: SessionState) -> GuardDecision {
    let route = Route::parse(path);
    if route == Route::NotFound {
        return GuardDecision::Redirect {
            to: ENTRY_PATH,
            from: None,
        };
    }

    let decision = match (route.requirement(), state) {
        (Requirement::Public, _) => GuardDecision::Render(route),
        (_, SessionState::Unauthenticated) => GuardDecision::Redirect {
            to: ENTRY_PATH,
            from: Some(path.to_string()),
        },
        (Requirement::Connected, SessionState::AuthenticatedNoConnection) => {
            GuardDecision::Redirect {
                to: CONNECT_PATH,
                from: Some(path.to_string()),
            }
        }
        _ => GuardDecision::Render(route),
    };
    debug!("[RouteGuard] {} ({:?}) => {:?}", path, state, decision);
    decision
}

/// 登录成功后的跳转目标：优先回到原始请求路径，否则进入连接页
pub fn post_login_target(from: Option<&str>) -> String {
    match from {
        Some(path) if !matches!(Route::parse(path), Route::Entry | Route::NotFound) => {
            path.to_string()
        }
        _ => CONNECT_PATH.to_string(),
    }
}

#[derive(Debug, Default)]
struct NavState {
    current: String,
    pending_from: Option<String>,
}

/// 导航器：记录当前路径，每次导航都经过路由守卫
pub struct Navigator {
    store: Arc<dyn SessionStore>,
    state: Mutex<NavState>,
}

impl Navigator {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            state: Mutex::new(NavState {
                current: ENTRY_PATH.to_string(),
                pending_from: None,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NavState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn current_path(&self) -> String {
        self.lock().current.clone()
    }

    /// 被守卫拦截时保存的原始路径
    pub fn pending_from(&self) -> Option<String> {
        self.lock().pending_from.clone()
    }

    /// 导航到指定路径，返回最终落地的路由
    pub async fn navigate(&self, path: &str) -> Route {
        let session_state = SessionState::resolve(self.store.as_ref()).await;
        let decision = guard(path, session_state);

        let mut nav = self.lock();
        match decision {
            GuardDecision::Render(route) => {
                nav.current = path.to_string();
                route
            }
            GuardDecision::Redirect { to, from } => {
                info!("[RouteGuard] 🔀 {} 重定向到 {}", path, to);
                if from.is_some() {
                    nav.pending_from = from;
                }
                nav.current = to.to_string();
                Route::parse(to)
            }
        }
    }

    /// 登录成功后跳转：回到被拦截的路径或连接页
    pub async fn navigate_after_login(&self) -> Route {
        let from = self.lock().pending_from.take();
        let target = post_login_target(from.as_deref());
        self.navigate(&target).await
    }

    /// 强制回到入口页（不经过守卫）。已在入口页时不做任何事，返回 false
    pub fn redirect_to_entry(&self) -> bool {
        let mut nav = self.lock();
        if nav.current == ENTRY_PATH {
            return false;
        }
        info!("[RouteGuard] 🔒 认证失效，{} 跳转到入口页", nav.current);
        let from = std::mem::replace(&mut nav.current, ENTRY_PATH.to_string());
        nav.pending_from = Some(from);
        true
    }
}

impl AuthExpiredHandler for Navigator {
    fn on_auth_expired(&self) {
        self.redirect_to_entry();
    }
}
