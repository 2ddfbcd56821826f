//! 会话本地模型定义
//!
//! 所有值都以字符串形式落盘，解析由这里的模型负责。

use crate::dashboard::session::store::SessionStore;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// 持久化键名
pub mod keys {
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const TENANT_ID: &str = "tenant_id";
    pub const DB_TYPE: &str = "db_type";
    pub const DB_HOST: &str = "db_host";
    pub const DB_PORT: &str = "db_port";
    pub const DB_NAME: &str = "db_name";

    pub const PREF_CACHE_ENABLED: &str = "pref_cache_enabled";
    pub const PREF_CACHE_TTL: &str = "pref_cache_ttl";
    pub const PREF_NOTIFICATIONS: &str = "pref_notifications";
    pub const PREF_AUTO_CONNECT: &str = "pref_auto_connect";

    /// 数据库连接上下文相关的键
    pub const CONNECTION_KEYS: &[&str] = &[TENANT_ID, DB_TYPE, DB_HOST, DB_PORT, DB_NAME];

    /// 登出时需要清理的键（认证 + 连接上下文，不含偏好设置）
    pub const SESSION_KEYS: &[&str] = &[ACCESS_TOKEN, TENANT_ID, DB_TYPE, DB_HOST, DB_PORT, DB_NAME];
}

/// 读取非空值，空字符串视为不存在
async fn get_non_empty(store: &dyn SessionStore, key: &str) -> Option<String> {
    store.get(key).await.filter(|v| !v.is_empty())
}

/// 登录凭证
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSession {
    pub access_token: Option<String>,
}

impl AuthSession {
    pub async fn load(store: &dyn SessionStore) -> Self {
        Self {
            access_token: get_non_empty(store, keys::ACCESS_TOKEN).await,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub async fn save_token(store: &dyn SessionStore, token: &str) -> Result<()> {
        store.set(keys::ACCESS_TOKEN, token).await
    }

    pub async fn clear(store: &dyn SessionStore) -> Result<()> {
        store.remove(keys::ACCESS_TOKEN).await
    }
}

/// 当前会话绑定的数据库连接
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionContext {
    pub tenant_id: String,
    pub db_type: String,
    pub host: String,
    pub port: String,
    pub database_name: String,
}

impl ConnectionContext {
    /// 读取连接上下文；tenant_id 为空即视为未连接
    pub async fn load(store: &dyn SessionStore) -> Option<Self> {
        let tenant_id = get_non_empty(store, keys::TENANT_ID).await?;
        Some(Self {
            tenant_id,
            db_type: store.get(keys::DB_TYPE).await.unwrap_or_default(),
            host: store.get(keys::DB_HOST).await.unwrap_or_default(),
            port: store.get(keys::DB_PORT).await.unwrap_or_default(),
            database_name: store.get(keys::DB_NAME).await.unwrap_or_default(),
        })
    }

    /// 只读取 tenant_id
    pub async fn tenant_id(store: &dyn SessionStore) -> Option<String> {
        get_non_empty(store, keys::TENANT_ID).await
    }

    /// tenant_id 最后写入，这样读到 tenant_id 时其余字段一定已经就绪
    pub async fn save(&self, store: &dyn SessionStore) -> Result<()> {
        store.set(keys::DB_TYPE, &self.db_type).await?;
        store.set(keys::DB_HOST, &self.host).await?;
        store.set(keys::DB_PORT, &self.port).await?;
        store.set(keys::DB_NAME, &self.database_name).await?;
        store.set(keys::TENANT_ID, &self.tenant_id).await
    }

    /// 删除连接上下文，tenant_id 最先删除
    pub async fn clear(store: &dyn SessionStore) -> Result<()> {
        for key in keys::CONNECTION_KEYS {
            store.remove(key).await?;
        }
        Ok(())
    }
}

pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 3600;

/// 用户偏好设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub cache_enabled: bool,
    pub cache_ttl_seconds: u64,
    pub notifications_enabled: bool,
    pub auto_connect: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            notifications_enabled: true,
            auto_connect: false,
        }
    }
}

/// 布尔值以字面量 "true"/"false" 存储，其他内容一律回退到默认值
fn parse_flag(raw: Option<String>, default: bool) -> bool {
    match raw.as_deref() {
        Some("true") => true,
        Some("false") => false,
        _ => default,
    }
}

fn flag_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

impl Preferences {
    pub async fn load(store: &dyn SessionStore) -> Self {
        let defaults = Self::default();
        let cache_ttl_seconds = store
            .get(keys::PREF_CACHE_TTL)
            .await
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|ttl| *ttl > 0)
            .unwrap_or(defaults.cache_ttl_seconds);
        Self {
            cache_enabled: parse_flag(
                store.get(keys::PREF_CACHE_ENABLED).await,
                defaults.cache_enabled,
            ),
            cache_ttl_seconds,
            notifications_enabled: parse_flag(
                store.get(keys::PREF_NOTIFICATIONS).await,
                defaults.notifications_enabled,
            ),
            auto_connect: parse_flag(
                store.get(keys::PREF_AUTO_CONNECT).await,
                defaults.auto_connect,
            ),
        }
    }

    pub async fn save(&self, store: &dyn SessionStore) -> Result<()> {
        store
            .set(keys::PREF_CACHE_ENABLED, flag_str(self.cache_enabled))
            .await?;
        store
            .set(keys::PREF_CACHE_TTL, &self.cache_ttl_seconds.to_string())
            .await?;
        store
            .set(keys::PREF_NOTIFICATIONS, flag_str(self.notifications_enabled))
            .await?;
        store
            .set(keys::PREF_AUTO_CONNECT, flag_str(self.auto_connect))
            .await
    }
}
