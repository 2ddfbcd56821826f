//! 会话存储接口
//!
//! 视图层只通过 [`SessionStore`] 读写持久化状态，方便在测试中替换实现。

use crate::dashboard::session::models::keys;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// 键值会话存储
///
/// 所有值都是字符串，调用方自行解析。`set` 对调用方而言是原子的。
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 读取；失败时返回 `None`，从不报错
    async fn get(&self, key: &str) -> Option<String>;

    /// 写入，静默覆盖旧值
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// 删除，幂等
    async fn remove(&self, key: &str) -> Result<()>;

    /// `session_only` 为 true 时只清理认证和连接上下文，保留偏好设置；
    /// 否则清空全部键
    async fn clear(&self, session_only: bool) -> Result<()>;
}

/// 内存实现（进程内有效，不落盘）
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // 锁中毒时数据仍然一致（每次操作都是单步写入），直接取回
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }

    async fn clear(&self, session_only: bool) -> Result<()> {
        let mut entries = self.lock();
        if session_only {
            entries.retain(|k, _| !keys::SESSION_KEYS.contains(&k.as_str()));
        } else {
            entries.clear();
        }
        debug!("[Session] 内存会话已清理，session_only={}", session_only);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_returns_last_set_until_removed() {
        let store = MemorySessionStore::new();
        assert!(store.get("k").await.is_none());

        store.set("k", "v1").await.unwrap();
        assert_eq!(store.get("k").await.as_deref(), Some("v1"));
        store.set("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.as_deref(), Some("v2"));

        store.remove("k").await.unwrap();
        assert!(store.get("k").await.is_none());
        // 重复删除不报错
        store.remove("k").await.unwrap();
    }

    #[tokio::test]
    async fn clear_session_only_keeps_preferences() {
        let store = MemorySessionStore::new();
        store.set(keys::ACCESS_TOKEN, "tok").await.unwrap();
        store.set(keys::TENANT_ID, "t1").await.unwrap();
        store.set(keys::PREF_CACHE_ENABLED, "false").await.unwrap();

        store.clear(true).await.unwrap();
        assert!(store.get(keys::ACCESS_TOKEN).await.is_none());
        assert!(store.get(keys::TENANT_ID).await.is_none());
        assert_eq!(store.get(keys::PREF_CACHE_ENABLED).await.as_deref(), Some("false"));

        store.clear(false).await.unwrap();
        assert!(store.get(keys::PREF_CACHE_ENABLED).await.is_none());
    }
}
