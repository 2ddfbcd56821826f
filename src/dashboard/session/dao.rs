//! 会话数据访问层（DAO）
//!
//! 基于 sqlx / SQLite 的持久化会话存储，表结构由 `migrations/` 管理。

use crate::dashboard::db::create_sqlite_pool_with_migration;
use crate::dashboard::session::models::keys;
use crate::dashboard::session::store::SessionStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info, warn};

/// 持久化会话存储（跨进程重启保留）
pub struct SqliteSessionStore {
    db: Pool<Sqlite>,
}

impl SqliteSessionStore {
    /// 使用已有连接池创建
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// 连接数据库并执行迁移
    pub async fn connect(db_url: &str) -> Result<Self> {
        info!("[SessionDAO] 打开会话数据库: {}", db_url);
        let db = create_sqlite_pool_with_migration(db_url).await?;
        Ok(Self::new(db))
    }

    fn now_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn get(&self, key: &str) -> Option<String> {
        let row = sqlx::query("SELECT value FROM client_kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.db)
            .await;

        match row {
            Ok(row) => row.map(|m| m.get::<String, _>("value")),
            Err(e) => {
                warn!("[SessionDAO] 读取键 {} 失败: {:?}", key, e);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        // 单条 UPSERT，读方不会看到写了一半的值
        sqlx::query(
            r#"
            INSERT INTO client_kv (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Self::now_millis())
        .execute(&self.db)
        .await
        .with_context(|| format!("写入会话键失败: {}", key))?;

        debug!("[SessionDAO] 写入键: {}", key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM client_kv WHERE key = ?")
            .bind(key)
            .execute(&self.db)
            .await
            .with_context(|| format!("删除会话键失败: {}", key))?;

        debug!("[SessionDAO] 删除键: {}", key);
        Ok(())
    }

    async fn clear(&self, session_only: bool) -> Result<()> {
        let mut tx = self.db.begin().await.context("开启事务失败")?;
        if session_only {
            for key in keys::SESSION_KEYS {
                sqlx::query("DELETE FROM client_kv WHERE key = ?")
                    .bind(*key)
                    .execute(&mut *tx)
                    .await
                    .with_context(|| format!("删除会话键失败: {}", key))?;
            }
        } else {
            sqlx::query("DELETE FROM client_kv")
                .execute(&mut *tx)
                .await
                .context("清空会话存储失败")?;
        }
        tx.commit().await.context("提交事务失败")?;

        info!("[SessionDAO] 会话存储已清理，session_only={}", session_only);
        Ok(())
    }
}
