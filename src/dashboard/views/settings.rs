//! 设置视图控制器：偏好设置与断开数据库连接

use crate::dashboard::api::ApiClient;
use crate::dashboard::error::{ClientError, ClientResult};
use crate::dashboard::session::{ConnectionContext, Preferences};
use std::sync::Arc;
use tracing::{info, warn};

/// 校验缓存 TTL 输入：必须是正整数
pub fn parse_cache_ttl(input: &str) -> ClientResult<u64> {
    match input.trim().parse::<u64>() {
        Ok(ttl) if ttl > 0 => Ok(ttl),
        _ => Err(ClientError::Validation(format!(
            "缓存 TTL 必须是正整数: {}",
            input.trim()
        ))),
    }
}

pub struct SettingsView {
    api: Arc<ApiClient>,
    preferences: Preferences,
    connection: Option<ConnectionContext>,
}

impl SettingsView {
    pub async fn mount(api: Arc<ApiClient>) -> Self {
        let store = api.store().clone();
        let preferences = Preferences::load(store.as_ref()).await;
        let connection = ConnectionContext::load(store.as_ref()).await;
        Self {
            api,
            preferences,
            connection,
        }
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn preferences_mut(&mut self) -> &mut Preferences {
        &mut self.preferences
    }

    /// 当前连接信息（设置页展示用）
    pub fn connection(&self) -> Option<&ConnectionContext> {
        self.connection.as_ref()
    }

    pub fn set_cache_ttl(&mut self, input: &str) -> ClientResult<()> {
        self.preferences.cache_ttl_seconds = parse_cache_ttl(input)?;
        Ok(())
    }

    pub async fn save(&self) -> ClientResult<()> {
        self.preferences.save(self.api.store().as_ref()).await?;
        info!("[SettingsView] 💾 偏好设置已保存: {:?}", self.preferences);
        Ok(())
    }

    /// 断开当前数据库连接
    ///
    /// 有 tenant_id 时先通知后端（失败只记日志），然后清除本地连接上下文。
    /// 没有 tenant_id 时什么都不做，返回 false。
    pub async fn disconnect(&mut self) -> ClientResult<bool> {
        let store = self.api.store().clone();
        let Some(tenant_id) = ConnectionContext::tenant_id(store.as_ref()).await else {
            self.connection = None;
            return Ok(false);
        };

        match self.api.disconnect_tenant(&tenant_id).await {
            Ok(resp) => info!("[SettingsView] 🔌 已断开 {}: {}", tenant_id, resp.message),
            Err(e) => warn!("[SettingsView] 后端断开 {} 失败，继续清理本地状态: {}", tenant_id, e),
        }
        ConnectionContext::clear(store.as_ref()).await?;
        self.connection = None;
        Ok(true)
    }
}
