//! 性能视图控制器：租户统计 + 租户健康探测

use crate::dashboard::api::ApiClient;
use crate::dashboard::error::ClientResult;
use crate::dashboard::poller::{spawn_poller, PollHandle};
use crate::dashboard::session::ConnectionContext;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSnapshot {
    pub total_queries: u64,
    pub hit_rate_percentage: f64,
    pub hits: u64,
    pub misses: u64,
    /// 数据库探测延迟（毫秒）
    pub latency_ms: f64,
    pub db_status: String,
}

/// 拉取一次性能快照；未连接数据库时返回 `Ok(None)`
pub async fn fetch_performance(api: &ApiClient) -> ClientResult<Option<PerformanceSnapshot>> {
    let Some(tenant_id) = ConnectionContext::tenant_id(api.store().as_ref()).await else {
        return Ok(None);
    };
    let (stats, health) = tokio::try_join!(
        api.get_tenant_stats(&tenant_id),
        api.get_tenant_health(&tenant_id)
    )?;
    Ok(Some(PerformanceSnapshot {
        total_queries: stats.total_queries,
        hit_rate_percentage: stats.hit_rate_percentage,
        hits: stats.hits,
        misses: stats.misses,
        latency_ms: health.latency.unwrap_or_default(),
        db_status: health.status,
    }))
}

pub fn start_polling(api: Arc<ApiClient>, period: Duration) -> PollHandle<PerformanceSnapshot> {
    spawn_poller("performance", period, move || {
        let api = api.clone();
        async move { fetch_performance(&api).await }
    })
}
