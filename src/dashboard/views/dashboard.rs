//! 仪表盘视图控制器
//!
//! 并发拉取租户历史和统计，汇总为一个快照；按分析轮询间隔刷新。

use crate::dashboard::api::ApiClient;
use crate::dashboard::error::ClientResult;
use crate::dashboard::poller::{spawn_poller, PollHandle};
use crate::dashboard::session::ConnectionContext;
use crate::dashboard::types::{HistoryItem, TenantStats};
use chrono::{DateTime, Local, NaiveDateTime};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// 平均延迟缺失时的占位符
pub const MISSING_LATENCY: &str = "—";

/// 命中率高于该值视为健康
pub const HEALTHY_HIT_RATE: f64 = 50.0;

/// 缓存命中率评价
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitRateVerdict {
    Healthy,
    Low,
}

impl HitRateVerdict {
    pub fn from_rate(hit_rate_percentage: f64) -> Self {
        if hit_rate_percentage > HEALTHY_HIT_RATE {
            HitRateVerdict::Healthy
        } else {
            HitRateVerdict::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HitRateVerdict::Healthy => "Healthy",
            HitRateVerdict::Low => "Low",
        }
    }
}

/// 最近查询表格的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentQueryRow {
    pub id: String,
    pub query: String,
    pub time: String,
}

impl From<HistoryItem> for RecentQueryRow {
    fn from(item: HistoryItem) -> Self {
        Self {
            time: format_timestamp(&item.timestamp),
            id: item.id,
            query: item.query,
        }
    }
}

/// 仪表盘快照
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub total_queries: u64,
    pub hit_rate_percentage: f64,
    pub avg_latency: String,
    pub verdict: HitRateVerdict,
    pub recent_queries: Vec<RecentQueryRow>,
}

impl DashboardSnapshot {
    pub fn build(stats: TenantStats, history: Vec<HistoryItem>) -> Self {
        Self {
            total_queries: stats.total_queries,
            hit_rate_percentage: stats.hit_rate_percentage,
            avg_latency: stats
                .avg_latency
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| MISSING_LATENCY.to_string()),
            verdict: HitRateVerdict::from_rate(stats.hit_rate_percentage),
            recent_queries: history.into_iter().map(RecentQueryRow::from).collect(),
        }
    }
}

/// 时间戳格式化为本地 `HH:MM`；带时区的按本地时区换算，无时区的按原值显示。
/// 无法解析时原样返回。
pub fn format_timestamp(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Local).format("%H:%M").to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, pattern) {
            return naive.format("%H:%M").to_string();
        }
    }
    raw.to_string()
}

/// 拉取一次快照；未连接数据库时不发请求，返回 `Ok(None)`
pub async fn fetch_snapshot(api: &ApiClient) -> ClientResult<Option<DashboardSnapshot>> {
    let Some(tenant_id) = ConnectionContext::tenant_id(api.store().as_ref()).await else {
        debug!("[DashboardView] 未连接数据库，跳过拉取");
        return Ok(None);
    };
    let (history, stats) = tokio::try_join!(
        api.get_tenant_history(&tenant_id),
        api.get_tenant_stats(&tenant_id)
    )?;
    Ok(Some(DashboardSnapshot::build(stats, history)))
}

/// 启动仪表盘轮询
pub fn start_polling(api: Arc<ApiClient>, period: Duration) -> PollHandle<DashboardSnapshot> {
    spawn_poller("dashboard", period, move || {
        let api = api.clone();
        async move { fetch_snapshot(&api).await }
    })
}
