//! 缓存分析视图控制器

use crate::dashboard::api::ApiClient;
use crate::dashboard::error::ClientResult;
use crate::dashboard::poller::{spawn_poller, PollHandle};
use crate::dashboard::types::CacheStats;
use std::sync::Arc;
use std::time::Duration;

/// 缓存分析面板的展示数据
#[derive(Debug, Clone, PartialEq)]
pub struct CacheAnalytics {
    pub hit_rate_percentage: f64,
    pub hits: u64,
    pub misses: u64,
    pub total_requests: u64,
    pub redis_available: bool,
    pub memory_cache_size: u64,
}

impl CacheAnalytics {
    /// Redis 状态标签
    pub fn backend_label(&self) -> &'static str {
        if self.redis_available {
            "Redis"
        } else {
            "In-memory"
        }
    }
}

impl From<CacheStats> for CacheAnalytics {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate_percentage: stats.hit_rate_percentage,
            hits: stats.hits,
            misses: stats.misses,
            total_requests: stats.total_requests,
            redis_available: stats.redis_available,
            memory_cache_size: stats.memory_cache_size,
        }
    }
}

pub async fn fetch_cache_analytics(api: &ApiClient) -> ClientResult<CacheAnalytics> {
    Ok(api.get_cache_stats().await?.into())
}

/// 启动缓存统计轮询（全局接口，不依赖租户）
pub fn start_polling(api: Arc<ApiClient>, period: Duration) -> PollHandle<CacheAnalytics> {
    spawn_poller("cache", period, move || {
        let api = api.clone();
        async move { fetch_cache_analytics(&api).await.map(Some) }
    })
}
