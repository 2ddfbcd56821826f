//! 数据库健康状态小组件

use crate::dashboard::api::ApiClient;
use crate::dashboard::error::ClientResult;
use crate::dashboard::poller::{spawn_poller, PollHandle};
use crate::dashboard::session::ConnectionContext;
use crate::dashboard::types::HealthResponse;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// 默认慢连接阈值（毫秒）
pub const DEFAULT_SLOW_THRESHOLD_MS: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Connected,
    Slow,
    Offline,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Connected => "connected",
            HealthStatus::Slow => "slow",
            HealthStatus::Offline => "offline",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthReading {
    pub status: HealthStatus,
    pub latency_ms: f64,
}

impl HealthReading {
    pub const OFFLINE: HealthReading = HealthReading {
        status: HealthStatus::Offline,
        latency_ms: 0.0,
    };
}

/// 根据探测结果分类
pub fn classify(response: &HealthResponse, slow_threshold_ms: f64) -> HealthReading {
    if response.status != "connected" {
        return HealthReading::OFFLINE;
    }
    let latency_ms = response.latency.unwrap_or_default();
    let status = if latency_ms > slow_threshold_ms {
        HealthStatus::Slow
    } else {
        HealthStatus::Connected
    };
    HealthReading { status, latency_ms }
}

/// 探测一次。失败不向上抛出，直接视为离线
pub async fn check(api: &ApiClient, slow_threshold_ms: f64) -> HealthReading {
    let Some(tenant_id) = ConnectionContext::tenant_id(api.store().as_ref()).await else {
        return HealthReading::OFFLINE;
    };
    match api.get_tenant_health(&tenant_id).await {
        Ok(response) => classify(&response, slow_threshold_ms),
        Err(e) => {
            warn!("[HealthMonitor] 健康检查失败: {}", e);
            HealthReading::OFFLINE
        }
    }
}

/// 启动健康轮询；每一轮都会产生读数（离线也是读数）
pub fn start_polling(
    api: Arc<ApiClient>,
    period: Duration,
    slow_threshold_ms: f64,
) -> PollHandle<HealthReading> {
    spawn_poller("health", period, move || {
        let api = api.clone();
        async move { ClientResult::Ok(Some(check(&api, slow_threshold_ms).await)) }
    })
}
