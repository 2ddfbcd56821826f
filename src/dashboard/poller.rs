//! 轮询任务
//!
//! 每个轮询循环都是一个显式的可取消任务，由所属视图持有。
//! 视图卸载时调用 [`PollHandle::cancel`]（或直接 drop），后台任务随之终止，
//! 之后到达的响应不会再写回视图状态。

use crate::dashboard::error::ClientResult;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// 轮询任务句柄
///
/// 持有最近一次成功拉取的结果；拉取失败时只记录日志，保留上一次的结果。
pub struct PollHandle<T> {
    name: &'static str,
    receiver: watch::Receiver<Option<T>>,
    task: JoinHandle<()>,
}

impl<T: Clone> PollHandle<T> {
    /// 最近一次成功拉取的结果
    pub fn latest(&self) -> Option<T> {
        self.receiver.borrow().clone()
    }
}

impl<T> PollHandle<T> {
    /// 订阅结果变化，供渲染层等待刷新
    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.receiver.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// 取消轮询（视图卸载）
    pub fn cancel(self) {
        drop(self);
    }
}

impl<T> Drop for PollHandle<T> {
    fn drop(&mut self) {
        self.task.abort();
        debug!("[Poller] {} 轮询已取消", self.name);
    }
}

/// 轮询间隔下限；更短的间隔（包括 0）会被提升到该值
pub const MIN_POLL_PERIOD: Duration = Duration::from_millis(100);

/// 启动轮询：立即拉取一次，之后每隔 `period` 拉取一次
///
/// `fetch` 返回 `Ok(None)` 表示本轮没有可展示的数据（例如尚未连接数据库），
/// 不会覆盖已有结果。同一循环内的拉取是串行的。
pub fn spawn_poller<T, F, Fut>(name: &'static str, period: Duration, fetch: F) -> PollHandle<T>
where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ClientResult<Option<T>>> + Send + 'static,
{
    let period = if period < MIN_POLL_PERIOD {
        warn!(
            "[Poller] {} 轮询间隔 {:?} 过短，改用 {:?}",
            name, period, MIN_POLL_PERIOD
        );
        MIN_POLL_PERIOD
    } else {
        period
    };
    let (sender, receiver) = watch::channel(None);
    info!("[Poller] ⏱️ 启动 {} 轮询，间隔 {:?}", name, period);

    let task = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match fetch().await {
                Ok(Some(value)) => {
                    if sender.send(Some(value)).is_err() {
                        break;
                    }
                }
                Ok(None) => debug!("[Poller] {} 本轮无数据", name),
                Err(e) => warn!("[Poller] {} 拉取失败，保留上次结果: {}", name, e),
            }
        }
    });

    PollHandle {
        name,
        receiver,
        task,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::error::ClientError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn polls_on_interval_and_stops_when_cancelled() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let handle = spawn_poller("test", Duration::from_secs(10), move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok(Some(n)) }
        });

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(handle.latest(), Some(3));

        handle.cancel();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_keeps_last_known_good() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let handle = spawn_poller("test", Duration::from_secs(10), move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Ok(Some("first".to_string()))
                } else {
                    Err(ClientError::Network("down".into()))
                }
            }
        });

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(handle.latest().as_deref(), Some("first"));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_is_raised_to_minimum() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let handle = spawn_poller("test", Duration::ZERO, move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok(Some(n)) }
        });

        tokio::time::sleep(MIN_POLL_PERIOD * 3 + Duration::from_millis(50)).await;
        assert!(handle.is_running());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(handle.latest(), Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn none_does_not_overwrite() {
        let handle: PollHandle<u32> =
            spawn_poller("test", Duration::from_secs(10), || async { Ok(None) });
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(handle.latest().is_none());
        assert!(handle.is_running());
    }
}
