use chrono::{DateTime, Utc};
use shared_utils::AppMetrics;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    connectors::PriceSource,
    models::{ExpenseResult, PriceSample},
    storage::PriceRepository,
};

const JOB_NAME: &str = "price_poller";

/// 时间来源，测试中可替换
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 定时拉取法币价格并写入价格存储
///
/// 单次失败只记录日志和指标，不影响后续调度。
pub struct PricePoller {
    source: Arc<dyn PriceSource>,
    store: Arc<dyn PriceRepository>,
    metrics: Arc<AppMetrics>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    align_to_boundary: bool,
}

impl PricePoller {
    pub fn new(
        source: Arc<dyn PriceSource>,
        store: Arc<dyn PriceRepository>,
        metrics: Arc<AppMetrics>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            store,
            metrics,
            clock: Arc::new(SystemClock),
            interval,
            align_to_boundary: false,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 首次触发对齐到下一个整间隔时刻；否则启动后立即触发
    pub fn aligned(mut self, align: bool) -> Self {
        self.align_to_boundary = align;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// 执行一次拉取并写入
    pub async fn tick(&self) -> ExpenseResult<PriceSample> {
        let price = self.source.fetch_price().await?;
        let sample = PriceSample::at(price, self.clock.now());
        self.store.insert(&sample).await?;
        Ok(sample)
    }

    async fn run_tick(&self) {
        match self.tick().await {
            Ok(sample) => {
                self.metrics.record_job_run(JOB_NAME, true);
                self.metrics.record_created("price_sample");
                info!(price = %sample.price, timestamp = %sample.timestamp, "Price sample saved");
            }
            Err(e) => {
                self.metrics.record_job_run(JOB_NAME, false);
                error!(error = %e, "Price poll failed");
            }
        }
    }

    fn first_delay(&self) -> Duration {
        if self.align_to_boundary {
            delay_until_boundary(self.clock.now(), self.interval)
        } else {
            Duration::ZERO
        }
    }

    /// 在后台启动轮询
    pub fn spawn(self) -> PollerHandle {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let first_delay = self.first_delay();
        info!(
            interval_secs = self.interval.as_secs(),
            first_tick_in_secs = first_delay.as_secs(),
            "Price poller started"
        );

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + first_delay, self.interval);
            // 上一次仍未完成时跳过错过的触发点
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        tokio::select! {
                            _ = cancelled.cancelled() => break,
                            _ = self.run_tick() => {}
                        }
                    }
                }
            }

            info!("Price poller stopped");
        });

        PollerHandle { token, handle }
    }
}

/// 后台轮询任务句柄
pub struct PollerHandle {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl PollerHandle {
    /// 请求停止，不等待任务结束
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// 停止并等待任务结束
    pub async fn shutdown(self) -> Result<(), JoinError> {
        self.token.cancel();
        self.handle.await
    }
}

/// 距离下一个整间隔时刻（按 Unix 纪元对齐）的时长
pub fn delay_until_boundary(now: DateTime<Utc>, interval: Duration) -> Duration {
    let period_ms = i64::try_from(interval.as_millis()).unwrap_or(i64::MAX);
    if period_ms == 0 {
        return Duration::ZERO;
    }

    let remainder = now.timestamp_millis().rem_euclid(period_ms);
    if remainder == 0 {
        Duration::ZERO
    } else {
        Duration::from_millis((period_ms - remainder) as u64)
    }
}
