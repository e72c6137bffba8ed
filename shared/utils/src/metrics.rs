use anyhow::Result;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// 服务级 Prometheus 指标
///
/// 每个实例拥有独立的 registry，测试中可以随意创建。
pub struct AppMetrics {
    registry: Registry,
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    upstream_requests_total: IntCounterVec,
    jobs_total: IntCounterVec,
    records_created_total: IntCounterVec,
}

impl AppMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "path", "status"],
        )?;
        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request latency in seconds",
            ),
            &["method", "path"],
        )?;
        let upstream_requests_total = IntCounterVec::new(
            Opts::new(
                "upstream_requests_total",
                "Calls made to third-party APIs by outcome",
            ),
            &["api", "outcome"],
        )?;
        let jobs_total = IntCounterVec::new(
            Opts::new("jobs_total", "Background job runs by outcome"),
            &["job", "outcome"],
        )?;
        let records_created_total = IntCounterVec::new(
            Opts::new("records_created_total", "Records appended to storage"),
            &["kind"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(upstream_requests_total.clone()))?;
        registry.register(Box::new(jobs_total.clone()))?;
        registry.register(Box::new(records_created_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            upstream_requests_total,
            jobs_total,
            records_created_total,
        })
    }

    /// 记录一次 HTTP 请求
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration: Duration) {
        self.http_requests_total
            .with_label_values(&[method, path, &status.to_string()])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration.as_secs_f64());
    }

    /// 记录一次第三方 API 调用
    pub fn record_upstream_call(&self, api: &str, success: bool) {
        self.upstream_requests_total
            .with_label_values(&[api, outcome(success)])
            .inc();
    }

    /// 记录一次后台任务执行
    pub fn record_job_run(&self, job: &str, success: bool) {
        self.jobs_total.with_label_values(&[job, outcome(success)]).inc();
    }

    pub fn record_created(&self, kind: &str) {
        self.records_created_total.with_label_values(&[kind]).inc();
    }

    pub fn job_runs(&self, job: &str, success: bool) -> u64 {
        self.jobs_total
            .with_label_values(&[job, outcome(success)])
            .get()
    }

    pub fn upstream_calls(&self, api: &str, success: bool) -> u64 {
        self.upstream_requests_total
            .with_label_values(&[api, outcome(success)])
            .get()
    }

    pub fn records_created(&self, kind: &str) -> u64 {
        self.records_created_total.with_label_values(&[kind]).get()
    }

    /// 导出 Prometheus 文本格式
    pub fn gather(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

fn outcome(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "failure"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_tracked_per_label() {
        let metrics = AppMetrics::new().unwrap();

        metrics.record_job_run("price_poller", true);
        metrics.record_job_run("price_poller", true);
        metrics.record_job_run("price_poller", false);

        assert_eq!(metrics.job_runs("price_poller", true), 2);
        assert_eq!(metrics.job_runs("price_poller", false), 1);
        assert_eq!(metrics.job_runs("other", true), 0);
    }

    #[test]
    fn test_gather_exposes_recorded_series() {
        let metrics = AppMetrics::new().unwrap();
        metrics.record_http_request("GET", "/api/expenses", 404, Duration::from_millis(3));
        metrics.record_upstream_call("etherscan", false);
        metrics.record_created("transaction_record");

        let text = metrics.gather().unwrap();
        assert!(text.contains("http_requests_total"));
        assert!(text.contains("status=\"404\""));
        assert!(text.contains("upstream_requests_total"));
        assert!(text.contains("records_created_total"));
    }

    #[test]
    fn test_instances_do_not_share_registry() {
        let a = AppMetrics::new().unwrap();
        let b = AppMetrics::new().unwrap();
        a.record_created("price_sample");

        assert_eq!(a.records_created("price_sample"), 1);
        assert_eq!(b.records_created("price_sample"), 0);
    }
}
