//! 规则服务的 Prometheus 指标
//!
//! 记录函数在没有安装 recorder 时是空操作，因此库代码可以无条件调用。
//! 安装后指标在独立端口的 `/metrics` 上导出。

use anyhow::Result;
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::ObservabilityConfig;

const HTTP_REQUESTS: &str = "http_requests_total";
const HTTP_DURATION: &str = "http_request_duration_seconds";
const RULE_EVALUATIONS: &str = "rule_evaluations_total";
const RULE_EVALUATION_DURATION: &str = "rule_evaluation_duration_seconds";
const RULE_SET_SIZE: &str = "rule_set_size";
const RULE_COMPILE_FAILURES: &str = "rule_compile_failures_total";
const RULES_STORED: &str = "rules_stored";

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// 指标导出服务的句柄，持有期间导出服务保持运行
pub struct MetricsHandle {
    _exporter: JoinHandle<()>,
}

/// 安装全局 recorder 并启动导出服务
pub async fn init(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROMETHEUS_HANDLE.set(handle.clone());

    describe_metrics();
    metrics::counter!("service_starts_total", "service" => config.service_name.clone())
        .increment(1);

    let exporter = serve_exporter(SocketAddr::from(([0, 0, 0, 0], config.metrics_port)), handle)
        .await?;

    Ok(MetricsHandle {
        _exporter: exporter,
    })
}

fn describe_metrics() {
    metrics::describe_counter!(HTTP_REQUESTS, "HTTP requests handled");
    metrics::describe_histogram!(HTTP_DURATION, "HTTP request latency in seconds");
    metrics::describe_counter!(RULE_EVALUATIONS, "Rule set evaluations");
    metrics::describe_histogram!(
        RULE_EVALUATION_DURATION,
        "Rule set evaluation latency in seconds"
    );
    metrics::describe_histogram!(RULE_SET_SIZE, "Rules per evaluated rule set");
    metrics::describe_counter!(RULE_COMPILE_FAILURES, "Rule strings rejected at compile time");
    metrics::describe_gauge!(RULES_STORED, "Rules currently held by the store");
}

async fn serve_exporter(addr: SocketAddr, handle: PrometheusHandle) -> Result<JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(handle.render())))
        .route("/health", get(|| async { "OK" }));

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Metrics exporter listening");

    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Metrics exporter stopped");
        }
    }))
}

/// 已安装的 Prometheus handle
pub fn get_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

/// 记录一次 HTTP 请求
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    metrics::counter!(HTTP_REQUESTS, &labels).increment(1);
    metrics::histogram!(HTTP_DURATION, &labels).record(duration_secs);
}

/// 记录一次规则集求值
///
/// 规则数量作为直方图的观测值记录，不作为标签。
pub fn record_rule_evaluation(matched: bool, rule_count: usize, duration_secs: f64) {
    metrics::counter!(RULE_EVALUATIONS, "matched" => matched.to_string()).increment(1);
    metrics::histogram!(RULE_EVALUATION_DURATION).record(duration_secs);
    metrics::histogram!(RULE_SET_SIZE).record(rule_count as f64);
}

/// 记录一次编译失败，按错误码分类
pub fn record_compile_failure(code: &'static str) {
    metrics::counter!(RULE_COMPILE_FAILURES, "code" => code).increment(1);
}

pub fn set_rules_stored(count: usize) {
    metrics::gauge!(RULES_STORED).set(count as f64);
}
