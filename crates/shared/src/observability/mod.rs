//! 日志与指标
//!
//! 二进制在启动时调用一次 [`init`]；库代码只使用 `tracing` 宏和
//! [`metrics`] 中的记录函数，不关心输出去向。

pub mod metrics;
pub mod middleware;
pub mod tracing;

use ::tracing::info;
use anyhow::Result;
use serde::Deserialize;
use std::str::FromStr;

/// 可观测性配置
#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    /// 日志与指标中的服务标识
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// 指标导出端口
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,

    /// EnvFilter 表达式，`RUST_LOG` 存在时以其为准
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// 输出 JSON 行而非可读文本
    #[serde(default)]
    pub json_logs: bool,
}

fn default_service_name() -> String {
    "unknown-service".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            metrics_port: default_metrics_port(),
            metrics_enabled: default_metrics_enabled(),
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok()?.parse().ok()
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.as_str(), "true" | "1"))
}

impl ObservabilityConfig {
    /// 仅从环境变量构建（METRICS_PORT、METRICS_ENABLED、RUST_LOG、JSON_LOGS）
    pub fn from_env(service_name: &str) -> Self {
        let defaults = Self::default();
        Self {
            service_name: service_name.to_string(),
            metrics_port: env_parse("METRICS_PORT").unwrap_or(defaults.metrics_port),
            metrics_enabled: env_flag("METRICS_ENABLED").unwrap_or(defaults.metrics_enabled),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            json_logs: env_flag("JSON_LOGS").unwrap_or(defaults.json_logs),
        }
    }

    /// 配置文件未设置服务名时使用给定名称
    pub fn with_service_name(mut self, service_name: &str) -> Self {
        if self.service_name == default_service_name() {
            self.service_name = service_name.to_string();
        }
        self
    }
}

/// 持有指标导出服务，离开作用域时记录关闭日志
pub struct ObservabilityGuard {
    _metrics: Option<metrics::MetricsHandle>,
}

impl ObservabilityGuard {
    /// 不持有任何资源的 guard
    pub fn empty() -> Self {
        Self { _metrics: None }
    }
}

impl Drop for ObservabilityGuard {
    fn drop(&mut self) {
        info!("Observability shut down");
    }
}

/// 安装全局 subscriber，并在启用时启动指标导出
///
/// ```ignore
/// let config = ObservabilityConfig::from_env("eligibility-rules");
/// let _guard = eligibility_shared::observability::init(&config).await?;
/// ```
pub async fn init(config: &ObservabilityConfig) -> Result<ObservabilityGuard> {
    tracing::init(config)?;

    let metrics = if config.metrics_enabled {
        Some(metrics::init(config).await?)
    } else {
        None
    };

    info!(
        service = %config.service_name,
        metrics_enabled = config.metrics_enabled,
        metrics_port = config.metrics_port,
        json_logs = config.json_logs,
        "Observability ready"
    );

    Ok(ObservabilityGuard { _metrics: metrics })
}
