//! 资格规则服务
//!
//! 提供规则管理、编译与求值的 REST 接口。

use anyhow::Result;
use eligibility_shared::config::AppConfig;
use eligibility_shared::observability;
use rule_engine::RuleEngine;
use rule_engine::http::{self, AppState};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

const SERVICE_NAME: &str = "eligibility-rules";

#[tokio::main]
async fn main() -> Result<()> {
    // 统一加载配置：config/default.toml -> config/{env}.toml -> config/{service}.toml -> 环境变量
    let config = AppConfig::load(SERVICE_NAME).unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig {
            service_name: SERVICE_NAME.to_string(),
            ..AppConfig::default()
        }
    });

    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config).await?;

    info!("Starting {} on {}", config.service_name, config.server_addr());

    let engine = RuleEngine::from_config(&config.engine);
    info!(
        strict_operators = config.engine.strict_operators,
        max_depth = config.engine.max_depth,
        trace_enabled = config.engine.trace_enabled,
        "Rule engine initialized"
    );

    if config.is_production() && config.server.cors_origins.trim() == "*" {
        warn!("cors_origins=\"*\" 在生产环境中不安全，请设置为具体域名");
    }

    let app = http::router(AppState::in_memory(engine))
        .layer(http::cors_layer(&config.server.cors_origins))
        .layer(http::timeout_layer(Duration::from_secs(
            config.server.request_timeout_seconds,
        )));

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Service shutdown complete");
    Ok(())
}

/// 优雅关闭信号处理
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        }
    }
}
