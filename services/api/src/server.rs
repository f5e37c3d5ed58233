use crate::cli::ServeArgs;
use crate::infra::{AppState, ConfiguredProcessor, Marketplace};
use crate::routes::marketplace_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use rentgate::config::AppConfig;
use rentgate::error::AppError;
use rentgate::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let processor = ConfiguredProcessor::from_config(&config.payments)?;
    let processor_label = processor.label();
    let marketplace = Marketplace::in_memory(&config, processor);
    marketplace.uploads.store().ensure_layout().await?;

    let app = marketplace_routes(&marketplace)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        processor = processor_label,
        uploads = %config.uploads.root_dir.display(),
        "rental marketplace ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
