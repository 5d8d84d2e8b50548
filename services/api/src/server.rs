use crate::cli::ServeArgs;
use crate::infra::{
    load_catalog, AppState, InMemoryCatalogRepository, InMemoryTransactionRepository,
};
use crate::routes::with_reward_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use cardwise::config::AppConfig;
use cardwise::error::AppError;
use cardwise::rewards::RewardService;
use cardwise::telemetry;
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

    let catalog = Arc::new(InMemoryCatalogRepository::default());
    let transactions = Arc::new(InMemoryTransactionRepository::default());
    let service = Arc::new(RewardService::new(catalog, transactions));

    let definitions = load_catalog(&config.catalog)?;
    let seeded = service.seed_catalog(&definitions)?;
    info!(seeded, "predefined card catalog loaded");

    let app = with_reward_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "card recommendation service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
