use crate::cli::ServeArgs;
use crate::infra::{load_candidates, AppState, InMemoryCandidateRepository};
use crate::routes::with_search_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use muni_rank::config::AppConfig;
use muni_rank::error::AppError;
use muni_rank::search::{MunicipalitySearchService, ScoringModel, SearchEngine};
use muni_rank::telemetry;
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
    if let Some(path) = args.candidates_csv.take() {
        config.dataset.candidates_csv = Some(path);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryCandidateRepository::new(load_candidates(
        &config.dataset,
    )?));
    let candidate_count = repository.len();
    let engine = SearchEngine::from_config(ScoringModel::default(), &config.routing);
    let search_service = Arc::new(MunicipalitySearchService::new(repository, engine));

    let app = with_search_routes(search_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        candidates = candidate_count,
        routing = config.routing.enabled(),
        "municipality search service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
