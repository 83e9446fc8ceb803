use crate::cli::ServeArgs;
use crate::infra::{AppState, DiagnosisState, JsonFileStore};
use crate::routes::app_router;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use esg_diagnosis::config::AppConfig;
use esg_diagnosis::diagnosis::{DiagnosisService, IndicatorCatalog};
use esg_diagnosis::error::AppError;
use esg_diagnosis::narrative::Narrator;
use esg_diagnosis::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let narrator = Arc::new(Narrator::from_config(&config.narrative));
    if !narrator.is_live() {
        warn!(
            "GEMINI_API_KEY is not set; /api/config will report the missing credential and \
             narrative generation falls back to canned suggestions"
        );
    }

    let store = Arc::new(JsonFileStore::new(&config.storage.data_dir)?);
    let catalog = Arc::new(IndicatorCatalog::standard());
    let service = DiagnosisService::new(catalog.clone(), store.clone(), store);

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let diagnosis_state = DiagnosisState {
        service: Arc::new(Mutex::new(service)),
        narrator,
        catalog,
        api_key: config.narrative.api_key.clone(),
    };

    let app = app_router(diagnosis_state)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "esg diagnosis service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
