use crate::infra::{AppState, DiagnosisState};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use chrono::Local;
use esg_diagnosis::diagnosis::domain::{
    DiagnosisResult, Indicator, PerformanceData, PerformanceIndicator, QuantitativeData,
};
use esg_diagnosis::diagnosis::flow::Screen;
use esg_diagnosis::diagnosis::report;
use esg_diagnosis::diagnosis::repository::{ResultRepository, UsageRepository};
use esg_diagnosis::diagnosis::usage::UsageSnapshot;
use esg_diagnosis::diagnosis::DiagnosisError;
use esg_diagnosis::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

pub(crate) fn app_router<S>(state: DiagnosisState<S>) -> Router
where
    S: ResultRepository + UsageRepository + 'static,
{
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/config", get(config_endpoint::<S>))
        .route("/api/v1/diagnosis/catalog", get(catalog_endpoint::<S>))
        .route("/api/v1/diagnosis/usage", get(usage_endpoint::<S>))
        .route("/api/v1/diagnosis/session", post(start_session_endpoint::<S>))
        .route(
            "/api/v1/diagnosis/session/answers",
            post(record_answer_endpoint::<S>),
        )
        .route(
            "/api/v1/diagnosis/session/performance",
            put(set_performance_endpoint::<S>),
        )
        .route("/api/v1/diagnosis/session/back", post(back_endpoint::<S>))
        .route("/api/v1/diagnosis/finalize", post(finalize_endpoint::<S>))
        .route("/api/v1/diagnosis/report", get(report_endpoint::<S>))
        .route(
            "/api/v1/diagnosis/report/narrative",
            post(narrative_endpoint::<S>),
        )
        .route("/api/v1/diagnosis/report/export", get(export_endpoint::<S>))
        .route("/api/v1/diagnosis/home", post(home_endpoint::<S>))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnswerToggleRequest {
    pub(crate) indicator_id: String,
    pub(crate) sub_question_id: String,
    pub(crate) option_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerToggleResponse {
    pub(crate) selected: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FinalizeRequest {
    pub(crate) company_name: String,
    #[serde(default)]
    pub(crate) performance_data: Option<PerformanceData>,
    #[serde(default)]
    pub(crate) quantitative_data: Option<QuantitativeData>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StartSessionResponse {
    pub(crate) screen: Screen,
    pub(crate) usage: UsageSnapshot,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScreenResponse {
    pub(crate) screen: Screen,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CatalogResponse {
    pub(crate) indicators: Vec<Indicator>,
    pub(crate) performance_indicators: Vec<PerformanceIndicator>,
    pub(crate) daily_limit: u32,
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Bootstrap credential for narrative-capable clients. A 500 here means
/// the server-side secret is unset; the rest of the flow still works.
pub(crate) async fn config_endpoint<S>(State(state): State<DiagnosisState<S>>) -> Response
where
    S: ResultRepository + UsageRepository + 'static,
{
    match &state.api_key {
        Some(api_key) => Json(json!({ "apiKey": api_key })).into_response(),
        None => {
            error!("narrative API key is not configured on the server");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Server configuration error: API key is missing." })),
            )
                .into_response()
        }
    }
}

pub(crate) async fn catalog_endpoint<S>(
    State(state): State<DiagnosisState<S>>,
) -> Json<CatalogResponse>
where
    S: ResultRepository + UsageRepository + 'static,
{
    let service = state.service.lock().expect("service mutex poisoned");
    Json(CatalogResponse {
        indicators: state.catalog.indicators().to_vec(),
        performance_indicators: state.catalog.performance_indicators().to_vec(),
        daily_limit: service.usage(Local::now().date_naive()).limit,
    })
}

pub(crate) async fn usage_endpoint<S>(State(state): State<DiagnosisState<S>>) -> Json<UsageSnapshot>
where
    S: ResultRepository + UsageRepository + 'static,
{
    let service = state.service.lock().expect("service mutex poisoned");
    Json(service.usage(Local::now().date_naive()))
}

pub(crate) async fn start_session_endpoint<S>(
    State(state): State<DiagnosisState<S>>,
) -> Result<Json<StartSessionResponse>, AppError>
where
    S: ResultRepository + UsageRepository + 'static,
{
    let mut service = state.service.lock().expect("service mutex poisoned");
    let usage = service.start_session(Local::now().date_naive())?;
    Ok(Json(StartSessionResponse {
        screen: service.screen(),
        usage,
    }))
}

pub(crate) async fn record_answer_endpoint<S>(
    State(state): State<DiagnosisState<S>>,
    Json(payload): Json<AnswerToggleRequest>,
) -> Result<Json<AnswerToggleResponse>, AppError>
where
    S: ResultRepository + UsageRepository + 'static,
{
    let mut service = state.service.lock().expect("service mutex poisoned");
    let selected = service.record_answer(
        &payload.indicator_id,
        &payload.sub_question_id,
        &payload.option_id,
    )?;
    Ok(Json(AnswerToggleResponse { selected }))
}

pub(crate) async fn set_performance_endpoint<S>(
    State(state): State<DiagnosisState<S>>,
    Json(payload): Json<PerformanceData>,
) -> Result<Json<serde_json::Value>, AppError>
where
    S: ResultRepository + UsageRepository + 'static,
{
    let mut service = state.service.lock().expect("service mutex poisoned");
    service.set_performance_data(payload)?;
    Ok(Json(json!({ "status": "ok" })))
}

pub(crate) async fn finalize_endpoint<S>(
    State(state): State<DiagnosisState<S>>,
    Json(payload): Json<FinalizeRequest>,
) -> Result<Json<DiagnosisResult>, AppError>
where
    S: ResultRepository + UsageRepository + 'static,
{
    let mut service = state.service.lock().expect("service mutex poisoned");
    if let Some(performance_data) = payload.performance_data {
        service.set_performance_data(performance_data)?;
    }
    if let Some(quantitative_data) = payload.quantitative_data {
        service.set_quantitative_data(quantitative_data)?;
    }
    let result = service.finalize(&payload.company_name, Local::now())?;
    Ok(Json(result))
}

/// Runs the narrative step for the current result. The service mutex is
/// released while the generator call is in flight; the in-flight guard
/// keeps overlapping triggers from double-calling the generator.
pub(crate) async fn narrative_endpoint<S>(
    State(state): State<DiagnosisState<S>>,
) -> Result<Json<DiagnosisResult>, AppError>
where
    S: ResultRepository + UsageRepository + 'static,
{
    let snapshot = {
        let mut service = state.service.lock().expect("service mutex poisoned");
        service.begin_narrative()?
    };

    let Some(partial) = snapshot else {
        // Suggestions already attached; echo the completed result.
        let service = state.service.lock().expect("service mutex poisoned");
        let result = service
            .current_result()
            .cloned()
            .ok_or(DiagnosisError::NoActiveResult)?;
        return Ok(Json(result));
    };

    let outcome = state.narrator.generate(&state.catalog, &partial).await;

    let mut service = state.service.lock().expect("service mutex poisoned");
    let completed = service.complete_narrative(outcome)?;
    Ok(Json(completed))
}

pub(crate) async fn report_endpoint<S>(State(state): State<DiagnosisState<S>>) -> Response
where
    S: ResultRepository + UsageRepository + 'static,
{
    let mut service = state.service.lock().expect("service mutex poisoned");
    let current = service.current_result().cloned();
    match current {
        Some(result) => Json(result).into_response(),
        None => {
            let screen = service.navigate(Screen::Report);
            (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "no diagnosis result is available",
                    "redirectTo": screen,
                })),
            )
                .into_response()
        }
    }
}

pub(crate) async fn export_endpoint<S>(
    State(state): State<DiagnosisState<S>>,
) -> Result<Response, AppError>
where
    S: ResultRepository + UsageRepository + 'static,
{
    let result = {
        let service = state.service.lock().expect("service mutex poisoned");
        service.current_result().cloned()
    }
    .ok_or(DiagnosisError::NoActiveResult)?;

    let html = report::render_document(&state.catalog, &result);
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_filename(&result.company_name)
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        html,
    )
        .into_response())
}

pub(crate) async fn back_endpoint<S>(
    State(state): State<DiagnosisState<S>>,
) -> Result<Json<ScreenResponse>, AppError>
where
    S: ResultRepository + UsageRepository + 'static,
{
    let mut service = state.service.lock().expect("service mutex poisoned");
    service.back()?;
    Ok(Json(ScreenResponse {
        screen: service.screen(),
    }))
}

pub(crate) async fn home_endpoint<S>(State(state): State<DiagnosisState<S>>) -> Json<ScreenResponse>
where
    S: ResultRepository + UsageRepository + 'static,
{
    let mut service = state.service.lock().expect("service mutex poisoned");
    service.go_home();
    Json(ScreenResponse {
        screen: service.screen(),
    })
}

fn export_filename(company_name: &str) -> String {
    let safe: String = company_name
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect();
    let safe = safe.trim_matches('_');
    if safe.is_empty() {
        "esg_report.html".to_string()
    } else {
        format!("{safe}_esg_report.html")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryStore;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use esg_diagnosis::diagnosis::{DiagnosisService, IndicatorCatalog};
    use esg_diagnosis::narrative::{Narrator, StaticNarrator};
    use std::sync::{Arc, Mutex};
    use tower::util::ServiceExt;

    fn test_state(api_key: Option<&str>) -> (DiagnosisState<InMemoryStore>, Arc<InMemoryStore>) {
        let catalog = Arc::new(IndicatorCatalog::standard());
        let store = Arc::new(InMemoryStore::default());
        let service = DiagnosisService::new(catalog.clone(), store.clone(), store.clone());
        let state = DiagnosisState {
            service: Arc::new(Mutex::new(service)),
            narrator: Arc::new(Narrator::Static(StaticNarrator)),
            catalog,
            api_key: api_key.map(String::from),
        };
        (state, store)
    }

    async fn answer_all_yes(state: &DiagnosisState<InMemoryStore>) {
        let indicator_ids: Vec<String> = state
            .catalog
            .indicators()
            .iter()
            .map(|indicator| indicator.id.to_string())
            .collect();
        for indicator_id in indicator_ids {
            record_answer_endpoint(
                State(state.clone()),
                Json(AnswerToggleRequest {
                    indicator_id,
                    sub_question_id: "Q1".to_string(),
                    option_id: "opt1".to_string(),
                }),
            )
            .await
            .expect("answer records");
        }
    }

    #[tokio::test]
    async fn healthcheck_responds_ok_through_the_router() {
        let (state, _) = test_state(None);
        let response = app_router(state)
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn config_endpoint_reports_the_missing_credential() {
        let (state, _) = test_state(None);
        let response = app_router(state)
            .oneshot(
                Request::builder()
                    .uri("/api/config")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert!(payload["error"].as_str().expect("error text").contains("API key"));
    }

    #[tokio::test]
    async fn config_endpoint_hands_out_the_configured_key() {
        let (state, _) = test_state(Some("test-key"));
        let response = app_router(state)
            .oneshot(
                Request::builder()
                    .uri("/api/config")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(payload["apiKey"], "test-key");
    }

    #[tokio::test]
    async fn full_flow_scores_persists_and_attaches_narrative() {
        let (state, store) = test_state(None);

        let Json(started) = start_session_endpoint(State(state.clone()))
            .await
            .expect("session starts");
        assert_eq!(started.usage.count, 1);

        answer_all_yes(&state).await;

        let Json(result) = finalize_endpoint(
            State(state.clone()),
            Json(FinalizeRequest {
                company_name: "Acme Textiles".to_string(),
                performance_data: None,
                quantitative_data: None,
            }),
        )
        .await
        .expect("finalize succeeds");

        assert_eq!(result.scores.overall, 5.0);
        assert!(result.suggestions.is_none());
        let stored = store.load().expect("load succeeds").expect("slot filled");
        assert!(stored.suggestions.is_none(), "partial result is persisted");

        let Json(completed) = narrative_endpoint(State(state.clone()))
            .await
            .expect("narrative attaches");
        assert!(completed.suggestions.is_some());

        let stored = store.load().expect("load succeeds").expect("slot filled");
        assert!(
            stored.suggestions.is_some(),
            "completed result is persisted"
        );

        // A second trigger is a no-op echo, not a regeneration.
        let Json(echoed) = narrative_endpoint(State(state.clone()))
            .await
            .expect("second trigger echoes");
        assert_eq!(echoed.suggestions, completed.suggestions);
    }

    #[tokio::test]
    async fn blank_company_name_is_rejected_without_creating_a_result() {
        let (state, store) = test_state(None);

        start_session_endpoint(State(state.clone()))
            .await
            .expect("session starts");
        answer_all_yes(&state).await;

        let err = finalize_endpoint(
            State(state.clone()),
            Json(FinalizeRequest {
                company_name: "   ".to_string(),
                performance_data: None,
                quantitative_data: None,
            }),
        )
        .await
        .expect_err("blank name is rejected");

        assert!(matches!(
            err,
            AppError::Diagnosis(DiagnosisError::CompanyNameRequired)
        ));
        assert!(store.load().expect("load succeeds").is_none());

        let response = report_endpoint(State(state.clone())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn eleventh_session_of_the_day_is_refused() {
        let (state, _) = test_state(None);

        for _ in 0..10 {
            start_session_endpoint(State(state.clone()))
                .await
                .expect("session starts under the cap");
            home_endpoint(State(state.clone())).await;
        }

        let err = start_session_endpoint(State(state.clone()))
            .await
            .expect_err("cap refuses the eleventh session");
        assert!(matches!(
            err,
            AppError::Diagnosis(DiagnosisError::DailyLimitReached { limit: 10 })
        ));
    }

    #[tokio::test]
    async fn export_serves_a_standalone_html_attachment() {
        let (state, _) = test_state(None);

        start_session_endpoint(State(state.clone()))
            .await
            .expect("session starts");
        answer_all_yes(&state).await;
        finalize_endpoint(
            State(state.clone()),
            Json(FinalizeRequest {
                company_name: "Acme Textiles".to_string(),
                performance_data: None,
                quantitative_data: None,
            }),
        )
        .await
        .expect("finalize succeeds");

        let response = export_endpoint(State(state.clone()))
            .await
            .expect("export renders");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .expect("content type set"),
            "text/html; charset=utf-8"
        );
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_DISPOSITION)
                .expect("disposition set"),
            "attachment; filename=\"Acme_Textiles_esg_report.html\""
        );

        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let html = String::from_utf8(body.to_vec()).expect("utf-8 body");
        assert!(html.contains("Acme Textiles ESG Diagnosis Report"));
    }

    #[tokio::test]
    async fn home_clears_the_stored_slot() {
        let (state, store) = test_state(None);

        start_session_endpoint(State(state.clone()))
            .await
            .expect("session starts");
        answer_all_yes(&state).await;
        finalize_endpoint(
            State(state.clone()),
            Json(FinalizeRequest {
                company_name: "Acme Textiles".to_string(),
                performance_data: None,
                quantitative_data: None,
            }),
        )
        .await
        .expect("finalize succeeds");
        assert!(store.load().expect("load succeeds").is_some());

        let Json(response) = home_endpoint(State(state.clone())).await;
        assert_eq!(response.screen, Screen::Landing);
        assert!(store.load().expect("load succeeds").is_none());
    }
}
