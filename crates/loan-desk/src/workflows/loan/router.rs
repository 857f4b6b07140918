use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{text_or_number, DraftFields};
use super::history::FacilityView;
use super::service::{ApplicationServiceError, LoanApplicationService};
use super::store::KeyValueStore;

/// Payload for pricing a loan without submitting an application.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub facility_id: String,
    #[serde(deserialize_with = "text_or_number")]
    pub amount: String,
    #[serde(deserialize_with = "text_or_number")]
    pub repayment_period: String,
}

/// Router builder exposing the catalog, quotes, submissions and history.
pub fn loan_router<S>(service: Arc<LoanApplicationService<S>>) -> Router
where
    S: KeyValueStore + 'static,
{
    Router::new()
        .route("/api/v1/facilities", get(facilities_handler::<S>))
        .route("/api/v1/loans/quote", post(quote_handler::<S>))
        .route(
            "/api/v1/loans/applications",
            post(submit_handler::<S>).get(history_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn facilities_handler<S>(
    State(service): State<Arc<LoanApplicationService<S>>>,
) -> Response
where
    S: KeyValueStore + 'static,
{
    let views: Vec<FacilityView> = service.facilities().iter().map(FacilityView::from).collect();
    (StatusCode::OK, axum::Json(views)).into_response()
}

pub(crate) async fn quote_handler<S>(
    State(service): State<Arc<LoanApplicationService<S>>>,
    axum::Json(request): axum::Json<QuoteRequest>,
) -> Response
where
    S: KeyValueStore + 'static,
{
    match service.quote(&request.facility_id, &request.amount, &request.repayment_period) {
        Ok(loan) => (StatusCode::OK, axum::Json(loan)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<LoanApplicationService<S>>>,
    axum::Json(fields): axum::Json<DraftFields>,
) -> Response
where
    S: KeyValueStore + 'static,
{
    match service.submit(fields) {
        Ok(application) => (StatusCode::CREATED, axum::Json(application)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn history_handler<S>(
    State(service): State<Arc<LoanApplicationService<S>>>,
) -> Response
where
    S: KeyValueStore + 'static,
{
    match service.history_views() {
        Ok(views) => (StatusCode::OK, axum::Json(views)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: ApplicationServiceError) -> Response {
    if let Some(errors) = error.validation_errors() {
        let payload = json!({
            "error": error.to_string(),
            "fields": errors,
        });
        return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
    }

    let status = match error {
        ApplicationServiceError::UnknownFacility(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
