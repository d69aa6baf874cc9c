//! HTTP API сервиса подбора вентиляторов

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{ReportError, ServiceError};
use crate::report::ReportStore;
use crate::service::PredictionService;
use crate::types::{Prediction, QueryParams, ReportOutput};

/// Общее состояние только для чтения, блокировки не нужны
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
    pub reports: Arc<ReportStore>,
}

impl AppState {
    pub fn new(service: PredictionService, reports: ReportStore) -> Self {
        Self {
            service: Arc::new(service),
            reports: Arc::new(reports),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/predict", post(predict))
        .route("/api/report", post(report))
        .route("/api/download", get(download))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Ошибка запроса в виде JSON `{ "error": kind, "message": text }`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let status = match err {
            ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServiceError::EmptyCatalog => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::UnknownLabel(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Тело запроса, которое не разобрано как запрос подбора, считается неверным вводом
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::InvalidInput(rejection.body_text()).into()
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        let (status, kind) = match &err {
            ReportError::InvalidHandle(_) => (StatusCode::BAD_REQUEST, "invalid_handle"),
            ReportError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ReportError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io"),
        };
        Self {
            status,
            kind,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("{}: {}", self.kind, self.message);
        } else {
            tracing::warn!("{}: {}", self.kind, self.message);
        }
        let body = Json(serde_json::json!({
            "error": self.kind,
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Fan selection ML API",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "catalog_rows": state.service.catalog().len(),
        "manufacturers": state.service.labels().len(),
    }))
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<QueryParams>, JsonRejection>,
) -> Result<Json<Prediction>, ApiError> {
    let Json(query) = payload?;
    tracing::info!("Predict request: {:?}", query);
    Ok(Json(state.service.predict_query(&query)?))
}

async fn report(
    State(state): State<AppState>,
    payload: Result<Json<QueryParams>, JsonRejection>,
) -> Result<Json<ReportOutput>, ApiError> {
    let Json(query) = payload?;
    tracing::info!("Report request: {:?}", query);

    let record = state.service.build_report(&query)?;
    let handle = state.reports.store(&record).await?;

    Ok(Json(ReportOutput {
        report: record.summary,
        pdf_filename: handle,
    }))
}

#[derive(Debug, Deserialize)]
struct DownloadParams {
    filename: String,
}

async fn download(
    State(state): State<AppState>,
    Query(params): Query<DownloadParams>,
) -> Result<Response, ApiError> {
    let bytes = state.reports.read(&params.filename).await?;
    let disposition = format!("attachment; filename=\"{}\"", params.filename);

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
