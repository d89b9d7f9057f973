use crate::state::AppState;
use crate::STATUS_TAG;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Serialize;
use tracing::instrument;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

#[derive(Serialize, utoipa::ToSchema)]
struct HealthStatus {
    status: &'static str,
    worker_id: String,
    timestamp: String,
    model: String,
    device: String,
    gpu_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    compute_type: Option<String>,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = STATUS_TAG,
    responses(
        (status = OK, description = "Decoder handle is ready", body = HealthStatus),
        (status = 503, description = "Decoder handle has not finished initializing", body = HealthStatus),
    )
)]
#[instrument(skip(state))]
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.decoder.is_ready();
    let gpu_available = state.decoder_config.device == "cuda";
    let body = HealthStatus {
        status: if ready { "healthy" } else { "unhealthy" },
        worker_id: state.worker_id.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        model: state.decoder_config.model_size.clone(),
        device: state.decoder_config.device.clone(),
        gpu_available,
        compute_type: gpu_available.then(|| state.decoder_config.compute_type.clone()),
    };

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize, utoipa::ToSchema)]
struct ServiceInfo {
    service: &'static str,
    worker_id: String,
    model: String,
    device: String,
    status: &'static str,
    endpoints: Endpoints,
}

#[derive(Serialize, utoipa::ToSchema)]
struct Endpoints {
    transcribe: &'static str,
    health: &'static str,
}

#[utoipa::path(
    get,
    path = "/",
    tag = STATUS_TAG,
    responses((status = OK, description = "Static service description", body = ServiceInfo))
)]
#[instrument(skip(state))]
async fn root(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "transcription-service",
        worker_id: state.worker_id.clone(),
        model: state.decoder_config.model_size.clone(),
        device: state.decoder_config.device.clone(),
        status: if state.decoder.is_ready() {
            "ready"
        } else {
            "initializing"
        },
        endpoints: Endpoints {
            transcribe: "/v1/audio/transcriptions",
            health: "/health",
        },
    })
}

/// Provides the status/health/root routes.
#[derive(Default)]
pub struct StatusRouter;

impl StatusRouter {
    pub fn router(self) -> OpenApiRouter<AppState> {
        OpenApiRouter::new().routes(routes!(health)).routes(routes!(root))
    }
}
