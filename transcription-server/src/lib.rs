use crate::headers::X_REQUEST_ID_NAME;
use std::fmt::Debug;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::instrument;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use utoipa_scalar::{Scalar, Servable};

mod admission;
mod api;
mod auth;
mod context;
pub mod environ;
pub mod error;
mod fallback;
mod headers;
mod language_detection;
mod routes;
pub mod state;
mod transcribe;

use crate::api::ApiDoc;
use crate::routes::StatusRouter;
pub use context::Context;
pub use error::HttpError;
pub use state::{AppState, DecoderHandle};

pub type HttpResult<T> = Result<T, HttpError>;

const STATUS_TAG: &str = "Status";
const STATUS_DESC: &str = "Health and readiness of the transcription worker";

pub const AUDIO_TAG: &str = "Audio";
pub const AUDIO_DESC: &str = "Turn an uploaded audio file into a timed transcript.";

/// Binds the transcription HTTP surface to `interface` and serves it until the process is
/// killed. Builds the admission-controlled `/v1/audio/transcriptions` route plus the status
/// routes, wraps them in the usual request-id/trace layers, and mounts the OpenAPI docs at
/// `/docs`.
///
/// There is deliberately no per-request wall-clock timeout layer here: the decoder's own
/// internal limits are the only bound on how long a transcription may run, and admission
/// control is what sheds load, not a clock.
#[instrument(skip(state))]
pub async fn serve_http<A>(interface: A, state: AppState) -> HttpResult<()>
where
    A: ToSocketAddrs + Debug,
{
    let audio_router = OpenApiRouter::new().routes(routes!(transcribe::transcribe));

    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(audio_router)
        .merge(StatusRouter::default().router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::new(X_REQUEST_ID_NAME.clone())),
        )
        .with_state(state)
        .split_for_parts();

    let router = router.merge(Scalar::with_url("/docs", api));

    let listener = TcpListener::bind(interface).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
