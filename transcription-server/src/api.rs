use crate::{AUDIO_DESC, AUDIO_TAG, STATUS_DESC, STATUS_TAG};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "Transcription Service API"),
    tags(
        (name = STATUS_TAG, description = STATUS_DESC),
        (name = AUDIO_TAG, description = AUDIO_DESC),
    )
)]
pub struct ApiDoc;
