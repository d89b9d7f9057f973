use std::sync::Arc;
use tracing::info;
use transcription_core::Decoder;
use transcription_server::state::AppState;

#[cfg(feature = "whisper")]
fn load_decoder(state: &AppState) -> Result<Arc<dyn Decoder>, Box<dyn std::error::Error>> {
    use transcription_core::decoder::whisper_rs::WhisperRsDecoder;

    let cfg = &state.decoder_config;
    let decoder = WhisperRsDecoder::load(
        &cfg.model_size,
        &cfg.device,
        &cfg.compute_type,
        cfg.cpu_threads,
    )?;
    Ok(Arc::new(decoder))
}

#[cfg(not(feature = "whisper"))]
fn load_decoder(_state: &AppState) -> Result<Arc<dyn Decoder>, Box<dyn std::error::Error>> {
    use transcription_core::decoder::mock::MockDecoder;

    tracing::warn!("whisper feature disabled, serving requests with the mock decoder");
    Ok(Arc::new(MockDecoder::always_confident_english("")))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let worker_id = std::env::var("WORKER_ID").unwrap_or_else(|_| "1".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8000".to_string());
    let interface = format!("{host}:{port}");

    info!(worker_id = %worker_id, "worker starting up");

    let state = AppState::from_env(worker_id.clone());

    let decoder_handle = state.decoder.clone();
    let decoder_state = state.clone();
    tokio::task::spawn_blocking(move || match load_decoder(&decoder_state) {
        Ok(decoder) => {
            info!(model = %decoder.identity().model, "decoder ready");
            decoder_handle.set(decoder);
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to load decoder, /health will stay unready");
        }
    });

    info!(interface = %interface, "listening");
    transcription_server::serve_http(interface, state).await?;
    Ok(())
}
