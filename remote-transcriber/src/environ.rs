use std::env;
use tracing::warn;

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_opt_string(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Connection and credential settings for [`crate::client::RemoteTranscriber`], read from
/// `REMOTE_TRANSCRIBER_URL`, `REMOTE_TRANSCRIBER_API_KEY`, `REMOTE_TRANSCRIBER_MODEL`,
/// `REMOTE_TRANSCRIBER_TEMPERATURE`, and `REMOTE_TRANSCRIBER_VAD_MODEL`.
#[cfg_attr(debug_assertions, derive(Debug))]
pub struct RemoteTranscriberConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: String,
    pub vad_model: Option<String>,
}

impl RemoteTranscriberConfig {
    /// Reads the adapter's connection settings from the environment. Unlike the server-side
    /// config structs, a missing URL or key is a hard configuration error: there is no sane
    /// default endpoint to fall back to.
    pub fn from_env() -> Result<Self, String> {
        let api_url = env_opt_string("REMOTE_TRANSCRIBER_URL")
            .ok_or_else(|| "REMOTE_TRANSCRIBER_URL is not set".to_string())?;
        let api_key = env_opt_string("REMOTE_TRANSCRIBER_API_KEY")
            .ok_or_else(|| "REMOTE_TRANSCRIBER_API_KEY is not set".to_string())?;

        if api_key.trim().is_empty() {
            warn!("REMOTE_TRANSCRIBER_API_KEY is set but empty");
        }

        Ok(Self {
            api_url,
            api_key,
            model: env_string("REMOTE_TRANSCRIBER_MODEL", "default"),
            temperature: env_string("REMOTE_TRANSCRIBER_TEMPERATURE", "0"),
            vad_model: env_opt_string("REMOTE_TRANSCRIBER_VAD_MODEL"),
        })
    }
}
