use std::borrow::Cow;
use thiserror::Error;

#[derive(Clone, Error, Debug)]
pub enum EnvironmentError {
    #[error(
        "Required environment variable {0} not found. Please define this variable {0}=... and relaunch the application."
    )]
    MissingEnvVar(String),

    #[error(
        "Found environment variable {0} but validation failed: {1}. Please fix this variable and relaunch the application."
    )]
    InvalidEnvVar(Cow<'static, str>, String),
}

/// Super trait for all variables which can be inferred at runtime, from the environment variables
pub trait FromEnv {
    const ENV_VAR_NAME: &'static str;

    fn from_env() -> Self;
}

/// Super trait for all variables which can be inferred at runtime, from the environment variables
/// but whose extraction may fail
pub trait TryFromEnv {
    const ENV_VAR_NAME: &'static str;

    fn try_from_env() -> Result<Self, EnvironmentError>
    where
        Self: Sized;
}

/// Parses a boolean-ish environment variable, returning `default` when unset.
pub fn env_bool(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(raw) => matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "y" | "on"),
        Err(_) => default,
    }
}

/// Parses an integer environment variable, returning `default` when unset or invalid.
pub fn env_int(name: &str, default: i64) -> i64 {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid int env {name}={raw:?}, using default {default}");
            default
        }),
        _ => default,
    }
}

/// Parses a floating-point environment variable, returning `default` when unset or invalid.
pub fn env_float(name: &str, default: f64) -> f64 {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid float env {name}={raw:?}, using default {default}");
            default
        }),
        _ => default,
    }
}

/// Reads a string environment variable, returning `default` when unset or empty.
pub fn env_string(name: &str, default: &str) -> String {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw,
        _ => default.to_string(),
    }
}
