use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum KdebugError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("HTTP Request Error: {0}")]
    Http(#[from] Arc<reqwest::Error>),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Platform '{0}' is currently unsupported")]
    UnsupportedPlatform(String),

    #[error("Integrity Error: {0}")]
    Integrity(String),

    #[error("DownloadError: Failed to download '{0}' from '{1}': {2}")]
    Download(String, String, String),

    #[error("Resolution Error: {reason}")]
    Resolution { reason: String, stderr: String },

    #[error("Command failed with exit code {code}: {stderr}")]
    Process {
        code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("Handshake Error: {0}")]
    Handshake(String),

    #[error("Port forward exited without reporting a local port")]
    NoPortFound,

    #[error("Unknown debugger '{0}'")]
    UnsupportedDebugger(String),

    #[error("Timed out after {0:?} waiting for the port forward to report a local port")]
    TunnelTimeout(Duration),
}

impl From<std::io::Error> for KdebugError {
    fn from(err: std::io::Error) -> Self {
        KdebugError::Io(Arc::new(err))
    }
}

impl From<reqwest::Error> for KdebugError {
    fn from(err: reqwest::Error) -> Self {
        KdebugError::Http(Arc::new(err))
    }
}

impl From<serde_json::Error> for KdebugError {
    fn from(err: serde_json::Error) -> Self {
        KdebugError::Json(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, KdebugError>;
