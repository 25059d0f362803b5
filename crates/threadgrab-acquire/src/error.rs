use threadgrab_model::ModelError;
use thiserror::Error;

/// Why a thread could not be fetched and saved.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("session state unusable: {0}")]
    Session(#[source] ModelError),

    #[error("browser: {0}")]
    Browser(String),

    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("page at {0} has no <pre> body")]
    MissingBody(String),

    #[error("response is not a thread record: {0}")]
    Parse(#[source] ModelError),

    #[error("could not serialize thread: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("could not write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<chromiumoxide::error::CdpError> for FetchError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        FetchError::Browser(err.to_string())
    }
}
