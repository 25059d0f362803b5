pub mod session;
pub mod thread;

pub use session::*;
pub use thread::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("could not read session state {path}: {source}")]
    SessionIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse session state {path}: {source}")]
    SessionParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
