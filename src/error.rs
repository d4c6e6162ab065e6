use std::path::PathBuf;

use thiserror::Error;

use crate::client::ClientError;

pub type Result<T, E = TaggerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum TaggerError {
    #[error("{0} contains no log lines")]
    EmptyInput(String),

    #[error("malformed model response: {0}")]
    MalformedResponse(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("model call failed: {0}")]
    Client(#[from] ClientError),
}

impl TaggerError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
