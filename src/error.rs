use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by dedup store operations.
///
/// Missing state is never an error; only state that exists and cannot be
/// read back is.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("corrupt state in {path:?}: {source}")]
    CorruptState {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialize: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
