use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Failed to walk {path}: {source}")]
    Discovery {
        path: String,
        #[source]
        source: ignore::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Extraction error: {0}")]
    ExtractError(#[from] modview_extractor::ExtractError),

    #[error("Invalid project path: {0}")]
    InvalidPath(String),
}
