use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    #[error("corrupt collection file {path}: {reason}")]
    Corrupt { path: String, reason: String },
    #[error("unsupported database url: {0}")]
    UnsupportedUrl(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
