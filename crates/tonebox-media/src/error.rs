use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("encode error: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, MediaError>;
