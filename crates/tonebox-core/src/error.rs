use thiserror::Error;

use crate::history::Mode;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid filter spec: {0}")]
    InvalidSpec(String),

    #[error("invalid mode: {0:?}")]
    InvalidMode(String),

    #[error("no active history entry (mode {mode})")]
    EmptyHistory { mode: Mode },

    #[error("no cached filters to preview")]
    EmptyScratch,

    #[error("unknown operation {name:?} in section {section:?}")]
    UnknownOperation { section: String, name: String },

    #[error(
        "crop ({x}, {y}) {width}x{height} is outside image of size {image_width}x{image_height}"
    )]
    CropOutOfBounds {
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        image_width: u32,
        image_height: u32,
    },

    #[error("image not found: {0}")]
    ImageNotFound(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
