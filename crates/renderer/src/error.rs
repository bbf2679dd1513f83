//! Rendering errors.

use gfs_common::ViewerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid canvas size {width}x{height}")]
    InvalidCanvas { width: u32, height: u32 },

    #[error("field has no cells to draw")]
    EmptyField,

    #[error("unknown colormap '{0}'")]
    UnknownColormap(String),

    #[error("PNG encoding failed: {0}")]
    Encode(String),

    #[error("cannot read {path}: {message}")]
    Asset { path: String, message: String },
}

impl From<RenderError> for ViewerError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::EmptyField => ViewerError::EmptyRegion(err.to_string()),
            other => ViewerError::RenderFailed(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;
