//! Error types for DAP2 access.

use thiserror::Error;

pub type OpendapResult<T> = Result<T, OpendapError>;

#[derive(Debug, Error)]
pub enum OpendapError {
    /// Transport failure (connect, TLS, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// The server answered with a DAP2 `Error { ... }` document.
    #[error("server error: {0}")]
    Server(String),

    /// A `.dds` or `.das` document could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// A `.dods` payload did not match its declared structure.
    #[error("decode error: {0}")]
    Decode(String),
}
