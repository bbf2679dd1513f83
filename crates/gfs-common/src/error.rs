//! Error taxonomy surfaced to viewer users.

use thiserror::Error;

/// Result type alias using ViewerError.
pub type ViewerResult<T> = Result<T, ViewerError>;

/// Failures that abort a render request.
///
/// Every variant is terminal for the request; nothing is retried and no
/// partial map is produced.
#[derive(Debug, Error)]
pub enum ViewerError {
    // === Request Errors ===
    #[error("Invalid request parameter '{param}': {message}")]
    InvalidRequest { param: String, message: String },

    #[error("Parameter not recognized: {0}")]
    UnrecognizedParameter(String),

    #[error("Forecast step {step} is out of range (available: 0..={max})")]
    StepOutOfRange { step: u32, max: u32 },

    // === Data Errors ===
    #[error("Failed to load data: {0}")]
    LoadFailed(String),

    #[error("Failed to read field '{field}': {message}")]
    FieldReadFailed { field: String, message: String },

    #[error("Region does not overlap the dataset grid: {0}")]
    EmptyRegion(String),

    // === Rendering Errors ===
    #[error("Rendering failed: {0}")]
    RenderFailed(String),
}

impl ViewerError {
    /// HTTP status code used when the error is returned by the viewer service.
    pub fn http_status_code(&self) -> u16 {
        match self {
            ViewerError::InvalidRequest { .. } | ViewerError::UnrecognizedParameter(_) => 400,

            ViewerError::StepOutOfRange { .. } | ViewerError::EmptyRegion(_) => 422,

            ViewerError::LoadFailed(_) | ViewerError::FieldReadFailed { .. } => 502,

            ViewerError::RenderFailed(_) => 500,
        }
    }

    /// Whether the failure is a user-facing warning rather than a data or server failure.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            ViewerError::UnrecognizedParameter(_) | ViewerError::InvalidRequest { .. }
        )
    }

    pub fn invalid(param: &str, message: impl Into<String>) -> Self {
        ViewerError::InvalidRequest {
            param: param.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ViewerError::UnrecognizedParameter("foobar".into()).http_status_code(), 400);
        assert_eq!(ViewerError::StepOutOfRange { step: 300, max: 240 }.http_status_code(), 422);
        assert_eq!(ViewerError::LoadFailed("timeout".into()).http_status_code(), 502);
        assert_eq!(ViewerError::RenderFailed("png".into()).http_status_code(), 500);
    }

    #[test]
    fn test_messages() {
        let err = ViewerError::LoadFailed("connection refused".into());
        assert_eq!(err.to_string(), "Failed to load data: connection refused");
        assert!(!err.is_warning());

        let err = ViewerError::UnrecognizedParameter("foobar".into());
        assert!(err.is_warning());
    }
}
