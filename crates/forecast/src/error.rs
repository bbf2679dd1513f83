//! Error types for forecast dataset access.

use gfs_common::ViewerError;
use opendap::OpendapError;
use thiserror::Error;

/// Errors that can occur while opening, reading or clipping a forecast dataset.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// The remote dataset could not be opened.
    #[error("failed to open dataset {url}: {source}")]
    OpenFailed {
        url: String,
        #[source]
        source: OpendapError,
    },

    /// Dataset metadata is missing or inconsistent.
    #[error("invalid dataset metadata: {0}")]
    InvalidMetadata(String),

    /// The dataset has no variable with this name.
    #[error("variable not found: {0}")]
    MissingVariable(String),

    /// A field slice could not be read.
    #[error("failed to read {field}: {message}")]
    ReadFailed { field: String, message: String },

    /// Step index beyond the dataset's time axis.
    #[error("step {step} is beyond the time axis (0..{available})")]
    StepOutOfRange { step: u32, available: usize },

    /// The requested region selects no grid cells.
    #[error("region selects no grid cells: {0}")]
    EmptyRegion(String),
}

impl DatasetError {
    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }

    pub fn read_failed(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ReadFailed {
            field: field.into(),
            message: msg.into(),
        }
    }
}

impl From<DatasetError> for ViewerError {
    fn from(err: DatasetError) -> Self {
        match err {
            DatasetError::OpenFailed { .. } | DatasetError::InvalidMetadata(_) => {
                ViewerError::LoadFailed(err.to_string())
            }
            DatasetError::MissingVariable(field) => ViewerError::FieldReadFailed {
                field,
                message: "not present in dataset".to_string(),
            },
            DatasetError::ReadFailed { field, message } => {
                ViewerError::FieldReadFailed { field, message }
            }
            DatasetError::StepOutOfRange { step, available } => ViewerError::StepOutOfRange {
                step,
                max: available.saturating_sub(1) as u32,
            },
            DatasetError::EmptyRegion(msg) => ViewerError::EmptyRegion(msg),
        }
    }
}

/// Result type for dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_failure_maps_to_load_failed() {
        let err = DatasetError::OpenFailed {
            url: "https://example.test/dods/x".into(),
            source: OpendapError::Status {
                url: "https://example.test/dods/x.dds".into(),
                status: 404,
            },
        };
        let viewer: ViewerError = err.into();
        assert_eq!(viewer.http_status_code(), 502);
        assert!(viewer.to_string().starts_with("Failed to load data"));
    }

    #[test]
    fn test_step_out_of_range_reports_last_index() {
        let viewer: ViewerError = DatasetError::StepOutOfRange {
            step: 130,
            available: 121,
        }
        .into();
        match viewer {
            ViewerError::StepOutOfRange { step, max } => {
                assert_eq!(step, 130);
                assert_eq!(max, 120);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
