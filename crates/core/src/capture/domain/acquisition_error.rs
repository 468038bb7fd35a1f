use thiserror::Error;

use crate::capture::domain::capture_request::FacingDirection;

/// Why a camera could not be acquired.
///
/// Every variant means the same thing to the user ("camera unavailable");
/// the detail is for logs.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),
    #[error("no camera device available for the {0} facing direction")]
    NoDevice(FacingDirection),
    #[error("camera device is already in use: {0}")]
    DeviceBusy(String),
    #[error("camera backend error: {0}")]
    Backend(String),
}

impl AcquisitionError {
    /// Maps a backend failure message onto the closest variant.
    pub fn from_backend_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("permission denied") || lower.contains("not authorized") {
            AcquisitionError::PermissionDenied(message)
        } else if lower.contains("busy") || lower.contains("in use") {
            AcquisitionError::DeviceBusy(message)
        } else {
            AcquisitionError::Backend(message)
        }
    }
}
