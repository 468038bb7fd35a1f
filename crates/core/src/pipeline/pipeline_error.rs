use thiserror::Error;

use crate::capture::domain::acquisition_error::AcquisitionError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("sample interval must be at least 1")]
    InvalidSampleInterval,
    #[error("confidence threshold must be within 0..=1, got {0}")]
    InvalidThreshold(f64),
    #[error("refresh rate must be at least 1 Hz")]
    InvalidRefreshRate,
    #[error("camera unavailable: {0}")]
    Camera(#[from] AcquisitionError),
    #[error("pipeline has been torn down")]
    TornDown,
}
