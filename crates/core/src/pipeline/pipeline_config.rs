use crate::capture::domain::capture_request::CaptureRequest;
use crate::capture::infrastructure::camera_devices::CameraDevices;
use crate::detection::infrastructure::model_resolver::ModelSource;
use crate::pipeline::pipeline_error::PipelineError;
use crate::shared::constants::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_REFRESH_RATE_HZ, DEFAULT_SAMPLE_INTERVAL,
};

/// Tunables for a live detection session.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Run inference on every Nth ready display frame.
    pub sample_interval: u64,
    /// Detections must score strictly above this to be drawn.
    pub confidence_threshold: f64,
    /// Display refresh rate for fixed-rate scheduling.
    pub refresh_rate_hz: u32,
    pub capture: CaptureRequest,
    pub model: ModelSource,
    pub devices: CameraDevices,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.sample_interval < 1 {
            return Err(PipelineError::InvalidSampleInterval);
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(PipelineError::InvalidThreshold(self.confidence_threshold));
        }
        if self.refresh_rate_hz < 1 {
            return Err(PipelineError::InvalidRefreshRate);
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            refresh_rate_hz: DEFAULT_REFRESH_RATE_HZ,
            capture: CaptureRequest::default(),
            model: ModelSource::Default,
            devices: CameraDevices::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sample_interval, 4);
        assert_eq!(config.refresh_rate_hz, 60);
    }

    #[rstest]
    #[case(0, 0.5, 60)]
    #[case(4, 1.5, 60)]
    #[case(4, -0.1, 60)]
    #[case(4, f64::NAN, 60)]
    #[case(4, 0.5, 0)]
    fn test_invalid_values_rejected(
        #[case] sample_interval: u64,
        #[case] confidence_threshold: f64,
        #[case] refresh_rate_hz: u32,
    ) {
        let config = PipelineConfig {
            sample_interval,
            confidence_threshold,
            refresh_rate_hz,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
