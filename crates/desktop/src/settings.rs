use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use lookout_core::capture::domain::capture_request::{CaptureRequest, FacingDirection};
use lookout_core::capture::infrastructure::camera_devices::CameraDevices;
use lookout_core::detection::infrastructure::model_resolver::ModelSource;
use lookout_core::pipeline::pipeline_config::PipelineConfig;
use lookout_core::shared::constants::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_REFRESH_RATE_HZ, DEFAULT_SAMPLE_INTERVAL,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Front,
    Back,
}

impl From<Facing> for FacingDirection {
    fn from(facing: Facing) -> Self {
        match facing {
            Facing::Front => FacingDirection::Front,
            Facing::Back => FacingDirection::Back,
        }
    }
}

/// User configuration read from `<config_dir>/Lookout/settings.json`.
///
/// Missing fields take their defaults; the file is never written by the app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub facing: Facing,
    pub sample_interval: u64,
    pub confidence_threshold: f64,
    /// Local path or URL overriding the bundled model.
    pub model: Option<String>,
    pub front_device: Option<String>,
    pub back_device: Option<String>,
    /// libavdevice demuxer; `"none"` opens devices as plain files or URLs.
    pub input_format: Option<String>,
    pub dark_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            facing: Facing::Back,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            model: None,
            front_device: None,
            back_device: None,
            input_format: None,
            dark_mode: true,
        }
    }
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("Lookout").join("settings.json"))
    }

    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(json) = fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&json).unwrap_or_else(|e| {
            log::warn!("Ignoring malformed settings {}: {e}", path.display());
            Self::default()
        })
    }

    /// Pipeline configuration for a window `display_width` pixels wide.
    pub fn to_config(&self, display_width: u32) -> PipelineConfig {
        let mut devices = CameraDevices::default();
        if self.front_device.is_some() || self.back_device.is_some() {
            devices.front = self.front_device.clone();
            devices.back = self.back_device.clone();
        }
        match self.input_format.as_deref() {
            Some("none") => devices.input_format = None,
            Some(format) => devices.input_format = Some(format.to_string()),
            None => {}
        }

        PipelineConfig {
            sample_interval: self.sample_interval,
            confidence_threshold: self.confidence_threshold,
            refresh_rate_hz: DEFAULT_REFRESH_RATE_HZ,
            capture: CaptureRequest::for_display_width(self.facing.into(), display_width),
            model: self
                .model
                .as_deref()
                .map(ModelSource::parse)
                .unwrap_or_default(),
            devices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(Settings::load_from(&tmp.path().join("settings.json")), Settings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        fs::write(&path, r#"{ "facing": "front", "confidence_threshold": 0.7 }"#).unwrap();

        let settings = Settings::load_from(&path);

        assert_eq!(settings.facing, Facing::Front);
        assert_relative_eq!(settings.confidence_threshold, 0.7);
        assert_eq!(settings.sample_interval, DEFAULT_SAMPLE_INTERVAL);
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[rstest]
    #[case(360, 360)]
    #[case(767, 360)]
    #[case(768, 800)]
    #[case(1280, 800)]
    fn test_capture_width_follows_display(#[case] display: u32, #[case] expected: u32) {
        let config = Settings::default().to_config(display);
        assert_eq!(config.capture.width_hint, expected);
        assert_eq!(config.capture.height_hint, 600);
        assert_eq!(config.capture.facing, FacingDirection::Back);
    }

    #[test]
    fn test_device_overrides() {
        let settings = Settings {
            back_device: Some("clip.mp4".into()),
            input_format: Some("none".into()),
            model: Some("/models/custom.onnx".into()),
            ..Settings::default()
        };

        let config = settings.to_config(1024);

        assert_eq!(config.devices.device_for(FacingDirection::Back), Some("clip.mp4"));
        assert_eq!(config.devices.device_for(FacingDirection::Front), Some("clip.mp4"));
        assert_eq!(config.devices.input_format, None);
        assert_eq!(
            config.model,
            ModelSource::Path(PathBuf::from("/models/custom.onnx"))
        );
    }
}
