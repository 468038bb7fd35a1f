use crate::capture::domain::capture_request::FacingDirection;

/// Maps facing directions onto ffmpeg input devices.
///
/// `input_format` names the libavdevice demuxer (`v4l2`, `avfoundation`,
/// `dshow`). When it is `None` the device string is opened as a plain URL
/// or file, which lets a recorded clip stand in for a camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevices {
    pub front: Option<String>,
    pub back: Option<String>,
    pub input_format: Option<String>,
}

impl CameraDevices {
    /// Device for `facing`, falling back to the other direction's device
    /// on machines with a single camera.
    pub fn device_for(&self, facing: FacingDirection) -> Option<&str> {
        let (preferred, fallback) = match facing {
            FacingDirection::Front => (&self.front, &self.back),
            FacingDirection::Back => (&self.back, &self.front),
        };
        match (preferred, fallback) {
            (Some(device), _) => Some(device.as_str()),
            (None, Some(device)) => {
                log::warn!("No {facing} camera configured, using {device}");
                Some(device.as_str())
            }
            (None, None) => None,
        }
    }

    /// Platform default: the first camera for both directions.
    pub fn platform_default() -> Self {
        #[cfg(target_os = "linux")]
        {
            Self {
                front: Some("/dev/video0".to_string()),
                back: None,
                input_format: Some("v4l2".to_string()),
            }
        }
        #[cfg(target_os = "macos")]
        {
            Self {
                front: Some("0".to_string()),
                back: None,
                input_format: Some("avfoundation".to_string()),
            }
        }
        #[cfg(target_os = "windows")]
        {
            Self {
                front: None,
                back: None,
                input_format: Some("dshow".to_string()),
            }
        }
        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        {
            Self {
                front: None,
                back: None,
                input_format: None,
            }
        }
    }
}

impl Default for CameraDevices {
    fn default() -> Self {
        Self::platform_default()
    }
}
