pub const DEFAULT_MODEL_NAME: &str = "yolov8n.onnx";
pub const DEFAULT_MODEL_URL: &str =
    "https://huggingface.co/Ultralytics/YOLOv8/resolve/main/yolov8n.onnx";

/// One inference per this many display refreshes.
pub const DEFAULT_SAMPLE_INTERVAL: u64 = 4;

/// Detections at or below this confidence are not drawn.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;

pub const DEFAULT_REFRESH_RATE_HZ: u32 = 60;

/// Capture height requested for every facing direction.
pub const CAPTURE_HEIGHT_HINT: u32 = 600;
pub const CAPTURE_WIDTH_HINT: u32 = 800;
pub const CAPTURE_WIDTH_HINT_NARROW: u32 = 360;
/// Displays narrower than this get the narrow width hint.
pub const NARROW_DISPLAY_WIDTH: u32 = 768;

pub const CAMERA_UNAVAILABLE_MESSAGE: &str = "Camera unavailable";
pub const MODEL_UNAVAILABLE_MESSAGE: &str = "Detection model failed to load";
