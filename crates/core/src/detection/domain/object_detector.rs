use crate::detection::domain::errors::DetectionError;
use crate::shared::detection::DetectionBatch;
use crate::shared::frame::Frame;

/// A pretrained object-detection model.
///
/// Implementations may keep scratch buffers between calls, hence `&mut self`.
pub trait ObjectDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<DetectionBatch, DetectionError>;
}
