use crate::capture::domain::acquisition_error::AcquisitionError;
use crate::capture::domain::capture_request::CaptureRequest;
use crate::capture::domain::frame_source::FrameSource;

/// Platform camera access.
///
/// `open` returns once the device has been opened (or has failed); frames
/// may still be arriving when it returns.
pub trait CameraBackend: Send {
    fn open(&mut self, request: &CaptureRequest) -> Result<Box<dyn FrameSource>, AcquisitionError>;
}
