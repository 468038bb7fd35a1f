use crate::capture::domain::acquisition_error::AcquisitionError;
use crate::capture::domain::camera_backend::CameraBackend;
use crate::capture::domain::capture_request::CaptureRequest;
use crate::capture::domain::frame_source::FrameSource;

/// Owns the single live camera source.
///
/// A new acquisition always releases the previous source first, so at most
/// one device handle is open at any time.
pub struct CaptureManager {
    backend: Box<dyn CameraBackend>,
    live: Option<Box<dyn FrameSource>>,
    request: Option<CaptureRequest>,
}

impl CaptureManager {
    pub fn new(backend: Box<dyn CameraBackend>) -> Self {
        Self {
            backend,
            live: None,
            request: None,
        }
    }

    /// Releases any live source, then opens one for `request`.
    ///
    /// On failure no source is live afterwards.
    pub fn acquire(&mut self, request: CaptureRequest) -> Result<&dyn FrameSource, AcquisitionError> {
        self.release();

        log::info!(
            "Acquiring {} camera ({}x{} hint)",
            request.facing,
            request.width_hint,
            request.height_hint
        );
        let source = self.backend.open(&request)?;
        self.request = Some(request);
        Ok(&**self.live.insert(source))
    }

    /// Stops the live source, if any.
    pub fn release(&mut self) {
        if let Some(mut source) = self.live.take() {
            source.release();
            if let Some(request) = self.request.take() {
                log::info!("Released {} camera", request.facing);
            }
        }
    }

    pub fn source(&self) -> Option<&dyn FrameSource> {
        self.live.as_deref()
    }

    /// The request behind the live source.
    pub fn current_request(&self) -> Option<&CaptureRequest> {
        self.request.as_ref()
    }

    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }
}

impl Drop for CaptureManager {
    fn drop(&mut self) {
        self.release();
    }
}
