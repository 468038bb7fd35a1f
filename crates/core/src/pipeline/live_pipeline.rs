use std::ops::ControlFlow;

use crate::capture::capture_manager::CaptureManager;
use crate::capture::domain::camera_backend::CameraBackend;
use crate::capture::domain::capture_request::{CaptureRequest, FacingDirection};
use crate::detection::domain::inference_service::InferenceService;
use crate::detection::domain::object_detector::ObjectDetector;
use crate::detection::infrastructure::threaded_inference_service::ThreadedInferenceService;
use crate::pipeline::detection_loop::{DetectionLoop, TickOutcome, TickReport};
use crate::pipeline::frame_scheduler::FrameScheduler;
use crate::pipeline::liveness::Liveness;
use crate::pipeline::pipeline_config::PipelineConfig;
use crate::pipeline::pipeline_error::PipelineError;
use crate::pipeline::pipeline_state::PipelineState;
use crate::rendering::domain::drawing_surface::DrawingSurface;
use crate::rendering::overlay_renderer::OverlayRenderer;
use crate::shared::frame::Frame;
use crate::shared::render_state::RenderState;

/// A live camera session with object detection.
///
/// Owns the camera, the model worker and the detection loop. The caller
/// drives it one display frame at a time with [`LivePipeline::tick`] or hands
/// it a scheduler with [`LivePipeline::run`].
pub struct LivePipeline {
    state: PipelineState,
    detection: DetectionLoop,
    request: CaptureRequest,
    torn_down: bool,
}

impl LivePipeline {
    pub fn new(backend: Box<dyn CameraBackend>, config: &PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let renderer = OverlayRenderer::new(config.confidence_threshold);
        Ok(Self {
            state: PipelineState::new(CaptureManager::new(backend)),
            detection: DetectionLoop::new(config.sample_interval, renderer)?,
            request: config.capture,
            torn_down: false,
        })
    }

    /// Acquire the camera for `request` and begin a new capture session.
    ///
    /// On failure no camera is live; the pipeline stays usable and a later
    /// `start` or `flip_camera` may succeed.
    pub fn start(&mut self, request: CaptureRequest) -> Result<(), PipelineError> {
        if self.torn_down {
            return Err(PipelineError::TornDown);
        }
        self.request = request;
        let generation = self.state.begin_generation();

        match self.state.capture_mut().acquire(request) {
            Ok(source) => {
                match source.dimensions() {
                    Some((w, h)) => log::info!("Camera session {generation} live at {w}x{h}"),
                    None => log::info!("Camera session {generation} live, waiting for first frame"),
                }
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to acquire {} camera: {e}", request.facing);
                Err(e.into())
            }
        }
    }

    /// Switch between front and back cameras.
    ///
    /// The old session stops producing results before its camera is
    /// released, then the new camera is acquired. Returns the new direction.
    pub fn flip_camera(&mut self) -> Result<FacingDirection, PipelineError> {
        let facing = self.request.facing.flipped();
        log::info!("Flipping camera to {facing}");
        self.start(self.request.with_facing(facing))?;
        Ok(facing)
    }

    /// Run `detector` on its own worker thread from now on.
    pub fn install_model(&mut self, detector: Box<dyn ObjectDetector>) {
        self.install_inference(Box::new(ThreadedInferenceService::spawn(detector)));
    }

    pub fn install_inference(&mut self, service: Box<dyn InferenceService>) {
        if self.torn_down {
            return;
        }
        log::info!("Detection model ready");
        self.state.set_inference(service);
    }

    /// Advance by one display frame. Completed results are painted onto
    /// `surface` when one is given.
    pub fn tick(&mut self, surface: Option<&mut dyn DrawingSurface>) -> TickReport {
        self.detection.step(&mut self.state, surface)
    }

    /// Tick once per scheduled frame until the scheduler stops, the pipeline
    /// is torn down, or `on_tick` breaks.
    pub fn run<F>(
        &mut self,
        scheduler: &mut dyn FrameScheduler,
        mut surface: Option<&mut dyn DrawingSurface>,
        mut on_tick: F,
    ) where
        F: FnMut(&mut LivePipeline, &TickReport) -> ControlFlow<()>,
    {
        while scheduler.next_frame() {
            let report = match surface {
                Some(ref mut target) => {
                    let target: &mut dyn DrawingSurface = &mut **target;
                    self.tick(Some(target))
                }
                None => self.tick(None),
            };
            if report.outcome == TickOutcome::Cancelled {
                break;
            }
            if on_tick(self, &report).is_break() {
                break;
            }
        }
    }

    /// Stop detection and release the camera. Idempotent.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.detection.liveness().cancel();
        self.state.shut_down();
        log::info!("Live pipeline torn down");
    }

    pub fn facing(&self) -> FacingDirection {
        self.request.facing
    }

    pub fn is_camera_live(&self) -> bool {
        self.state.capture().is_live()
    }

    pub fn has_model(&self) -> bool {
        self.state.has_model()
    }

    pub fn render_state(&self) -> Option<&RenderState> {
        self.state.render_state()
    }

    /// Latest camera frame, if the camera is delivering.
    pub fn current_frame(&self) -> Option<Frame> {
        self.state
            .capture()
            .source()
            .filter(|s| s.is_ready())
            .and_then(|s| s.current_frame())
    }

    pub fn liveness(&self) -> Liveness {
        self.detection.liveness()
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }
}

impl Drop for LivePipeline {
    fn drop(&mut self) {
        self.teardown();
    }
}
