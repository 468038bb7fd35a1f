use crate::capture::capture_manager::CaptureManager;
use crate::detection::domain::inference_service::{InferenceOutcome, InferenceService, InferenceTicket};
use crate::shared::render_state::RenderState;

/// Everything a live session mutates between ticks.
///
/// Owned by one thread. The detection loop is the only writer of the render
/// state; the frame counter and generation only move forward.
pub struct PipelineState {
    capture: CaptureManager,
    inference: Option<Box<dyn InferenceService>>,
    frame_counter: u64,
    generation: u64,
    in_flight: Option<InferenceTicket>,
    render_state: Option<RenderState>,
}

impl PipelineState {
    pub fn new(capture: CaptureManager) -> Self {
        Self {
            capture,
            inference: None,
            frame_counter: 0,
            generation: 0,
            in_flight: None,
            render_state: None,
        }
    }

    pub fn capture(&self) -> &CaptureManager {
        &self.capture
    }

    pub fn capture_mut(&mut self) -> &mut CaptureManager {
        &mut self.capture
    }

    pub fn set_inference(&mut self, service: Box<dyn InferenceService>) {
        self.inference = Some(service);
        self.in_flight = None;
    }

    pub fn has_model(&self) -> bool {
        self.inference.is_some()
    }

    /// Ready display frames seen so far.
    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn in_flight(&self) -> Option<InferenceTicket> {
        self.in_flight
    }

    pub fn render_state(&self) -> Option<&RenderState> {
        self.render_state.as_ref()
    }

    /// Starts a new capture session. Anything still running for the old one
    /// is forgotten and its results will be discarded.
    pub fn begin_generation(&mut self) -> u64 {
        self.generation += 1;
        self.in_flight = None;
        self.render_state = None;
        self.generation
    }

    /// Drops the inference service and the camera. Results of calls still
    /// running on the worker are never observed.
    pub fn shut_down(&mut self) {
        self.inference = None;
        self.in_flight = None;
        self.capture.release();
    }

    pub(crate) fn advance_frame_counter(&mut self) -> u64 {
        self.frame_counter += 1;
        self.frame_counter
    }

    pub(crate) fn poll_completed(&mut self) -> Vec<InferenceOutcome> {
        self.inference
            .as_mut()
            .map(|service| service.poll_completed())
            .unwrap_or_default()
    }

    pub(crate) fn inference_mut(&mut self) -> Option<&mut (dyn InferenceService + 'static)> {
        self.inference.as_deref_mut()
    }

    pub(crate) fn set_in_flight(&mut self, ticket: Option<InferenceTicket>) {
        self.in_flight = ticket;
    }

    pub(crate) fn set_render_state(&mut self, state: RenderState) {
        self.render_state = Some(state);
    }
}
