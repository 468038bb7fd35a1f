use crate::detection::domain::inference_service::{InferenceRequest, InferenceTicket};
use crate::pipeline::liveness::Liveness;
use crate::pipeline::pipeline_error::PipelineError;
use crate::pipeline::pipeline_state::PipelineState;
use crate::rendering::domain::drawing_surface::DrawingSurface;
use crate::rendering::overlay_renderer::OverlayRenderer;
use crate::shared::render_state::RenderState;

/// What a single tick decided about sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The owning view is gone; nothing was touched.
    Cancelled,
    /// No model or no camera yet.
    Idle,
    /// The camera has not delivered a frame with real dimensions yet.
    NotReady,
    /// Between samples.
    Waiting,
    /// A sample was due but the previous call has not finished.
    SkippedInFlight,
    /// A frame was handed to the model.
    Sampled,
    /// A sample was due but the model refused it.
    SubmitFailed,
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub outcome: TickOutcome,
    /// Completed results written to the render state this tick.
    pub applied: usize,
    /// Detections painted by the last applied result.
    pub painted: usize,
}

impl TickReport {
    fn new(outcome: TickOutcome, applied: usize, painted: usize) -> Self {
        Self {
            outcome,
            applied,
            painted,
        }
    }
}

/// Samples every Nth ready frame into the model and paints results as they
/// come back.
///
/// At most one call per capture session is outstanding. Results from an
/// earlier session are dropped; within a session the most recently
/// completed result wins.
pub struct DetectionLoop {
    sample_interval: u64,
    renderer: OverlayRenderer,
    liveness: Liveness,
}

impl DetectionLoop {
    pub fn new(sample_interval: u64, renderer: OverlayRenderer) -> Result<Self, PipelineError> {
        if sample_interval < 1 {
            return Err(PipelineError::InvalidSampleInterval);
        }
        Ok(Self {
            sample_interval,
            renderer,
            liveness: Liveness::new(),
        })
    }

    pub fn sample_interval(&self) -> u64 {
        self.sample_interval
    }

    pub fn renderer(&self) -> &OverlayRenderer {
        &self.renderer
    }

    /// Handle for cancelling the loop from elsewhere.
    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    /// Advance by one display frame.
    pub fn step(
        &mut self,
        state: &mut PipelineState,
        surface: Option<&mut dyn DrawingSurface>,
    ) -> TickReport {
        if !self.liveness.is_alive() {
            return TickReport::new(TickOutcome::Cancelled, 0, 0);
        }

        let (applied, painted) = self.apply_completed(state, surface);
        let report = |outcome| TickReport::new(outcome, applied, painted);

        if !state.has_model() {
            return report(TickOutcome::Idle);
        }
        let Some(source) = state.capture().source() else {
            return report(TickOutcome::Idle);
        };
        if !source.is_ready() {
            return report(TickOutcome::NotReady);
        }
        let frame = source.current_frame();

        let counter = state.advance_frame_counter();
        if counter % self.sample_interval != 0 {
            return report(TickOutcome::Waiting);
        }
        if state.in_flight().is_some() {
            log::trace!("Sample {counter} skipped, previous inference still running");
            return report(TickOutcome::SkippedInFlight);
        }
        let Some(frame) = frame else {
            return report(TickOutcome::NotReady);
        };

        let ticket = InferenceTicket {
            generation: state.generation(),
            sequence: counter,
        };
        let submitted = match state.inference_mut() {
            Some(service) => service.submit(InferenceRequest { ticket, frame }),
            None => return report(TickOutcome::Idle),
        };
        match submitted {
            Ok(()) => {
                state.set_in_flight(Some(ticket));
                report(TickOutcome::Sampled)
            }
            Err(e) => {
                log::warn!("Could not submit frame {counter} for detection: {e}");
                report(TickOutcome::SubmitFailed)
            }
        }
    }

    fn apply_completed(
        &self,
        state: &mut PipelineState,
        mut surface: Option<&mut dyn DrawingSurface>,
    ) -> (usize, usize) {
        let mut applied = 0;
        let mut painted = 0;

        for outcome in state.poll_completed() {
            if state.in_flight() == Some(outcome.ticket) {
                state.set_in_flight(None);
            }
            if outcome.ticket.generation != state.generation() {
                log::debug!(
                    "Discarding result for sample {} from an earlier camera session",
                    outcome.ticket.sequence
                );
                continue;
            }

            match outcome.result {
                Ok(batch) => {
                    let render_state = RenderState::new(
                        batch,
                        outcome.frame_width,
                        outcome.frame_height,
                        outcome.ticket.generation,
                    );
                    if let Some(surface) = surface.as_deref_mut() {
                        painted = self.renderer.render_state(surface, &render_state);
                    }
                    log::debug!(
                        "Sample {}: {} detections",
                        outcome.ticket.sequence,
                        render_state.batch().len()
                    );
                    state.set_render_state(render_state);
                    applied += 1;
                }
                Err(e) => {
                    log::warn!("Detection failed for sample {}: {e}", outcome.ticket.sequence);
                }
            }
        }

        (applied, painted)
    }
}
