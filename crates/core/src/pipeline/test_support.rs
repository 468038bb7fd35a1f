//! Fakes shared by the pipeline tests.

use std::sync::{Arc, Mutex};

use crate::detection::domain::errors::DetectionError;
use crate::detection::domain::inference_service::{
    InferenceOutcome, InferenceRequest, InferenceService, InferenceTicket,
};
use crate::pipeline::frame_scheduler::FrameScheduler;
use crate::shared::detection::DetectionBatch;

#[derive(Default)]
struct ScriptState {
    submitted: Vec<(InferenceTicket, (u32, u32))>,
    completed: Vec<InferenceOutcome>,
    auto_reply: Option<Result<DetectionBatch, DetectionError>>,
    reject_with: Option<DetectionError>,
}

/// Test handle onto a [`FakeInference`]: inspect submissions and decide
/// when and how each call completes.
#[derive(Clone, Default)]
pub(crate) struct ScriptedInference(Arc<Mutex<ScriptState>>);

impl ScriptedInference {
    pub fn service(&self) -> Box<dyn InferenceService> {
        Box::new(FakeInference(self.clone()))
    }

    pub fn submitted(&self) -> Vec<InferenceTicket> {
        self.0.lock().unwrap().submitted.iter().map(|(t, _)| *t).collect()
    }

    /// Every later submission completes immediately with `reply`.
    pub fn auto_reply(&self, reply: Result<DetectionBatch, DetectionError>) {
        self.0.lock().unwrap().auto_reply = Some(reply);
    }

    /// Every later submission is refused with `error`.
    pub fn reject_with(&self, error: DetectionError) {
        self.0.lock().unwrap().reject_with = Some(error);
    }

    /// Complete the submission with `ticket` using the frame size it was
    /// submitted with.
    pub fn complete(&self, ticket: InferenceTicket, result: Result<DetectionBatch, DetectionError>) {
        let mut state = self.0.lock().unwrap();
        let (frame_width, frame_height) = state
            .submitted
            .iter()
            .find(|(t, _)| *t == ticket)
            .map(|(_, size)| *size)
            .expect("ticket was never submitted");
        state.completed.push(InferenceOutcome {
            ticket,
            frame_width,
            frame_height,
            result,
        });
    }
}

struct FakeInference(ScriptedInference);

impl InferenceService for FakeInference {
    fn submit(&mut self, request: InferenceRequest) -> Result<(), DetectionError> {
        let mut state = self.0 .0.lock().unwrap();
        if let Some(error) = state.reject_with.clone() {
            return Err(error);
        }
        let size = request.frame.dimensions();
        state.submitted.push((request.ticket, size));
        if let Some(reply) = state.auto_reply.clone() {
            state.completed.push(InferenceOutcome {
                ticket: request.ticket,
                frame_width: size.0,
                frame_height: size.1,
                result: reply,
            });
        }
        Ok(())
    }

    fn poll_completed(&mut self) -> Vec<InferenceOutcome> {
        std::mem::take(&mut self.0 .0.lock().unwrap().completed)
    }
}

/// Schedules a fixed number of frames without sleeping.
pub(crate) struct CountingScheduler {
    pub remaining: u64,
    pub scheduled: u64,
}

impl CountingScheduler {
    pub fn new(frames: u64) -> Self {
        Self {
            remaining: frames,
            scheduled: 0,
        }
    }
}

impl FrameScheduler for CountingScheduler {
    fn next_frame(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.scheduled += 1;
        true
    }
}
