use crate::detection::domain::errors::DetectionError;
use crate::shared::detection::DetectionBatch;
use crate::shared::frame::Frame;

/// Identifies one inference call: which capture session it belongs to and
/// which tick sampled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InferenceTicket {
    pub generation: u64,
    pub sequence: u64,
}

pub struct InferenceRequest {
    pub ticket: InferenceTicket,
    pub frame: Frame,
}

/// A finished inference call, tagged with the size of the frame it ran on.
#[derive(Debug)]
pub struct InferenceOutcome {
    pub ticket: InferenceTicket,
    pub frame_width: u32,
    pub frame_height: u32,
    pub result: Result<DetectionBatch, DetectionError>,
}

/// Asynchronous inference: submit never waits for the model, completions
/// are collected later.
pub trait InferenceService: Send {
    fn submit(&mut self, request: InferenceRequest) -> Result<(), DetectionError>;

    /// Outcomes finished since the last poll, in completion order.
    fn poll_completed(&mut self) -> Vec<InferenceOutcome>;
}
