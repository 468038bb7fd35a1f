use crate::shared::detection::DetectionBatch;

/// The most recent detection result paired with the frame size it was
/// computed against. Painting always uses these dimensions, never the
/// source's current ones.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderState {
    batch: DetectionBatch,
    frame_width: u32,
    frame_height: u32,
    generation: u64,
}

impl RenderState {
    pub fn new(batch: DetectionBatch, frame_width: u32, frame_height: u32, generation: u64) -> Self {
        Self {
            batch,
            frame_width,
            frame_height,
            generation,
        }
    }

    pub fn batch(&self) -> &DetectionBatch {
        &self.batch
    }

    pub fn frame_width(&self) -> u32 {
        self.frame_width
    }

    pub fn frame_height(&self) -> u32 {
        self.frame_height
    }

    /// Capture session that produced this result.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
