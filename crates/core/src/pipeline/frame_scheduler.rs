/// Source of "next display frame" callbacks.
///
/// The detection loop advances one step per scheduled frame.
pub trait FrameScheduler {
    /// Blocks until the next frame is due. Returns `false` when no more
    /// frames will be scheduled.
    fn next_frame(&mut self) -> bool;
}
