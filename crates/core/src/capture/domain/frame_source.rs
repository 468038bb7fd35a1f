use crate::shared::frame::Frame;

/// A live, continuously updating camera surface.
///
/// Owned exclusively by the capture manager. Dimensions are whatever the
/// device actually delivers and may change while the source is live.
pub trait FrameSource: Send {
    /// True once at least one frame has been decoded.
    fn is_ready(&self) -> bool;

    /// Natural pixel size of the most recent frame, if any.
    fn dimensions(&self) -> Option<(u32, u32)>;

    /// The most recent frame, if any.
    fn current_frame(&self) -> Option<Frame>;

    /// Stops the underlying device. Safe to call more than once.
    fn release(&mut self);
}
