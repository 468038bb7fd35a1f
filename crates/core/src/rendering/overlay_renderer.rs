use crate::rendering::domain::drawing_surface::{DrawingSurface, OverlayStyle};
use crate::shared::constants::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::shared::detection::DetectionBatch;
use crate::shared::render_state::RenderState;

/// Label position relative to the box's top-left corner.
const LABEL_OFFSET_X: f64 = 5.0;
const LABEL_OFFSET_Y: f64 = 20.0;

/// Paints a detection batch onto a drawing surface.
///
/// Each call repaints from scratch, so rendering the same batch twice leaves
/// the surface in the same state.
#[derive(Clone, Debug)]
pub struct OverlayRenderer {
    threshold: f64,
    style: OverlayStyle,
}

impl OverlayRenderer {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            style: OverlayStyle::default(),
        }
    }

    pub fn with_style(mut self, style: OverlayStyle) -> Self {
        self.style = style;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    /// Paint `batch`, which was detected on a `frame_width`x`frame_height`
    /// frame. Returns the number of detections drawn.
    ///
    /// A zero-sized frame leaves the surface untouched.
    pub fn render(
        &self,
        surface: &mut dyn DrawingSurface,
        batch: &DetectionBatch,
        frame_width: u32,
        frame_height: u32,
    ) -> usize {
        if frame_width == 0 || frame_height == 0 {
            return 0;
        }

        if surface.dimensions() != (frame_width, frame_height) {
            surface.resize(frame_width, frame_height);
        }
        surface.clear();

        let mut drawn = 0;
        for detection in batch.above(self.threshold) {
            let bbox = detection.bounding_box();
            surface.stroke_rect(bbox, &self.style);
            surface.fill_text(
                &detection.caption(),
                bbox.x + LABEL_OFFSET_X,
                bbox.y + LABEL_OFFSET_Y,
                &self.style,
            );
            drawn += 1;
        }
        drawn
    }

    pub fn render_state(&self, surface: &mut dyn DrawingSurface, state: &RenderState) -> usize {
        self.render(
            surface,
            state.batch(),
            state.frame_width(),
            state.frame_height(),
        )
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    use crate::shared::detection::{BoundingBox, Detection};

    #[derive(Clone, Debug, PartialEq)]
    pub(crate) enum Op {
        Resize(u32, u32),
        Clear,
        Rect(BoundingBox),
        Text(String, f64, f64),
    }

    /// Records every call so tests can check ordering.
    #[derive(Default)]
    pub(crate) struct RecordingSurface {
        pub size: (u32, u32),
        pub ops: Vec<Op>,
    }

    impl RecordingSurface {
        pub fn sized(width: u32, height: u32) -> Self {
            Self {
                size: (width, height),
                ops: Vec::new(),
            }
        }

        /// Shapes currently on the surface: everything after the last
        /// resize or clear.
        pub fn visible(&self) -> Vec<Op> {
            let start = self
                .ops
                .iter()
                .rposition(|op| matches!(op, Op::Clear | Op::Resize(..)))
                .map_or(0, |i| i + 1);
            self.ops[start..].to_vec()
        }
    }

    impl DrawingSurface for RecordingSurface {
        fn dimensions(&self) -> (u32, u32) {
            self.size
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.size = (width, height);
            self.ops.push(Op::Resize(width, height));
        }

        fn clear(&mut self) {
            self.ops.push(Op::Clear);
        }

        fn stroke_rect(&mut self, bbox: &BoundingBox, _style: &OverlayStyle) {
            self.ops.push(Op::Rect(*bbox));
        }

        fn fill_text(&mut self, text: &str, x: f64, y: f64, _style: &OverlayStyle) {
            self.ops.push(Op::Text(text.to_string(), x, y));
        }
    }

    fn person_and_cup() -> DetectionBatch {
        DetectionBatch::new(vec![
            Detection::new("person", 0.82, BoundingBox::new(10.0, 20.0, 100.0, 200.0)),
            Detection::new("cup", 0.31, BoundingBox::new(300.0, 50.0, 40.0, 40.0)),
        ])
    }

    #[test]
    fn test_person_and_cup_draws_only_person() {
        let mut surface = RecordingSurface::sized(640, 480);
        let drawn = OverlayRenderer::default().render(&mut surface, &person_and_cup(), 640, 480);

        assert_eq!(drawn, 1);
        assert_eq!(
            surface.visible(),
            vec![
                Op::Rect(BoundingBox::new(10.0, 20.0, 100.0, 200.0)),
                Op::Text("person 82.0%".into(), 15.0, 40.0),
            ]
        );
    }

    #[rstest]
    #[case(0.5, 0)]
    #[case(0.50001, 1)]
    #[case(0.49, 0)]
    #[case(1.0, 1)]
    fn test_threshold_is_strict(#[case] confidence: f64, #[case] expected: usize) {
        let batch = DetectionBatch::new(vec![Detection::new(
            "dog",
            confidence,
            BoundingBox::new(0.0, 0.0, 5.0, 5.0),
        )]);
        let mut surface = RecordingSurface::sized(10, 10);
        assert_eq!(OverlayRenderer::default().render(&mut surface, &batch, 10, 10), expected);
    }

    #[test]
    fn test_resize_happens_before_any_drawing() {
        let mut surface = RecordingSurface::sized(320, 240);
        OverlayRenderer::default().render(&mut surface, &person_and_cup(), 640, 480);

        assert_eq!(surface.size, (640, 480));
        assert_eq!(surface.ops[0], Op::Resize(640, 480));
        let first_shape = surface
            .ops
            .iter()
            .position(|op| matches!(op, Op::Rect(_) | Op::Text(..)))
            .unwrap();
        assert!(first_shape > 0);
    }

    #[test]
    fn test_matching_size_is_not_resized() {
        let mut surface = RecordingSurface::sized(640, 480);
        OverlayRenderer::default().render(&mut surface, &person_and_cup(), 640, 480);
        assert!(!surface.ops.iter().any(|op| matches!(op, Op::Resize(..))));
        assert_eq!(surface.ops[0], Op::Clear);
    }

    #[test]
    fn test_render_is_idempotent() {
        let renderer = OverlayRenderer::default();
        let mut surface = RecordingSurface::sized(640, 480);

        renderer.render(&mut surface, &person_and_cup(), 640, 480);
        let once = surface.visible();
        renderer.render(&mut surface, &person_and_cup(), 640, 480);

        assert_eq!(surface.visible(), once);
    }

    #[test]
    fn test_empty_batch_clears_surface() {
        let renderer = OverlayRenderer::default();
        let mut surface = RecordingSurface::sized(640, 480);
        renderer.render(&mut surface, &person_and_cup(), 640, 480);

        let drawn = renderer.render(&mut surface, &DetectionBatch::default(), 640, 480);

        assert_eq!(drawn, 0);
        assert!(surface.visible().is_empty());
    }

    #[test]
    fn test_zero_sized_frame_is_noop() {
        let mut surface = RecordingSurface::sized(640, 480);
        let drawn = OverlayRenderer::default().render(&mut surface, &person_and_cup(), 0, 480);

        assert_eq!(drawn, 0);
        assert!(surface.ops.is_empty());
    }

    #[test]
    fn test_detections_drawn_in_input_order() {
        let batch = DetectionBatch::new(vec![
            Detection::new("b", 0.9, BoundingBox::new(1.0, 1.0, 1.0, 1.0)),
            Detection::new("a", 0.9, BoundingBox::new(2.0, 2.0, 1.0, 1.0)),
        ]);
        let mut surface = RecordingSurface::sized(10, 10);
        OverlayRenderer::default().render(&mut surface, &batch, 10, 10);

        let labels: Vec<String> = surface
            .visible()
            .into_iter()
            .filter_map(|op| match op {
                Op::Text(t, ..) => Some(t),
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec!["b 90.0%", "a 90.0%"]);
    }

    #[test]
    fn test_default_style() {
        let style = OverlayRenderer::default().style().to_owned();
        assert_eq!(style.color, crate::rendering::domain::drawing_surface::Color::GREEN);
        assert_relative_eq!(style.line_width, 2.0);
        assert_relative_eq!(style.font_size, 16.0);
    }
}
