use crate::rendering::domain::drawing_surface::{Color, DrawingSurface, OverlayStyle};
use crate::shared::detection::BoundingBox;

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    StrokeRect {
        bbox: BoundingBox,
        color: Color,
        line_width: f64,
    },
    FillText {
        text: String,
        x: f64,
        y: f64,
        color: Color,
        size: f64,
    },
}

/// Retained drawing commands in frame-pixel coordinates.
///
/// GUI canvases replay the list on every redraw, scaling from the recorded
/// size to whatever bounds the widget has.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DisplayList {
    width: u32,
    height: u32,
    commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Text of every label currently in the list, in draw order.
    pub fn captions(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillText { text, .. } => Some(text.as_str()),
                DrawCommand::StrokeRect { .. } => None,
            })
            .collect()
    }
}

impl DrawingSurface for DisplayList {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.commands.clear();
    }

    fn clear(&mut self) {
        self.commands.clear();
    }

    fn stroke_rect(&mut self, bbox: &BoundingBox, style: &OverlayStyle) {
        self.commands.push(DrawCommand::StrokeRect {
            bbox: *bbox,
            color: style.color,
            line_width: style.line_width,
        });
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, style: &OverlayStyle) {
        self.commands.push(DrawCommand::FillText {
            text: text.to_string(),
            x,
            y,
            color: style.color,
            size: style.font_size,
        });
    }
}
