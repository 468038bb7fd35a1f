use crate::shared::detection::BoundingBox;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const GREEN: Color = Color::rgb(0x00, 0xFF, 0x00);
}

/// Stroke and text styling for overlay shapes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayStyle {
    pub color: Color,
    pub line_width: f64,
    /// Label text size in pixels.
    pub font_size: f64,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            color: Color::GREEN,
            line_width: 2.0,
            font_size: 16.0,
        }
    }
}

/// A transparent 2D layer stacked over the video.
///
/// Coordinates are in the surface's own pixels, which the renderer keeps
/// equal to the source frame's pixels.
pub trait DrawingSurface {
    fn dimensions(&self) -> (u32, u32);

    /// Change the pixel size. Resizing discards everything drawn so far.
    fn resize(&mut self, width: u32, height: u32);

    fn clear(&mut self);

    fn stroke_rect(&mut self, bbox: &BoundingBox, style: &OverlayStyle);

    /// Draw `text` with its baseline starting at `(x, y)`.
    fn fill_text(&mut self, text: &str, x: f64, y: f64, style: &OverlayStyle);
}
