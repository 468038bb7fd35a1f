use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;

use crate::rendering::domain::drawing_surface::{Color, DrawingSurface, OverlayStyle};
use crate::shared::detection::BoundingBox;
use crate::shared::frame::Frame;

/// A label placed on an [`ImageSurface`].
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedLabel {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

/// Transparent RGBA raster overlay.
///
/// Rectangles are always rasterized. Labels are rasterized when the surface
/// has a font and are also kept as positioned text.
pub struct ImageSurface {
    image: RgbaImage,
    labels: Vec<PlacedLabel>,
    font: Option<FontArc>,
}

impl ImageSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            labels: Vec::new(),
            font: None,
        }
    }

    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn labels(&self) -> &[PlacedLabel] {
        &self.labels
    }

    /// The overlay alpha-blended onto `frame`.
    ///
    /// The frame is expected to match the overlay size; pixels outside the
    /// overlay are copied unchanged.
    pub fn composite_over(&self, frame: &Frame) -> RgbaImage {
        let (fw, fh) = frame.dimensions();
        let mut out = RgbaImage::from_raw(fw, fh, frame.to_rgba())
            .unwrap_or_else(|| RgbaImage::new(fw, fh));

        for (x, y, px) in out.enumerate_pixels_mut() {
            if x >= self.image.width() || y >= self.image.height() {
                continue;
            }
            let over = self.image.get_pixel(x, y);
            let alpha = over[3] as u32;
            if alpha == 0 {
                continue;
            }
            for c in 0..3 {
                px[c] = ((over[c] as u32 * alpha + px[c] as u32 * (255 - alpha)) / 255) as u8;
            }
            px[3] = 255;
        }
        out
    }
}

impl DrawingSurface for ImageSurface {
    fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.image = RgbaImage::new(width, height);
        self.labels.clear();
    }

    fn clear(&mut self) {
        for px in self.image.pixels_mut() {
            *px = Rgba([0, 0, 0, 0]);
        }
        self.labels.clear();
    }

    fn stroke_rect(&mut self, bbox: &BoundingBox, style: &OverlayStyle) {
        let Some(corners) = pixel_corners(bbox, self.image.dimensions()) else {
            return;
        };
        let thickness = style.line_width.round().max(1.0) as u32;
        draw_rect(&mut self.image, corners, to_rgba(style.color), thickness);
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, style: &OverlayStyle) {
        if let Some(font) = &self.font {
            let scale = PxScale::from(style.font_size as f32);
            // `y` is the baseline; imageproc positions text by its top edge.
            let ascent = font.as_scaled(scale).ascent() as f64;
            draw_text_mut(
                &mut self.image,
                to_rgba(style.color),
                x.round() as i32,
                (y - ascent).round() as i32,
                scale,
                font,
                text,
            );
        }
        self.labels.push(PlacedLabel {
            text: text.to_string(),
            x,
            y,
        });
    }
}

fn to_rgba(color: Color) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, color.a])
}

/// Inclusive pixel corners `[x0, y0, x1, y1]` of a box, clamped to the image.
fn pixel_corners(bbox: &BoundingBox, (w, h): (u32, u32)) -> Option<[u32; 4]> {
    if w == 0 || h == 0 || bbox.width <= 0.0 || bbox.height <= 0.0 {
        return None;
    }
    let max_x = (w - 1) as f64;
    let max_y = (h - 1) as f64;
    let x0 = bbox.x.max(0.0);
    let y0 = bbox.y.max(0.0);
    let x1 = (bbox.x + bbox.width - 1.0).min(max_x);
    let y1 = (bbox.y + bbox.height - 1.0).min(max_y);
    if x0 > max_x || y0 > max_y || x1 < x0 || y1 < y0 {
        return None;
    }
    Some([x0 as u32, y0 as u32, x1 as u32, y1 as u32])
}

/// Draw a rectangle border with given thickness, growing inwards.
fn draw_rect(img: &mut RgbaImage, [x0, y0, x1, y1]: [u32; 4], color: Rgba<u8>, thickness: u32) {
    for t in 0..thickness {
        let (xx0, yy0) = (x0 + t, y0 + t);
        let (Some(xx1), Some(yy1)) = (x1.checked_sub(t), y1.checked_sub(t)) else {
            break;
        };
        if xx0 > xx1 || yy0 > yy1 {
            break;
        }
        for x in xx0..=xx1 {
            img.put_pixel(x, yy0, color);
            img.put_pixel(x, yy1, color);
        }
        for y in yy0..=yy1 {
            img.put_pixel(xx0, y, color);
            img.put_pixel(xx1, y, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::infrastructure::label_font::find_system_font;
    use crate::rendering::overlay_renderer::OverlayRenderer;
    use crate::shared::detection::{Detection, DetectionBatch};

    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

    #[test]
    fn test_stroke_draws_border_only() {
        let mut surface = ImageSurface::new(20, 20);
        let style = OverlayStyle {
            line_width: 1.0,
            ..OverlayStyle::default()
        };

        surface.stroke_rect(&BoundingBox::new(2.0, 3.0, 10.0, 8.0), &style);

        let img = surface.image();
        assert_eq!(*img.get_pixel(2, 3), GREEN);
        assert_eq!(*img.get_pixel(11, 10), GREEN);
        assert_eq!(*img.get_pixel(6, 6), CLEAR);
        assert_eq!(*img.get_pixel(12, 3), CLEAR);
    }

    #[test]
    fn test_line_width_two_grows_inwards() {
        let mut surface = ImageSurface::new(20, 20);
        surface.stroke_rect(&BoundingBox::new(0.0, 0.0, 10.0, 10.0), &OverlayStyle::default());

        let img = surface.image();
        assert_eq!(*img.get_pixel(1, 5), GREEN);
        assert_eq!(*img.get_pixel(2, 5), CLEAR);
    }

    #[test]
    fn test_box_past_edge_is_clamped() {
        let mut surface = ImageSurface::new(10, 10);
        surface.stroke_rect(&BoundingBox::new(5.0, 5.0, 50.0, 50.0), &OverlayStyle::default());
        assert_eq!(*surface.image().get_pixel(9, 9), GREEN);
    }

    #[test]
    fn test_box_outside_is_ignored() {
        let mut surface = ImageSurface::new(10, 10);
        surface.stroke_rect(&BoundingBox::new(20.0, 20.0, 5.0, 5.0), &OverlayStyle::default());
        assert!(surface.image().pixels().all(|p| *p == CLEAR));
    }

    #[test]
    fn test_clear_resets_pixels_and_labels() {
        let mut surface = ImageSurface::new(10, 10);
        let style = OverlayStyle::default();
        surface.stroke_rect(&BoundingBox::new(0.0, 0.0, 5.0, 5.0), &style);
        surface.fill_text("cup 90.0%", 5.0, 20.0, &style);

        surface.clear();

        assert!(surface.image().pixels().all(|p| *p == CLEAR));
        assert!(surface.labels().is_empty());
    }

    /// Whether any strongly green pixel lies in the inclusive pixel rectangle.
    fn any_ink(img: &RgbaImage, (x0, y0): (u32, u32), (x1, y1): (u32, u32)) -> bool {
        (y0..=y1).any(|y| (x0..=x1).any(|x| {
            let p = img.get_pixel(x, y);
            p[1] > 127 && p[3] > 127
        }))
    }

    #[test]
    fn test_label_drawn_on_baseline_inside_box() {
        // Needs an installed system font
        let Some(font) = find_system_font() else {
            return;
        };
        let batch = DetectionBatch::new(vec![Detection::new(
            "person",
            0.82,
            BoundingBox::new(10.0, 20.0, 100.0, 80.0),
        )]);
        let mut surface = ImageSurface::new(200, 120).with_font(font);

        OverlayRenderer::default().render(&mut surface, &batch, 200, 120);

        let img = surface.image();
        // Caption baseline sits at (15, 40); glyphs fill the band above it.
        assert!(any_ink(img, (15, 24), (100, 44)));
        // Nothing between the box border and the caption's left edge.
        assert!(!any_ink(img, (12, 24), (13, 44)));
        // Nothing well below the baseline.
        assert!(!any_ink(img, (15, 50), (100, 96)));
        assert_eq!(surface.labels()[0].text, "person 82.0%");
    }

    #[test]
    fn test_label_without_font_is_only_recorded() {
        let mut surface = ImageSurface::new(200, 120);
        surface.fill_text("person 82.0%", 15.0, 40.0, &OverlayStyle::default());

        assert!(!surface.has_font());
        assert!(surface.image().pixels().all(|p| *p == CLEAR));
        assert_eq!(
            surface.labels(),
            &[PlacedLabel {
                text: "person 82.0%".to_string(),
                x: 15.0,
                y: 40.0,
            }]
        );
    }

    #[test]
    fn test_composite_keeps_frame_where_overlay_is_clear() {
        let frame = Frame::new(vec![50u8; 8 * 8 * 3], 8, 8, 3, 0);
        let batch = DetectionBatch::new(vec![Detection::new(
            "person",
            0.9,
            BoundingBox::new(0.0, 0.0, 8.0, 8.0),
        )]);
        let mut surface = ImageSurface::new(1, 1);
        OverlayRenderer::default().render(&mut surface, &batch, 8, 8);

        let out = surface.composite_over(&frame);

        assert_eq!(out.dimensions(), (8, 8));
        assert_eq!(*out.get_pixel(0, 0), GREEN);
        assert_eq!(*out.get_pixel(4, 4), Rgba([50, 50, 50, 255]));
        assert_eq!(surface.labels()[0].text, "person 90.0%");
    }
}
