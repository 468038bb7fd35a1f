use iced::mouse;
use iced::widget::canvas::{self, Frame, Path, Stroke};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme, Vector};

use lookout_core::rendering::domain::drawing_surface::{Color as OverlayColor, DrawingSurface};
use lookout_core::rendering::infrastructure::display_list::{DrawCommand, DisplayList};

/// Replays an overlay display list over the video, using the same
/// aspect-preserving fit as the video image beneath it.
pub struct OverlayCanvas<'a> {
    list: &'a DisplayList,
}

impl<'a> OverlayCanvas<'a> {
    pub fn new(list: &'a DisplayList) -> Self {
        Self { list }
    }
}

impl<Message> canvas::Program<Message> for OverlayCanvas<'_> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let Some((scale, offset)) = contain_transform(bounds.size(), self.list.dimensions()) else {
            return vec![frame.into_geometry()];
        };
        let map = |x: f64, y: f64| Point::new(offset.x + x as f32 * scale, offset.y + y as f32 * scale);

        for command in self.list.commands() {
            match command {
                DrawCommand::StrokeRect {
                    bbox,
                    color,
                    line_width,
                } => {
                    let path = Path::rectangle(
                        map(bbox.x, bbox.y),
                        Size::new(bbox.width as f32 * scale, bbox.height as f32 * scale),
                    );
                    frame.stroke(
                        &path,
                        Stroke {
                            style: canvas::Style::Solid(to_iced(*color)),
                            width: *line_width as f32,
                            ..Stroke::default()
                        },
                    );
                }
                DrawCommand::FillText {
                    text,
                    x,
                    y,
                    color,
                    size,
                } => {
                    // Recorded y is the baseline; canvas text is anchored at its top.
                    let top = map(*x, *y - *size);
                    frame.fill_text(canvas::Text {
                        content: text.clone(),
                        position: top,
                        color: to_iced(*color),
                        size: (*size as f32 * scale).into(),
                        ..canvas::Text::default()
                    });
                }
            }
        }

        vec![frame.into_geometry()]
    }
}

fn to_iced(color: OverlayColor) -> Color {
    Color::from_rgba8(color.r, color.g, color.b, color.a as f32 / 255.0)
}

/// Scale and offset that fit `content` inside `bounds` without distortion,
/// centered on both axes.
pub fn contain_transform(bounds: Size, (width, height): (u32, u32)) -> Option<(f32, Vector)> {
    if width == 0 || height == 0 || bounds.width <= 0.0 || bounds.height <= 0.0 {
        return None;
    }
    let scale = (bounds.width / width as f32).min(bounds.height / height as f32);
    let offset = Vector::new(
        (bounds.width - width as f32 * scale) / 2.0,
        (bounds.height - height as f32 * scale) / 2.0,
    );
    Some((scale, offset))
}
