/// Axis-aligned box in source-pixel coordinates, anchored at its top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a box from corner coordinates `(x1, y1, x2, y2)`.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(x1, y1, (x2 - x1).max(0.0), (y2 - y1).max(0.0))
    }

    /// Clips the box to `[0, width] x [0, height]`.
    pub fn clamped(&self, width: u32, height: u32) -> Self {
        let x1 = self.x.clamp(0.0, width as f64);
        let y1 = self.y.clamp(0.0, height as f64);
        let x2 = (self.x + self.width).clamp(0.0, width as f64);
        let y2 = (self.y + self.height).clamp(0.0, height as f64);
        Self::from_corners(x1, y1, x2, y2)
    }
}

/// One labeled, scored object found in a single frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    class_label: String,
    confidence: f64,
    bounding_box: BoundingBox,
}

impl Detection {
    /// Confidence is clamped into `[0, 1]`.
    pub fn new(class_label: impl Into<String>, confidence: f64, bounding_box: BoundingBox) -> Self {
        Self {
            class_label: class_label.into(),
            confidence: confidence.clamp(0.0, 1.0),
            bounding_box,
        }
    }

    pub fn class_label(&self) -> &str {
        &self.class_label
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    /// Overlay caption, e.g. `"person 82.0%"`.
    ///
    /// The percentage is rounded half away from zero, so 0.8125 reads 81.3%.
    pub fn caption(&self) -> String {
        let percent = (self.confidence * 1000.0).round() / 10.0;
        format!("{} {:.1}%", self.class_label, percent)
    }
}

/// Detections for one sampled frame, in model output order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionBatch {
    detections: Vec<Detection>,
}

impl DetectionBatch {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Detection> {
        self.detections.iter()
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    /// Detections whose confidence is strictly above `threshold`, order preserved.
    pub fn above(&self, threshold: f64) -> impl Iterator<Item = &Detection> {
        self.detections
            .iter()
            .filter(move |d| d.confidence > threshold)
    }
}

impl From<Vec<Detection>> for DetectionBatch {
    fn from(detections: Vec<Detection>) -> Self {
        Self::new(detections)
    }
}

impl<'a> IntoIterator for &'a DetectionBatch {
    type Item = &'a Detection;
    type IntoIter = std::slice::Iter<'a, Detection>;

    fn into_iter(self) -> Self::IntoIter {
        self.detections.iter()
    }
}
