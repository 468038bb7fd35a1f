/// COCO object detector running a YOLO (v8/v11 layout) ONNX model via `ort`.
///
/// Handles letterbox preprocessing, inference, per-class score decoding and
/// class-aware NMS. Boxes come back in source-pixel `{x, y, width, height}`.
use std::path::Path;

use crate::detection::domain::errors::DetectionError;
use crate::detection::domain::object_detector::ObjectDetector;
use crate::shared::detection::{BoundingBox, Detection, DetectionBatch};
use crate::shared::frame::Frame;

use super::coco_labels::label_for;
use super::execution_provider::session_from_file;

/// Fallback model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Candidates below this score are dropped before NMS. The overlay applies
/// its own, stricter threshold.
pub const DEFAULT_MODEL_CONFIDENCE: f64 = 0.25;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// Box columns preceding the class scores: cx, cy, w, h.
const BOX_VALUES: usize = 4;

/// Caps the batch so a noisy frame cannot flood the overlay.
const MAX_DETECTIONS: usize = 100;

pub struct OnnxYoloDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (NCHW),
    /// falling back to 640 when the shape is dynamic.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = session_from_file(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                ort::value::ValueType::Tensor { ref shape, .. }
                    if shape.len() >= 4 && shape[2] > 0 =>
                {
                    Some(shape[2] as u32)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);
        log::info!(
            "Loaded detection model {} (input {input_size}x{input_size})",
            model_path.display()
        );

        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }

    fn run(&mut self, frame: &Frame) -> Result<DetectionBatch, Box<dyn std::error::Error>> {
        let (input_tensor, geometry) = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        let data = tensor
            .as_slice()
            .ok_or("YOLO output tensor is not contiguous")?;

        let layout = OutputLayout::from_shape(&shape)?;
        let candidates = decode(data, &layout, self.confidence, &geometry);
        let kept = nms(candidates, NMS_IOU_THRESH);

        let (fw, fh) = frame.dimensions();
        let detections = kept
            .into_iter()
            .take(MAX_DETECTIONS)
            .map(|c| {
                Detection::new(
                    label_for(c.class_id),
                    c.confidence,
                    BoundingBox::from_corners(c.x1, c.y1, c.x2, c.y2).clamped(fw, fh),
                )
            })
            .collect::<Vec<_>>();
        Ok(DetectionBatch::new(detections))
    }
}

impl ObjectDetector for OnnxYoloDetector {
    fn detect(&mut self, frame: &Frame) -> Result<DetectionBatch, DetectionError> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(DetectionError::Inference("empty frame".to_string()));
        }
        self.run(frame)
            .map_err(|e| DetectionError::Inference(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Maps model-space coordinates back onto the source frame.
#[derive(Clone, Copy, Debug, PartialEq)]
struct LetterboxGeometry {
    scale: f64,
    pad_x: f64,
    pad_y: f64,
}

impl LetterboxGeometry {
    fn to_source(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }
}

/// Letterbox-resize a frame into a `target_size` square NCHW float tensor.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, LetterboxGeometry) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // 114/255 gray padding, YOLO convention
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let channels = frame.channels() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                let sc = c.min(channels - 1);
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, sc]] as f32 / 255.0;
            }
        }
    }

    (
        tensor,
        LetterboxGeometry {
            scale,
            pad_x: pad_x as f64,
            pad_y: pad_y as f64,
        },
    )
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

/// Output is `[1, 4 + classes, anchors]` (exported default) or the
/// transposed `[1, anchors, 4 + classes]`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct OutputLayout {
    anchors: usize,
    features: usize,
    transposed: bool,
}

impl OutputLayout {
    fn from_shape(shape: &[usize]) -> Result<Self, DetectionError> {
        if shape.len() != 3 {
            return Err(DetectionError::Output(format!(
                "expected a 3-D output, got {shape:?}"
            )));
        }
        let (anchors, features, transposed) = if shape[1] < shape[2] {
            (shape[2], shape[1], true)
        } else {
            (shape[1], shape[2], false)
        };
        if features <= BOX_VALUES {
            return Err(DetectionError::Output(format!(
                "output has no class scores: {shape:?}"
            )));
        }
        Ok(Self {
            anchors,
            features,
            transposed,
        })
    }

    fn value(&self, data: &[f32], anchor: usize, feature: usize) -> f32 {
        if self.transposed {
            data[feature * self.anchors + anchor]
        } else {
            data[anchor * self.features + feature]
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Candidate {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    confidence: f64,
    class_id: usize,
}

fn decode(
    data: &[f32],
    layout: &OutputLayout,
    min_confidence: f64,
    geometry: &LetterboxGeometry,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for anchor in 0..layout.anchors {
        let (class_id, score) = (BOX_VALUES..layout.features)
            .map(|f| (f - BOX_VALUES, layout.value(data, anchor, f) as f64))
            .fold((0, f64::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });
        if score < min_confidence {
            continue;
        }

        let cx = layout.value(data, anchor, 0) as f64;
        let cy = layout.value(data, anchor, 1) as f64;
        let w = layout.value(data, anchor, 2) as f64;
        let h = layout.value(data, anchor, 3) as f64;
        let (x1, y1) = geometry.to_source(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = geometry.to_source(cx + w / 2.0, cy + h / 2.0);

        candidates.push(Candidate {
            x1,
            y1,
            x2,
            y2,
            confidence: score,
            class_id,
        });
    }
    candidates
}

/// Greedy per-class NMS; survivors come back sorted by confidence descending.
fn nms(mut candidates: Vec<Candidate>, iou_thresh: f64) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<Candidate> = Vec::new();
    for c in candidates {
        let suppressed = keep
            .iter()
            .any(|k| k.class_id == c.class_id && iou(k, &c) > iou_thresh);
        if !suppressed {
            keep.push(c);
        }
    }
    keep
}

fn iou(a: &Candidate, b: &Candidate) -> f64 {
    let x1 = a.x1.max(b.x1);
    let y1 = a.y1.max(b.y1);
    let x2 = a.x2.min(b.x2);
    let y2 = a.y2.min(b.y2);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a.x2 - a.x1) * (a.y2 - a.y1);
    let area_b = (b.x2 - b.x1) * (b.y2 - b.y1);
    inter / (area_a + area_b - inter)
}
