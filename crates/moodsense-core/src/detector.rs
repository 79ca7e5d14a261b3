//! UltraFace face detector via ONNX Runtime.
//!
//! Wraps the version-RFB-320 UltraFace model: a fixed 320×240 RGB input,
//! two outputs (per-candidate [background, face] scores and normalized
//! corner-coordinate boxes), confidence thresholding and NMS.

use image::imageops::FilterType;
use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

// --- Named constants (no magic numbers) ---
const ULTRAFACE_INPUT_WIDTH: u32 = 320;
const ULTRAFACE_INPUT_HEIGHT: u32 = 240;
const ULTRAFACE_MEAN: f32 = 127.0;
const ULTRAFACE_STD: f32 = 128.0;
const ULTRAFACE_NMS_THRESHOLD: f32 = 0.5;
/// Per-candidate score vector is [background, face].
const ULTRAFACE_FACE_CLASS: usize = 1;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("model file not found: {0} — download ultraface version-RFB-320 and place in the model directory")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// A detected face, corner coordinates normalized to [0, 1] of the frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub confidence: f32,
}

impl FaceBox {
    /// Map to integer pixel bounds in a width×height frame, clamped so the
    /// crop is always non-empty and inside the frame.
    pub fn to_pixels(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let x1 = (self.x1.clamp(0.0, 1.0) * width as f32) as u32;
        let y1 = (self.y1.clamp(0.0, 1.0) * height as f32) as u32;
        let x2 = ((self.x2.clamp(0.0, 1.0) * width as f32) as u32).min(width);
        let y2 = ((self.y2.clamp(0.0, 1.0) * height as f32) as u32).min(height);
        let w = (x2.saturating_sub(x1)).max(1);
        let h = (y2.saturating_sub(y1)).max(1);
        (x1.min(width - 1), y1.min(height - 1), w, h)
    }
}

/// UltraFace-based face detector.
pub struct FaceDetector {
    session: Session,
    confidence_threshold: f32,
}

impl FaceDetector {
    /// Load the UltraFace ONNX model from the given path.
    pub fn load(model_path: &str, confidence_threshold: f32) -> Result<Self, DetectorError> {
        if !Path::new(model_path).exists() {
            return Err(DetectorError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        tracing::info!(
            path = model_path,
            inputs = ?session.inputs().iter().map(|i| (i.name(), i.dtype())).collect::<Vec<_>>(),
            outputs = ?session.outputs().iter().map(|o| o.name()).collect::<Vec<_>>(),
            "loaded UltraFace model"
        );

        Ok(Self {
            session,
            confidence_threshold,
        })
    }

    /// Detect faces, returning boxes sorted by confidence (highest first).
    pub fn detect(&mut self, image: &RgbImage) -> Result<Vec<FaceBox>, DetectorError> {
        let input = preprocess(image);

        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (_, scores) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectorError::InferenceFailed(format!("scores: {e}")))?;
        let (_, boxes) = outputs[1]
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectorError::InferenceFailed(format!("boxes: {e}")))?;

        let candidates = decode(scores, boxes, self.confidence_threshold);
        let mut result = nms(candidates, ULTRAFACE_NMS_THRESHOLD);
        result.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(result)
    }
}

/// Resize to 320×240 and normalize into a NCHW float tensor.
fn preprocess(image: &RgbImage) -> Array4<f32> {
    let resized = image::imageops::resize(
        image,
        ULTRAFACE_INPUT_WIDTH,
        ULTRAFACE_INPUT_HEIGHT,
        FilterType::Triangle,
    );

    let mut tensor = Array4::<f32>::zeros((
        1,
        3,
        ULTRAFACE_INPUT_HEIGHT as usize,
        ULTRAFACE_INPUT_WIDTH as usize,
    ));

    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] =
                (pixel.0[c] as f32 - ULTRAFACE_MEAN) / ULTRAFACE_STD;
        }
    }

    tensor
}

/// Decode candidates above the confidence threshold.
///
/// `scores` is N×2 ([background, face] per candidate), `boxes` is N×4
/// normalized corners [x1, y1, x2, y2]. UltraFace emits boxes already in
/// frame-relative coordinates, so decoding is a flat threshold-and-collect.
fn decode(scores: &[f32], boxes: &[f32], threshold: f32) -> Vec<FaceBox> {
    let num_candidates = scores.len() / 2;
    let mut detections = Vec::new();

    for idx in 0..num_candidates {
        let confidence = scores[idx * 2 + ULTRAFACE_FACE_CLASS];
        if confidence <= threshold {
            continue;
        }

        let off = idx * 4;
        if off + 3 >= boxes.len() {
            continue;
        }

        detections.push(FaceBox {
            x1: boxes[off].clamp(0.0, 1.0),
            y1: boxes[off + 1].clamp(0.0, 1.0),
            x2: boxes[off + 2].clamp(0.0, 1.0),
            y2: boxes[off + 3].clamp(0.0, 1.0),
            confidence,
        });
    }

    detections
}

/// Non-Maximum Suppression: remove overlapping detections.
fn nms(mut detections: Vec<FaceBox>, iou_threshold: f32) -> Vec<FaceBox> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; detections.len()];

    for i in 0..detections.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(detections[i].clone());

        for j in (i + 1)..detections.len() {
            if !suppressed[j] && iou(&detections[i], &detections[j]) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    keep
}

/// Intersection-over-Union between two normalized boxes.
fn iou(a: &FaceBox, b: &FaceBox) -> f32 {
    let x1 = a.x1.max(b.x1);
    let y1 = a.y1.max(b.y1);
    let x2 = a.x2.min(b.x2);
    let y2 = a.y2.min(b.y2);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let area_a = (a.x2 - a.x1).max(0.0) * (a.y2 - a.y1).max(0.0);
    let area_b = (b.x2 - b.x1).max(0.0) * (b.y2 - b.y1).max(0.0);
    let union = area_a + area_b - inter;

    if union > 0.0 {
        inter / union
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_box(x1: f32, y1: f32, x2: f32, y2: f32, conf: f32) -> FaceBox {
        FaceBox { x1, y1, x2, y2, confidence: conf }
    }

    #[test]
    fn test_decode_thresholds_on_face_score() {
        // Two candidates: one background-dominant, one face-dominant
        let scores = [0.9, 0.1, 0.2, 0.8];
        let boxes = [0.0, 0.0, 0.5, 0.5, 0.25, 0.25, 0.75, 0.75];
        let result = decode(&scores, &boxes, 0.7);
        assert_eq!(result.len(), 1);
        assert!((result[0].confidence - 0.8).abs() < 1e-6);
        assert!((result[0].x1 - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_decode_clamps_out_of_range_boxes() {
        let scores = [0.1, 0.9];
        let boxes = [-0.1, -0.2, 1.3, 0.5];
        let result = decode(&scores, &boxes, 0.5);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].x1, 0.0);
        assert_eq!(result[0].y1, 0.0);
        assert_eq!(result[0].x2, 1.0);
        assert!((result[0].y2 - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_decode_empty() {
        let result = decode(&[], &[], 0.7);
        assert!(result.is_empty());
    }

    #[test]
    fn test_iou_identical() {
        let a = make_box(0.1, 0.1, 0.5, 0.5, 1.0);
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_disjoint() {
        let a = make_box(0.0, 0.0, 0.2, 0.2, 1.0);
        let b = make_box(0.5, 0.5, 0.7, 0.7, 1.0);
        assert!(iou(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_nms_suppresses_overlapping() {
        let detections = vec![
            make_box(0.0, 0.0, 0.5, 0.5, 0.9),
            make_box(0.02, 0.02, 0.52, 0.52, 0.8),
            make_box(0.6, 0.6, 0.9, 0.9, 0.7),
        ];
        let result = nms(detections, 0.5);
        assert_eq!(result.len(), 2);
        assert!((result[0].confidence - 0.9).abs() < 1e-6);
        assert!((result[1].confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_nms_empty() {
        assert!(nms(vec![], 0.5).is_empty());
    }

    #[test]
    fn test_to_pixels_clamps_to_frame() {
        let b = make_box(0.5, 0.5, 1.0, 1.0, 0.9);
        let (x, y, w, h) = b.to_pixels(640, 480);
        assert_eq!((x, y), (320, 240));
        assert_eq!((w, h), (320, 240));
    }

    #[test]
    fn test_to_pixels_degenerate_box_is_non_empty() {
        let b = make_box(0.5, 0.5, 0.5, 0.5, 0.9);
        let (_, _, w, h) = b.to_pixels(640, 480);
        assert!(w >= 1 && h >= 1);
    }

    #[test]
    fn test_preprocess_shape_and_normalization() {
        let image = RgbImage::from_pixel(320, 240, image::Rgb([127, 127, 127]));
        let tensor = preprocess(&image);
        assert_eq!(
            tensor.shape(),
            &[1, 3, ULTRAFACE_INPUT_HEIGHT as usize, ULTRAFACE_INPUT_WIDTH as usize]
        );
        // Pixel value 127 normalizes to 0.0
        assert!(tensor[[0, 0, 0, 0]].abs() < 1e-6);
    }
}
