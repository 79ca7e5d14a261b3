//! Face analysis backend — emotion, age, and gender heads via ONNX Runtime.
//!
//! The scoring core consumes [`FaceAnalysis`] records through the
//! [`FaceAnalyzer`] trait so it can be driven by fixture distributions in
//! tests. [`OnnxAnalyzer`] is the production implementation: detect the best
//! face with UltraFace, then run the per-attribute heads on the crop.

use crate::detector::{DetectorError, FaceDetector};
use crate::emotion::{Emotion, EmotionScores};
use image::imageops::FilterType;
use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

// --- Named constants (no magic numbers) ---
const EMOTION_INPUT_SIZE: u32 = 48;
const EMOTION_CLASSES: usize = 7;
const ATTRIBUTE_INPUT_SIZE: u32 = 224;
/// Age head output: one softmax bin per year, 0–100.
const AGE_BINS: usize = 101;
/// Gender head output order.
const GENDER_LABELS: [&str; 2] = ["Woman", "Man"];

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("model file not found: {0} — place the emotion model in the model directory")]
    ModelNotFound(String),
    // The message text is part of the rendered outcome; keep it stable.
    #[error("No face detected")]
    NoFaceDetected,
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// One analyzed face, as produced by a backend. Raw model output — derived
/// mood scores live in [`crate::scoring::AnalysisReport`].
#[derive(Debug, Clone)]
pub struct FaceAnalysis {
    pub emotions: EmotionScores,
    pub dominant_emotion: Emotion,
    pub age: Option<u32>,
    pub gender: Option<String>,
}

/// Narrow seam between image input and the scoring core.
pub trait FaceAnalyzer {
    fn analyze(&mut self, image: &RgbImage) -> Result<FaceAnalysis, AnalyzerError>;
}

/// ONNX-backed analyzer: UltraFace detection plus emotion/age/gender heads.
pub struct OnnxAnalyzer {
    detector: FaceDetector,
    emotion: Session,
    age: Option<Session>,
    gender: Option<Session>,
    require_face: bool,
}

impl OnnxAnalyzer {
    /// Load the detection and attribute models.
    ///
    /// The detector and emotion models are required; missing age or gender
    /// models degrade to `None` passthrough fields with a warning.
    pub fn load(
        detector_path: &str,
        emotion_path: &str,
        age_path: &str,
        gender_path: &str,
        confidence_threshold: f32,
        require_face: bool,
    ) -> Result<Self, AnalyzerError> {
        let detector = FaceDetector::load(detector_path, confidence_threshold)?;

        if !Path::new(emotion_path).exists() {
            return Err(AnalyzerError::ModelNotFound(emotion_path.to_string()));
        }
        let emotion = load_session(emotion_path, "emotion")?;

        let age = load_optional_session(age_path, "age")?;
        let gender = load_optional_session(gender_path, "gender")?;

        Ok(Self {
            detector,
            emotion,
            age,
            gender,
            require_face,
        })
    }

    /// Whether the optional age head is loaded.
    pub fn has_age(&self) -> bool {
        self.age.is_some()
    }

    /// Whether the optional gender head is loaded.
    pub fn has_gender(&self) -> bool {
        self.gender.is_some()
    }

    /// Pick the face crop to analyze: best detection, or the full frame when
    /// detection enforcement is off and nothing cleared the threshold.
    fn face_crop(&mut self, image: &RgbImage) -> Result<RgbImage, AnalyzerError> {
        let faces = self.detector.detect(image)?;
        match faces.first() {
            Some(best) => {
                let (x, y, w, h) = best.to_pixels(image.width(), image.height());
                tracing::debug!(x, y, w, h, confidence = best.confidence, "face selected");
                Ok(image::imageops::crop_imm(image, x, y, w, h).to_image())
            }
            None if self.require_face => Err(AnalyzerError::NoFaceDetected),
            None => {
                tracing::debug!("no face cleared the threshold; analyzing full frame");
                Ok(image.clone())
            }
        }
    }

    fn run_emotion(&mut self, crop: &RgbImage) -> Result<EmotionScores, AnalyzerError> {
        let input = preprocess_grayscale(crop, EMOTION_INPUT_SIZE);
        let outputs = self
            .emotion
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;
        let (_, logits) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| AnalyzerError::InferenceFailed(format!("emotion head: {e}")))?;

        if logits.len() != EMOTION_CLASSES {
            return Err(AnalyzerError::InferenceFailed(format!(
                "expected {EMOTION_CLASSES} emotion logits, got {}",
                logits.len()
            )));
        }

        Ok(scores_from_logits(logits))
    }

    fn run_age(&mut self, crop: &RgbImage) -> Result<Option<u32>, AnalyzerError> {
        let Some(session) = self.age.as_mut() else {
            return Ok(None);
        };
        let input = preprocess_rgb(crop, ATTRIBUTE_INPUT_SIZE);
        let outputs = session.run(ort::inputs![TensorRef::from_array_view(input.view())?])?;
        let (_, logits) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| AnalyzerError::InferenceFailed(format!("age head: {e}")))?;

        if logits.len() != AGE_BINS {
            return Err(AnalyzerError::InferenceFailed(format!(
                "expected {AGE_BINS} age bins, got {}",
                logits.len()
            )));
        }

        Ok(Some(expected_age(logits)))
    }

    fn run_gender(&mut self, crop: &RgbImage) -> Result<Option<String>, AnalyzerError> {
        let Some(session) = self.gender.as_mut() else {
            return Ok(None);
        };
        let input = preprocess_rgb(crop, ATTRIBUTE_INPUT_SIZE);
        let outputs = session.run(ort::inputs![TensorRef::from_array_view(input.view())?])?;
        let (_, logits) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| AnalyzerError::InferenceFailed(format!("gender head: {e}")))?;

        if logits.len() != GENDER_LABELS.len() {
            return Err(AnalyzerError::InferenceFailed(format!(
                "expected {} gender logits, got {}",
                GENDER_LABELS.len(),
                logits.len()
            )));
        }

        let dominant = if logits[0] >= logits[1] { 0 } else { 1 };
        Ok(Some(GENDER_LABELS[dominant].to_string()))
    }
}

impl FaceAnalyzer for OnnxAnalyzer {
    fn analyze(&mut self, image: &RgbImage) -> Result<FaceAnalysis, AnalyzerError> {
        let crop = self.face_crop(image)?;

        let emotions = self.run_emotion(&crop)?;
        let dominant_emotion = emotions.dominant();
        let age = self.run_age(&crop)?;
        let gender = self.run_gender(&crop)?;

        tracing::info!(
            dominant = %dominant_emotion,
            ?age,
            ?gender,
            "face analysis complete"
        );

        Ok(FaceAnalysis {
            emotions,
            dominant_emotion,
            age,
            gender,
        })
    }
}

fn load_session(path: &str, head: &str) -> Result<Session, AnalyzerError> {
    let session = Session::builder()?
        .with_intra_threads(2)?
        .commit_from_file(path)?;
    tracing::info!(
        path,
        head,
        outputs = ?session.outputs().iter().map(|o| o.name()).collect::<Vec<_>>(),
        "loaded attribute model"
    );
    Ok(session)
}

fn load_optional_session(path: &str, head: &str) -> Result<Option<Session>, AnalyzerError> {
    if !Path::new(path).exists() {
        tracing::warn!(path, head, "optional model missing; field will not be reported");
        return Ok(None);
    }
    Ok(Some(load_session(path, head)?))
}

/// Resize to size×size grayscale, normalize to [0, 1], NCHW 1×1×size×size.
fn preprocess_grayscale(crop: &RgbImage, size: u32) -> Array4<f32> {
    let resized = image::imageops::resize(crop, size, size, FilterType::Triangle);
    let gray = image::imageops::grayscale(&resized);

    let mut tensor = Array4::<f32>::zeros((1, 1, size as usize, size as usize));
    for (x, y, pixel) in gray.enumerate_pixels() {
        tensor[[0, 0, y as usize, x as usize]] = pixel.0[0] as f32 / 255.0;
    }
    tensor
}

/// Resize to size×size RGB, normalize to [0, 1], NCHW 1×3×size×size.
fn preprocess_rgb(crop: &RgbImage, size: u32) -> Array4<f32> {
    let resized = image::imageops::resize(crop, size, size, FilterType::Triangle);

    let mut tensor = Array4::<f32>::zeros((1, 3, size as usize, size as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel.0[c] as f32 / 255.0;
        }
    }
    tensor
}

/// Numerically stable softmax.
fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exp: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exp.iter().sum();
    exp.iter().map(|&e| e / sum).collect()
}

/// Emotion logits → per-label scores on the 0–100 scale.
fn scores_from_logits(logits: &[f32]) -> EmotionScores {
    let probs = softmax(logits);
    let mut values = [0.0f32; EMOTION_CLASSES];
    for (value, prob) in values.iter_mut().zip(&probs) {
        *value = prob * 100.0;
    }
    EmotionScores::from_values(values)
}

/// Age estimate as the expectation over the 101 softmax bins.
fn expected_age(logits: &[f32]) -> u32 {
    let probs = softmax(logits);
    let expectation: f32 = probs.iter().enumerate().map(|(i, &p)| i as f32 * p).sum();
    expectation.round().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_face_message_is_exact() {
        // Rendered verbatim to the user; the wording is load-bearing
        assert_eq!(AnalyzerError::NoFaceDetected.to_string(), "No face detected");
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0, -4.0, 0.5, 0.0, 2.5]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs.iter().all(|&p| p >= 0.0));
    }

    #[test]
    fn test_softmax_uniform_logits() {
        let probs = softmax(&[3.0; 7]);
        for p in probs {
            assert!((p - 1.0 / 7.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_softmax_large_logits_stable() {
        let probs = softmax(&[1000.0, 999.0]);
        assert!(probs.iter().all(|p| p.is_finite()));
        assert!(probs[0] > probs[1]);
    }

    #[test]
    fn test_scores_from_logits_scale() {
        let scores = scores_from_logits(&[0.0; EMOTION_CLASSES]);
        let total: f32 = Emotion::ALL.iter().map(|&e| scores.get(e)).sum();
        assert!((total - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_scores_from_logits_dominant() {
        // Strong "happy" logit (index 3 in label order)
        let scores = scores_from_logits(&[0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0]);
        assert_eq!(scores.dominant(), Emotion::Happy);
        assert!(scores.happy > 99.0);
    }

    #[test]
    fn test_expected_age_one_hot() {
        let mut logits = [0.0f32; AGE_BINS];
        logits[34] = 50.0; // effectively one-hot after softmax
        assert_eq!(expected_age(&logits), 34);
    }

    #[test]
    fn test_preprocess_grayscale_shape_and_range() {
        let crop = RgbImage::from_pixel(100, 80, image::Rgb([255, 255, 255]));
        let tensor = preprocess_grayscale(&crop, EMOTION_INPUT_SIZE);
        assert_eq!(tensor.shape(), &[1, 1, 48, 48]);
        assert!((tensor[[0, 0, 0, 0]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_preprocess_rgb_channels() {
        let crop = RgbImage::from_pixel(10, 10, image::Rgb([255, 0, 127]));
        let tensor = preprocess_rgb(&crop, 8);
        assert_eq!(tensor.shape(), &[1, 3, 8, 8]);
        assert!((tensor[[0, 0, 0, 0]] - 1.0).abs() < 1e-6);
        assert!(tensor[[0, 1, 0, 0]].abs() < 1e-6);
        assert!((tensor[[0, 2, 0, 0]] - 127.0 / 255.0).abs() < 1e-6);
    }
}
