use std::path::PathBuf;

/// CLI configuration, loaded from environment variables.
pub struct Config {
    /// Directory containing ONNX model files.
    pub model_dir: PathBuf,
    /// Face detection confidence threshold.
    pub confidence_threshold: f32,
    /// Whether an image with no detected face is an error. When off, the
    /// full frame is analyzed instead.
    pub require_face: bool,
}

impl Config {
    /// Load configuration from `MOODSENSE_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let model_dir = std::env::var("MOODSENSE_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| moodsense_core::default_model_dir());

        Self {
            model_dir,
            confidence_threshold: env_f32("MOODSENSE_CONFIDENCE_THRESHOLD", 0.7),
            require_face: std::env::var("MOODSENSE_REQUIRE_FACE")
                .map(|v| v != "0")
                .unwrap_or(true),
        }
    }

    /// Path to the UltraFace detection model.
    pub fn detector_model_path(&self) -> String {
        self.model_path("ultraface-rfb-320.onnx")
    }

    /// Path to the 7-class emotion model.
    pub fn emotion_model_path(&self) -> String {
        self.model_path("emotion.onnx")
    }

    /// Path to the optional 101-bin age model.
    pub fn age_model_path(&self) -> String {
        self.model_path("age.onnx")
    }

    /// Path to the optional 2-class gender model.
    pub fn gender_model_path(&self) -> String {
        self.model_path("gender.onnx")
    }

    fn model_path(&self, file: &str) -> String {
        self.model_dir.join(file).to_string_lossy().into_owned()
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
