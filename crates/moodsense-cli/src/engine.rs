//! Inference worker thread.
//!
//! The ONNX sessions live on a dedicated OS thread; requests arrive over a
//! depth-1 channel, so at most one analysis is in flight at a time, and each
//! request is answered on its own oneshot channel.

use crate::config::Config;
use image::RgbImage;
use moodsense_core::{AnalyzerError, FaceAnalysis, FaceAnalyzer, OnnxAnalyzer};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{0}")]
    Analyzer(#[from] AnalyzerError),
    #[error("engine thread exited")]
    ChannelClosed,
}

/// Messages sent from the CLI to the engine thread.
enum EngineRequest {
    Analyze {
        image: RgbImage,
        reply: oneshot::Sender<Result<FaceAnalysis, EngineError>>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Request analysis of one image and await the result.
    pub async fn analyze(&self, image: RgbImage) -> Result<FaceAnalysis, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Analyze {
                image,
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)?
    }
}

/// Spawn the engine on a dedicated OS thread.
///
/// Loads the ONNX models synchronously (fail-fast), then enters the request
/// loop. `require_face` overrides the configured enforcement when set.
pub fn spawn_engine(config: &Config, require_face: bool) -> Result<EngineHandle, EngineError> {
    let mut analyzer = OnnxAnalyzer::load(
        &config.detector_model_path(),
        &config.emotion_model_path(),
        &config.age_model_path(),
        &config.gender_model_path(),
        config.confidence_threshold,
        require_face,
    )?;
    tracing::info!(model_dir = %config.model_dir.display(), "analyzer loaded");

    // Depth 1: one analysis in flight at a time.
    let (tx, mut rx) = mpsc::channel::<EngineRequest>(1);

    std::thread::Builder::new()
        .name("moodsense-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Analyze { image, reply } => {
                        let result = analyzer.analyze(&image).map_err(EngineError::from);
                        let _ = reply.send(result);
                    }
                }
            }
            tracing::info!("engine thread exiting");
        })
        .expect("failed to spawn engine thread");

    Ok(EngineHandle { tx })
}
