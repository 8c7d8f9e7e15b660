mod onnx;
mod remote;

pub use onnx::OnnxDetector;
pub use remote::RemoteDetector;

use thiserror::Error;

use crate::config::{DetectorBackend, DetectorConfig};
use crate::frame::{BoundingBox, Frame};

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("frame encoding failed")]
    Encode,
    #[error("inference failed: {0}")]
    Inference(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Object detector consulted by the detection loop.
///
/// Errors are non-fatal: callers treat them as an empty detection list.
pub trait Detector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectError>;
}

pub fn from_config(config: &DetectorConfig) -> Result<Box<dyn Detector>, DetectError> {
    match config.backend {
        DetectorBackend::Remote => Ok(Box::new(RemoteDetector::new(config)?)),
        DetectorBackend::Onnx => Ok(Box::new(OnnxDetector::new(
            &config.model_path,
            config.confidence as f32 / 100.0,
            config.labels.clone(),
        )?)),
    }
}
