use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

use super::{DetectError, Detection, Detector};
use crate::config::DetectorConfig;
use crate::frame::{BoundingBox, Frame};

const UPLOAD_WIDTH: i32 = 640;
const UPLOAD_HEIGHT: i32 = 480;

#[derive(Debug, Deserialize)]
struct InferenceResponse {
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    class: String,
    confidence: f32,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

/// Hosted inference endpoint taking a base64 JPEG body.
pub struct RemoteDetector {
    client: Client,
    url: String,
    api_key: String,
    confidence: u32,
}

impl RemoteDetector {
    pub fn new(config: &DetectorConfig) -> Result<Self, DetectError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("sortquest/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let url = format!(
            "{}/{}/{}",
            config.endpoint.trim_end_matches('/'),
            config.model,
            config.version
        );

        Ok(Self {
            client,
            url,
            api_key: config.api_key.clone(),
            confidence: config.confidence,
        })
    }

    fn request(&self, body: String) -> Result<String, DetectError> {
        let confidence = self.confidence.to_string();
        let text = self
            .client
            .post(&self.url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("confidence", confidence.as_str()),
                ("format", "json"),
            ])
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()?
            .error_for_status()?
            .text()?;
        Ok(text)
    }
}

impl Detector for RemoteDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectError> {
        if frame.width == 0 || frame.height == 0 {
            return Ok(Vec::new());
        }

        let jpeg = frame
            .encode_jpeg(Some((UPLOAD_WIDTH, UPLOAD_HEIGHT)))
            .ok_or(DetectError::Encode)?;
        let body = STANDARD.encode(jpeg);

        let text = self.request(body)?;
        let detections = parse_predictions(&text, frame.width, frame.height)?;

        tracing::debug!(count = detections.len(), "remote inference returned");
        Ok(detections)
    }
}

/// Parses a response and maps boxes from upload space back to the frame.
fn parse_predictions(
    text: &str,
    frame_width: u32,
    frame_height: u32,
) -> Result<Vec<Detection>, DetectError> {
    let response: InferenceResponse = serde_json::from_str(text)?;

    let sx = frame_width as f32 / UPLOAD_WIDTH as f32;
    let sy = frame_height as f32 / UPLOAD_HEIGHT as f32;

    Ok(response
        .predictions
        .into_iter()
        .map(|p| Detection {
            label: p.class.to_lowercase(),
            confidence: p.confidence,
            bbox: BoundingBox::from_center(p.x, p.y, p.width, p.height).scaled(sx, sy),
        })
        .collect())
}
