use ndarray::{Array4, ArrayViewD};
use opencv::core::{Mat, Size, BORDER_CONSTANT};
use opencv::imgproc;
use opencv::prelude::*;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::TensorRef;

use super::{DetectError, Detection, Detector};
use crate::frame::{BoundingBox, Frame};

const INPUT_SIZE: u32 = 640;

fn inference_error(e: impl std::fmt::Display) -> DetectError {
    DetectError::Inference(e.to_string())
}

/// Letterbox geometry used to map model boxes back onto the frame.
#[derive(Debug, Clone, Copy)]
struct Letterbox {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
    orig_w: f32,
    orig_h: f32,
}

/// Local YOLO26 export run through onnxruntime.
pub struct OnnxDetector {
    session: Session,
    confidence_threshold: f32,
    labels: Vec<String>,
}

impl OnnxDetector {
    pub fn new(
        model_path: &str,
        confidence_threshold: f32,
        labels: Vec<String>,
    ) -> Result<Self, DetectError> {
        let builder = Session::builder()
            .map_err(inference_error)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(inference_error)?
            .with_intra_threads(4)
            .map_err(inference_error)?;

        let session = if model_path.starts_with("http://") || model_path.starts_with("https://") {
            builder.commit_from_url(model_path)
        } else {
            builder.commit_from_file(model_path)
        }
        .map_err(inference_error)?;

        tracing::info!(model = %model_path, classes = labels.len(), "onnx model loaded");

        Ok(Self {
            session,
            confidence_threshold,
            labels: labels.into_iter().map(|l| l.to_lowercase()).collect(),
        })
    }

    fn preprocess(&self, frame: &Frame) -> Result<(Array4<f32>, Letterbox), DetectError> {
        let mat = frame.to_mat().map_err(inference_error)?;

        let rows = frame.height as f32;
        let cols = frame.width as f32;
        let input_size = INPUT_SIZE as f32;

        let scale = (input_size / cols).min(input_size / rows);
        let new_w = (cols * scale).round() as i32;
        let new_h = (rows * scale).round() as i32;

        let mut resized = Mat::default();
        imgproc::resize(
            &mat,
            &mut resized,
            Size::new(new_w, new_h),
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )
        .map_err(inference_error)?;

        let pad_x = (INPUT_SIZE as i32 - new_w) / 2;
        let pad_y = (INPUT_SIZE as i32 - new_h) / 2;

        let mut padded = Mat::default();
        opencv::core::copy_make_border(
            &resized,
            &mut padded,
            pad_y,
            INPUT_SIZE as i32 - new_h - pad_y,
            pad_x,
            INPUT_SIZE as i32 - new_w - pad_x,
            BORDER_CONSTANT,
            opencv::core::Scalar::new(114.0, 114.0, 114.0, 0.0),
        )
        .map_err(inference_error)?;

        let mut rgb = Mat::default();
        imgproc::cvt_color(&padded, &mut rgb, imgproc::COLOR_BGR2RGB, 0)
            .map_err(inference_error)?;

        let data = rgb.data_bytes().map_err(inference_error)?;
        let side = INPUT_SIZE as usize;
        if data.len() < side * side * 3 {
            return Err(DetectError::Inference("frame data too small".to_string()));
        }

        let mut tensor = Array4::<f32>::zeros((1, 3, side, side));
        for y in 0..side {
            for x in 0..side {
                let idx = (y * side + x) * 3;
                tensor[[0, 0, y, x]] = data[idx] as f32 / 255.0;
                tensor[[0, 1, y, x]] = data[idx + 1] as f32 / 255.0;
                tensor[[0, 2, y, x]] = data[idx + 2] as f32 / 255.0;
            }
        }

        let letterbox = Letterbox {
            scale,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
            orig_w: cols,
            orig_h: rows,
        };

        Ok((tensor, letterbox))
    }
}

impl Detector for OnnxDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectError> {
        if frame.width == 0 || frame.height == 0 {
            return Ok(Vec::new());
        }

        let (input_tensor, letterbox) = self.preprocess(frame)?;

        let tensor_ref = TensorRef::from_array_view(input_tensor.view())
            .map_err(inference_error)?
            .into_dyn();
        let outputs = self
            .session
            .run(ort::inputs![tensor_ref])
            .map_err(inference_error)?;

        let (Some(logits_val), Some(boxes_val)) =
            (outputs.get("logits"), outputs.get("pred_boxes"))
        else {
            return Err(DetectError::Inference(
                "expected 'logits' and 'pred_boxes' outputs".to_string(),
            ));
        };

        let logits = logits_val
            .try_extract_array::<f32>()
            .map_err(inference_error)?
            .to_owned();
        let boxes = boxes_val
            .try_extract_array::<f32>()
            .map_err(inference_error)?
            .to_owned();
        drop(outputs);

        postprocess(
            &logits.view(),
            &boxes.view(),
            self.confidence_threshold,
            &self.labels,
            letterbox,
        )
    }
}

fn postprocess(
    logits: &ArrayViewD<f32>,
    boxes: &ArrayViewD<f32>,
    confidence_threshold: f32,
    labels: &[String],
    letterbox: Letterbox,
) -> Result<Vec<Detection>, DetectError> {
    let logits_shape = logits.shape();
    let boxes_shape = boxes.shape();

    // logits [1, N, C], boxes [1, N, 4]
    if logits_shape.len() < 2 || boxes_shape.len() < 2 {
        return Ok(Vec::new());
    }

    let (num_detections, num_classes) = if logits_shape.len() == 3 {
        (logits_shape[1], logits_shape[2])
    } else {
        (logits_shape[0], logits_shape[1])
    };

    let logits_flat = logits
        .as_slice()
        .ok_or_else(|| DetectError::Inference("non-contiguous logits".to_string()))?;
    let boxes_flat = boxes
        .as_slice()
        .ok_or_else(|| DetectError::Inference("non-contiguous boxes".to_string()))?;

    if boxes_flat.len() < num_detections * 4 {
        return Err(DetectError::Inference("box tensor too small".to_string()));
    }

    let input_size = INPUT_SIZE as f32;
    let mut detections = Vec::new();

    for i in 0..num_detections {
        let mut max_score = 0.0f32;
        let mut max_class = 0usize;

        for j in 0..num_classes {
            let logit = logits_flat[i * num_classes + j];
            let score = 1.0 / (1.0 + (-logit).exp());
            if score > max_score {
                max_score = score;
                max_class = j;
            }
        }

        if max_score < confidence_threshold {
            continue;
        }

        let Some(label) = labels.get(max_class) else {
            continue;
        };

        // cx, cy, w, h normalised to the letterboxed input
        let cx = boxes_flat[i * 4] * input_size;
        let cy = boxes_flat[i * 4 + 1] * input_size;
        let w = boxes_flat[i * 4 + 2] * input_size;
        let h = boxes_flat[i * 4 + 3] * input_size;

        let x = (((cx - w / 2.0) - letterbox.pad_x) / letterbox.scale).clamp(0.0, letterbox.orig_w);
        let y = (((cy - h / 2.0) - letterbox.pad_y) / letterbox.scale).clamp(0.0, letterbox.orig_h);
        let width = (w / letterbox.scale).min(letterbox.orig_w - x);
        let height = (h / letterbox.scale).min(letterbox.orig_h - y);

        detections.push(Detection {
            label: label.clone(),
            confidence: max_score,
            bbox: BoundingBox::new(x, y, width, height),
        });
    }

    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    Ok(detections)
}
