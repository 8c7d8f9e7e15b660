use opencv::core::Mat;
use opencv::prelude::*;
use opencv::videoio;
use thiserror::Error;

use super::FrameSource;
use crate::frame::Frame;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("opencv error: {0}")]
    OpenCv(#[from] opencv::Error),
    #[error("camera {0} could not be opened")]
    Unavailable(i32),
}

pub struct OpenCvCamera {
    index: i32,
    capture: videoio::VideoCapture,
    scratch: Mat,
}

impl OpenCvCamera {
    pub fn open(index: i32) -> Result<Self, CameraError> {
        let mut capture = videoio::VideoCapture::new(index, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(CameraError::Unavailable(index));
        }
        let _ = capture.set(videoio::CAP_PROP_BUFFERSIZE, 1.0);

        tracing::info!(camera = index, "camera opened");

        Ok(Self {
            index,
            capture,
            scratch: Mat::default(),
        })
    }
}

impl FrameSource for OpenCvCamera {
    fn read(&mut self) -> Option<Frame> {
        match self.capture.read(&mut self.scratch) {
            Ok(true) if !self.scratch.empty() => match Frame::from_mat(&self.scratch) {
                Ok(frame) => Some(frame),
                Err(e) => {
                    tracing::trace!(camera = self.index, error = %e, "frame conversion failed");
                    None
                }
            },
            Ok(_) => None,
            Err(e) => {
                tracing::trace!(camera = self.index, error = %e, "frame read failed");
                None
            }
        }
    }

    fn index(&self) -> i32 {
        self.index
    }
}

impl Drop for OpenCvCamera {
    fn drop(&mut self) {
        let _ = self.capture.release();
        tracing::info!(camera = self.index, "camera released");
    }
}
