mod kcf;

pub use kcf::KcfTrackerFactory;

use thiserror::Error;

use crate::frame::{BoundingBox, Frame};

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("opencv error: {0}")]
    OpenCv(#[from] opencv::Error),
}

/// Single-object visual tracker. Failures are reported, never raised.
pub trait Tracker: Send {
    fn init(&mut self, frame: &Frame, bbox: BoundingBox) -> bool;

    /// `None` once the object is lost.
    fn update(&mut self, frame: &Frame) -> Option<BoundingBox>;
}

pub trait TrackerFactory: Send {
    fn create(&self) -> Result<Box<dyn Tracker>, TrackError>;
}
