use opencv::core::{Ptr, Rect};
use opencv::prelude::*;
use opencv::tracking::{TrackerKCF, TrackerKCF_Params};

use super::{TrackError, Tracker, TrackerFactory};
use crate::frame::{BoundingBox, Frame};

pub struct KcfTracker {
    inner: Ptr<TrackerKCF>,
}

impl Tracker for KcfTracker {
    fn init(&mut self, frame: &Frame, bbox: BoundingBox) -> bool {
        let rect = bbox.to_rect();
        if rect.width <= 0 || rect.height <= 0 {
            return false;
        }

        let mat = match frame.to_mat() {
            Ok(m) => m,
            Err(e) => {
                tracing::trace!(error = %e, "tracker init conversion failed");
                return false;
            }
        };

        match self.inner.init(&mat, rect) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "tracker init failed");
                false
            }
        }
    }

    fn update(&mut self, frame: &Frame) -> Option<BoundingBox> {
        let mat = frame.to_mat().ok()?;
        let mut rect = Rect::default();
        match self.inner.update(&mat, &mut rect) {
            Ok(true) => Some(BoundingBox::from_rect(rect)),
            Ok(false) => None,
            Err(e) => {
                tracing::trace!(error = %e, "tracker update failed");
                None
            }
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct KcfTrackerFactory;

impl TrackerFactory for KcfTrackerFactory {
    fn create(&self) -> Result<Box<dyn Tracker>, TrackError> {
        let params = TrackerKCF_Params::default()?;
        let inner = TrackerKCF::create(params)?;
        Ok(Box::new(KcfTracker { inner }))
    }
}
