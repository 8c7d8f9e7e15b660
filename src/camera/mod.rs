mod capture;
mod preview;

pub use capture::{CameraError, OpenCvCamera};
pub use preview::render_preview;

use crate::frame::Frame;

pub trait FrameSource: Send {
    /// Returns `None` when no frame is available this tick.
    fn read(&mut self) -> Option<Frame>;

    fn index(&self) -> i32;
}
