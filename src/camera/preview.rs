use opencv::core::{self, Scalar};
use opencv::imgproc;

use crate::frame::{encode_jpeg, BoundingBox, Frame};

pub fn render_preview(frame: &Frame, tracked: Option<(&str, BoundingBox)>) -> Option<Vec<u8>> {
    let mut mat = frame.to_mat().ok()?;

    if let Some((label, bbox)) = tracked {
        let color = Scalar::new(0.0, 255.0, 0.0, 0.0);
        let rect = bbox.to_rect();
        imgproc::rectangle(&mut mat, rect, color, 2, imgproc::LINE_8, 0).ok()?;
        let origin = core::Point::new(rect.x, (rect.y - 6).max(12));
        imgproc::put_text(
            &mut mat,
            label,
            origin,
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.5,
            color,
            1,
            imgproc::LINE_8,
            false,
        )
        .ok()?;
    }

    encode_jpeg(&mat)
}
