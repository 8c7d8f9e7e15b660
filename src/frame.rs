use opencv::core::{Mat, Rect, Size, Vector};
use opencv::imgcodecs;
use opencv::imgproc;
use opencv::prelude::*;
use serde::Serialize;

/// Packed BGR8 image produced once per tick.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    pub fn scaled(&self, sx: f32, sy: f32) -> Self {
        Self::new(self.x * sx, self.y * sy, self.width * sx, self.height * sy)
    }

    pub fn to_rect(self) -> Rect {
        Rect::new(
            self.x.round() as i32,
            self.y.round() as i32,
            self.width.round() as i32,
            self.height.round() as i32,
        )
    }

    pub fn from_rect(rect: Rect) -> Self {
        Self::new(
            rect.x as f32,
            rect.y as f32,
            rect.width as f32,
            rect.height as f32,
        )
    }
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    pub fn from_mat(mat: &Mat) -> opencv::Result<Self> {
        let mat = if mat.is_continuous() {
            mat.try_clone()?
        } else {
            let mut copy = Mat::default();
            mat.copy_to(&mut copy)?;
            copy
        };

        Ok(Self {
            width: mat.cols() as u32,
            height: mat.rows() as u32,
            data: mat.data_bytes()?.to_vec(),
        })
    }

    pub fn to_mat(&self) -> opencv::Result<Mat> {
        let flat = Mat::from_slice(&self.data)?;
        let shaped = flat.reshape(3, self.height as i32)?;
        shaped.try_clone()
    }

    pub fn encode_jpeg(&self, target: Option<(i32, i32)>) -> Option<Vec<u8>> {
        let mat = self.to_mat().ok()?;
        let mat = match target {
            Some((w, h)) => {
                let mut resized = Mat::default();
                imgproc::resize(
                    &mat,
                    &mut resized,
                    Size::new(w, h),
                    0.0,
                    0.0,
                    imgproc::INTER_LINEAR,
                )
                .ok()?;
                resized
            }
            None => mat,
        };
        encode_jpeg(&mat)
    }
}

pub fn encode_jpeg(mat: &Mat) -> Option<Vec<u8>> {
    let mut buf = Vector::<u8>::new();
    let params = Vector::<i32>::new();
    imgcodecs::imencode(".jpg", mat, &mut buf, &params).ok()?;
    Some(buf.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_from_center() {
        let b = BoundingBox::from_center(100.0, 50.0, 40.0, 20.0);
        assert_eq!(b, BoundingBox::new(80.0, 40.0, 40.0, 20.0));
    }

    #[test]
    fn test_box_scaled() {
        let b = BoundingBox::new(10.0, 20.0, 30.0, 40.0).scaled(2.0, 0.5);
        assert_eq!(b, BoundingBox::new(20.0, 10.0, 60.0, 20.0));
    }

    #[test]
    fn test_rect_round_trip() {
        let b = BoundingBox::new(1.4, 2.6, 10.0, 11.5);
        let r = b.to_rect();
        assert_eq!((r.x, r.y, r.width, r.height), (1, 3, 10, 12));
        assert_eq!(BoundingBox::from_rect(r), BoundingBox::new(1.0, 3.0, 10.0, 12.0));
    }
}
