use serde::{Deserialize, Serialize};

/// Axis-aligned face box in integer pixels, origin at the top-left corner.
///
/// Field names match the wire format of the prediction payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl BoundingBox {
    /// Builds a box from corner coordinates.
    ///
    /// Each corner is truncated toward zero before the extent is taken, so
    /// `(10.9, 20.2, 100.7, 150.1)` becomes `x=10, y=20, w=90, h=130`.
    /// A reversed corner pair yields a zero extent, never a negative one.
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        let (x1, y1, x2, y2) = (x1 as i32, y1 as i32, x2 as i32, y2 as i32);
        Self {
            x: x1,
            y: y1,
            w: (x2 - x1).max(0),
            h: (y2 - y1).max(0),
        }
    }

    pub fn area(&self) -> i64 {
        self.w as i64 * self.h as i64
    }
}
