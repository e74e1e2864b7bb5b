use serde::{Deserialize, Serialize};

/// Integer pixel box in TLBR format, in one specific square resolution space.
///
/// Coordinates are ordered on construction so `x1 <= x2` and `y1 <= y2`
/// always hold. Which resolution the box lives in is tracked by the caller;
/// use [`scale_boxes`](crate::geometry::scale_boxes) to move between spaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    /// Create a box from two corners, in any order.
    #[inline]
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// Convert to TLBR array: `[x1, y1, x2, y2]`.
    #[inline]
    pub fn to_tlbr(&self) -> [i32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// Horizontal center with integer division, as used for sector lookup.
    #[inline]
    pub fn center_x(&self) -> i32 {
        (self.x1 + self.x2) / 2
    }

    /// True when the box covers no pixel.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x1 == self.x2 || self.y1 == self.y2
    }
}

impl From<[i32; 4]> for BoundingBox {
    fn from(tlbr: [i32; 4]) -> Self {
        Self::new(tlbr[0], tlbr[1], tlbr[2], tlbr[3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corners_are_ordered() {
        let b = BoundingBox::new(40, 60, 10, 20);
        assert_eq!(b.to_tlbr(), [10, 20, 40, 60]);
        assert_eq!(b.width(), 30);
        assert_eq!(b.height(), 40);
    }

    #[test]
    fn test_center_x_truncates() {
        assert_eq!(BoundingBox::new(0, 0, 5, 5).center_x(), 2);
        assert_eq!(BoundingBox::new(90, 0, 110, 5).center_x(), 100);
    }

    #[test]
    fn test_empty_box() {
        assert!(BoundingBox::new(3, 3, 3, 9).is_empty());
        assert!(!BoundingBox::from([0, 0, 1, 1]).is_empty());
    }
}
