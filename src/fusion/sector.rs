use serde::{Deserialize, Serialize};

/// Coarse horizontal direction of a box within the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sector {
    Left,
    Front,
    Right,
}

impl Sector {
    /// Classify a horizontal center against three equal bands.
    ///
    /// With `third = frame_width / 3` (integer division), `x < third` is
    /// left, `x < 2 * third` is front and anything else is right. Each band
    /// includes its lower boundary.
    pub fn from_center(center_x: i32, frame_width: usize) -> Self {
        let third = (frame_width / 3) as i64;
        let x = center_x as i64;
        if x < third {
            Sector::Left
        } else if x < third * 2 {
            Sector::Front
        } else {
            Sector::Right
        }
    }

    /// Single-letter code used to pick speech assets.
    pub fn code(&self) -> &'static str {
        match self {
            Sector::Left => "L",
            Sector::Front => "F",
            Sector::Right => "R",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_centers() {
        assert_eq!(Sector::from_center(50, 300), Sector::Left);
        assert_eq!(Sector::from_center(150, 300), Sector::Front);
        assert_eq!(Sector::from_center(250, 300), Sector::Right);
    }

    #[test]
    fn test_boundaries_belong_to_upper_band() {
        assert_eq!(Sector::from_center(99, 300), Sector::Left);
        assert_eq!(Sector::from_center(100, 300), Sector::Front);
        assert_eq!(Sector::from_center(199, 300), Sector::Front);
        assert_eq!(Sector::from_center(200, 300), Sector::Right);
    }

    #[test]
    fn test_out_of_frame_centers() {
        assert_eq!(Sector::from_center(-20, 300), Sector::Left);
        assert_eq!(Sector::from_center(900, 300), Sector::Right);
    }

    #[test]
    fn test_codes() {
        assert_eq!(Sector::Left.code(), "L");
        assert_eq!(Sector::Front.code(), "F");
        assert_eq!(Sector::Right.code(), "R");
    }
}
