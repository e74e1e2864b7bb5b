//! What the speech collaborator should say about a frame.

use serde::{Deserialize, Serialize};

use super::{BoxDistance, HazardResult, Sector};

/// Nearest and farthest spoken distance, in whole meters.
const MIN_BAND_M: f32 = 1.0;
const MAX_BAND_M: f32 = 5.0;

/// Clamp a distance into the spoken `[1, 5]` meter range, truncating.
pub fn distance_band(distance_m: f32) -> u8 {
    if distance_m.is_nan() {
        return MIN_BAND_M as u8;
    }
    distance_m.clamp(MIN_BAND_M, MAX_BAND_M) as u8
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Subject {
    Obstacle,
    /// Matched text, e.g. a shop sign.
    Target(String),
}

/// A direction + distance + subject triple for speech synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub sector: Sector,
    pub distance_band: u8,
    pub subject: Subject,
}

impl Announcement {
    /// Announcement for a hazard; none for non-positive distances, which
    /// only come from unusable depth.
    pub fn for_hazard(hazard: &HazardResult) -> Option<Self> {
        (hazard.distance_m > 0.0).then(|| Self {
            sector: hazard.sector,
            distance_band: distance_band(hazard.distance_m),
            subject: Subject::Obstacle,
        })
    }

    pub fn for_target(fix: &BoxDistance, text: impl Into<String>) -> Self {
        Self {
            sector: fix.sector,
            distance_band: distance_band(fix.distance_m),
            subject: Subject::Target(text.into()),
        }
    }

    /// Sector code used to select the direction phrase.
    pub fn sector_code(&self) -> &'static str {
        self.sector.code()
    }
}
