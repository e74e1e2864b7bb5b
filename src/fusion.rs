//! Depth and detection fusion: hazard and target location.

mod announcement;
mod hazard;
mod locator;
mod sector;

pub use announcement::{Announcement, Subject, distance_band};
pub use hazard::{FusionConfig, HazardLocator, HazardResult, check_hazard};
pub use locator::{BoxDistance, nearest_distance};
pub use sector::Sector;
