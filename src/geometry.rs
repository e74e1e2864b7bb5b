mod bbox;
mod scaling;

pub use bbox::BoundingBox;
pub use scaling::scale_boxes;
