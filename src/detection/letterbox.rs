/// Geometry of an aspect-preserving resize into a square model input.
///
/// The image is scaled by `scale` and centered on the square canvas with
/// `pad_x` / `pad_y` pixels of border.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub original_width: f32,
    pub original_height: f32,
}

impl Letterbox {
    /// Letterbox a `width x height` image into an `input_size` square.
    ///
    /// Returns `None` for empty images or a zero input size.
    pub fn fit(width: u32, height: u32, input_size: u32) -> Option<Self> {
        if width == 0 || height == 0 || input_size == 0 {
            return None;
        }
        let (ow, oh) = (width as f32, height as f32);
        let size = input_size as f32;
        let scale = (size / ow).min(size / oh);
        let new_width = (ow * scale) as u32;
        let new_height = (oh * scale) as u32;
        Some(Self {
            scale,
            pad_x: input_size.saturating_sub(new_width) as f32 / 2.0,
            pad_y: input_size.saturating_sub(new_height) as f32 / 2.0,
            original_width: ow,
            original_height: oh,
        })
    }

    /// No-op letterbox for images already at the input size.
    pub fn identity(input_size: u32) -> Self {
        let size = input_size as f32;
        Self {
            scale: 1.0,
            pad_x: 0.0,
            pad_y: 0.0,
            original_width: size,
            original_height: size,
        }
    }

    /// Map a letterboxed point back into the original image, clamped to it.
    #[inline]
    pub fn to_original(&self, x: f32, y: f32) -> (f32, f32) {
        (
            ((x - self.pad_x) / self.scale).clamp(0.0, self.original_width),
            ((y - self.pad_y) / self.scale).clamp(0.0, self.original_height),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landscape_pads_vertically() {
        let lb = Letterbox::fit(1280, 720, 640).unwrap();
        assert_eq!(lb.scale, 0.5);
        assert_eq!(lb.pad_x, 0.0);
        assert_eq!(lb.pad_y, 140.0);

        assert_eq!(lb.to_original(320.0, 320.0), (640.0, 360.0));
        // points in the padding clamp to the image
        assert_eq!(lb.to_original(10.0, 100.0), (20.0, 0.0));
    }

    #[test]
    fn test_square_is_identity() {
        assert_eq!(Letterbox::fit(640, 640, 640).unwrap(), Letterbox::identity(640));
    }

    #[test]
    fn test_empty_image() {
        assert!(Letterbox::fit(0, 480, 640).is_none());
    }
}
