//! Debug rendering of distance grids.
//!
//! Two bands with distinct ramps: `(0, 10]` meters on a jet ramp and
//! `(10, 150]` meters on a hot ramp. Everything else (including infinity)
//! is black.

use image::{Rgb, RgbImage};
use ndarray::ArrayView2;

use super::SafeDistanceMap;

const NEAR_LIMIT_M: f32 = 10.0;
const MID_LIMIT_M: f32 = 150.0;

fn quantize(t: f32) -> f32 {
    ((t * 255.0).clamp(0.0, 255.0) as u8) as f32 / 255.0
}

fn channel(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Blue -> cyan -> yellow -> red.
pub fn jet(t: f32) -> Rgb<u8> {
    let t = quantize(t);
    let ramp = |offset: f32| 1.5 - (4.0 * t - offset).abs();
    Rgb([channel(ramp(3.0)), channel(ramp(2.0)), channel(ramp(1.0))])
}

/// Black -> red -> yellow -> white.
pub fn hot(t: f32) -> Rgb<u8> {
    let t = quantize(t);
    Rgb([
        channel(3.0 * t),
        channel(3.0 * t - 1.0),
        channel(3.0 * t - 2.0),
    ])
}

/// Color for one distance in meters.
pub fn distance_color(d: f32) -> Rgb<u8> {
    if d > 0.0 && d <= NEAR_LIMIT_M {
        jet(d / NEAR_LIMIT_M)
    } else if d > NEAR_LIMIT_M && d <= MID_LIMIT_M {
        hot((d - NEAR_LIMIT_M) / (MID_LIMIT_M - NEAR_LIMIT_M))
    } else {
        Rgb([0, 0, 0])
    }
}

/// Render any `(height, width)` distance grid.
pub fn render_distances(distances: ArrayView2<'_, f32>) -> RgbImage {
    let (height, width) = distances.dim();
    RgbImage::from_fn(width as u32, height as u32, |x, y| {
        distance_color(distances[[y as usize, x as usize]])
    })
}

pub fn render_safe_map(map: &SafeDistanceMap) -> RgbImage {
    render_distances(map.view())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::SafeMapConfig;
    use ndarray::array;

    #[test]
    fn test_out_of_band_is_black() {
        assert_eq!(distance_color(0.0), Rgb([0, 0, 0]));
        assert_eq!(distance_color(-3.0), Rgb([0, 0, 0]));
        assert_eq!(distance_color(151.0), Rgb([0, 0, 0]));
        assert_eq!(distance_color(f32::INFINITY), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_bands_use_different_ramps() {
        // far end of the near band is red on jet
        let near = distance_color(10.0);
        assert!(near[0] > 100 && near[2] == 0);
        // far end of the mid band is white on hot
        assert_eq!(distance_color(150.0), Rgb([255, 255, 255]));
        // start of the mid band is dark on hot
        let mid = distance_color(10.5);
        assert!(mid[0] < 50 && mid[1] == 0 && mid[2] == 0);
    }

    #[test]
    fn test_render_dimensions() {
        let img = render_distances(array![[1.0, 2.0, 3.0], [20.0, f32::INFINITY, 0.0]].view());
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(*img.get_pixel(1, 1), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_render_safe_map() {
        let map = SafeDistanceMap::build(32, &SafeMapConfig::default()).unwrap();
        let img = render_safe_map(&map);
        assert_eq!(img.dimensions(), (32, 32));
        // top center has no corridor surface
        assert_eq!(*img.get_pixel(16, 0), Rgb([0, 0, 0]));
    }
}
