//! CPU raster operations behind the pivot transform.
//!
//! Both operations work on straight-alpha [`RgbaImage`]s and never mutate their
//! input. Scaling delegates to [`image::imageops::resize`]; rotation is a
//! hand-written inverse-mapping sampler because the output must grow to fit the
//! rotated bounds instead of cropping.
//!
//! # Rotation convention
//!
//! Angles are in degrees. A positive angle turns the picture counter-clockwise
//! as seen on a y-down screen, so the right edge of an image rotated by `90.0`
//! ends up at the top.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// Slack used when turning a rotated extent into whole pixels, so that
/// `sin`/`cos` noise at multiples of 90° does not add a spurious column.
const SIZE_TOLERANCE: f32 = 1e-3;

/// Angles closer than this (in degrees) to a full turn are treated as no rotation.
const IDENTITY_TOLERANCE: f32 = 1e-6;

/// Resampling filter used when scaling and rotating sprites.
///
/// Everything except [`Resample::Nearest`] is considered smooth and rotates
/// with bilinear sampling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Resample {
    /// Pick the closest source texel. Blocky, but exact for pixel art.
    Nearest,
    /// Linear (triangle) filter.
    #[default]
    Bilinear,
    /// Cubic Catmull-Rom filter.
    CatmullRom,
    /// Gaussian filter, softer than Catmull-Rom.
    Gaussian,
    /// Lanczos with a window of 3. Sharpest and slowest.
    Lanczos3,
}

impl Resample {
    /// Whether this filter interpolates between texels.
    pub fn is_smooth(self) -> bool {
        self != Resample::Nearest
    }
}

impl From<Resample> for FilterType {
    fn from(filter: Resample) -> Self {
        match filter {
            Resample::Nearest => FilterType::Nearest,
            Resample::Bilinear => FilterType::Triangle,
            Resample::CatmullRom => FilterType::CatmullRom,
            Resample::Gaussian => FilterType::Gaussian,
            Resample::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Resize `image` to exactly `width × height` pixels.
///
/// Returns a copy when the size is unchanged.
pub fn smooth_scale(image: &RgbaImage, width: u32, height: u32, filter: Resample) -> RgbaImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    imageops::resize(image, width, height, filter.into())
}

/// Size of the axis-aligned box enclosing a `width × height` raster rotated by
/// `angle` degrees. Never smaller than one pixel on either axis.
pub fn rotated_size(width: u32, height: u32, angle: f32) -> (u32, u32) {
    let (sin, cos) = angle.to_radians().sin_cos();
    let (w, h) = (width as f32, height as f32);

    let bound_w = w * cos.abs() + h * sin.abs();
    let bound_h = w * sin.abs() + h * cos.abs();

    (snap_ceil(bound_w), snap_ceil(bound_h))
}

fn snap_ceil(extent: f32) -> u32 {
    (extent - SIZE_TOLERANCE).ceil().max(1.0) as u32
}

/// Rotate `image` by `angle` degrees about its own centre.
///
/// The output is sized by [`rotated_size`] and shares its centre with the
/// input. Texels that fall outside the source are fully transparent.
pub fn rotate_expand(image: &RgbaImage, angle: f32, filter: Resample) -> RgbaImage {
    let turn = angle.rem_euclid(360.0);
    if turn < IDENTITY_TOLERANCE || 360.0 - turn < IDENTITY_TOLERANCE {
        return image.clone();
    }

    let (width, height) = image.dimensions();
    let (out_w, out_h) = rotated_size(width, height, angle);
    let (sin, cos) = angle.to_radians().sin_cos();

    let src_cx = width as f32 * 0.5;
    let src_cy = height as f32 * 0.5;
    let dst_cx = out_w as f32 * 0.5;
    let dst_cy = out_h as f32 * 0.5;

    let mut out = RgbaImage::new(out_w, out_h);
    for (x, y, texel) in out.enumerate_pixels_mut() {
        let dx = x as f32 + 0.5 - dst_cx;
        let dy = y as f32 + 0.5 - dst_cy;

        // Inverse of the on-screen counter-clockwise rotation, back into source space.
        let sx = dx * cos - dy * sin + src_cx;
        let sy = dx * sin + dy * cos + src_cy;

        // Texel centres sit at half-integer coordinates.
        let (u, v) = (sx - 0.5, sy - 0.5);
        *texel = if filter.is_smooth() {
            sample_bilinear(image, u, v)
        } else {
            sample_nearest(image, u, v)
        };
    }

    out
}

fn texel(image: &RgbaImage, x: i64, y: i64) -> Option<&Rgba<u8>> {
    if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
        return None;
    }
    Some(image.get_pixel(x as u32, y as u32))
}

fn sample_nearest(image: &RgbaImage, u: f32, v: f32) -> Rgba<u8> {
    texel(image, u.round() as i64, v.round() as i64)
        .copied()
        .unwrap_or(Rgba([0, 0, 0, 0]))
}

/// Bilinear sample with alpha-weighted colour, so transparent neighbours fade
/// the edge out instead of darkening it.
fn sample_bilinear(image: &RgbaImage, u: f32, v: f32) -> Rgba<u8> {
    let (x0, y0) = (u.floor(), v.floor());
    let (fx, fy) = (u - x0, v - y0);
    let (x0, y0) = (x0 as i64, y0 as i64);

    let taps = [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x0 + 1, y0, fx * (1.0 - fy)),
        (x0, y0 + 1, (1.0 - fx) * fy),
        (x0 + 1, y0 + 1, fx * fy),
    ];

    let mut rgb = [0.0f32; 3];
    let mut alpha = 0.0f32;
    for (x, y, weight) in taps {
        let Some(Rgba([r, g, b, a])) = texel(image, x, y) else {
            continue;
        };
        let coverage = *a as f32 * weight;
        rgb[0] += *r as f32 * coverage;
        rgb[1] += *g as f32 * coverage;
        rgb[2] += *b as f32 * coverage;
        alpha += coverage;
    }

    if alpha <= f32::EPSILON {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |c: f32| (c / alpha).round().clamp(0.0, 255.0) as u8;
    Rgba([
        channel(rgb[0]),
        channel(rgb[1]),
        channel(rgb[2]),
        alpha.round().clamp(0.0, 255.0) as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    /// Two pixels side by side: red on the left, blue on the right.
    fn red_blue() -> RgbaImage {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, RED);
        img.put_pixel(1, 0, BLUE);
        img
    }

    #[test]
    fn rotated_size_quarter_turns() {
        assert_eq!(rotated_size(40, 10, 0.0), (40, 10));
        assert_eq!(rotated_size(40, 10, 90.0), (10, 40));
        assert_eq!(rotated_size(40, 10, -90.0), (10, 40));
        assert_eq!(rotated_size(40, 10, 180.0), (40, 10));
        assert_eq!(rotated_size(40, 10, 270.0), (10, 40));
    }

    #[test]
    fn rotated_size_diagonal() {
        // 10 * (cos 45 + sin 45) = 14.142...
        assert_eq!(rotated_size(10, 10, 45.0), (15, 15));
    }

    #[test]
    fn rotated_size_never_zero() {
        assert_eq!(rotated_size(0, 0, 30.0), (1, 1));
    }

    #[test]
    fn rotate_quarter_turn_is_counter_clockwise() {
        let out = rotate_expand(&red_blue(), 90.0, Resample::Bilinear);
        assert_eq!(out.dimensions(), (1, 2));
        assert_eq!(*out.get_pixel(0, 0), BLUE);
        assert_eq!(*out.get_pixel(0, 1), RED);
    }

    #[test]
    fn rotate_negative_quarter_turn_is_clockwise() {
        let out = rotate_expand(&red_blue(), -90.0, Resample::Nearest);
        assert_eq!(out.dimensions(), (1, 2));
        assert_eq!(*out.get_pixel(0, 0), RED);
        assert_eq!(*out.get_pixel(0, 1), BLUE);
    }

    #[test]
    fn rotate_half_turn_mirrors_both_axes() {
        let out = rotate_expand(&red_blue(), 180.0, Resample::Bilinear);
        assert_eq!(out.dimensions(), (2, 1));
        assert_eq!(*out.get_pixel(0, 0), BLUE);
        assert_eq!(*out.get_pixel(1, 0), RED);
    }

    #[test]
    fn rotate_full_turn_is_identity() {
        let img = red_blue();
        assert_eq!(rotate_expand(&img, 0.0, Resample::Bilinear), img);
        assert_eq!(rotate_expand(&img, 360.0, Resample::Bilinear), img);
        assert_eq!(rotate_expand(&img, -720.0, Resample::Bilinear), img);
    }

    #[test]
    fn rotate_diagonal_leaves_transparent_corners() {
        let img = RgbaImage::from_pixel(8, 8, RED);
        let out = rotate_expand(&img, 45.0, Resample::Bilinear);
        assert_eq!(out.dimensions(), (12, 12));
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(11, 11)[3], 0);
        assert_eq!(*out.get_pixel(6, 6), RED);
    }

    #[test]
    fn bilinear_edges_keep_their_colour() {
        let img = RgbaImage::from_pixel(8, 8, BLUE);
        let out = rotate_expand(&img, 30.0, Resample::Bilinear);
        for px in out.pixels().filter(|px| px[3] > 0) {
            assert_eq!([px[0], px[1], px[2]], [0, 0, 255]);
        }
    }

    #[test]
    fn smooth_scale_dimensions() {
        let img = RgbaImage::from_pixel(10, 20, RED);
        let out = smooth_scale(&img, 30, 5, Resample::Bilinear);
        assert_eq!(out.dimensions(), (30, 5));
        let px = out.get_pixel(15, 2);
        assert!(px[0] >= 254 && px[1] <= 1 && px[3] >= 254);
    }

    #[test]
    fn nearest_scale_duplicates_texels() {
        let out = smooth_scale(&red_blue(), 4, 1, Resample::Nearest);
        assert_eq!(*out.get_pixel(0, 0), RED);
        assert_eq!(*out.get_pixel(1, 0), RED);
        assert_eq!(*out.get_pixel(2, 0), BLUE);
        assert_eq!(*out.get_pixel(3, 0), BLUE);
    }

    #[test]
    fn smooth_filters_interpolate() {
        let out = smooth_scale(&red_blue(), 4, 1, Resample::Bilinear);
        let middle = out.get_pixel(1, 0);
        assert!(middle[0] > 0 && middle[2] > 0);
    }

    #[test]
    fn filter_mapping() {
        assert_eq!(FilterType::from(Resample::Bilinear), FilterType::Triangle);
        assert_eq!(FilterType::from(Resample::Nearest), FilterType::Nearest);
        assert!(!Resample::Nearest.is_smooth());
        assert!(Resample::default().is_smooth());
    }
}
