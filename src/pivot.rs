//! Rotate and scale a sprite about an arbitrary pivot.
//!
//! Rotating an image about its centre is easy; rotating it about some other
//! point (the hinge of a cannon barrel, the shoulder of an arm) means the
//! centre has to move. [`PivotTransform`] works out where the rotated and
//! scaled image has to go so that a chosen point of the image, the *pivot*,
//! stays glued to a point on screen, the *origin*.
//!
//! # Quick Start
//!
//! ```no_run
//! use swivel::{PivotTransform, Vec2, raster::Resample};
//!
//! let barrel = image::open("image/cannon.png").unwrap().to_rgba8();
//!
//! let placement = PivotTransform::new(Vec2::new(133.0, 225.0), Vec2::new(33.5, 120.0))
//!     .angle(-45.0)
//!     .scale(1.0, 0.8)
//!     .filter(Resample::Bilinear)
//!     .apply(&barrel)
//!     .unwrap();
//!
//! // Blit `placement.image` with its top-left corner at `placement.rect.top_left()`.
//! ```
//!
//! # How the placement is found
//!
//! 1. Put the untransformed image so the pivot sits on the origin.
//! 2. Take the vector from that rectangle's centre to the origin.
//! 3. Scale it per axis, in the image's own (unrotated) frame.
//! 4. Rotate it the same way the image is rotated on screen.
//! 5. The transformed image is centred at `origin - offset`.
//!
//! The image itself is resampled to `round(w * scale_x) × round(h * scale_y)`
//! and then rotated into an enlarged bounding box, see [`crate::raster`].
//!
//! # Angle convention
//!
//! Positive angles turn counter-clockwise as seen on a y-down screen. In
//! mathematical (y-up) terms the offset vector is therefore rotated by
//! `-angle`.

use std::fmt;

use glam::Vec2;
use image::RgbaImage;
use thiserror::Error;

use crate::draw2d::Rect;
use crate::raster::{self, Resample};

/// The axis a scale factor applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
        }
    }
}

/// Parameters that cannot produce a meaningful placement.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum PivotError {
    #[error("scale_{axis} must be finite and greater than zero, got {value}")]
    InvalidScale { axis: Axis, value: f32 },

    #[error("rotation angle must be finite, got {0}")]
    NonFiniteAngle(f32),

    #[error("cannot transform an empty {width}x{height} image")]
    EmptyImage { width: u32, height: u32 },

    #[error(
        "transformed image would be {width}x{height}, over the {} pixel limit",
        MAX_DIMENSION
    )]
    TooLarge { width: u32, height: u32 },
}

/// Largest width or height a transformed image may have. Matches wgpu's
/// default `max_texture_dimension_2d`, so every placement can be uploaded.
pub const MAX_DIMENSION: u32 = 8192;

/// A transformed image and where to draw it.
#[derive(Clone, Debug)]
pub struct Placement {
    /// The scaled and rotated copy of the source image.
    pub image: RgbaImage,
    /// Destination rectangle, the same size as `image`.
    pub rect: Rect,
}

/// Rotation and per-axis scaling of an image about a pivot point.
///
/// Built fluently, then applied to any number of images:
///
/// ```
/// use swivel::{PivotTransform, Vec2};
///
/// let transform = PivotTransform::new(Vec2::new(100.0, 100.0), Vec2::ZERO)
///     .scale(2.0, 1.0);
///
/// let rect = transform.placement_rect(30, 20).unwrap();
/// assert_eq!(rect.top_left(), Vec2::new(100.0, 100.0));
/// assert_eq!(rect.size(), Vec2::new(60.0, 20.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PivotTransform {
    origin: Vec2,
    pivot: Vec2,
    angle: f32,
    scale: Vec2,
    filter: Resample,
}

impl PivotTransform {
    /// Pin `pivot` (image-local, measured from the top-left corner of the
    /// unscaled image) to `origin` (screen space).
    pub fn new(origin: Vec2, pivot: Vec2) -> Self {
        Self {
            origin,
            pivot,
            angle: 0.0,
            scale: Vec2::ONE,
            filter: Resample::default(),
        }
    }

    /// Set the rotation in degrees, counter-clockwise on screen.
    pub fn angle(mut self, degrees: f32) -> Self {
        self.angle = degrees;
        self
    }

    /// Set independent horizontal and vertical scale factors.
    pub fn scale(mut self, scale_x: f32, scale_y: f32) -> Self {
        self.scale = Vec2::new(scale_x, scale_y);
        self
    }

    /// Scale both axes by the same factor.
    pub fn uniform_scale(self, scale: f32) -> Self {
        self.scale(scale, scale)
    }

    /// Set the resampling filter used for both scaling and rotation.
    pub fn filter(mut self, filter: Resample) -> Self {
        self.filter = filter;
        self
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn pivot(&self) -> Vec2 {
        self.pivot
    }

    pub fn degrees(&self) -> f32 {
        self.angle
    }

    pub fn scale_factors(&self) -> Vec2 {
        self.scale
    }

    /// Reject scale factors and angles that would yield NaN or empty geometry.
    pub fn validate(&self) -> Result<(), PivotError> {
        for (axis, value) in [(Axis::X, self.scale.x), (Axis::Y, self.scale.y)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(PivotError::InvalidScale { axis, value });
            }
        }
        if !self.angle.is_finite() {
            return Err(PivotError::NonFiniteAngle(self.angle));
        }
        Ok(())
    }

    /// Where a `width × height` image sits before any rotation or scaling:
    /// positioned so the pivot lands on the origin.
    pub fn unrotated_rect(&self, width: u32, height: u32) -> Rect {
        Rect::from_top_left(
            self.origin - self.pivot,
            Vec2::new(width as f32, height as f32),
        )
    }

    /// Pixel size of the image after scaling, before rotation.
    pub fn scaled_size(&self, width: u32, height: u32) -> (u32, u32) {
        let scaled = |len: u32, factor: f32| ((len as f32 * factor).round() as u32).max(1);
        (scaled(width, self.scale.x), scaled(height, self.scale.y))
    }

    /// Centre-to-pivot offset after scaling and rotation.
    fn rotated_offset(&self, width: u32, height: u32) -> Vec2 {
        let center = self.unrotated_rect(width, height).center();
        let offset = (self.origin - center) * self.scale;
        screen_rotation(self.angle).rotate(offset)
    }

    /// Destination rectangle for a `width × height` image, without touching
    /// any pixels.
    ///
    /// Fails with [`PivotError::TooLarge`] when the scaled or rotated image
    /// would exceed [`MAX_DIMENSION`] on either side.
    pub fn placement_rect(&self, width: u32, height: u32) -> Result<Rect, PivotError> {
        self.validate()?;
        if width == 0 || height == 0 {
            return Err(PivotError::EmptyImage { width, height });
        }

        let scaled_w = width as f32 * self.scale.x;
        let scaled_h = height as f32 * self.scale.y;
        if scaled_w.round() > MAX_DIMENSION as f32 || scaled_h.round() > MAX_DIMENSION as f32 {
            // `as` saturates, so absurd scales report u32::MAX.
            return Err(PivotError::TooLarge {
                width: scaled_w.round() as u32,
                height: scaled_h.round() as u32,
            });
        }

        let center = self.origin - self.rotated_offset(width, height);
        let (scaled_w, scaled_h) = self.scaled_size(width, height);
        let (out_w, out_h) = raster::rotated_size(scaled_w, scaled_h, self.angle);
        if out_w > MAX_DIMENSION || out_h > MAX_DIMENSION {
            return Err(PivotError::TooLarge {
                width: out_w,
                height: out_h,
            });
        }

        Ok(Rect::from_center(
            center,
            Vec2::new(out_w as f32, out_h as f32),
        ))
    }

    /// Scale and rotate `image`, returning the result and where to draw it.
    ///
    /// `image` is left untouched.
    pub fn apply(&self, image: &RgbaImage) -> Result<Placement, PivotError> {
        let (width, height) = image.dimensions();
        let rect = self.placement_rect(width, height)?;

        let (scaled_w, scaled_h) = self.scaled_size(width, height);
        let scaled = raster::smooth_scale(image, scaled_w, scaled_h, self.filter);
        let rotated = raster::rotate_expand(&scaled, self.angle, self.filter);

        Ok(Placement {
            image: rotated,
            rect,
        })
    }

    /// Screen position the pivot ends up at once a `width × height` image is
    /// drawn at its [`placement_rect`](Self::placement_rect).
    ///
    /// Maps the pivot forward through scale and rotation from the placement's
    /// centre; equals [`origin`](Self::origin) up to float error.
    pub fn pivot_in_world(&self, width: u32, height: u32) -> Result<Vec2, PivotError> {
        let rect = self.placement_rect(width, height)?;
        let half = Vec2::new(width as f32, height as f32) * 0.5;
        let local = (self.pivot - half) * self.scale;
        Ok(rect.center() + screen_rotation(self.angle).rotate(local))
    }
}

/// Unit complex number for a counter-clockwise turn on a y-down screen.
fn screen_rotation(degrees: f32) -> Vec2 {
    Vec2::from_angle(-degrees.to_radians())
}

/// One-shot form of [`PivotTransform`] with the default filter.
pub fn compute_placement(
    image: &RgbaImage,
    origin: Vec2,
    pivot: Vec2,
    angle: f32,
    scale_x: f32,
    scale_y: f32,
) -> Result<Placement, PivotError> {
    PivotTransform::new(origin, pivot)
        .angle(angle)
        .scale(scale_x, scale_y)
        .apply(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const EPSILON: f32 = 1e-3;

    fn approx(a: Vec2, b: Vec2, tolerance: f32) -> bool {
        (a - b).abs().max_element() <= tolerance
    }

    fn checkerboard(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        })
    }

    #[test]
    fn identity_keeps_image_and_rect() {
        let img = checkerboard(30, 20);
        let origin = Vec2::new(100.0, 80.0);
        let pivot = Vec2::new(7.0, 4.0);

        let placement = compute_placement(&img, origin, pivot, 0.0, 1.0, 1.0).unwrap();

        assert_eq!(placement.rect, Rect::new(93.0, 76.0, 30.0, 20.0));
        assert_eq!(placement.image, img);
    }

    #[test]
    fn scale_only_keeps_top_left_pivot() {
        let origin = Vec2::new(50.0, 60.0);
        let rect = PivotTransform::new(origin, Vec2::ZERO)
            .scale(2.0, 1.0)
            .placement_rect(30, 20)
            .unwrap();

        assert!(approx(rect.top_left(), origin, EPSILON));
        assert_eq!(rect.size(), Vec2::new(60.0, 20.0));
    }

    #[test]
    fn rotation_about_center_keeps_center() {
        let origin = Vec2::new(200.0, 150.0);
        let transform = PivotTransform::new(origin, Vec2::new(15.0, 10.0)).angle(90.0);

        let rect = transform.placement_rect(30, 20).unwrap();
        assert!(approx(rect.center(), origin, EPSILON));
        assert_eq!(rect.size(), Vec2::new(20.0, 30.0));
    }

    #[test]
    fn quarter_turn_about_corner() {
        // Pivot on the top-left corner of a 40x10 bar; a counter-clockwise
        // quarter turn swings the bar up above the origin.
        let origin = Vec2::new(100.0, 100.0);
        let rect = PivotTransform::new(origin, Vec2::ZERO)
            .angle(90.0)
            .placement_rect(40, 10)
            .unwrap();

        assert!(approx(rect.top_left(), Vec2::new(100.0, 60.0), EPSILON));
        assert_eq!(rect.size(), Vec2::new(10.0, 40.0));
    }

    #[test]
    fn pivot_is_invariant_across_angles_and_scales() {
        let origin = Vec2::new(133.3, 225.0);
        let pivot = Vec2::new(33.5, 120.0);

        for step in 0..24 {
            let angle = step as f32 * 15.0;
            for (sx, sy) in [(1.0, 1.0), (0.7, 1.0), (1.0, 0.7), (2.5, 0.3), (0.25, 4.0)] {
                let transform = PivotTransform::new(origin, pivot).angle(angle).scale(sx, sy);
                let world = transform.pivot_in_world(67, 140).unwrap();
                assert!(
                    approx(world, origin, EPSILON),
                    "angle {angle}, scale ({sx}, {sy}): pivot drifted to {world}"
                );
            }
        }
    }

    /// Centroid (in screen space) of every opaque pixel of a placement.
    fn opaque_centroid(placement: &Placement) -> Vec2 {
        let mut sum = Vec2::ZERO;
        let mut weight = 0.0;
        for (x, y, px) in placement.image.enumerate_pixels() {
            let a = px[3] as f32;
            sum += Vec2::new(x as f32 + 0.5, y as f32 + 0.5) * a;
            weight += a;
        }
        placement.rect.top_left() + sum / weight
    }

    #[test]
    fn rendered_pivot_stays_on_origin() {
        // A transparent sprite with a single opaque 3x3 marker centred on the pivot.
        let mut img = RgbaImage::new(64, 32);
        for y in 9..12 {
            for x in 19..22 {
                img.put_pixel(x, y, Rgba([255, 0, 0, 255]));
            }
        }
        let pivot = Vec2::new(20.5, 10.5);
        let origin = Vec2::new(200.0, 150.0);

        for angle in [0.0, 37.0, 90.0, 145.0, -60.0, 270.0] {
            for (sx, sy) in [(1.0, 1.0), (1.5, 0.8), (0.75, 2.0)] {
                let placement = PivotTransform::new(origin, pivot)
                    .angle(angle)
                    .scale(sx, sy)
                    .apply(&img)
                    .unwrap();

                let marker = opaque_centroid(&placement);
                assert!(
                    approx(marker, origin, 1.0),
                    "angle {angle}, scale ({sx}, {sy}): marker at {marker}"
                );
            }
        }
    }

    #[test]
    fn applied_image_matches_placement_rect() {
        let img = checkerboard(67, 140);
        let transform = PivotTransform::new(Vec2::new(133.0, 225.0), Vec2::new(33.5, 120.0))
            .angle(-45.0)
            .scale(1.0, 0.85);

        let placement = transform.apply(&img).unwrap();
        let (w, h) = placement.image.dimensions();
        assert_eq!(placement.rect.size(), Vec2::new(w as f32, h as f32));
    }

    #[test]
    fn source_image_is_not_modified() {
        let img = checkerboard(10, 10);
        let before = img.clone();
        compute_placement(&img, Vec2::ZERO, Vec2::new(5.0, 5.0), 33.0, 1.7, 0.4).unwrap();
        assert_eq!(img, before);
    }

    #[test]
    fn zero_scale_is_rejected() {
        let img = checkerboard(10, 10);
        let err = compute_placement(&img, Vec2::ZERO, Vec2::ZERO, 0.0, 0.0, 1.0).unwrap_err();
        assert_eq!(
            err,
            PivotError::InvalidScale {
                axis: Axis::X,
                value: 0.0
            }
        );

        let err = compute_placement(&img, Vec2::ZERO, Vec2::ZERO, 0.0, 1.0, 0.0).unwrap_err();
        assert!(matches!(err, PivotError::InvalidScale { axis: Axis::Y, .. }));
    }

    #[test]
    fn negative_and_non_finite_scales_are_rejected() {
        for bad in [-1.0, f32::NAN, f32::INFINITY] {
            let result = PivotTransform::new(Vec2::ZERO, Vec2::ZERO)
                .scale(1.0, bad)
                .placement_rect(4, 4);
            assert!(matches!(result, Err(PivotError::InvalidScale { .. })));
        }
    }

    #[test]
    fn non_finite_angle_is_rejected() {
        let result = PivotTransform::new(Vec2::ZERO, Vec2::ZERO)
            .angle(f32::NAN)
            .validate();
        assert!(matches!(result, Err(PivotError::NonFiniteAngle(_))));
    }

    #[test]
    fn empty_image_is_rejected() {
        let result = PivotTransform::new(Vec2::ZERO, Vec2::ZERO).apply(&RgbaImage::new(0, 5));
        assert_eq!(
            result.unwrap_err(),
            PivotError::EmptyImage {
                width: 0,
                height: 5
            }
        );
    }

    #[test]
    fn tiny_scale_keeps_one_pixel() {
        let transform = PivotTransform::new(Vec2::ZERO, Vec2::ZERO).uniform_scale(0.001);
        assert_eq!(transform.scaled_size(10, 10), (1, 1));
    }

    #[test]
    fn huge_scale_is_rejected_before_resampling() {
        let err = PivotTransform::new(Vec2::ZERO, Vec2::ZERO)
            .scale(1e6, 1e6)
            .apply(&checkerboard(10, 10))
            .unwrap_err();
        assert_eq!(
            err,
            PivotError::TooLarge {
                width: 10_000_000,
                height: 10_000_000
            }
        );
    }

    #[test]
    fn barrel_scaled_past_texture_limit_is_rejected() {
        let err = PivotTransform::new(Vec2::ZERO, Vec2::new(33.5, 120.0))
            .uniform_scale(100.0)
            .apply(&RgbaImage::new(67, 140))
            .unwrap_err();
        assert_eq!(
            err,
            PivotError::TooLarge {
                width: 6700,
                height: 14000
            }
        );
    }

    #[test]
    fn rotation_can_push_bounds_past_the_limit() {
        // 6000x6000 fits when upright; its 45 degree bounding box does not.
        let transform = PivotTransform::new(Vec2::ZERO, Vec2::ZERO).uniform_scale(600.0);
        assert!(transform.placement_rect(10, 10).is_ok());

        match transform.angle(45.0).placement_rect(10, 10) {
            Err(PivotError::TooLarge { width, height }) => {
                assert!(width > MAX_DIMENSION && height > MAX_DIMENSION);
            }
            other => panic!("expected TooLarge, got {other:?}"),
        }
    }

    #[test]
    fn largest_allowed_size_passes() {
        let rect = PivotTransform::new(Vec2::ZERO, Vec2::ZERO)
            .scale(MAX_DIMENSION as f32 / 16.0, 1.0)
            .placement_rect(16, 16)
            .unwrap();
        assert_eq!(rect.size(), Vec2::new(MAX_DIMENSION as f32, 16.0));
    }

    #[test]
    fn error_messages_name_the_axis() {
        let err = PivotError::InvalidScale {
            axis: Axis::Y,
            value: -2.0,
        };
        assert_eq!(
            err.to_string(),
            "scale_y must be finite and greater than zero, got -2"
        );
    }
}
