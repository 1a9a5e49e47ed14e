//! The cannon scene: a barrel pivoting on a fixed mount.
//!
//! Owns the two decoded sprites and the [`CannonAnimation`], and knows where
//! things go on screen. It draws nothing itself; the frame loop asks it for
//! the barrel's [`Placement`] and the mount's position and composites them,
//! barrel first so the mount covers the hinge.

use std::path::PathBuf;

use glam::Vec2;
use image::RgbaImage;

use crate::animation::{AnimationConfig, CannonAnimation, Stage};
use crate::error::AssetError;
use crate::pivot::{PivotError, PivotTransform, Placement};
use crate::raster::Resample;
use crate::texture::load_rgba;

/// Assets and layout of the cannon scene.
#[derive(Clone, Debug)]
pub struct CannonConfig {
    /// Barrel sprite, pointing right at angle zero.
    pub cannon_path: PathBuf,
    /// Mount sprite, drawn over the barrel's hinge.
    pub mount_path: PathBuf,
    /// Hinge point inside the barrel sprite.
    pub pivot: Vec2,
    /// Offset from the anchor back to the mount sprite's top-left corner.
    pub mount_offset: Vec2,
    /// Filter used to scale and rotate the barrel.
    pub filter: Resample,
    pub animation: AnimationConfig,
}

impl Default for CannonConfig {
    fn default() -> Self {
        Self {
            cannon_path: PathBuf::from("image/cannon.png"),
            mount_path: PathBuf::from("image/cannon_mount.png"),
            pivot: Vec2::new(33.5, 120.0),
            mount_offset: Vec2::new(43.0, 16.0),
            filter: Resample::Bilinear,
            animation: AnimationConfig::default(),
        }
    }
}

/// Decoded sprites plus the running animation.
pub struct CannonScene {
    config: CannonConfig,
    cannon: RgbaImage,
    mount: RgbaImage,
    animation: CannonAnimation,
}

impl CannonScene {
    /// Decode both sprites. Fails on the first missing or unreadable file.
    pub fn load(config: CannonConfig) -> Result<Self, AssetError> {
        let cannon = load_rgba(&config.cannon_path)?;
        let mount = load_rgba(&config.mount_path)?;
        Ok(Self::from_images(config, cannon, mount))
    }

    /// Build a scene from already-decoded sprites.
    pub fn from_images(config: CannonConfig, cannon: RgbaImage, mount: RgbaImage) -> Self {
        let animation = CannonAnimation::new(config.animation);
        Self {
            config,
            cannon,
            mount,
            animation,
        }
    }

    /// Screen point the barrel hinges on: a third of the way across, three
    /// quarters of the way down.
    pub fn anchor(screen: Vec2) -> Vec2 {
        Vec2::new(screen.x / 3.0, screen.y * 3.0 / 4.0)
    }

    /// Top-left corner of the mount sprite for a given anchor.
    pub fn mount_position(&self, anchor: Vec2) -> Vec2 {
        anchor - self.config.mount_offset
    }

    pub fn config(&self) -> &CannonConfig {
        &self.config
    }

    pub fn animation(&self) -> &CannonAnimation {
        &self.animation
    }

    pub fn mount(&self) -> &RgbaImage {
        &self.mount
    }

    /// The barrel's transform for the current animation frame.
    pub fn transform(&self, anchor: Vec2) -> PivotTransform {
        PivotTransform::new(anchor, self.config.pivot)
            .angle(self.animation.angle)
            .scale(self.animation.zoom_x, self.animation.zoom_y)
            .filter(self.config.filter)
    }

    /// Scaled and rotated barrel for the current animation frame.
    pub fn cannon_placement(&self, anchor: Vec2) -> Result<Placement, PivotError> {
        self.transform(anchor).apply(&self.cannon)
    }

    /// Advance the animation by one frame.
    pub fn advance(&mut self) -> Option<Stage> {
        let next = self.animation.step();
        if let Some(stage) = next {
            log::debug!(
                "cannon stage -> {} (angle {:.0}, zoom {:.2})",
                stage,
                self.animation.angle,
                self.animation.zoom_y
            );
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn scene() -> CannonScene {
        let cannon = RgbaImage::from_pixel(67, 140, Rgba([60, 60, 60, 255]));
        let mount = RgbaImage::from_pixel(86, 60, Rgba([120, 80, 40, 255]));
        CannonScene::from_images(CannonConfig::default(), cannon, mount)
    }

    #[test]
    fn anchor_for_default_window() {
        let anchor = CannonScene::anchor(Vec2::new(400.0, 300.0));
        assert!((anchor.x - 133.333).abs() < 0.001);
        assert_eq!(anchor.y, 225.0);
    }

    #[test]
    fn mount_sits_up_and_left_of_anchor() {
        let scene = scene();
        let pos = scene.mount_position(Vec2::new(133.0, 225.0));
        assert_eq!(pos, Vec2::new(90.0, 209.0));
    }

    #[test]
    fn placement_keeps_hinge_on_anchor_every_frame() {
        let mut scene = scene();
        let anchor = CannonScene::anchor(Vec2::new(400.0, 300.0));
        for _ in 0..132 {
            let transform = scene.transform(anchor);
            let hinge = transform.pivot_in_world(67, 140).unwrap();
            assert!((hinge - anchor).length() < 1e-3);
            scene.advance();
        }
    }

    #[test]
    fn first_frame_points_barrel_sideways() {
        // At -90 degrees the 67x140 barrel lies on its side.
        let scene = scene();
        let placement = scene.cannon_placement(Vec2::new(133.0, 225.0)).unwrap();
        assert_eq!(placement.image.dimensions(), (140, 67));
    }

    #[test]
    fn advance_reports_transitions() {
        let mut scene = scene();
        let stages: Vec<_> = (0..132).filter_map(|_| scene.advance()).collect();
        assert_eq!(
            stages,
            vec![Stage::Squash, Stage::Stretch, Stage::Lower, Stage::Raise]
        );
    }

    #[test]
    fn missing_assets_fail_to_load() {
        let config = CannonConfig {
            cannon_path: PathBuf::from("no/such/cannon.png"),
            ..CannonConfig::default()
        };
        let err = CannonScene::load(config).err().unwrap();
        assert_eq!(err.path, PathBuf::from("no/such/cannon.png"));
    }
}
