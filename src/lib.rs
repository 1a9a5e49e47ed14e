//! # Swivel
//!
//! **Rotate and scale sprites around any point, not just their centre.**
//!
//! Swivel is a small 2D drawing layer on top of wgpu and winit built around
//! one idea: a [`PivotTransform`] that keeps a chosen point of an image pinned
//! to the screen while the image turns and stretches around it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use swivel::*;
//!
//! fn main() -> Result<(), AppError> {
//!     let arm = image::open("arm.png").unwrap().to_rgba8();
//!
//!     run_with_config(AppConfig::new().title("Swing").size(400, 300), move |_ctx| {
//!         let mut angle = 0.0;
//!
//!         move |frame| {
//!             angle += 90.0 * frame.dt;
//!             let shoulder = Vec2::new(200.0, 150.0);
//!             let placement = PivotTransform::new(shoulder, Vec2::new(8.0, 8.0))
//!                 .angle(angle)
//!                 .scale(1.0, 0.9)
//!                 .apply(&arm);
//!
//!             match placement {
//!                 Ok(placement) => frame.placement(&placement),
//!                 Err(e) => frame.fail(e),
//!             }
//!         }
//!     })
//! }
//! ```
//!
//! ## Layout
//!
//! - [`pivot`] finds where a rotated, scaled image goes.
//! - [`raster`] does the pixel work: smooth scaling and expanding rotation.
//! - [`animation`] and [`cannon`] drive the bundled `cannon` demo.
//! - [`run_with_config`] opens the window and hands you a [`Frame`] per tick.

pub mod animation;
mod app;
pub mod cannon;
mod clock;
mod draw2d;
mod error;
mod gpu;
pub mod pivot;
pub mod raster;
mod texture;

pub use animation::{AnimationConfig, CannonAnimation, Stage};
pub use app::{AppConfig, Frame, SetupContext, run_with_config};
pub use cannon::{CannonConfig, CannonScene};
pub use clock::FrameClock;
pub use draw2d::{Color, Draw2d, Rect, SpriteId};
pub use error::{AppError, AssetError, GpuError};
pub use gpu::GpuContext;
pub use pivot::{Axis, PivotError, PivotTransform, Placement, compute_placement};
pub use raster::Resample;
pub use texture::{Sprite, Texture, load_rgba};

// Re-export glam math types for convenience
pub use glam::Vec2;
