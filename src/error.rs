//! Error types shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

use crate::pivot::PivotError;

/// Failures while bringing up or driving the GPU.
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("failed to create window surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported texture formats")]
    UnsupportedSurface,

    #[error("failed to acquire surface texture: {0}")]
    Frame(#[from] wgpu::SurfaceError),
}

/// An image asset that could not be read or decoded.
#[derive(Debug, Error)]
#[error("failed to load image '{}': {source}", .path.display())]
pub struct AssetError {
    pub path: PathBuf,
    pub source: image::ImageError,
}

/// Anything that can stop an app from starting or keep it from running.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Pivot(#[from] PivotError),
}
