//! Engine error types.

use thiserror::Error;

/// Errors from the accelerated backend.
#[derive(Debug, Error)]
pub enum GpuError {
    /// No suitable GPU adapter was found.
    #[error("failed to request GPU adapter")]
    AdapterNotFound,

    /// The adapter cannot run compute shaders.
    #[error("adapter does not support compute shaders")]
    ComputeUnsupported,

    /// Failed to request a GPU device.
    #[error("failed to request GPU device: {0}")]
    DeviceRequestFailed(#[from] wgpu::RequestDeviceError),

    /// Buffer readback failed.
    #[error("buffer readback failed: {0}")]
    Readback(String),
}

/// Errors that can occur while constructing or reconfiguring an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The accelerated backend is unavailable. Recoverable: retry with the
    /// fallback backend.
    #[error("accelerated backend unavailable: {0}")]
    Gpu(#[from] GpuError),

    /// Grid sizes must be at least one cell.
    #[error("invalid grid size: {0}")]
    InvalidGridSize(usize),

    /// Neither backend could be constructed.
    #[error("no compute backend available")]
    NoBackend,
}
