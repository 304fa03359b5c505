//! The backend-independent engine contract.

use glam::Vec2;
use petri_core::{InitialCondition, ModelParams, ReactionModel, Tool};
use petri_color::Palette;

use crate::cpu::CpuEngine;
use crate::error::EngineError;
use crate::gpu::GpuEngine;

/// Which execution strategy an engine runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Plain CPU sweep. Always available.
    Cpu,
    /// wgpu compute pipelines.
    Gpu,
}

/// Backend selection for [`create_engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendPreference {
    /// Probe for the accelerated backend, fall back to the CPU.
    #[default]
    Auto,
    /// CPU only.
    ForceCpu,
    /// Accelerated only; construction fails if unavailable.
    ForceGpu,
}

/// The display rectangle the simulation is presented in, in screen
/// coordinates. Pointer mapping and `resize` operate on this; the
/// simulation grid itself is unaffected by it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    /// Left edge in screen coordinates.
    pub x: f32,
    /// Top edge in screen coordinates.
    pub y: f32,
    /// Width in screen pixels.
    pub width: f32,
    /// Height in screen pixels.
    pub height: f32,
}

impl Surface {
    /// Creates a surface rectangle.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Maps a screen point into normalized grid coordinates.
    ///
    /// Row 0 of the grid is the top row of the surface on both backends.
    pub fn screen_to_uv(&self, screen: Vec2) -> Vec2 {
        Vec2::new(
            (screen.x - self.x) / self.width,
            (screen.y - self.y) / self.height,
        )
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new(0.0, 0.0, 512.0, 512.0)
    }
}

/// Callback receiving activity samples.
pub type ActivityCallback = Box<dyn FnMut(f32)>;

/// One interactive simulation instance.
///
/// Both backends implement the same contract and are behaviorally
/// interchangeable for a caller; only floating-point rounding and the
/// backend grid-size cap may differ. All methods assume a single-threaded
/// caller (see the crate docs); the engine performs no internal locking.
pub trait Engine {
    /// The execution strategy behind this instance.
    fn backend_kind(&self) -> BackendKind;

    /// Allocates (or reallocates) simulation state.
    ///
    /// `grid_size` is capped to the backend maximum. The grid is seeded
    /// with the `center` condition, walls and undo history are cleared,
    /// and one frame is rendered. Any previous state is discarded.
    fn init(&mut self, surface: Surface, grid_size: usize) -> Result<(), EngineError>;

    /// Switches the kinetics model. Takes effect on the next step.
    fn set_model(&mut self, model: ReactionModel);

    /// Replaces the parameter map. Unknown keys are ignored; missing keys
    /// resolve to model defaults.
    fn set_params(&mut self, params: &ModelParams);

    /// Sets how many kinetics passes run per tick, clamped to the backend
    /// bounds (CPU 1–10, accelerated 1–20).
    fn set_steps_per_frame(&mut self, steps: u32);

    /// Current passes-per-tick setting.
    fn steps_per_frame(&self) -> u32;

    /// Switches the palette, rebuilds the LUT, and re-renders immediately
    /// when stopped.
    fn set_colormap(&mut self, palette: Palette);

    /// Marks the engine running. Idempotent; ticks only advance the
    /// simulation while running.
    fn start(&mut self);

    /// Marks the engine stopped and cancels the pending tick. Idempotent.
    fn stop(&mut self);

    /// True between `start` and `stop`.
    fn is_running(&self) -> bool;

    /// Runs one scheduled tick: `steps_per_frame` kinetics passes, then a
    /// render, then (every 30th frame) an activity sample. No-op while
    /// stopped or destroyed.
    fn tick(&mut self);

    /// Rewrites the grid per the named initial condition, clears walls,
    /// and re-renders immediately when stopped.
    fn reset_state(&mut self, condition: InitialCondition);

    /// Stamps seed concentrations into every foreground cell of a
    /// caller-rasterized mask (`grid_size * grid_size` cells).
    fn seed_mask(&mut self, mask: &[bool]);

    /// Applies one brush stamp at normalized coordinates. Wall tools paint
    /// the mask; the rest perturb the current channels and re-render
    /// immediately when stopped.
    fn apply_brush(&mut self, uv: Vec2, tool: Tool, radius: f32, intensity: f32, square: bool);

    /// Maps pointer coordinates through the current surface rectangle.
    fn screen_to_uv(&self, screen: Vec2) -> Vec2;

    /// Updates the display surface size. The simulation grid is never
    /// reallocated by this call; use [`Engine::init`] to change
    /// resolution.
    fn resize(&mut self, width: f32, height: f32);

    /// Downsamples channel V to `target_size * target_size` by nearest neighbor, for
    /// spectral analysis and similar consumers.
    fn read_channel(&mut self, target_size: usize) -> Vec<f32>;

    /// Deep-copies the current channels onto the undo stack (call before a
    /// stroke begins, so one undo reverts one stroke).
    fn push_undo_state(&mut self);

    /// Restores the most recent snapshot. Returns false, with no effect,
    /// when the stack is empty.
    fn undo(&mut self) -> bool;

    /// The most recently rendered frame: grid-resolution RGBA8 bytes.
    fn frame(&self) -> &[u8];

    /// Side length of the simulation grid in cells.
    fn grid_size(&self) -> usize;

    /// Installs (or clears) the activity-sample callback.
    fn set_activity_callback(&mut self, callback: Option<ActivityCallback>);

    /// Stops the engine and releases backend resources. Safe to call more
    /// than once; every later call is a no-op.
    fn destroy(&mut self);
}

/// Constructs an engine per the backend preference.
///
/// With [`BackendPreference::Auto`], the accelerated backend is probed
/// first; any capability or initialization failure logs a warning and
/// falls back to the CPU engine, which always succeeds. Call
/// [`Engine::init`] on the result before use.
pub fn create_engine(preference: BackendPreference) -> Result<Box<dyn Engine>, EngineError> {
    match preference {
        BackendPreference::ForceCpu => Ok(Box::new(CpuEngine::new())),
        BackendPreference::ForceGpu => Ok(Box::new(GpuEngine::new()?)),
        BackendPreference::Auto => match GpuEngine::new() {
            Ok(engine) => {
                tracing::debug!("using accelerated backend: {}", engine.device_info());
                Ok(Box::new(engine))
            }
            Err(err) => {
                tracing::warn!("accelerated backend unavailable, falling back to CPU: {err}");
                Ok(Box::new(CpuEngine::new()))
            }
        },
    }
}

/// Nearest-neighbor downsample of a square field.
pub(crate) fn downsample_nearest(src: &[f32], width: usize, target: usize) -> Vec<f32> {
    if width == 0 || target == 0 {
        return vec![0.0; target * target];
    }

    let scale = width as f32 / target as f32;
    let mut out = Vec::with_capacity(target * target);
    for y in 0..target {
        let sy = ((y as f32 * scale) as usize).min(width - 1);
        for x in 0..target {
            let sx = ((x as f32 * scale) as usize).min(width - 1);
            out.push(src[sy * width + sx]);
        }
    }
    out
}
