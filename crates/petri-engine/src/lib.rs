//! Dual-backend interactive reaction-diffusion engine.
//!
//! One [`Engine`] instance owns a periodic simulation grid, steps it with
//! the active reaction model, applies brush strokes and walls, renders
//! frames through a palette LUT, and keeps a bounded undo history. Two
//! conforming implementations exist: [`CpuEngine`] (always available) and
//! [`GpuEngine`] (wgpu compute). [`create_engine`] probes for acceleration
//! and falls back automatically.
//!
//! The engine is single-threaded by contract: the host drives ticks from
//! one execution context (see [`scheduler`]) and makes every mutating call
//! from that same context. There is no internal locking; a multi-threaded
//! host must serialize access itself.
//!
//! # Example
//!
//! ```
//! use petri_engine::{BackendPreference, ManualTicks, Surface, create_engine, run};
//!
//! let mut engine = create_engine(BackendPreference::ForceCpu).unwrap();
//! engine.init(Surface::default(), 128).unwrap();
//!
//! engine.start();
//! run(engine.as_mut(), &mut ManualTicks::new(60));
//! engine.stop();
//!
//! assert_eq!(engine.frame().len(), 128 * 128 * 4);
//! engine.destroy();
//! ```

mod activity;
mod cpu;
mod engine;
mod error;
mod gpu;
pub mod scheduler;

pub use activity::{ActivitySampler, SAMPLE_INTERVAL};
pub use cpu::{CpuEngine, MAX_GRID_CPU, STEPS_RANGE_CPU};
pub use engine::{
    ActivityCallback, BackendKind, BackendPreference, Engine, Surface, create_engine,
};
pub use error::{EngineError, GpuError};
pub use gpu::{GpuContext, GpuEngine, MAX_GRID_GPU, STEPS_RANGE_GPU};
pub use scheduler::{ManualTicks, TickSource, run};

// Re-export the vocabulary types hosts need to drive an engine.
pub use glam;
pub use petri_color::Palette;
pub use petri_core::{InitialCondition, ModelParams, ReactionModel, Tool};
