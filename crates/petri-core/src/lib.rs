//! Simulation substrate for petri.
//!
//! This crate provides the state and pure math that both execution
//! backends share:
//!
//! - [`FieldGrid`] / [`WallMask`] - double-buffered channels and obstacles
//! - [`ReactionModel`] / [`Kinetics`] - the supported reaction systems
//! - [`integrate`] - the periodic-Laplacian stepper
//! - [`seed`](seed()) - initial-condition generators
//! - [`apply_brush`] - interactive perturbation tools
//! - [`UndoStack`] - bounded snapshot history
//!
//! # Example
//!
//! ```
//! use petri_core::{
//!     FieldGrid, InitialCondition, ModelParams, ReactionModel, WallMask, integrate, seed,
//! };
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let mut grid = FieldGrid::new(128, 128);
//! let walls = WallMask::new(128, 128);
//! let mut rng = StdRng::seed_from_u64(1);
//! seed(&mut grid, InitialCondition::Center, &mut rng);
//!
//! let model = ReactionModel::GrayScott;
//! let params = ModelParams::new();
//! let kinetics = model.kinetics(&params);
//! integrate::steps(&mut grid, &walls, &kinetics, model.dt(&params), 100);
//! ```

mod brush;
mod grid;
pub mod integrate;
mod model;
mod seed;
mod undo;

pub use brush::{REFERENCE_GRID, Tool, apply_brush};
pub use grid::{FieldGrid, WallMask};
pub use model::{Kinetics, ModelParams, ParamSpec, ReactionModel};
pub use seed::{InitialCondition, seed, seed_mask};
pub use undo::{DEFAULT_DEPTH, Snapshot, UndoStack};
