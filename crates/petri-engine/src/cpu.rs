//! CPU fallback backend.
//!
//! The reference implementation of the engine contract: a plain sweep
//! over the shared simulation core, always available. Grid resolution is
//! capped lower than the accelerated backend so interactive rates stay
//! reachable without a GPU.

use glam::Vec2;
use petri_color::{ColorLut, Palette};
use petri_core::{
    FieldGrid, InitialCondition, ModelParams, ReactionModel, Tool, UndoStack, WallMask, integrate,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::activity::{self, ActivitySampler};
use crate::engine::{
    ActivityCallback, BackendKind, Engine, Surface, downsample_nearest,
};
use crate::error::EngineError;

/// Largest grid the CPU backend will allocate.
pub const MAX_GRID_CPU: usize = 256;

/// Steps-per-frame bounds for the CPU backend.
pub const STEPS_RANGE_CPU: (u32, u32) = (1, 10);

/// CPU implementation of [`Engine`].
pub struct CpuEngine {
    grid: FieldGrid,
    walls: WallMask,
    undo: UndoStack,
    surface: Surface,
    model: ReactionModel,
    params: ModelParams,
    palette: Palette,
    lut: ColorLut,
    frame: Vec<u8>,
    steps_per_frame: u32,
    running: bool,
    destroyed: bool,
    sampler: ActivitySampler,
    on_activity: Option<ActivityCallback>,
    rng: StdRng,
}

impl CpuEngine {
    /// Creates an uninitialized engine; call [`Engine::init`] before use.
    pub fn new() -> Self {
        Self::with_rng_seed(rand::thread_rng().gen())
    }

    /// Creates an engine with a fixed seed for the noise initial
    /// condition, for reproducible tests.
    pub fn with_rng_seed(seed: u64) -> Self {
        Self {
            grid: FieldGrid::new(0, 0),
            walls: WallMask::new(0, 0),
            undo: UndoStack::new(),
            surface: Surface::default(),
            model: ReactionModel::default(),
            params: ModelParams::new(),
            palette: Palette::default(),
            lut: ColorLut::build(Palette::default()),
            frame: Vec::new(),
            steps_per_frame: 5,
            running: false,
            destroyed: false,
            sampler: ActivitySampler::new(),
            on_activity: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The active palette.
    pub fn palette(&self) -> Palette {
        self.palette
    }

    fn render(&mut self) {
        self.lut.map_field(self.grid.v(), &mut self.frame);
    }

    fn render_if_stopped(&mut self) {
        if !self.running {
            self.render();
        }
    }

    fn sample_activity(&mut self) {
        let grid = &self.grid;
        if let Some(level) = self.sampler.record_frame(|| activity::mean(grid.v())) {
            if let Some(callback) = self.on_activity.as_mut() {
                callback(level);
            }
        }
    }
}

impl Default for CpuEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for CpuEngine {
    fn backend_kind(&self) -> BackendKind {
        BackendKind::Cpu
    }

    fn init(&mut self, surface: Surface, grid_size: usize) -> Result<(), EngineError> {
        if grid_size == 0 {
            return Err(EngineError::InvalidGridSize(grid_size));
        }

        let size = grid_size.min(MAX_GRID_CPU);
        tracing::debug!("cpu engine init: {size}x{size} grid");

        self.surface = surface;
        self.grid = FieldGrid::new(size, size);
        self.walls = WallMask::new(size, size);
        self.undo.clear();
        self.sampler.reset();
        self.destroyed = false;
        self.reset_state(InitialCondition::Center);
        Ok(())
    }

    fn set_model(&mut self, model: ReactionModel) {
        self.model = model;
    }

    fn set_params(&mut self, params: &ModelParams) {
        self.params = params.clone();
    }

    fn set_steps_per_frame(&mut self, steps: u32) {
        self.steps_per_frame = steps.clamp(STEPS_RANGE_CPU.0, STEPS_RANGE_CPU.1);
    }

    fn steps_per_frame(&self) -> u32 {
        self.steps_per_frame
    }

    fn set_colormap(&mut self, palette: Palette) {
        self.palette = palette;
        self.lut = ColorLut::build(palette);
        self.render_if_stopped();
    }

    fn start(&mut self) {
        if self.destroyed {
            return;
        }
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn tick(&mut self) {
        if !self.running || self.destroyed || self.grid.is_empty() {
            return;
        }

        let kinetics = self.model.kinetics(&self.params);
        let dt = self.model.dt(&self.params);
        for _ in 0..self.steps_per_frame {
            integrate::step(&mut self.grid, &self.walls, &kinetics, dt);
        }

        self.render();
        self.sample_activity();
    }

    fn reset_state(&mut self, condition: InitialCondition) {
        petri_core::seed(&mut self.grid, condition, &mut self.rng);
        self.walls.clear();
        self.render_if_stopped();
    }

    fn seed_mask(&mut self, mask: &[bool]) {
        petri_core::seed_mask(&mut self.grid, mask);
        self.render_if_stopped();
    }

    fn apply_brush(&mut self, uv: Vec2, tool: Tool, radius: f32, intensity: f32, square: bool) {
        if self.grid.is_empty() {
            return;
        }

        petri_core::apply_brush(
            &mut self.grid,
            &mut self.walls,
            (uv.x, uv.y),
            tool,
            radius,
            intensity,
            square,
        );

        if !tool.is_wall_tool() {
            self.render_if_stopped();
        }
    }

    fn screen_to_uv(&self, screen: Vec2) -> Vec2 {
        self.surface.screen_to_uv(screen)
    }

    fn resize(&mut self, width: f32, height: f32) {
        // Display-only: the simulation grid keeps its resolution.
        self.surface.width = width;
        self.surface.height = height;
        self.render_if_stopped();
    }

    fn read_channel(&mut self, target_size: usize) -> Vec<f32> {
        downsample_nearest(self.grid.v(), self.grid.width(), target_size)
    }

    fn push_undo_state(&mut self) {
        self.undo.push(&self.grid);
    }

    fn undo(&mut self) -> bool {
        let restored = self.undo.restore_into(&mut self.grid);
        if restored {
            self.render_if_stopped();
        }
        restored
    }

    fn frame(&self) -> &[u8] {
        &self.frame
    }

    fn grid_size(&self) -> usize {
        self.grid.width()
    }

    fn set_activity_callback(&mut self, callback: Option<ActivityCallback>) {
        self.on_activity = callback;
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.stop();
        self.grid = FieldGrid::new(0, 0);
        self.walls = WallMask::new(0, 0);
        self.undo.clear();
        self.frame.clear();
        self.destroyed = true;
    }
}
