//! Accelerated backend: wgpu compute pipelines.
//!
//! Field state lives in ping-pong storage buffers on the device; WGSL
//! kernels run the kinetics pass, the brush, and LUT colorization. Undo
//! snapshots and the activity/channel reductions read state back through
//! staging buffers. Behavior matches the CPU backend up to floating-point
//! rounding.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use petri_color::{ColorLut, Palette};
use petri_core::{
    FieldGrid, InitialCondition, ModelParams, ReactionModel, Tool, UndoStack, WallMask,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use wgpu::util::DeviceExt;

use crate::activity::{self, ActivitySampler};
use crate::engine::{
    ActivityCallback, BackendKind, Engine, Surface, downsample_nearest,
};
use crate::error::{EngineError, GpuError};

/// Largest grid the accelerated backend will allocate.
pub const MAX_GRID_GPU: usize = 2048;

/// Steps-per-frame bounds for the accelerated backend.
pub const STEPS_RANGE_GPU: (u32, u32) = (1, 20);

/// GPU context: instance, adapter, device, queue.
///
/// Requesting the context doubles as the capability probe — construction
/// fails when no adapter exists or the adapter cannot run compute
/// shaders, and the caller falls back to the CPU backend.
pub struct GpuContext {
    #[allow(dead_code)]
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl GpuContext {
    /// Creates a new GPU context, blocking on adapter negotiation.
    pub fn new() -> Result<Self, GpuError> {
        pollster::block_on(Self::new_async())
    }

    /// Creates a new GPU context asynchronously.
    pub async fn new_async() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .ok_or(GpuError::AdapterNotFound)?;

        if !adapter
            .get_downlevel_capabilities()
            .flags
            .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS)
        {
            return Err(GpuError::ComputeUnsupported);
        }

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("petri-engine"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }

    /// Returns the adapter name/driver info.
    pub fn device_info(&self) -> String {
        format!("{:?}", self.adapter.get_info())
    }
}

/// Uniform block for the kinetics kernel.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct SimUniforms {
    width: u32,
    height: u32,
    model: u32,
    clamp_unit: u32,
    du: f32,
    dv: f32,
    p0: f32,
    p1: f32,
    p2: f32,
    dt: f32,
    _pad: [f32; 2],
}

/// Uniform block for the brush kernel.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct BrushUniforms {
    width: u32,
    height: u32,
    tool: u32,
    square: u32,
    cx: f32,
    cy: f32,
    radius: f32,
    intensity: f32,
}

/// Uniform block for the colorize kernel.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct RenderUniforms {
    count: u32,
    _pad: [u32; 3],
}

/// Device-side state, dropped wholesale on destroy.
struct GpuState {
    chan_u: [wgpu::Buffer; 2],
    chan_v: [wgpu::Buffer; 2],
    walls: wgpu::Buffer,
    lut: wgpu::Buffer,
    out_rgba: wgpu::Buffer,
    sim_uniforms: wgpu::Buffer,
    brush_uniforms: wgpu::Buffer,
    sim_pipeline: wgpu::ComputePipeline,
    brush_pipeline: wgpu::ComputePipeline,
    render_pipeline: wgpu::ComputePipeline,
    /// Kinetics bind groups, indexed by the current buffer pair.
    sim_binds: [wgpu::BindGroup; 2],
    brush_binds: [wgpu::BindGroup; 2],
    render_binds: [wgpu::BindGroup; 2],
    /// Which buffer pair is current.
    cur: usize,
}

/// Accelerated implementation of [`Engine`].
pub struct GpuEngine {
    ctx: GpuContext,
    state: Option<GpuState>,
    grid_size: usize,
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

impl GpuEngine {
    /// Probes the GPU and creates an uninitialized engine; call
    /// [`Engine::init`] before use.
    pub fn new() -> Result<Self, GpuError> {
        Self::with_rng_seed(rand::thread_rng().gen())
    }

    /// As [`GpuEngine::new`] with a fixed noise seed, for reproducible
    /// tests.
    pub fn with_rng_seed(seed: u64) -> Result<Self, GpuError> {
        Ok(Self {
            ctx: GpuContext::new()?,
            state: None,
            grid_size: 0,
            walls: WallMask::new(0, 0),
            undo: UndoStack::new(),
            surface: Surface::default(),
            model: ReactionModel::default(),
            params: ModelParams::new(),
            palette: Palette::default(),
            lut: ColorLut::build(Palette::default()),
            frame: Vec::new(),
            steps_per_frame: 8,
            running: false,
            destroyed: false,
            sampler: ActivitySampler::new(),
            on_activity: None,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Returns the adapter name/driver info.
    pub fn device_info(&self) -> String {
        self.ctx.device_info()
    }

    /// The active palette.
    pub fn palette(&self) -> Palette {
        self.palette
    }

    fn sim_uniforms(&self) -> SimUniforms {
        let size = self.grid_size as u32;
        let kinetics = self.model.kinetics(&self.params);
        let dt = self.model.dt(&self.params);
        let clamp_unit = kinetics.clamps_unit() as u32;

        let (model, du, dv, p0, p1, p2) = match kinetics {
            petri_core::Kinetics::GrayScott { feed, kill, du, dv } => (0, du, dv, feed, kill, 0.0),
            petri_core::Kinetics::FitzHughNagumo {
                a,
                b,
                epsilon,
                du,
                dv,
            } => (1, du, dv, a, b, epsilon),
            petri_core::Kinetics::Schnakenberg { a, b, du, dv } => (2, du, dv, a, b, 0.0),
            petri_core::Kinetics::Brusselator { a, b, du, dv } => (3, du, dv, a, b, 0.0),
        };

        SimUniforms {
            width: size,
            height: size,
            model,
            clamp_unit,
            du,
            dv,
            p0,
            p1,
            p2,
            dt,
            _pad: [0.0; 2],
        }
    }

    /// Reads a whole device buffer back into host memory.
    fn read_buffer(&self, buffer: &wgpu::Buffer, size: u64) -> Vec<u8> {
        let staging = self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("petri_staging"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("petri_readback"),
            });
        encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
        self.ctx.queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).unwrap();
        });
        self.ctx.device.poll(wgpu::Maintain::Wait);
        rx.recv().unwrap().unwrap();

        let data = slice.get_mapped_range().to_vec();
        staging.unmap();
        data
    }

    fn read_channel_f32(&self, buffer: &wgpu::Buffer) -> Vec<f32> {
        let bytes = self.read_buffer(buffer, (self.grid_size * self.grid_size * 4) as u64);
        bytemuck::cast_slice(&bytes).to_vec()
    }

    fn upload_walls(&self) {
        if let Some(state) = &self.state {
            let cells: Vec<u32> = self.walls.cells().iter().map(|&w| w as u32).collect();
            self.ctx
                .queue
                .write_buffer(&state.walls, 0, bytemuck::cast_slice(&cells));
        }
    }

    fn upload_grid(&self, grid: &FieldGrid) {
        if let Some(state) = &self.state {
            // Both pairs receive the data so the scratch side never leaks
            // stale state through wall-cell copies.
            for buffer in &state.chan_u {
                self.ctx
                    .queue
                    .write_buffer(buffer, 0, bytemuck::cast_slice(grid.u()));
            }
            for buffer in &state.chan_v {
                self.ctx
                    .queue
                    .write_buffer(buffer, 0, bytemuck::cast_slice(grid.v()));
            }
        }
    }

    fn upload_lut(&self) {
        if let Some(state) = &self.state {
            self.ctx
                .queue
                .write_buffer(&state.lut, 0, self.lut.bytes());
        }
    }

    fn workgroups(&self) -> (u32, u32) {
        let size = self.grid_size as u32;
        ((size + 7) / 8, (size + 7) / 8)
    }

    fn render(&mut self) {
        let Some(state) = &self.state else { return };

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("petri_render"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("petri_render_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&state.render_pipeline);
            pass.set_bind_group(0, &state.render_binds[state.cur], &[]);
            let count = (self.grid_size * self.grid_size) as u32;
            pass.dispatch_workgroups((count + 63) / 64, 1, 1);
        }
        self.ctx.queue.submit(Some(encoder.finish()));

        let bytes = self.read_buffer(
            &state.out_rgba,
            (self.grid_size * self.grid_size * 4) as u64,
        );
        self.frame = bytes;
    }

    fn render_if_stopped(&mut self) {
        if !self.running {
            self.render();
        }
    }

    fn sample_activity(&mut self) {
        // The mean readback only happens on sampling frames.
        if !self.sampler.frame_due() {
            return;
        }
        let Some(state) = &self.state else { return };

        let mean = activity::mean(&self.read_channel_f32(&state.chan_v[state.cur]));
        let level = self.sampler.update(mean);
        if let Some(callback) = self.on_activity.as_mut() {
            callback(level);
        }
    }
}

impl Engine for GpuEngine {
    fn backend_kind(&self) -> BackendKind {
        BackendKind::Gpu
    }

    fn init(&mut self, surface: Surface, grid_size: usize) -> Result<(), EngineError> {
        if grid_size == 0 {
            return Err(EngineError::InvalidGridSize(grid_size));
        }

        let size = grid_size.min(MAX_GRID_GPU);
        tracing::debug!("gpu engine init: {size}x{size} grid");
        let device = &self.ctx.device;
        let cells = size * size;
        let field_bytes = (cells * 4) as u64;

        let storage = |label: &str| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: field_bytes,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            })
        };
        let chan_u = [storage("petri_u0"), storage("petri_u1")];
        let chan_v = [storage("petri_v0"), storage("petri_v1")];
        let walls = storage("petri_walls");
        let out_rgba = storage("petri_frame");

        let lut = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("petri_lut"),
            contents: self.lut.bytes(),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });

        let sim_uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("petri_sim_uniforms"),
            size: std::mem::size_of::<SimUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let brush_uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("petri_brush_uniforms"),
            size: std::mem::size_of::<BrushUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let render_uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("petri_render_uniforms"),
            contents: bytemuck::bytes_of(&RenderUniforms {
                count: cells as u32,
                _pad: [0; 3],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let storage_entry = |binding, read_only| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let sim_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("petri_sim_layout"),
            entries: &[
                uniform_entry(0),
                storage_entry(1, true),
                storage_entry(2, true),
                storage_entry(3, false),
                storage_entry(4, false),
                storage_entry(5, true),
            ],
        });
        let brush_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("petri_brush_layout"),
            entries: &[uniform_entry(0), storage_entry(1, false), storage_entry(2, false)],
        });
        let render_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("petri_render_layout"),
            entries: &[
                uniform_entry(0),
                storage_entry(1, true),
                storage_entry(2, true),
                storage_entry(3, false),
            ],
        });

        let pipeline = |label: &str, layout: &wgpu::BindGroupLayout, source: &str| {
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
            let pipeline_layout =
                device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some(label),
                    bind_group_layouts: &[layout],
                    push_constant_ranges: &[],
                });
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: Some("main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                cache: None,
            })
        };
        let sim_pipeline = pipeline("petri_sim", &sim_layout, SIM_SHADER);
        let brush_pipeline = pipeline("petri_brush", &brush_layout, BRUSH_SHADER);
        let render_pipeline = pipeline("petri_colorize", &render_layout, RENDER_SHADER);

        let sim_bind = |src: usize| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("petri_sim_bind"),
                layout: &sim_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: sim_uniforms.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: chan_u[src].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: chan_v[src].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: chan_u[1 - src].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: chan_v[1 - src].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 5,
                        resource: walls.as_entire_binding(),
                    },
                ],
            })
        };
        let brush_bind = |cur: usize| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("petri_brush_bind"),
                layout: &brush_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: brush_uniforms.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: chan_u[cur].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: chan_v[cur].as_entire_binding(),
                    },
                ],
            })
        };
        let render_bind = |cur: usize| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("petri_render_bind"),
                layout: &render_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: render_uniforms.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: chan_v[cur].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: lut.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: out_rgba.as_entire_binding(),
                    },
                ],
            })
        };

        let sim_binds = [sim_bind(0), sim_bind(1)];
        let brush_binds = [brush_bind(0), brush_bind(1)];
        let render_binds = [render_bind(0), render_bind(1)];

        self.state = Some(GpuState {
            sim_binds,
            brush_binds,
            render_binds,
            chan_u,
            chan_v,
            walls,
            lut,
            out_rgba,
            sim_uniforms,
            brush_uniforms,
            sim_pipeline,
            brush_pipeline,
            render_pipeline,
            cur: 0,
        });
        self.grid_size = size;
        self.surface = surface;
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
        self.steps_per_frame = steps.clamp(STEPS_RANGE_GPU.0, STEPS_RANGE_GPU.1);
    }

    fn steps_per_frame(&self) -> u32 {
        self.steps_per_frame
    }

    fn set_colormap(&mut self, palette: Palette) {
        self.palette = palette;
        self.lut = ColorLut::build(palette);
        self.upload_lut();
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
        if !self.running || self.destroyed {
            return;
        }

        // Parameters resolve once per tick; every pass reads the same block.
        let sim = self.sim_uniforms();
        let (wx, wy) = self.workgroups();
        let Some(state) = &mut self.state else { return };

        self.ctx
            .queue
            .write_buffer(&state.sim_uniforms, 0, bytemuck::bytes_of(&sim));

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("petri_tick"),
            });
        for _ in 0..self.steps_per_frame {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("petri_sim_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&state.sim_pipeline);
            pass.set_bind_group(0, &state.sim_binds[state.cur], &[]);
            pass.dispatch_workgroups(wx, wy, 1);
            drop(pass);
            state.cur = 1 - state.cur;
        }
        self.ctx.queue.submit(Some(encoder.finish()));

        self.render();
        self.sample_activity();
    }

    fn reset_state(&mut self, condition: InitialCondition) {
        if self.state.is_none() {
            return;
        }

        let mut grid = FieldGrid::new(self.grid_size, self.grid_size);
        petri_core::seed(&mut grid, condition, &mut self.rng);
        self.upload_grid(&grid);
        self.walls.clear();
        self.upload_walls();
        self.render_if_stopped();
    }

    fn seed_mask(&mut self, mask: &[bool]) {
        let Some(state) = &self.state else { return };

        // Stamp over the current device state.
        let u = self.read_channel_f32(&state.chan_u[state.cur]);
        let v = self.read_channel_f32(&state.chan_v[state.cur]);
        let mut grid = FieldGrid::new(self.grid_size, self.grid_size);
        grid.restore(&u, &v);
        petri_core::seed_mask(&mut grid, mask);
        self.upload_grid(&grid);
        self.render_if_stopped();
    }

    fn apply_brush(&mut self, uv: Vec2, tool: Tool, radius: f32, intensity: f32, square: bool) {
        let size = self.grid_size as f32;
        let cx = uv.x * size;
        let cy = uv.y * size;
        let r = radius * (size / petri_core::REFERENCE_GRID);

        if tool.is_wall_tool() {
            self.walls.paint(cx, cy, r, tool == Tool::Wall, square);
            self.upload_walls();
            return;
        }
        if r <= 0.0 {
            return;
        }

        let (wx, wy) = self.workgroups();
        let Some(state) = &self.state else { return };
        let uniforms = BrushUniforms {
            width: self.grid_size as u32,
            height: self.grid_size as u32,
            tool: match tool {
                Tool::Inject => 0,
                Tool::Erase => 1,
                Tool::Attractor => 2,
                Tool::Repeller => 3,
                Tool::Wall | Tool::WallEraser => unreachable!(),
            },
            square: square as u32,
            cx,
            cy,
            radius: r,
            intensity,
        };
        self.ctx
            .queue
            .write_buffer(&state.brush_uniforms, 0, bytemuck::bytes_of(&uniforms));

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("petri_brush"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("petri_brush_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&state.brush_pipeline);
            pass.set_bind_group(0, &state.brush_binds[state.cur], &[]);
            pass.dispatch_workgroups(wx, wy, 1);
        }
        self.ctx.queue.submit(Some(encoder.finish()));

        self.render_if_stopped();
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
        let Some(state) = &self.state else {
            return vec![0.0; target_size * target_size];
        };
        let v = self.read_channel_f32(&state.chan_v[state.cur]);
        downsample_nearest(&v, self.grid_size, target_size)
    }

    fn push_undo_state(&mut self) {
        let Some(state) = &self.state else { return };
        let u = self.read_channel_f32(&state.chan_u[state.cur]);
        let v = self.read_channel_f32(&state.chan_v[state.cur]);
        self.undo.push_raw(u, v);
    }

    fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo.pop() else {
            return false;
        };
        let mut grid = FieldGrid::new(self.grid_size, self.grid_size);
        grid.restore(&snapshot.u, &snapshot.v);
        self.upload_grid(&grid);
        self.render_if_stopped();
        true
    }

    fn frame(&self) -> &[u8] {
        &self.frame
    }

    fn grid_size(&self) -> usize {
        self.grid_size
    }

    fn set_activity_callback(&mut self, callback: Option<ActivityCallback>) {
        self.on_activity = callback;
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.stop();
        self.state = None;
        self.grid_size = 0;
        self.walls = WallMask::new(0, 0);
        self.undo.clear();
        self.frame.clear();
        self.destroyed = true;
    }
}

const SIM_SHADER: &str = r#"
struct SimParams {
    width: u32,
    height: u32,
    model: u32,
    clamp_unit: u32,
    du: f32,
    dv: f32,
    p0: f32,
    p1: f32,
    p2: f32,
    dt: f32,
    pad0: f32,
    pad1: f32,
}

@group(0) @binding(0) var<uniform> params: SimParams;
@group(0) @binding(1) var<storage, read> src_u: array<f32>;
@group(0) @binding(2) var<storage, read> src_v: array<f32>;
@group(0) @binding(3) var<storage, read_write> dst_u: array<f32>;
@group(0) @binding(4) var<storage, read_write> dst_v: array<f32>;
@group(0) @binding(5) var<storage, read> walls: array<u32>;

fn cell(x: u32, y: u32) -> u32 {
    return y * params.width + x;
}

@compute @workgroup_size(8, 8)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {
    let x = gid.x;
    let y = gid.y;
    if (x >= params.width || y >= params.height) {
        return;
    }
    let i = cell(x, y);

    if (walls[i] != 0u) {
        dst_u[i] = src_u[i];
        dst_v[i] = src_v[i];
        return;
    }

    // Periodic 4-neighbor Laplacian
    let xm = select(x - 1u, params.width - 1u, x == 0u);
    let xp = select(x + 1u, 0u, x == params.width - 1u);
    let ym = select(y - 1u, params.height - 1u, y == 0u);
    let yp = select(y + 1u, 0u, y == params.height - 1u);

    let u = src_u[i];
    let v = src_v[i];
    let lap_u = src_u[cell(xm, y)] + src_u[cell(xp, y)] + src_u[cell(x, ym)]
        + src_u[cell(x, yp)] - 4.0 * u;
    let lap_v = src_v[cell(xm, y)] + src_v[cell(xp, y)] + src_v[cell(x, ym)]
        + src_v[cell(x, yp)] - 4.0 * v;

    var du = 0.0;
    var dv = 0.0;
    switch params.model {
        // Gray-Scott: p0 = feed, p1 = kill
        case 0u: {
            let uvv = u * v * v;
            du = params.du * lap_u - uvv + params.p0 * (1.0 - u);
            dv = params.dv * lap_v + uvv - (params.p0 + params.p1) * v;
        }
        // FitzHugh-Nagumo: p0 = a, p1 = b, p2 = epsilon
        case 1u: {
            du = u - (u * u * u) / 3.0 - v + params.du * lap_u;
            dv = params.p2 * (u + params.p0 - params.p1 * v) + params.dv * lap_v;
        }
        // Schnakenberg: p0 = a, p1 = b
        case 2u: {
            let u2v = u * u * v;
            du = params.p0 - u + u2v + params.du * lap_u;
            dv = params.p1 - u2v + params.dv * lap_v;
        }
        // Brusselator: p0 = a, p1 = b
        default: {
            let u2v = u * u * v;
            du = params.p0 - (params.p1 + 1.0) * u + u2v + params.du * lap_u;
            dv = params.p1 * u - u2v + params.dv * lap_v;
        }
    }

    var un = u + du * params.dt;
    var vn = v + dv * params.dt;
    if (params.clamp_unit != 0u) {
        un = clamp(un, 0.0, 1.0);
        vn = clamp(vn, 0.0, 1.0);
    }
    dst_u[i] = un;
    dst_v[i] = vn;
}
"#;

const BRUSH_SHADER: &str = r#"
struct BrushParams {
    width: u32,
    height: u32,
    tool: u32,
    square: u32,
    cx: f32,
    cy: f32,
    radius: f32,
    intensity: f32,
}

@group(0) @binding(0) var<uniform> params: BrushParams;
@group(0) @binding(1) var<storage, read_write> chan_u: array<f32>;
@group(0) @binding(2) var<storage, read_write> chan_v: array<f32>;

@compute @workgroup_size(8, 8)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {
    let x = gid.x;
    let y = gid.y;
    if (x >= params.width || y >= params.height) {
        return;
    }

    let dx = f32(x) - params.cx;
    let dy = f32(y) - params.cy;
    var dist = 0.0;
    if (params.square != 0u) {
        dist = max(abs(dx), abs(dy));
    } else {
        dist = sqrt(dx * dx + dy * dy);
    }
    if (dist > params.radius) {
        return;
    }

    let strength = (1.0 - dist / params.radius) * params.intensity;
    let i = y * params.width + x;
    switch params.tool {
        // inject
        case 0u: {
            chan_v[i] = min(1.0, chan_v[i] + strength);
        }
        // erase
        case 1u: {
            chan_u[i] = chan_u[i] + (1.0 - chan_u[i]) * strength;
            chan_v[i] = chan_v[i] * (1.0 - strength);
        }
        // attractor
        case 2u: {
            chan_v[i] = min(1.0, chan_v[i] + strength * 0.5);
        }
        // repeller
        default: {
            chan_v[i] = max(0.0, chan_v[i] - strength * 0.5);
        }
    }
}
"#;

const RENDER_SHADER: &str = r#"
struct RenderParams {
    count: u32,
    pad0: u32,
    pad1: u32,
    pad2: u32,
}

@group(0) @binding(0) var<uniform> params: RenderParams;
@group(0) @binding(1) var<storage, read> chan_v: array<f32>;
@group(0) @binding(2) var<storage, read> lut: array<u32>;
@group(0) @binding(3) var<storage, read_write> out_rgba: array<u32>;

@compute @workgroup_size(64)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {
    let i = gid.x;
    if (i >= params.count) {
        return;
    }
    let value = clamp(chan_v[i], 0.0, 1.0);
    out_rgba[i] = lut[u32(round(value * 255.0))];
}
"#;
