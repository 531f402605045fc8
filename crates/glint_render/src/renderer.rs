//! Multithreaded render pass orchestration.
//!
//! A pass flattens the scene, builds the BVH, cuts the image into
//! chunks and lets a fixed pool of workers claim chunks from an atomic
//! counter until the list is exhausted or a stop is requested. Workers
//! write into private buffers that are merged after every thread has
//! joined.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use glint_core::Scene;
use glint_math::{Ray, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::bvh::Bvh;
use crate::chunk::{self, Chunk};
use crate::emitter::{CameraRayEmitter, RayEmitterParameters};
use crate::framebuffer::{Framebuffer, ThreadBuffer};
use crate::intersect;
use crate::shading;
use crate::stats::{RenderProgress, RenderStats};
use crate::triangles::TriangleSet;

/// Default tile edge in pixels.
pub const DEFAULT_CHUNK_SIZE: u32 = 32;

/// Everything a render pass needs to know besides the scene.
#[derive(Clone, Debug)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    /// Framebuffer channels: 1, 3 or 4
    pub channels: u32,
    /// Rounded to the nearest perfect square on renderer construction
    pub samples_per_pixel: u32,
    pub chunk_size: u32,
    pub thread_count: usize,
    /// Seed for lens jitter; passes with equal seeds produce equal
    /// images
    pub seed: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 450,
            channels: 3,
            samples_per_pixel: 1,
            chunk_size: DEFAULT_CHUNK_SIZE,
            thread_count: thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            seed: 0,
        }
    }
}

/// Reasons a render pass cannot start or finish.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("scene contains no triangles")]
    EmptyScene,

    #[error("scene has no camera")]
    NoCamera,

    #[error("thread count must be at least one")]
    ZeroThreads,

    #[error("chunk size must be at least one pixel")]
    ZeroChunkSize,

    #[error("unsupported channel count {0} (expected 1, 3 or 4)")]
    UnsupportedChannelCount(u32),

    #[error("framebuffer dimensions must be nonzero")]
    EmptyFramebuffer,

    #[error("framebuffer is {actual:?} but settings require {expected:?}")]
    FramebufferMismatch {
        expected: (u32, u32, u32),
        actual: (u32, u32, u32),
    },

    #[error("a render pass is already running")]
    RenderInProgress,

    #[error("a render worker panicked")]
    WorkerPanicked,
}

/// Lifecycle of the renderer across passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum RenderState {
    Idle = 0,
    Rendering = 1,
    Completed = 2,
    Stopped = 3,
}

impl RenderState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => RenderState::Rendering,
            2 => RenderState::Completed,
            3 => RenderState::Stopped,
            _ => RenderState::Idle,
        }
    }
}

/// How a pass ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    Completed,
    Stopped,
}

/// Read-only view of the scene shared by every worker for one pass.
struct PassContext<'a> {
    set: &'a TriangleSet,
    bvh: &'a Bvh,
    emitter: &'a CameraRayEmitter,
    chunks: &'a [Chunk],
    next_chunk: &'a AtomicUsize,
    stop: &'a AtomicBool,
    stats: &'a RenderStats,
    scene: &'a Scene,
    settings: &'a RenderSettings,
    /// Weight of one sample so that accumulated samples average
    sample_weight: f32,
    /// Edge length of one cell of the subpixel grid, in pixel units
    cell_size: f32,
}

/// Drives render passes over a scene into a framebuffer.
///
/// All control methods take `&self`; state, stop flag and progress are
/// atomics so a UI thread can observe and cancel a pass that another
/// thread is running.
pub struct Renderer {
    settings: RenderSettings,
    state: AtomicU8,
    stop_requested: AtomicBool,
    stats: RenderStats,
}

impl Renderer {
    /// Validate settings and build a renderer in the idle state.
    ///
    /// The sample count is rounded to the nearest perfect square so
    /// samples form a stratified subpixel grid.
    pub fn new(mut settings: RenderSettings) -> Result<Self, RenderError> {
        if settings.width == 0 || settings.height == 0 {
            return Err(RenderError::EmptyFramebuffer);
        }
        if !matches!(settings.channels, 1 | 3 | 4) {
            return Err(RenderError::UnsupportedChannelCount(settings.channels));
        }
        if settings.chunk_size == 0 {
            return Err(RenderError::ZeroChunkSize);
        }
        if settings.thread_count == 0 {
            return Err(RenderError::ZeroThreads);
        }

        let rounded = chunk::nearest_square_sample_count(settings.samples_per_pixel);
        if rounded != settings.samples_per_pixel {
            log::info!(
                "Rounding {} samples per pixel to {}",
                settings.samples_per_pixel,
                rounded
            );
            settings.samples_per_pixel = rounded;
        }

        Ok(Self {
            settings,
            state: AtomicU8::new(RenderState::Idle as u8),
            stop_requested: AtomicBool::new(false),
            stats: RenderStats::new(),
        })
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Allocate a framebuffer matching the render settings.
    pub fn create_framebuffer(&self) -> Result<Framebuffer, RenderError> {
        Framebuffer::new(self.settings.width, self.settings.height, self.settings.channels)
    }

    pub fn state(&self) -> RenderState {
        RenderState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Progress of the pass in flight (or the last finished pass).
    pub fn progress(&self) -> RenderProgress {
        self.stats.snapshot()
    }

    /// Ask the running pass to stop. Workers observe the flag between
    /// chunks, so the pass ends after at most one chunk per worker. A
    /// request made with no pass running cancels the next pass instead.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Whether a pass over this scene could start right now.
    pub fn is_ready_to_render(&self, scene: &Scene) -> bool {
        self.state() != RenderState::Rendering
            && scene.camera.is_some()
            && scene.triangle_count() > 0
    }

    /// Render one pass of the scene into the framebuffer.
    ///
    /// Blocks until the pass completes or a stop request is observed.
    /// On error the framebuffer is left untouched. The stop flag is
    /// consumed by the pass, whichever way it ends.
    pub fn render_pass(
        &self,
        scene: &Scene,
        framebuffer: &mut Framebuffer,
    ) -> Result<RenderOutcome, RenderError> {
        let previous = self.state.load(Ordering::Acquire);
        if previous == RenderState::Rendering as u8
            || self
                .state
                .compare_exchange(
                    previous,
                    RenderState::Rendering as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_err()
        {
            return Err(RenderError::RenderInProgress);
        }

        match self.render_pass_inner(scene, framebuffer) {
            Ok(outcome) => {
                let state = match outcome {
                    RenderOutcome::Completed => RenderState::Completed,
                    RenderOutcome::Stopped => RenderState::Stopped,
                };
                self.state.store(state as u8, Ordering::Release);
                self.stop_requested.store(false, Ordering::Release);
                Ok(outcome)
            }
            Err(err) => {
                self.state.store(previous, Ordering::Release);
                Err(err)
            }
        }
    }

    fn render_pass_inner(
        &self,
        scene: &Scene,
        framebuffer: &mut Framebuffer,
    ) -> Result<RenderOutcome, RenderError> {
        let camera = scene.camera.as_ref().ok_or(RenderError::NoCamera)?;

        let expected = (self.settings.width, self.settings.height, self.settings.channels);
        let actual = (framebuffer.width(), framebuffer.height(), framebuffer.channels());
        if expected != actual {
            return Err(RenderError::FramebufferMismatch { expected, actual });
        }

        let started = Instant::now();
        let set = TriangleSet::build(scene);
        if set.is_empty() {
            return Err(RenderError::EmptyScene);
        }
        let bvh = Bvh::build(&set);
        log::info!(
            "Prepared {} triangles in {:.1} ms",
            set.len(),
            started.elapsed().as_secs_f64() * 1e3
        );

        let emitter = CameraRayEmitter::new(RayEmitterParameters::from_camera(
            camera,
            self.settings.width,
            self.settings.height,
        ));

        let chunks = chunk::generate_chunks(
            self.settings.width,
            self.settings.height,
            self.settings.chunk_size,
            self.settings.samples_per_pixel,
        );
        self.stats.begin_pass(chunks.len());

        framebuffer.clear();
        let buffers = framebuffer.create_thread_buffers(self.settings.thread_count);

        let grid = (self.settings.samples_per_pixel as f32).sqrt();
        let next_chunk = AtomicUsize::new(0);
        let ctx = PassContext {
            set: &set,
            bvh: &bvh,
            emitter: &emitter,
            chunks: &chunks,
            next_chunk: &next_chunk,
            stop: &self.stop_requested,
            stats: &self.stats,
            scene,
            settings: &self.settings,
            sample_weight: 1.0 / self.settings.samples_per_pixel as f32,
            cell_size: 1.0 / grid,
        };

        let buffers = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(buffers.len());
            for buffer in buffers {
                let ctx = &ctx;
                handles.push(scope.spawn(move || worker_loop(ctx, buffer)));
            }

            let mut merged = Vec::with_capacity(handles.len());
            for handle in handles {
                match handle.join() {
                    Ok(buffer) => merged.push(buffer),
                    Err(_) => return Err(RenderError::WorkerPanicked),
                }
            }
            Ok(merged)
        })?;

        framebuffer.merge_thread_buffers(&buffers);

        let outcome = if self.is_stop_requested() {
            RenderOutcome::Stopped
        } else {
            RenderOutcome::Completed
        };
        let progress = self.stats.snapshot();
        log::info!(
            "Pass {:?} after {:.2} s ({}/{} chunks, {} clamped pixels)",
            outcome,
            progress.elapsed.as_secs_f64(),
            progress.completed_chunks,
            progress.total_chunks,
            progress.clamped_pixels
        );
        Ok(outcome)
    }
}

/// One worker: claim chunks until the list runs out or a stop request
/// is seen, then hand the accumulation buffer back.
fn worker_loop(ctx: &PassContext<'_>, mut buffer: ThreadBuffer) -> ThreadBuffer {
    loop {
        if ctx.stop.load(Ordering::Acquire) {
            break;
        }

        let index = ctx.next_chunk.fetch_add(1, Ordering::Relaxed);
        if index >= ctx.chunks.len() {
            break;
        }
        ctx.stats.note_claimed(index);

        // Seeding per chunk (not per worker) keeps the image
        // independent of which thread rendered which chunk
        let mut rng = StdRng::seed_from_u64(
            ctx.settings
                .seed
                .wrapping_add((index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)),
        );
        render_chunk(ctx, &ctx.chunks[index], &mut buffer, &mut rng);
        ctx.stats.note_completed();
    }
    buffer
}

fn render_chunk(ctx: &PassContext<'_>, chunk: &Chunk, buffer: &mut ThreadBuffer, rng: &mut StdRng) {
    let (sx, sy) = chunk.subpixel;
    // Sample at the center of this chunk's cell of the subpixel grid
    let offset_x = (sx as f32 + 0.5) * ctx.cell_size;
    let offset_y = (sy as f32 + 0.5) * ctx.cell_size;
    let inv_width = 1.0 / ctx.settings.width as f32;
    let inv_height = 1.0 / ctx.settings.height as f32;

    for y in chunk.y..chunk.y + chunk.height {
        for x in chunk.x..chunk.x + chunk.width {
            let u = (x as f32 + offset_x) * inv_width;
            let v = (y as f32 + offset_y) * inv_height;

            let ray = ctx.emitter.emit(u, v, rng);
            let color = trace(ctx, &ray);
            let (color, clamped) = shading::sanitize(color, ctx.scene.background);
            if clamped {
                ctx.stats.note_clamped_pixel();
            }

            buffer.accumulate(x, y, color.extend(1.0), ctx.sample_weight);
        }
    }
}

/// Nearest hit, attribute resolution, normal mapping, direct lighting.
fn trace(ctx: &PassContext<'_>, ray: &Ray) -> Vec3 {
    let hit = match ctx.bvh.intersect_nearest(ray, ctx.set, f32::INFINITY) {
        Some(hit) => hit,
        None => return ctx.scene.environment(ray.direction),
    };

    let triangle = &ctx.set.triangles[hit.triangle as usize];
    let mut info =
        intersect::hit_info_from_barycentric(ray, triangle, hit.distance, hit.barycentric);

    if let Some(material) = ctx.set.material(info.material) {
        if let Some(sample) = material.normal_sample(info.uv) {
            intersect::perturb_normal(&mut info, sample);
        }
    }

    shading::shade(&info, -ray.direction, ctx.set, ctx.bvh, &ctx.scene.lights)
}
