//! The picture-in-picture render loop.
//!
//! [`PipRenderer`] owns the live [`PipConfig`], a destination [`Canvas2d`], a
//! [`VideoSource`] and a [`FrameScheduler`]. `start_rendering` requests a
//! frame; the host hands every due [`FrameHandle`] back through
//! [`PipRenderer::on_frame`], which paints and requests the next one. Only
//! the most recently requested handle is honoured, so a restart can never
//! leave two loops running.
//!
//! The renderer assumes it is the only writer to its surface.

use crate::canvas::Canvas2d;
use crate::compositor::{FrameCompositor, FrameOutcome};
use crate::error::{Error, Result};
use crate::geometry::compute_inset;
use crate::scheduler::{Clock, FrameHandle, FrameScheduler, SystemClock};
use crate::stats::{FrameStats, PerformanceStats};
use crate::types::{clamp_size, InsetGeometry, PipConfig, PipConfigPatch, PipPosition, PipStyle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderState {
    Idle,
    Running,
}

/// A requested value the renderer replaced with a valid one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConfigAdjustment {
    SizeClamped { requested: f32, applied: f32 },
}

type AdjustmentHook = Box<dyn FnMut(ConfigAdjustment)>;

pub struct PipRenderer<C, V, S, K = SystemClock> {
    canvas: Option<C>,
    video: Option<V>,
    scheduler: S,
    clock: K,
    compositor: FrameCompositor,
    config: PipConfig,
    geometry: InsetGeometry,
    state: RenderState,
    pending: Option<FrameHandle>,
    stats: FrameStats,
    last_outcome: Option<FrameOutcome>,
    on_adjust: Option<AdjustmentHook>,
}

impl<C, V, S> PipRenderer<C, V, S, SystemClock>
where
    C: Canvas2d,
    V: crate::video::VideoSource,
    S: FrameScheduler,
{
    pub fn new(canvas: C, video: V, scheduler: S) -> Result<Self> {
        Self::with_clock(canvas, video, scheduler, SystemClock)
    }
}

impl<C, V, S, K> PipRenderer<C, V, S, K>
where
    C: Canvas2d,
    V: crate::video::VideoSource,
    S: FrameScheduler,
    K: Clock,
{
    /// Bind a renderer to its surface and source. A zero-sized surface is fatal.
    pub fn with_clock(canvas: C, video: V, scheduler: S, clock: K) -> Result<Self> {
        let (w, h) = (canvas.width(), canvas.height());
        if w == 0 || h == 0 {
            return Err(Error::surface(format!("cannot render PiP into a {w}x{h} surface")));
        }
        let config = PipConfig::default();
        let geometry =
            compute_inset(config.position, config.size, config.style, w as f32, h as f32);
        Ok(Self {
            canvas: Some(canvas),
            video: Some(video),
            scheduler,
            clock,
            compositor: FrameCompositor::default(),
            config,
            geometry,
            state: RenderState::Idle,
            pending: None,
            stats: FrameStats::new(),
            last_outcome: None,
            on_adjust: None,
        })
    }

    /// Replace the placeholder compositor (e.g. to change its label).
    pub fn with_compositor(mut self, compositor: FrameCompositor) -> Self {
        self.compositor = compositor;
        self
    }

    /// Be told whenever a requested value is replaced. Clamping happens either way.
    pub fn set_adjustment_hook(&mut self, hook: impl FnMut(ConfigAdjustment) + 'static) {
        self.on_adjust = Some(Box::new(hook));
    }

    /// Begin the per-frame loop, restarting it if it is already running.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn start_rendering(&mut self, patch: PipConfigPatch) -> Result<()> {
        if self.is_destroyed() {
            return Err(Error::Destroyed);
        }
        if self.state == RenderState::Running {
            self.stop_rendering();
        }
        self.apply_patch(&patch);
        self.stats.reset(self.clock.now());
        self.state = RenderState::Running;
        self.pending = Some(self.scheduler.request_frame());
        tracing::debug!(config = ?self.config, "pip rendering started");
        Ok(())
    }

    /// Halt the loop. Calling it while idle does nothing.
    pub fn stop_rendering(&mut self) {
        if self.state == RenderState::Idle {
            return;
        }
        self.state = RenderState::Idle;
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel_frame(handle);
        }
        tracing::debug!("pip rendering stopped");
    }

    /// Run one scheduled frame. Returns false for stale, cancelled or idle callbacks.
    pub fn on_frame(&mut self, handle: FrameHandle) -> bool {
        if self.state != RenderState::Running || self.pending != Some(handle) {
            tracing::trace!(?handle, "ignoring stale frame callback");
            return false;
        }
        self.pending = None;

        let (Some(canvas), Some(video)) = (self.canvas.as_mut(), self.video.as_ref()) else {
            return false;
        };

        let started = self.clock.now();
        self.geometry = compute_inset(
            self.config.position,
            self.config.size,
            self.config.style,
            canvas.width() as f32,
            canvas.height() as f32,
        );
        let outcome = self.compositor.composite(canvas, video, &self.config, &self.geometry);
        let finished = self.clock.now();

        if self.last_outcome != Some(outcome) {
            tracing::debug!(?outcome, "inset content changed");
        }
        self.last_outcome = Some(outcome);
        self.stats.record(finished.saturating_duration_since(started), finished);

        self.pending = Some(self.scheduler.request_frame());
        true
    }

    /// Overwrite the fields present in `patch`; visible from the next frame.
    pub fn update_config(&mut self, patch: PipConfigPatch) {
        self.apply_patch(&patch);
    }

    pub fn set_position(&mut self, position: PipPosition) {
        self.config.position = position;
        self.recalculate();
    }

    /// Returns the size actually applied after clamping.
    pub fn set_size(&mut self, size: f32) -> f32 {
        self.config.size = self.clamp_and_report(size);
        self.recalculate();
        self.config.size
    }

    pub fn set_style(&mut self, style: PipStyle) {
        self.config.style = style;
        self.recalculate();
    }

    pub fn performance_stats(&self) -> PerformanceStats {
        self.stats.snapshot()
    }

    /// Stop the loop and let go of the surface and the video source.
    pub fn destroy(&mut self) {
        self.stop_rendering();
        self.canvas = None;
        self.video = None;
        tracing::debug!("pip renderer destroyed");
    }

    pub fn config(&self) -> &PipConfig {
        &self.config
    }

    pub fn geometry(&self) -> &InsetGeometry {
        &self.geometry
    }

    pub fn is_rendering(&self) -> bool {
        self.state == RenderState::Running
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn is_destroyed(&self) -> bool {
        self.canvas.is_none()
    }

    /// Which content the last painted frame showed in the inset.
    pub fn last_outcome(&self) -> Option<FrameOutcome> {
        self.last_outcome
    }

    pub fn canvas(&self) -> Option<&C> {
        self.canvas.as_ref()
    }

    pub fn video(&self) -> Option<&V> {
        self.video.as_ref()
    }

    /// Mutable access to the source, e.g. to pull a fresh camera frame between frames.
    pub fn video_mut(&mut self) -> Option<&mut V> {
        self.video.as_mut()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    fn apply_patch(&mut self, patch: &PipConfigPatch) {
        let mut patch = *patch;
        if let Some(size) = patch.size {
            patch.size = Some(self.clamp_and_report(size));
        }
        self.config.apply(&patch);
        self.recalculate();
    }

    fn clamp_and_report(&mut self, requested: f32) -> f32 {
        let applied = clamp_size(requested);
        if applied != requested {
            tracing::debug!(requested, applied, "pip size clamped");
            if let Some(hook) = self.on_adjust.as_mut() {
                hook(ConfigAdjustment::SizeClamped { requested, applied });
            }
        }
        applied
    }

    fn recalculate(&mut self) {
        if let Some(canvas) = &self.canvas {
            self.geometry = compute_inset(
                self.config.position,
                self.config.size,
                self.config.style,
                canvas.width() as f32,
                canvas.height() as f32,
            );
        }
    }
}
