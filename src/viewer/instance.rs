use crate::cache::gate::{CacheDecision, FrameCacheGate};
use crate::cache::key::{CacheKey, Exposure};
use crate::cache::store::CacheStore;
use crate::color::lut::ColorSpace;
use crate::display::handoff::DisplaySyncHandoff;
use crate::display::surface::{BitDepth, DisplaySurface};
use crate::foundation::abort::AbortHandle;
use crate::foundation::core::{RectI, SequenceTime};
use crate::foundation::error::{ViewerError, ViewerResult};
use crate::geometry::mip::{TileSelection, select_tile};
use crate::render::buffer::{DisplayBuffer, TileBuffer};
use crate::render::convert::{ConvertJob, convert_tile};
use crate::render::pixel::{DisplayChannels, PhaseStrategy, PixelParams};
use crate::render::source::{RenderRequest, SourceImage, UpstreamRenderer};
use crate::viewer::config::ViewerOpts;
use crate::viewer::state::ViewerRenderState;
use std::sync::{Arc, Mutex};

/// Result of one viewer render request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderStatus {
    /// Frame displayed, found in cache, or nothing to render.
    Ok,
    /// No input region or upstream failure; prior display content is untouched.
    Failed,
    /// Cancellation observed at a checkpoint.
    Aborted,
}

/// How a display-parameter change is propagated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshAction {
    /// The display shader applies the change; only a repaint was requested.
    RedrawOnly,
    /// Pixels must be recomputed; the re-render hook was invoked.
    Rerender,
}

/// Callback asking the render scheduler for a new render cycle.
pub type RerenderHook = Arc<dyn Fn() + Send + Sync>;

/// Viewer render pipeline for one viewer widget.
///
/// `render` is meant to run on a worker thread, never on the thread owning the graphics context.
pub struct ViewerInstance {
    opts: ViewerOpts,
    upstream: Arc<dyn UpstreamRenderer>,
    surface: Arc<dyn DisplaySurface>,
    gate: FrameCacheGate,
    handoff: DisplaySyncHandoff,
    pool: rayon::ThreadPool,
    phase: Arc<dyn PhaseStrategy>,
    state: ViewerRenderState,
    abort: AbortHandle,
    rerender_hook: Mutex<Option<RerenderHook>>,
}

impl ViewerInstance {
    /// Build a viewer and start its display owner thread and conversion pool.
    pub fn new(
        opts: ViewerOpts,
        upstream: Arc<dyn UpstreamRenderer>,
        surface: Arc<dyn DisplaySurface>,
        cache: Arc<dyn CacheStore>,
    ) -> ViewerResult<Self> {
        opts.validate()?;
        let pool = build_thread_pool(opts.threads)?;
        let handoff = DisplaySyncHandoff::spawn(Arc::clone(&surface))?;
        Ok(Self {
            phase: opts.phase.strategy(),
            state: ViewerRenderState::new(opts.initial),
            opts,
            upstream,
            surface,
            gate: FrameCacheGate::new(cache),
            handoff,
            pool,
            abort: AbortHandle::new(),
            rerender_hook: Mutex::new(None),
        })
    }

    /// Replace the 8-bit decimation phase chosen by [`ViewerOpts::phase`].
    pub fn with_phase_strategy(mut self, phase: Arc<dyn PhaseStrategy>) -> Self {
        self.phase = phase;
        self
    }

    pub fn opts(&self) -> &ViewerOpts {
        &self.opts
    }

    pub fn state(&self) -> &ViewerRenderState {
        &self.state
    }

    /// Shared cancellation flag polled by renders of this viewer.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Slot the next display upload will use.
    pub fn buffer_index(&self) -> usize {
        self.handoff.buffer_index()
    }

    /// Register the callback invoked when a setter needs a new render.
    pub fn set_rerender_hook(&self, hook: RerenderHook) {
        *self.rerender_hook.lock().unwrap_or_else(|e| e.into_inner()) = Some(hook);
    }

    /// Force the next render to bypass the cache. Safe to call while a render is running.
    pub fn request_force_refresh(&self) {
        self.state.request_force_refresh();
    }

    /// Abort the in-flight render, if any.
    pub fn disconnect(&self) {
        self.abort.abort();
    }

    /// Render the frame at `time` and hand it to the display.
    ///
    /// `synchronous` converts and hands off inline on the calling thread, which must then be the
    /// graphics-context owner.
    #[tracing::instrument(skip(self))]
    pub fn render(
        &self,
        time: SequenceTime,
        force_refresh: bool,
        fit_to_viewport: bool,
        synchronous: bool,
    ) -> RenderStatus {
        match self.try_render(time, force_refresh, fit_to_viewport, synchronous) {
            Ok(()) => RenderStatus::Ok,
            Err(e) if e.is_abort() => {
                tracing::debug!(error = %e, "viewer render aborted");
                RenderStatus::Aborted
            }
            Err(e) => {
                tracing::warn!(error = %e, "viewer render failed");
                RenderStatus::Failed
            }
        }
    }

    fn try_render(
        &self,
        time: SequenceTime,
        force_refresh: bool,
        fit_to_viewport: bool,
        synchronous: bool,
    ) -> ViewerResult<()> {
        if force_refresh {
            self.state.request_force_refresh();
        }
        let mut zoom = self.surface.current_zoom();
        self.checkpoint("before region of definition")?;

        let rod = self
            .upstream
            .region_of_definition(time)
            .ok_or_else(|| ViewerError::region_unavailable("no active input region of definition"))?
            .clip_infinite_to(self.opts.project_format);
        if fit_to_viewport {
            self.surface.fit_to_region(rod);
            zoom = self.surface.current_zoom();
        }
        self.surface.set_region_of_definition(rod);
        let display_window = if self.opts.clip_to_project_window {
            self.opts.project_format
        } else {
            rod
        };

        let visible = self.surface.visible_region(rod);
        let Some(sel) = select_tile(rod, visible, zoom, self.opts.tile_size_pow2)? else {
            tracing::debug!(?rod, ?visible, "degenerate tile, nothing to render");
            return Ok(());
        };

        let args = self.state.snapshot();
        let bit_depth = self.surface.bit_depth();
        let view = if self.opts.views_count > 0 {
            self.surface.current_view()
        } else {
            0
        };
        let key = CacheKey {
            time,
            graph_hash: self.upstream.graph_hash(),
            exposure: Exposure::from(args.exposure),
            color_space: args.color_space,
            bit_depth,
            channels: args.channels,
            view,
            rod,
            display_window,
            texture: sel.texture,
        };

        let force = self.state.take_force_refresh();
        let decision = self.gate.decide(key, force, args.user_region.is_some());
        let bypass_cache = decision.bypass_upstream_cache();
        let reservation = match decision {
            CacheDecision::Hit(entry) => {
                return self.present(DisplayBuffer::Cached(entry), synchronous);
            }
            CacheDecision::Miss(r) => Some(r),
            CacheDecision::Bypass(_) => None,
        };

        let mut region = sel.texture.rect();
        if let Some(user) = args.user_region {
            match region.intersect(user) {
                Some(r) => region = r,
                None => return Ok(()),
            }
        }

        self.upstream.notify_input_rendering(true);
        let image = self.upstream.render(&RenderRequest {
            time,
            scale: 1.0,
            view,
            region,
            bypass_cache,
        });
        self.upstream.notify_input_rendering(false);
        let image = image.ok_or_else(|| {
            ViewerError::upstream(format!("no image for region {region:?} at time {time}"))
        })?;
        self.checkpoint("after upstream render")?;
        self.state.lock_args().last_rendered = Some(Arc::clone(&image));

        // Exposure is left to the display shader on the float path when it can apply it.
        let exposure = if bit_depth == BitDepth::Byte
            || !self.surface.shader_color_management_supported()
        {
            args.exposure as f32
        } else {
            1.0
        };
        let params = PixelParams {
            exposure,
            channels: args.channels.map(),
            lut: args.color_space.lut(),
        };
        let buffer = self.convert(&sel, region, &image, params, bit_depth, synchronous);
        if let Err(e) = self.checkpoint("after conversion") {
            self.state.lock_args().scratch = Some(buffer);
            return Err(e);
        }

        let (frame, published) = match reservation {
            Some(r) => {
                let entry = r.publish(buffer);
                (DisplayBuffer::Cached(Arc::clone(&entry)), Some(entry))
            }
            None => (DisplayBuffer::Owned(Arc::new(buffer)), None),
        };
        let result = self.present(frame, synchronous);
        // An aborted render never leaves its result in the cache.
        if let Some(entry) = published
            && matches!(&result, Err(e) if e.is_abort())
        {
            self.gate.store().evict(&entry);
        }
        result
    }

    fn convert(
        &self,
        sel: &TileSelection,
        region: RectI,
        image: &SourceImage,
        params: PixelParams,
        bit_depth: BitDepth,
        synchronous: bool,
    ) -> TileBuffer {
        // Held for the whole conversion so no state change can swap buffers underneath it.
        let mut slot = self.state.lock_args();
        let mut buffer =
            TileBuffer::recycle(slot.scratch.take(), sel.texture, bit_depth.pixel_format());
        let job = ConvertJob {
            source: image,
            texture: sel.texture,
            region,
            params,
            phase: self.phase.as_ref(),
            abort: &self.abort,
        };
        let pool = if synchronous { None } else { Some(&self.pool) };
        convert_tile(&job, &mut buffer, pool);
        drop(slot);
        buffer
    }

    fn present(&self, frame: DisplayBuffer, synchronous: bool) -> ViewerResult<()> {
        self.checkpoint("before display handoff")?;
        let report = self.handoff.handoff(frame.clone(), &self.abort, synchronous)?;
        let mut slot = self.state.lock_args();
        if report.uploaded() {
            slot.replace_display(frame);
            Ok(())
        } else {
            if let Some(buf) = frame.into_recyclable() {
                slot.scratch = Some(buf);
            }
            Err(ViewerError::Aborted("display handoff"))
        }
    }

    fn checkpoint(&self, at: &'static str) -> ViewerResult<()> {
        if self.abort.is_aborted() {
            Err(ViewerError::Aborted(at))
        } else {
            Ok(())
        }
    }

    /// Change the exposure scalar.
    pub fn set_exposure(&self, exposure: f64) -> RefreshAction {
        self.state.set_exposure(exposure);
        self.refresh_display_params()
    }

    /// Change the display color space.
    pub fn set_color_space(&self, space: ColorSpace) -> RefreshAction {
        self.state.set_color_space(space);
        self.refresh_display_params()
    }

    /// Change the displayed channels.
    ///
    /// Channel selection happens while converting pixels on both paths, so this always asks for
    /// a re-render.
    pub fn set_channel_selection(&self, channels: DisplayChannels) -> RefreshAction {
        self.state.set_channels(channels);
        self.rerender()
    }

    /// Enable (`Some`) or disable (`None`) the user sub-region.
    pub fn set_user_region(&self, region: Option<RectI>) -> RefreshAction {
        self.state.set_user_region(region);
        self.rerender()
    }

    fn refresh_display_params(&self) -> RefreshAction {
        let shader_can_apply = self.surface.bit_depth() != BitDepth::Byte
            && self.surface.shader_color_management_supported();
        if shader_can_apply || !self.upstream.is_connected() {
            self.surface.request_redraw();
            RefreshAction::RedrawOnly
        } else {
            self.rerender()
        }
    }

    fn rerender(&self) -> RefreshAction {
        let hook = self
            .rerender_hook
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(hook) = hook {
            hook();
        }
        RefreshAction::Rerender
    }

    /// Color of the last rendered source image at `(x, y)`.
    ///
    /// The active color space is applied unless `force_linear` or none is configured. Returns
    /// `None` before the first render or outside the image.
    pub fn sample_color_at(&self, x: i32, y: i32, force_linear: bool) -> Option<[f32; 4]> {
        let (image, space) = {
            let slot = self.state.lock_args();
            (slot.last_rendered.clone()?, slot.args.color_space)
        };
        let [r, g, b, a] = image.pixel(x, y)?;
        let mut rgb = [r, g, b];
        if !force_linear && let Some(lut) = space.lut() {
            lut.to_float_rgb(&mut rgb);
        }
        Some([rgb[0], rgb[1], rgb[2], a])
    }
}

/// `threads` has already been validated by [`ViewerOpts::validate`].
fn build_thread_pool(threads: Option<usize>) -> ViewerResult<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("mipview-convert-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ViewerError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}")))
}
