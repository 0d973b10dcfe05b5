use crate::color::lut::ColorSpace;
use crate::foundation::core::RectI;
use crate::render::buffer::{DisplayBuffer, TileBuffer};
use crate::render::pixel::DisplayChannels;
use crate::render::source::SourceImage;
use std::sync::{Arc, Mutex, MutexGuard};

/// Render parameters snapshotted once at the start of every render.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderArgs {
    pub exposure: f64,
    pub color_space: ColorSpace,
    pub channels: DisplayChannels,
    /// User-defined sub-region; `Some` means the region is enabled.
    pub user_region: Option<RectI>,
}

impl Default for RenderArgs {
    fn default() -> Self {
        Self {
            exposure: 1.0,
            color_space: ColorSpace::Srgb,
            channels: DisplayChannels::Rgba,
            user_region: None,
        }
    }
}

/// Everything guarded by the render-arguments lock.
#[derive(Debug, Default)]
pub(crate) struct ArgsSlot {
    pub(crate) args: RenderArgs,
    /// Frame currently shown by the display.
    pub(crate) display: Option<DisplayBuffer>,
    /// Reclaimed allocation reused by the next uncached render.
    pub(crate) scratch: Option<TileBuffer>,
    pub(crate) last_rendered: Option<Arc<SourceImage>>,
}

impl ArgsSlot {
    /// Show `next`; the previous frame's allocation is kept for reuse when the viewer owned it.
    pub(crate) fn replace_display(&mut self, next: DisplayBuffer) {
        if let Some(prev) = self.display.replace(next)
            && let Some(buf) = prev.into_recyclable()
        {
            self.scratch = Some(buf);
        }
    }
}

/// Viewer-owned mutable state behind two independent locks.
///
/// Render parameters and buffers share one lock, held by a render while it converts pixels.
/// The force-refresh flag has its own lock so it can be raised from outside while a render is in
/// flight.
#[derive(Debug, Default)]
pub struct ViewerRenderState {
    args: Mutex<ArgsSlot>,
    force_refresh: Mutex<bool>,
}

impl ViewerRenderState {
    pub fn new(args: RenderArgs) -> Self {
        Self {
            args: Mutex::new(ArgsSlot {
                args,
                ..ArgsSlot::default()
            }),
            force_refresh: Mutex::new(false),
        }
    }

    pub fn snapshot(&self) -> RenderArgs {
        self.lock_args().args
    }

    pub fn set_exposure(&self, exposure: f64) {
        self.lock_args().args.exposure = exposure;
    }

    pub fn set_color_space(&self, space: ColorSpace) {
        self.lock_args().args.color_space = space;
    }

    pub fn set_channels(&self, channels: DisplayChannels) {
        self.lock_args().args.channels = channels;
    }

    pub fn set_user_region(&self, region: Option<RectI>) {
        self.lock_args().args.user_region = region;
    }

    /// Raise the force-refresh flag for the next render.
    pub fn request_force_refresh(&self) {
        *self.lock_flag() = true;
    }

    /// Read and clear the force-refresh flag in one step.
    pub fn take_force_refresh(&self) -> bool {
        std::mem::take(&mut *self.lock_flag())
    }

    /// Source image of the last successful upstream render.
    pub fn last_rendered(&self) -> Option<Arc<SourceImage>> {
        self.lock_args().last_rendered.clone()
    }

    /// Frame currently shown.
    pub fn display_buffer(&self) -> Option<DisplayBuffer> {
        self.lock_args().display.clone()
    }

    pub(crate) fn lock_args(&self) -> MutexGuard<'_, ArgsSlot> {
        self.args.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_flag(&self) -> MutexGuard<'_, bool> {
        self.force_refresh.lock().unwrap_or_else(|e| e.into_inner())
    }
}
