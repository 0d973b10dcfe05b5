use crate::foundation::core::{RectI, ViewIndex};
use crate::geometry::mip::TextureRect;
use crate::render::buffer::PixelFormat;
use std::sync::{Mutex, MutexGuard};
use std::thread::ThreadId;

/// Texture storage selected by the display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitDepth {
    /// 8-bit display-encoded texture.
    #[default]
    Byte,
    /// Half float; converted on the float path.
    HalfFloat,
    /// 32-bit linear float texture.
    Float,
}

impl BitDepth {
    /// Stable numeric id used in cache keys.
    pub fn id(self) -> u8 {
        match self {
            Self::Byte => 0,
            Self::HalfFloat => 1,
            Self::Float => 2,
        }
    }

    /// Tile layout rendered for this depth.
    pub fn pixel_format(self) -> PixelFormat {
        match self {
            Self::Byte => PixelFormat::Bgra8,
            Self::HalfFloat | Self::Float => PixelFormat::RgbaF32,
        }
    }
}

/// Viewer widget owning the graphics context.
///
/// Upload, probe and redraw calls are made from the context-owning thread only; the query
/// methods may be called from the render thread.
pub trait DisplaySurface: Send + Sync {
    /// Copy `byte_count` bytes of `bytes` into the texture slot `buffer_index`.
    fn upload_region(
        &self,
        bytes: &[u8],
        byte_count: usize,
        texture: &TextureRect,
        buffer_index: usize,
    );

    /// Refresh the cached color under the pixel probe.
    fn refresh_pixel_probe(&self);

    /// Schedule a repaint.
    fn request_redraw(&self);

    fn current_zoom(&self) -> f64;

    /// Part of `rod` currently visible in the viewport.
    fn visible_region(&self, rod: RectI) -> RectI;

    fn bit_depth(&self) -> BitDepth;

    /// Whether exposure and color space can be applied by the display shader.
    fn shader_color_management_supported(&self) -> bool;

    fn current_view(&self) -> ViewIndex {
        0
    }

    /// Adjust the zoom so `rod` fills the viewport.
    fn fit_to_region(&self, _rod: RectI) {}

    /// Told the input's region of definition on every render.
    fn set_region_of_definition(&self, _rod: RectI) {}
}

/// One recorded [`DisplaySurface::upload_region`] call.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadRecord {
    pub texture: TextureRect,
    pub buffer_index: usize,
    pub byte_count: usize,
    pub bytes: Vec<u8>,
    pub thread: ThreadId,
}

/// Mutable settings of a [`HeadlessSurface`].
#[derive(Clone, Debug, PartialEq)]
pub struct HeadlessSettings {
    pub zoom: f64,
    pub bit_depth: BitDepth,
    pub shader_color_management: bool,
    pub view: ViewIndex,
    /// Restricts the visible region when set; otherwise the whole rod is visible.
    pub viewport: Option<RectI>,
    /// Viewport size in screen pixels, used by `fit_to_region`.
    pub viewport_size: (u32, u32),
}

impl Default for HeadlessSettings {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            bit_depth: BitDepth::Byte,
            shader_color_management: false,
            view: 0,
            viewport: None,
            viewport_size: (1920, 1080),
        }
    }
}

#[derive(Debug, Default)]
struct HeadlessLog {
    uploads: Vec<UploadRecord>,
    redraws: u64,
    probe_refreshes: u64,
    rod: Option<RectI>,
}

/// Display surface without a window, for tests, tools and debugging.
///
/// Records every upload and counts redraws and probe refreshes.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    settings: Mutex<HeadlessSettings>,
    log: Mutex<HeadlessLog>,
}

impl HeadlessSurface {
    pub fn new(settings: HeadlessSettings) -> Self {
        Self {
            settings: Mutex::new(settings),
            log: Mutex::new(HeadlessLog::default()),
        }
    }

    /// Change settings in place.
    pub fn configure(&self, f: impl FnOnce(&mut HeadlessSettings)) {
        f(&mut lock(&self.settings));
    }

    pub fn settings(&self) -> HeadlessSettings {
        lock(&self.settings).clone()
    }

    pub fn uploads(&self) -> Vec<UploadRecord> {
        lock(&self.log).uploads.clone()
    }

    pub fn last_upload(&self) -> Option<UploadRecord> {
        lock(&self.log).uploads.last().cloned()
    }

    pub fn redraw_count(&self) -> u64 {
        lock(&self.log).redraws
    }

    pub fn probe_refresh_count(&self) -> u64 {
        lock(&self.log).probe_refreshes
    }

    /// Last region of definition reported by the viewer.
    pub fn region_of_definition(&self) -> Option<RectI> {
        lock(&self.log).rod
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl DisplaySurface for HeadlessSurface {
    fn upload_region(
        &self,
        bytes: &[u8],
        byte_count: usize,
        texture: &TextureRect,
        buffer_index: usize,
    ) {
        let n = byte_count.min(bytes.len());
        lock(&self.log).uploads.push(UploadRecord {
            texture: *texture,
            buffer_index,
            byte_count,
            bytes: bytes[..n].to_vec(),
            thread: std::thread::current().id(),
        });
    }

    fn refresh_pixel_probe(&self) {
        lock(&self.log).probe_refreshes += 1;
    }

    fn request_redraw(&self) {
        lock(&self.log).redraws += 1;
    }

    fn current_zoom(&self) -> f64 {
        lock(&self.settings).zoom
    }

    fn visible_region(&self, rod: RectI) -> RectI {
        match lock(&self.settings).viewport {
            Some(v) => v.intersect(rod).unwrap_or_default(),
            None => rod,
        }
    }

    fn bit_depth(&self) -> BitDepth {
        lock(&self.settings).bit_depth
    }

    fn shader_color_management_supported(&self) -> bool {
        lock(&self.settings).shader_color_management
    }

    fn current_view(&self) -> ViewIndex {
        lock(&self.settings).view
    }

    fn fit_to_region(&self, rod: RectI) {
        if rod.is_empty() {
            return;
        }
        let mut s = lock(&self.settings);
        let (vw, vh) = s.viewport_size;
        let zx = f64::from(vw) / f64::from(rod.width());
        let zy = f64::from(vh) / f64::from(rod.height());
        s.zoom = zx.min(zy);
        s.viewport = None;
    }

    fn set_region_of_definition(&self, rod: RectI) {
        lock(&self.log).rod = Some(rod);
    }
}
