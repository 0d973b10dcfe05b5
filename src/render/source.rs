use crate::foundation::core::{RectI, SequenceTime, ViewIndex};
use crate::foundation::error::{ViewerError, ViewerResult};
use std::sync::Arc;

/// Read-only RGBA 32-bit float image produced by the upstream graph.
///
/// Rows are stored bottom-up from `bounds.y1`, pixels interleaved `R,G,B,A`.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceImage {
    bounds: RectI,
    data: Vec<f32>,
}

impl SourceImage {
    /// Wrap interleaved RGBA samples covering `bounds`.
    pub fn new(bounds: RectI, data: Vec<f32>) -> ViewerResult<Self> {
        let expected = (bounds.width() as usize)
            .saturating_mul(bounds.height() as usize)
            .saturating_mul(4);
        if data.len() != expected {
            return Err(ViewerError::validation(format!(
                "source image data has {} samples, expected {expected}",
                data.len()
            )));
        }
        Ok(Self { bounds, data })
    }

    /// Build an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(bounds: RectI, mut f: impl FnMut(i32, i32) -> [f32; 4]) -> Self {
        let mut data =
            Vec::with_capacity((bounds.width() as usize) * (bounds.height() as usize) * 4);
        for y in bounds.y1..bounds.y2 {
            for x in bounds.x1..bounds.x2 {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self { bounds, data }
    }

    /// Pixel extent of the image.
    pub fn bounds(&self) -> RectI {
        self.bounds
    }

    /// One pixel, or `None` outside the bounds.
    pub fn pixel(&self, x: i32, y: i32) -> Option<[f32; 4]> {
        let s = self.row_span(y, x, x + 1)?;
        Some([s[0], s[1], s[2], s[3]])
    }

    /// Samples of row `y` from column `x1` up to `x2` (exclusive), clamped to the bounds on the
    /// right. `None` if the row or `x1` is outside the image.
    pub fn row_span(&self, y: i32, x1: i32, x2: i32) -> Option<&[f32]> {
        if !self.bounds.contains(x1, y) {
            return None;
        }
        let w = self.bounds.width() as usize;
        let row = (y - self.bounds.y1) as usize;
        let start = (x1 - self.bounds.x1) as usize;
        let end = (x2.min(self.bounds.x2) - self.bounds.x1).max(x1 - self.bounds.x1) as usize;
        let base = row * w * 4;
        self.data.get(base + start * 4..base + end * 4)
    }
}

/// Parameters of one upstream render call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderRequest {
    pub time: SequenceTime,
    /// Render scale; the viewer always requests full resolution.
    pub scale: f64,
    pub view: ViewIndex,
    /// Source-resolution region that must be covered.
    pub region: RectI,
    /// Ask the graph to bypass its own caches.
    pub bypass_cache: bool,
}

/// Upstream node-graph evaluator feeding the viewer.
///
/// Implementations own the lifetime of the images they return; the viewer only keeps shared
/// references.
pub trait UpstreamRenderer: Send + Sync {
    /// Region of definition of the active input at `time`, or `None` when there is no input or
    /// it cannot be determined.
    fn region_of_definition(&self, time: SequenceTime) -> Option<RectI>;

    /// Content hash of the upstream graph; any parameter change must change it.
    fn graph_hash(&self) -> u64;

    /// Render `req.region`. `None` means failure or cancellation, never an empty image.
    fn render(&self, req: &RenderRequest) -> Option<Arc<SourceImage>>;

    /// Return `false` when the viewer has no connected input.
    fn is_connected(&self) -> bool {
        true
    }

    /// Progress notification around the render of the active input. Fire-and-forget.
    fn notify_input_rendering(&self, _started: bool) {}
}
