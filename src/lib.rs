//! mipview is the render pipeline behind an image viewer widget.
//!
//! Each render request walks the same path:
//!
//! - Pick the mip level and the tile-aligned texture rect for the current zoom
//! - Consult the frame cache through a [`FrameCacheGate`]
//! - Pull the region from the [`UpstreamRenderer`] and convert it to display pixels in parallel
//! - Hand the finished tile to the thread owning the graphics context
#![forbid(unsafe_code)]

mod foundation;

pub mod cache;
pub mod color;
pub mod display;
pub mod geometry;
/// Pixel conversion and buffers.
pub mod render;
/// Viewer instance, options and render state.
pub mod viewer;

pub use crate::foundation::abort::AbortHandle;
pub use crate::foundation::core::{RectI, SequenceTime, ViewIndex};
pub use crate::foundation::error::{ViewerError, ViewerResult};

pub use crate::cache::gate::{BypassReason, CacheDecision, FrameCacheGate, Reservation};
pub use crate::cache::key::{CacheKey, Exposure, KeyFingerprint};
pub use crate::cache::store::{
    CacheEntry, CacheEvent, CacheObserver, CacheStats, CacheStore, InMemoryCacheOpts,
    InMemoryFrameCache,
};
pub use crate::color::lut::{ColorSpace, Lut};
pub use crate::display::handoff::{DisplaySyncHandoff, HandoffReport};
pub use crate::display::surface::{
    BitDepth, DisplaySurface, HeadlessSettings, HeadlessSurface, UploadRecord,
};
pub use crate::geometry::mip::{TextureRect, TileSelection, select_tile};
pub use crate::render::buffer::{DisplayBuffer, PixelFormat, TileBuffer};
pub use crate::render::pixel::{
    CenteredPhase, DisplayChannels, FixedPhase, JitteredPhase, PhaseStrategy,
};
pub use crate::render::source::{RenderRequest, SourceImage, UpstreamRenderer};
pub use crate::viewer::config::{PhaseMode, ViewerOpts};
pub use crate::viewer::instance::{RefreshAction, RenderStatus, RerenderHook, ViewerInstance};
pub use crate::viewer::state::{RenderArgs, ViewerRenderState};
