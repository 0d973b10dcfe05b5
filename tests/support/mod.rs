#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use mipview::{
    AbortHandle, BitDepth, HeadlessSettings, HeadlessSurface, InMemoryCacheOpts,
    InMemoryFrameCache, PhaseMode, RectI, RenderRequest, SequenceTime, SourceImage,
    UpstreamRenderer, ViewerInstance, ViewerOpts,
};

pub type Fill = fn(i32, i32) -> [f32; 4];

/// Scripted upstream graph that records every render call.
pub struct FakeUpstream {
    pub rod: Mutex<Option<RectI>>,
    pub hash: u64,
    pub fill: Fill,
    pub fail: AtomicBool,
    pub connected: AtomicBool,
    /// Raised from inside `render`, simulating a cancel that lands mid-render.
    pub abort_during_render: Mutex<Option<AbortHandle>>,
    pub renders: AtomicUsize,
    pub requests: Mutex<Vec<RenderRequest>>,
    pub notifications: Mutex<Vec<bool>>,
}

impl FakeUpstream {
    pub fn new(rod: RectI, fill: Fill) -> Self {
        Self {
            rod: Mutex::new(Some(rod)),
            hash: 7,
            fill,
            fail: AtomicBool::new(false),
            connected: AtomicBool::new(true),
            abort_during_render: Mutex::new(None),
            renders: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            notifications: Mutex::new(Vec::new()),
        }
    }

    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RenderRequest> {
        self.requests.lock().unwrap().last().copied()
    }
}

impl UpstreamRenderer for FakeUpstream {
    fn region_of_definition(&self, _time: SequenceTime) -> Option<RectI> {
        *self.rod.lock().unwrap()
    }

    fn graph_hash(&self) -> u64 {
        self.hash
    }

    fn render(&self, req: &RenderRequest) -> Option<Arc<SourceImage>> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(*req);
        if let Some(abort) = self.abort_during_render.lock().unwrap().as_ref() {
            abort.abort();
        }
        if self.fail.load(Ordering::SeqCst) {
            return None;
        }
        Some(Arc::new(SourceImage::from_fn(req.region, self.fill)))
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn notify_input_rendering(&self, started: bool) {
        self.notifications.lock().unwrap().push(started);
    }
}

pub fn red(_x: i32, _y: i32) -> [f32; 4] {
    [1.0, 0.0, 0.0, 1.0]
}

pub fn ramp(x: i32, y: i32) -> [f32; 4] {
    [x as f32 / 64.0, y as f32 / 64.0, 0.25, 0.5]
}

pub struct Rig {
    pub upstream: Arc<FakeUpstream>,
    pub surface: Arc<HeadlessSurface>,
    pub cache: Arc<InMemoryFrameCache>,
    pub viewer: ViewerInstance,
}

pub fn rig(rod: RectI, fill: Fill) -> Rig {
    rig_with(rod, fill, HeadlessSettings::default())
}

pub fn rig_with(rod: RectI, fill: Fill, settings: HeadlessSettings) -> Rig {
    let opts = ViewerOpts {
        tile_size_pow2: 4,
        threads: Some(3),
        phase: PhaseMode::Fixed { column: 0 },
        ..ViewerOpts::default()
    };
    rig_opts(rod, fill, settings, opts)
}

pub fn rig_opts(rod: RectI, fill: Fill, settings: HeadlessSettings, opts: ViewerOpts) -> Rig {
    let upstream = Arc::new(FakeUpstream::new(rod, fill));
    let surface = Arc::new(HeadlessSurface::new(settings));
    let cache = Arc::new(InMemoryFrameCache::new(InMemoryCacheOpts::default()));
    let viewer = ViewerInstance::new(opts, upstream.clone(), surface.clone(), cache.clone())
        .unwrap();
    Rig {
        upstream,
        surface,
        cache,
        viewer,
    }
}

pub fn float_settings(shader: bool) -> HeadlessSettings {
    HeadlessSettings {
        bit_depth: BitDepth::Float,
        shader_color_management: shader,
        ..HeadlessSettings::default()
    }
}
