use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use mipview::{
    BitDepth, ColorSpace, DisplayChannels, HeadlessSettings, HeadlessSurface, InMemoryCacheOpts,
    InMemoryFrameCache, RectI, RenderRequest, RenderStatus, SequenceTime, SourceImage,
    UpstreamRenderer, ViewerInstance, ViewerOpts,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mipview", version)]
/// Render a synthetic gradient through the viewer pipeline and write the displayed tile as a PNG.
struct Cli {
    /// Viewer options JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Source image width.
    #[arg(long, default_value_t = 1024)]
    width: i32,

    /// Source image height.
    #[arg(long, default_value_t = 576)]
    height: i32,

    /// Viewer zoom factor.
    #[arg(long, default_value_t = 1.0)]
    zoom: f64,

    /// Exposure multiplier.
    #[arg(long)]
    exposure: Option<f64>,

    /// Display color space (`linear`, `srgb`, `rec709`).
    #[arg(long)]
    colorspace: Option<String>,

    /// Displayed channels (`rgba`, `r`, `g`, `b`, `a`, `luminance`).
    #[arg(long)]
    channels: Option<String>,

    /// Tile edge as a power of two.
    #[arg(long)]
    tile_pow2: Option<u32>,
}

/// Horizontal hue ramp over a vertical brightness ramp.
struct Gradient {
    bounds: RectI,
}

impl UpstreamRenderer for Gradient {
    fn region_of_definition(&self, _time: SequenceTime) -> Option<RectI> {
        Some(self.bounds)
    }

    fn graph_hash(&self) -> u64 {
        0x6772_6164
    }

    fn render(&self, req: &RenderRequest) -> Option<Arc<SourceImage>> {
        let region = req.region.intersect(self.bounds)?;
        let w = self.bounds.width().max(1) as f32;
        let h = self.bounds.height().max(1) as f32;
        Some(Arc::new(SourceImage::from_fn(region, |x, y| {
            let u = x as f32 / w;
            let v = 1.0 - y as f32 / h;
            [u * v, (1.0 - u) * v, v * v, 1.0]
        })))
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut opts = match &cli.config {
        Some(p) => ViewerOpts::from_path(p)?,
        None => ViewerOpts::default(),
    };
    if let Some(p) = cli.tile_pow2 {
        opts.tile_size_pow2 = p;
    }
    if let Some(e) = cli.exposure {
        opts.initial.exposure = e;
    }
    if let Some(name) = &cli.colorspace {
        opts.initial.color_space = ColorSpace::from_name(name)?;
    }
    if let Some(name) = &cli.channels {
        opts.initial.channels = parse_channels(name)?;
    }
    let bounds = RectI::new(0, 0, cli.width, cli.height)?;

    let surface = Arc::new(HeadlessSurface::new(HeadlessSettings {
        zoom: cli.zoom,
        bit_depth: BitDepth::Byte,
        ..HeadlessSettings::default()
    }));
    let cache = Arc::new(InMemoryFrameCache::new(InMemoryCacheOpts::default()));
    let viewer = ViewerInstance::new(opts, Arc::new(Gradient { bounds }), surface.clone(), cache)?;

    match viewer.render(0, false, false, false) {
        RenderStatus::Ok => {}
        status => anyhow::bail!("viewer render finished with {status:?}"),
    }
    let upload = surface
        .last_upload()
        .context("render produced no display upload")?;

    let rgba: Vec<u8> = upload
        .bytes
        .chunks_exact(4)
        .flat_map(|px| [px[2], px[1], px[0], px[3]])
        .collect();

    if let Some(parent) = cli.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &cli.out,
        &rgba,
        upload.texture.width,
        upload.texture.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", cli.out.display()))?;

    eprintln!(
        "wrote {} ({}x{}, mip {})",
        cli.out.display(),
        upload.texture.width,
        upload.texture.height,
        upload.texture.mip
    );
    Ok(())
}

fn parse_channels(name: &str) -> anyhow::Result<DisplayChannels> {
    serde_json::from_value(serde_json::Value::String(name.to_ascii_lowercase()))
        .with_context(|| format!("unknown channel selection \"{name}\""))
}
