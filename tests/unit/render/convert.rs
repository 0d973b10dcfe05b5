use super::*;
use crate::color::lut::ColorSpace;
use crate::geometry::mip::select_tile;
use crate::render::pixel::{DisplayChannels, FixedPhase, JitteredPhase};

fn pool(n: usize) -> rayon::ThreadPool {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n)
        .build()
        .unwrap()
}

fn gradient(rod: RectI) -> SourceImage {
    SourceImage::from_fn(rod, |x, y| {
        [
            x as f32 / rod.width() as f32,
            y as f32 / rod.height() as f32,
            0.25,
            1.0,
        ]
    })
}

fn params(space: ColorSpace) -> PixelParams {
    PixelParams {
        exposure: 1.0,
        channels: DisplayChannels::Rgba.map(),
        lut: space.lut(),
    }
}

#[test]
fn bands_partition_the_range_exactly() {
    for total in 0..70usize {
        for workers in 1..12usize {
            let rows = 5..5 + total;
            let bands = row_bands(rows.clone(), workers);
            let mut next = rows.start;
            for b in &bands {
                assert_eq!(b.start, next, "bands must be contiguous");
                assert!(b.end > b.start, "bands must be non-empty");
                assert!(b.len() <= total.div_ceil(workers));
                next = b.end;
            }
            assert_eq!(next, rows.end);
            assert!(bands.len() <= workers);
        }
    }
}

#[test]
fn one_worker_yields_one_band() {
    assert_eq!(row_bands(3..40, 1), vec![3..40]);
}

#[test]
fn band_height_is_ceiling_of_rows_per_worker() {
    assert_eq!(row_bands(0..10, 4), vec![0..3, 3..6, 6..9, 9..10]);
}

#[test]
fn parallel_conversion_matches_inline() {
    let rod = RectI::from_size(97, 61);
    let src = gradient(rod);
    let abort = AbortHandle::new();
    let phase = JitteredPhase { seed: 11 };
    for (zoom, format, space) in [
        (1.0, PixelFormat::Bgra8, ColorSpace::Srgb),
        (0.3, PixelFormat::Bgra8, ColorSpace::Rec709),
        (0.5, PixelFormat::RgbaF32, ColorSpace::Linear),
    ] {
        let texture = select_tile(rod, rod, zoom, 4).unwrap().unwrap().texture;
        let job = ConvertJob {
            source: &src,
            texture,
            region: texture.rect(),
            params: params(space),
            phase: &phase,
            abort: &abort,
        };
        let mut inline = TileBuffer::zeroed(texture, format);
        convert_tile(&job, &mut inline, None);
        let mut parallel = TileBuffer::zeroed(texture, format);
        convert_tile(&job, &mut parallel, Some(&pool(4)));
        assert_eq!(inline.bytes(), parallel.bytes());
    }
}

#[test]
fn decimated_float_tile_samples_nearest_neighbor() {
    let rod = RectI::from_size(8, 8);
    let src = SourceImage::from_fn(rod, |x, y| [x as f32, y as f32, 0.0, 0.0]);
    let texture = select_tile(rod, rod, 0.5, 1).unwrap().unwrap().texture;
    assert_eq!((texture.width, texture.height, texture.mip), (4, 4, 2));
    let abort = AbortHandle::new();
    let job = ConvertJob {
        source: &src,
        texture,
        region: texture.rect(),
        params: params(ColorSpace::Linear),
        phase: &FixedPhase::default(),
        abort: &abort,
    };
    let mut out = TileBuffer::zeroed(texture, PixelFormat::RgbaF32);
    convert_tile(&job, &mut out, Some(&pool(3)));

    let floats: Vec<f32> = out
        .bytes()
        .chunks_exact(4)
        .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    // Destination (1, 2) samples source (2, 4).
    let px = &floats[(2 * 4 + 1) * 4..(2 * 4 + 1) * 4 + 4];
    assert_eq!(px, &[2.0, 4.0, 0.0, 1.0]);
}

#[test]
fn sub_region_leaves_other_pixels_cleared() {
    let rod = RectI::from_size(16, 16);
    let src = SourceImage::from_fn(rod, |_, _| [1.0, 1.0, 1.0, 1.0]);
    let texture = select_tile(rod, rod, 1.0, 4).unwrap().unwrap().texture;
    let region = RectI::new(4, 4, 8, 6).unwrap();
    let abort = AbortHandle::new();
    let job = ConvertJob {
        source: &src,
        texture,
        region,
        params: params(ColorSpace::Linear),
        phase: &FixedPhase::default(),
        abort: &abort,
    };
    let mut out = TileBuffer::zeroed(texture, PixelFormat::Bgra8);
    convert_tile(&job, &mut out, Some(&pool(2)));

    let stride = out.row_stride();
    for y in 0..16usize {
        for x in 0..16usize {
            let v = out.bytes()[y * stride + x * 4];
            let inside = (4..8).contains(&x) && (4..6).contains(&y);
            assert_eq!(v, if inside { 255 } else { 0 }, "pixel ({x},{y})");
        }
    }
}

#[test]
fn aborted_job_writes_nothing() {
    let rod = RectI::from_size(8, 8);
    let src = gradient(rod);
    let texture = select_tile(rod, rod, 1.0, 3).unwrap().unwrap().texture;
    let abort = AbortHandle::new();
    abort.abort();
    let job = ConvertJob {
        source: &src,
        texture,
        region: texture.rect(),
        params: params(ColorSpace::Srgb),
        phase: &FixedPhase::default(),
        abort: &abort,
    };
    let mut out = TileBuffer::zeroed(texture, PixelFormat::Bgra8);
    convert_tile(&job, &mut out, Some(&pool(2)));
    assert!(out.bytes().iter().all(|&b| b == 0));
}
