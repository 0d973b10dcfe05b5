use crate::foundation::abort::AbortHandle;
use crate::foundation::core::RectI;
use crate::geometry::mip::TextureRect;
use crate::render::buffer::{PixelFormat, TileBuffer};
use crate::render::pixel::{PhaseStrategy, PixelParams, convert_row_f32, convert_row_u8};
use crate::render::source::SourceImage;
use rayon::prelude::*;
use std::ops::Range;

/// Split `rows` into contiguous, non-overlapping bands of `ceil(len / workers)` rows.
///
/// The last band is clamped to `rows.end`. Their union is exactly `rows`.
pub fn row_bands(rows: Range<usize>, workers: usize) -> Vec<Range<usize>> {
    let total = rows.end.saturating_sub(rows.start);
    if total == 0 {
        return Vec::new();
    }
    let per_band = total.div_ceil(workers.max(1));
    let mut out = Vec::with_capacity(total.div_ceil(per_band));
    let mut k = rows.start;
    while k < rows.end {
        let top = (k + per_band).min(rows.end);
        out.push(k..top);
        k = top;
    }
    out
}

/// Everything shared read-only by all bands of one tile conversion.
pub struct ConvertJob<'a> {
    pub source: &'a SourceImage,
    pub texture: TextureRect,
    /// Source-resolution region to fill, inside `texture`.
    pub region: RectI,
    pub params: PixelParams,
    pub phase: &'a dyn PhaseStrategy,
    pub abort: &'a AbortHandle,
}

impl ConvertJob<'_> {
    /// Destination rows covered by `region`.
    fn dst_rows(&self) -> Range<usize> {
        let t = &self.texture;
        let start = t.dst_index_at_or_after(t.y1, self.region.y1);
        let end = t
            .dst_index_at_or_after(t.y1, self.region.y2)
            .min(t.height as usize);
        start..end.max(start)
    }

    /// Destination columns covered by `region`.
    fn dst_cols(&self) -> Range<usize> {
        let t = &self.texture;
        let start = t.dst_index_at_or_after(t.x1, self.region.x1);
        let end = t
            .dst_index_at_or_after(t.x1, self.region.x2)
            .min(t.width as usize);
        start..end.max(start)
    }
}

/// Fill `buffer` from `job.source`.
///
/// With `pool == None` the whole range is converted inline on the calling thread. Otherwise it is
/// split with [`row_bands`] over the pool's worker count and joined before returning. Each band
/// owns a disjoint `&mut` slice of the destination rows.
pub fn convert_tile(job: &ConvertJob<'_>, buffer: &mut TileBuffer, pool: Option<&rayon::ThreadPool>) {
    let rows = job.dst_rows();
    let stride = buffer.row_stride();
    let format = buffer.format();
    if rows.is_empty() || stride == 0 {
        return;
    }
    let bytes = &mut buffer.bytes_mut()[rows.start * stride..rows.end * stride];

    let Some(pool) = pool else {
        convert_band(job, format, stride, rows, bytes);
        return;
    };

    let bands = row_bands(rows, pool.current_num_threads());
    let mut slices = Vec::with_capacity(bands.len());
    let mut rest = bytes;
    for band in bands {
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(band.len() * stride);
        slices.push((band, head));
        rest = tail;
    }

    pool.install(|| {
        slices.into_par_iter().for_each(|(band, out)| {
            tracing::trace!(rows = ?band, "convert band");
            convert_band(job, format, stride, band, out);
        });
    });
}

fn convert_band(
    job: &ConvertJob<'_>,
    format: PixelFormat,
    stride: usize,
    band: Range<usize>,
    out: &mut [u8],
) {
    if job.abort.is_aborted() {
        return;
    }
    let t = &job.texture;
    let step = t.mip as usize;
    let cols = job.dst_cols();
    if cols.is_empty() {
        return;
    }
    let bpp = format.bytes_per_pixel();
    let src_x = t.x1 + (cols.start * step) as i32;

    for (row_out, d) in out.chunks_exact_mut(stride).zip(band) {
        let y = t.y1 + (d * step) as i32;
        let Some(src) = job.source.row_span(y, src_x, job.region.x2) else {
            continue;
        };
        let dst = &mut row_out[cols.start * bpp..cols.end * bpp];
        match format {
            PixelFormat::RgbaF32 => convert_row_f32(src, step, dst, &job.params),
            PixelFormat::Bgra8 => {
                let start = job.phase.start_column(y, cols.len());
                convert_row_u8(src, step, dst, &job.params, start);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/convert.rs"]
mod tests;
