use crate::foundation::core::RectI;
use crate::foundation::error::{ViewerError, ViewerResult};

/// Largest accepted `tile_size_pow2` (64k pixel tiles).
pub const MAX_TILE_SIZE_POW2: u32 = 16;

/// The rectangle actually rendered and uploaded for display.
///
/// Bounds are in source-resolution units and already clamped to the region of definition;
/// `width`/`height` count destination pixels after decimation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextureRect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    /// Destination width in decimated pixels.
    pub width: u32,
    /// Destination height in decimated pixels.
    pub height: u32,
    /// Decimation factor, a power of two `>= 1`.
    pub mip: u32,
}

impl TextureRect {
    fn from_clamped(r: RectI, mip: u32) -> Self {
        let step = mip as i32;
        Self {
            x1: r.x1,
            y1: r.y1,
            x2: r.x2,
            y2: r.y2,
            width: ceil_div(i64::from(r.width()), i64::from(step)) as u32,
            height: ceil_div(i64::from(r.height()), i64::from(step)) as u32,
            mip,
        }
    }

    /// Source-resolution bounds as a rectangle.
    pub fn rect(&self) -> RectI {
        RectI {
            x1: self.x1,
            y1: self.y1,
            x2: self.x2,
            y2: self.y2,
        }
    }

    /// Number of destination pixels.
    pub fn pixel_count(&self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    /// Destination column/row index of the first destination sample at or after source
    /// coordinate `src` along an axis starting at `origin`.
    pub(crate) fn dst_index_at_or_after(&self, origin: i32, src: i32) -> usize {
        let off = i64::from(src) - i64::from(origin);
        ceil_div(off.max(0), i64::from(self.mip)) as usize
    }
}

/// Result of tile selection for one render request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileSelection {
    /// Decimation factor.
    pub mip: u32,
    /// Tile-aligned rectangle in decimated units, before clamping.
    pub tile: RectI,
    /// Exact rectangle to render and upload.
    pub texture: TextureRect,
}

/// Smallest power of two `>= 1/zoom`, or 1 when zoomed in.
pub fn decimation_for_zoom(zoom: f64) -> ViewerResult<u32> {
    if !zoom.is_finite() || zoom <= 0.0 {
        return Err(ViewerError::validation(format!(
            "zoom factor must be finite and > 0, got {zoom}"
        )));
    }
    if zoom >= 1.0 {
        return Ok(1);
    }
    let exp = (-zoom.log2()).ceil().clamp(0.0, 30.0) as u32;
    Ok(1u32 << exp)
}

/// Tile edge length in pixels for a configured power of two.
pub fn tile_size(tile_size_pow2: u32) -> ViewerResult<i32> {
    if tile_size_pow2 > MAX_TILE_SIZE_POW2 {
        return Err(ViewerError::validation(format!(
            "tile_size_pow2 must be <= {MAX_TILE_SIZE_POW2}, got {tile_size_pow2}"
        )));
    }
    Ok(1i32 << tile_size_pow2)
}

/// Derive decimation and the tile-aligned texture rectangle for a visible region.
///
/// `visible` is the part of `rod` shown by the viewport, in source-resolution units.
/// Returns `Ok(None)` when the result is degenerate, meaning there is nothing to render.
pub fn select_tile(
    rod: RectI,
    visible: RectI,
    zoom: f64,
    tile_size_pow2: u32,
) -> ViewerResult<Option<TileSelection>> {
    let mip = decimation_for_zoom(zoom)?;
    let tile = i64::from(tile_size(tile_size_pow2)?);
    if visible.is_empty() {
        return Ok(None);
    }
    let span = i64::from(mip) * tile;

    // floor(x / mip / tile) == floor(x / (mip * tile)) for integer x.
    let aligned = RectI {
        x1: saturate_i32(i64::from(visible.x1).div_euclid(span) * tile),
        y1: saturate_i32(i64::from(visible.y1).div_euclid(span) * tile),
        x2: saturate_i32(ceil_div(i64::from(visible.x2), span) * tile),
        y2: saturate_i32(ceil_div(i64::from(visible.y2), span) * tile),
    };
    if aligned.is_empty() {
        return Ok(None);
    }

    let m = i64::from(mip);
    let expanded = RectI {
        x1: saturate_i32(i64::from(aligned.x1) * m),
        y1: saturate_i32(i64::from(aligned.y1) * m),
        x2: saturate_i32(i64::from(aligned.x2) * m),
        y2: saturate_i32(i64::from(aligned.y2) * m),
    };
    let Some(clamped) = expanded.intersect(rod) else {
        return Ok(None);
    };

    Ok(Some(TileSelection {
        mip,
        tile: aligned,
        texture: TextureRect::from_clamped(clamped, mip),
    }))
}

fn ceil_div(a: i64, b: i64) -> i64 {
    -((-a).div_euclid(b))
}

fn saturate_i32(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/mip.rs"]
mod tests;
