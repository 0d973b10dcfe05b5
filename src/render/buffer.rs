use crate::cache::store::CacheEntry;
use crate::geometry::mip::TextureRect;
use std::sync::Arc;

/// Destination pixel layout of a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Display-encoded 8-bit samples packed as `B,G,R,A`.
    Bgra8,
    /// Linear 32-bit float samples stored as `R,G,B,A`.
    RgbaF32,
}

impl PixelFormat {
    /// Channels per pixel.
    pub fn channels(self) -> usize {
        4
    }

    /// Bytes per channel sample.
    pub fn bytes_per_channel(self) -> usize {
        match self {
            Self::Bgra8 => 1,
            Self::RgbaF32 => std::mem::size_of::<f32>(),
        }
    }

    /// Bytes per pixel.
    pub fn bytes_per_pixel(self) -> usize {
        self.channels() * self.bytes_per_channel()
    }
}

/// Render-owned tile pixels, sized exactly `width * height * channels * bytes_per_channel`.
///
/// Ownership either moves into the cache on publish (see [`CacheEntry::from_buffer`]) or stays
/// with the viewer, which recycles the allocation on the next render.
#[derive(Clone, Debug)]
pub struct TileBuffer {
    texture: TextureRect,
    format: PixelFormat,
    data: Vec<u8>,
}

impl TileBuffer {
    /// Allocate a zero-filled buffer for `texture`.
    pub fn zeroed(texture: TextureRect, format: PixelFormat) -> Self {
        Self::recycle(None, texture, format)
    }

    /// Reuse `previous`'s allocation when available, resized and cleared for `texture`.
    pub fn recycle(previous: Option<TileBuffer>, texture: TextureRect, format: PixelFormat) -> Self {
        let len = byte_len(&texture, format);
        let mut data = previous.map(|b| b.data).unwrap_or_default();
        data.clear();
        data.resize(len, 0);
        Self {
            texture,
            format,
            data,
        }
    }

    /// Rectangle these pixels cover.
    pub fn texture(&self) -> &TextureRect {
        &self.texture
    }

    /// Pixel layout.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Bytes of one destination row.
    pub fn row_stride(&self) -> usize {
        (self.texture.width as usize) * self.format.bytes_per_pixel()
    }

    /// Raw pixel bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub(crate) fn into_parts(self) -> (TextureRect, PixelFormat, Vec<u8>) {
        (self.texture, self.format, self.data)
    }
}

/// Exact byte size of a tile.
pub fn byte_len(texture: &TextureRect, format: PixelFormat) -> usize {
    texture.pixel_count().saturating_mul(format.bytes_per_pixel())
}

/// The pixels currently handed to the display.
///
/// Exactly one owner exists per frame: either the viewer ([`DisplayBuffer::Owned`]) or the
/// cache ([`DisplayBuffer::Cached`]).
#[derive(Clone, Debug)]
pub enum DisplayBuffer {
    /// Render result kept out of the cache.
    Owned(Arc<TileBuffer>),
    /// Published or looked-up cache entry.
    Cached(Arc<CacheEntry>),
}

impl DisplayBuffer {
    /// Raw pixel bytes.
    pub fn bytes(&self) -> &[u8] {
        match self {
            Self::Owned(b) => b.bytes(),
            Self::Cached(e) => e.bytes(),
        }
    }

    /// Rectangle these pixels cover.
    pub fn texture(&self) -> &TextureRect {
        match self {
            Self::Owned(b) => b.texture(),
            Self::Cached(e) => e.texture(),
        }
    }

    /// Pixel layout.
    pub fn format(&self) -> PixelFormat {
        match self {
            Self::Owned(b) => b.format(),
            Self::Cached(e) => e.format(),
        }
    }

    /// Return `true` when the cache owns these pixels.
    pub fn is_cached(&self) -> bool {
        matches!(self, Self::Cached(_))
    }

    /// Take the allocation back for reuse, if the viewer is its sole owner.
    pub(crate) fn into_recyclable(self) -> Option<TileBuffer> {
        match self {
            Self::Owned(b) => Arc::try_unwrap(b).ok(),
            Self::Cached(_) => None,
        }
    }
}
