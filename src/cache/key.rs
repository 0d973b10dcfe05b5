use crate::color::lut::ColorSpace;
use crate::display::surface::BitDepth;
use crate::foundation::core::{RectI, SequenceTime, ViewIndex};
use crate::geometry::mip::TextureRect;
use crate::render::pixel::DisplayChannels;
use xxhash_rust::xxh3::Xxh3;

const XXH3_SEED: u64 = 0x6d69_7076_6965_7731;

/// Exposure scalar compared and hashed by bit pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Exposure(u64);

impl Exposure {
    /// The scalar value.
    pub fn value(self) -> f64 {
        f64::from_bits(self.0)
    }
}

impl From<f64> for Exposure {
    fn from(v: f64) -> Self {
        Self(v.to_bits())
    }
}

/// Composite identity of one viewer render result.
///
/// A pure function of the render parameters: equal fields give equal keys, and any differing
/// field gives a different key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub time: SequenceTime,
    /// Content hash of the upstream graph.
    pub graph_hash: u64,
    pub exposure: Exposure,
    pub color_space: ColorSpace,
    pub bit_depth: BitDepth,
    pub channels: DisplayChannels,
    pub view: ViewIndex,
    /// Region of definition of the input.
    pub rod: RectI,
    pub display_window: RectI,
    /// Rendered tile, mip level included.
    pub texture: TextureRect,
}

/// Stable 128-bit digest of a [`CacheKey`], suitable for logs and persistent storage ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyFingerprint {
    pub hi: u64,
    pub lo: u64,
}

impl std::fmt::Display for KeyFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}{:016x}", self.hi, self.lo)
    }
}

impl CacheKey {
    /// Fingerprint independent of process, platform and `std` hasher seeds.
    pub fn fingerprint(&self) -> KeyFingerprint {
        let mut h = StableHasher::new();
        h.write_i64(self.time);
        h.write_u64(self.graph_hash);
        h.write_u64(self.exposure.0);
        h.write_u8(self.color_space.id());
        h.write_u8(self.bit_depth.id());
        h.write_u8(self.channels.id());
        h.write_u32(self.view);
        write_rect(&mut h, self.rod);
        write_rect(&mut h, self.display_window);
        let t = &self.texture;
        write_rect(&mut h, t.rect());
        h.write_u32(t.width);
        h.write_u32(t.height);
        h.write_u32(t.mip);
        h.finish()
    }
}

fn write_rect(h: &mut StableHasher, r: RectI) {
    for v in [r.x1, r.y1, r.x2, r.y2] {
        h.write_i32(v);
    }
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_i32(&mut self, v: i32) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_i64(&mut self, v: i64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn finish(self) -> KeyFingerprint {
        let v = self.inner.digest128();
        KeyFingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/key.rs"]
mod tests;
