use crate::color::lut::{Lut, float_to_u8};
use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Rec.601 luma weights.
const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

/// Half-step bias each carry accumulator starts from.
pub const CARRY_BIAS: u32 = 0x80;

/// Channel mode selected in the viewer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayChannels {
    #[default]
    Rgba,
    R,
    G,
    B,
    A,
    Luminance,
}

impl DisplayChannels {
    /// Stable numeric id used in cache keys.
    pub fn id(self) -> u8 {
        match self {
            Self::Rgba => 0,
            Self::R => 1,
            Self::G => 2,
            Self::B => 3,
            Self::A => 4,
            Self::Luminance => 5,
        }
    }

    /// Source channel offsets for the three displayed channels.
    pub fn map(self) -> ChannelMap {
        let (offsets, luminance) = match self {
            Self::Rgba => ([0, 1, 2], false),
            Self::R => ([0, 0, 0], false),
            Self::G => ([1, 1, 1], false),
            Self::B => ([2, 2, 2], false),
            Self::A => ([3, 3, 3], false),
            Self::Luminance => ([0, 1, 2], true),
        };
        ChannelMap { offsets, luminance }
    }
}

/// Per-channel source offsets plus the luma flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelMap {
    pub offsets: [usize; 3],
    pub luminance: bool,
}

/// Everything the row converters need besides pixels.
#[derive(Clone, Copy, Debug)]
pub struct PixelParams {
    pub exposure: f32,
    pub channels: ChannelMap,
    /// `None` quantizes directly; only read by the 8-bit path.
    pub lut: Option<&'static Lut>,
}

impl PixelParams {
    /// Sample one source pixel: channel selection, then exposure, then luma.
    #[inline]
    pub fn sample(&self, px: &[f32]) -> [f32; 3] {
        let [ro, go, bo] = self.channels.offsets;
        let r = px[ro] * self.exposure;
        let g = px[go] * self.exposure;
        let b = px[bo] * self.exposure;
        if self.channels.luminance {
            let l = LUMA_R * r + LUMA_G * g + LUMA_B * b;
            [l, l, l]
        } else {
            [r, g, b]
        }
    }
}

/// Pack 8-bit samples into one word whose little-endian bytes read `B,G,R,A`.
#[inline]
pub fn to_bgra(r: u8, g: u8, b: u8, a: u8) -> u32 {
    u32::from(b) | (u32::from(g) << 8) | (u32::from(r) << 16) | (u32::from(a) << 24)
}

/// One step of the 8-bit error-diffusion accumulator.
///
/// Keeps the fractional byte of `acc` and adds the next `8.8` sample. With `sample <= 0xFF00`
/// the result never exceeds `0xFFFF`.
#[inline]
pub fn carry_step(acc: u32, sample: u16) -> u32 {
    let next = (acc & 0xFF) + u32::from(sample);
    debug_assert!(next <= 0xFFFF, "carry accumulator overflow: {next:#x}");
    next
}

/// Per-row error carry for the three color channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ErrorCarry {
    acc: [u32; 3],
}

impl Default for ErrorCarry {
    fn default() -> Self {
        Self {
            acc: [CARRY_BIAS; 3],
        }
    }
}

impl ErrorCarry {
    /// Feed three `8.8` samples and return the emitted 8-bit codes.
    #[inline]
    pub fn push(&mut self, samples: [u16; 3]) -> [u8; 3] {
        let mut out = [0u8; 3];
        for i in 0..3 {
            self.acc[i] = carry_step(self.acc[i], samples[i]);
            out[i] = (self.acc[i] >> 8) as u8;
        }
        out
    }

    /// Current raw accumulators.
    pub fn accumulators(&self) -> [u32; 3] {
        self.acc
    }
}

/// Chooses the column each 8-bit row's decimation walk starts from.
pub trait PhaseStrategy: Send + Sync + std::fmt::Debug {
    /// Start column in `[0, samples)` for source row `row`. `samples` is never 0.
    fn start_column(&self, row: i32, samples: usize) -> usize;
}

/// Seeded per-row pseudo-random phase, reproducible for a given `(seed, row)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JitteredPhase {
    pub seed: u64,
}

impl PhaseStrategy for JitteredPhase {
    fn start_column(&self, row: i32, samples: usize) -> usize {
        (xxh3_64_with_seed(&row.to_le_bytes(), self.seed) % samples as u64) as usize
    }
}

/// Same start column on every row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FixedPhase {
    pub column: usize,
}

impl PhaseStrategy for FixedPhase {
    fn start_column(&self, _row: i32, samples: usize) -> usize {
        self.column.min(samples - 1)
    }
}

/// Middle column on every row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CenteredPhase;

impl PhaseStrategy for CenteredPhase {
    fn start_column(&self, _row: i32, samples: usize) -> usize {
        samples / 2
    }
}

/// Convert one destination row to linear float `r,g,b,1.0`.
///
/// `src` starts at the source pixel of the first destination column; each destination pixel
/// advances `step` source pixels. Columns past the end of `src` are left untouched.
pub fn convert_row_f32(src: &[f32], step: usize, dst: &mut [u8], params: &PixelParams) {
    for (i, out) in dst.chunks_exact_mut(16).enumerate() {
        let at = i * step * 4;
        let Some(px) = src.get(at..at + 4) else {
            break;
        };
        let [r, g, b] = params.sample(px);
        for (slot, v) in out.chunks_exact_mut(4).zip([r, g, b, 1.0]) {
            slot.copy_from_slice(&v.to_ne_bytes());
        }
    }
}

/// Convert one destination row to display-encoded `B,G,R,A` bytes with opaque alpha.
///
/// The walk starts at destination column `start`, runs forward to the row end, then backward
/// from `start - 1` to 0. Each direction gets a fresh [`ErrorCarry`].
pub fn convert_row_u8(src: &[f32], step: usize, dst: &mut [u8], params: &PixelParams, start: usize) {
    let available = src.len().div_ceil(step * 4);
    let n = (dst.len() / 4).min(available);
    if n == 0 {
        return;
    }
    let start = start.min(n - 1);

    let mut emit = |d: usize, carry: &mut ErrorCarry| {
        let at = d * step * 4;
        let [r, g, b] = params.sample(&src[at..at + 4]);
        let [r8, g8, b8] = match params.lut {
            Some(lut) => carry.push([lut.to_u8xx(r), lut.to_u8xx(g), lut.to_u8xx(b)]),
            None => [float_to_u8(r), float_to_u8(g), float_to_u8(b)],
        };
        dst[d * 4..d * 4 + 4].copy_from_slice(&to_bgra(r8, g8, b8, 255).to_le_bytes());
    };

    let mut carry = ErrorCarry::default();
    for d in start..n {
        emit(d, &mut carry);
    }
    let mut carry = ErrorCarry::default();
    for d in (0..start).rev() {
        emit(d, &mut carry);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pixel.rs"]
mod tests;
