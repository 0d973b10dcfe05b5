use crate::foundation::error::{ViewerError, ViewerResult};
use std::sync::OnceLock;

/// Number of table intervals over the linear `[0, 1]` input range.
const LUT_STEPS: usize = 4096;

/// Largest value returned by [`Lut::to_u8xx`]: 8-bit code 255 with an empty fractional byte.
pub const U8XX_MAX: u16 = 0xFF00;

/// Display color space applied by the 8-bit path and the pixel probe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpace {
    /// No transform; values are shown as stored.
    Linear,
    /// IEC 61966-2-1 transfer curve.
    #[default]
    Srgb,
    /// ITU-R BT.709 transfer curve.
    Rec709,
}

impl ColorSpace {
    /// Stable numeric id used in cache keys.
    pub fn id(self) -> u8 {
        match self {
            Self::Linear => 0,
            Self::Srgb => 1,
            Self::Rec709 => 2,
        }
    }

    /// Parse the names shown in the viewer's color-space menu.
    pub fn from_name(name: &str) -> ViewerResult<Self> {
        match name.trim() {
            "Linear(None)" | "linear" | "Linear" => Ok(Self::Linear),
            "sRGB" | "srgb" => Ok(Self::Srgb),
            "Rec.709" | "rec709" | "Rec709" => Ok(Self::Rec709),
            other => Err(ViewerError::validation(format!(
                "unknown color space \"{other}\""
            ))),
        }
    }

    /// Lookup table for this space, or `None` for [`ColorSpace::Linear`].
    pub fn lut(self) -> Option<&'static Lut> {
        static SRGB: OnceLock<Lut> = OnceLock::new();
        static REC709: OnceLock<Lut> = OnceLock::new();
        match self {
            Self::Linear => None,
            Self::Srgb => Some(SRGB.get_or_init(|| Lut::build(Self::Srgb))),
            Self::Rec709 => Some(REC709.get_or_init(|| Lut::build(Self::Rec709))),
        }
    }

    /// Exact linear-to-display transfer of one value in `[0, 1]`.
    pub fn encode(self, v: f32) -> f32 {
        let v = v.clamp(0.0, 1.0);
        match self {
            Self::Linear => v,
            Self::Srgb => {
                if v <= 0.003_130_8 {
                    12.92 * v
                } else {
                    1.055 * v.powf(1.0 / 2.4) - 0.055
                }
            }
            Self::Rec709 => {
                if v < 0.018 {
                    4.5 * v
                } else {
                    1.099 * v.powf(0.45) - 0.099
                }
            }
        }
    }
}

/// Linear float to display-encoded 8-bit fixed point (`8.8`) lookup table.
pub struct Lut {
    space: ColorSpace,
    table: Box<[u16]>,
}

impl std::fmt::Debug for Lut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lut")
            .field("space", &self.space)
            .field("entries", &self.table.len())
            .finish()
    }
}

impl Lut {
    fn build(space: ColorSpace) -> Self {
        let table = (0..=LUT_STEPS)
            .map(|i| {
                let x = i as f32 / LUT_STEPS as f32;
                (space.encode(x) * f32::from(U8XX_MAX)).round() as u16
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { space, table }
    }

    /// Color space this table encodes.
    pub fn space(&self) -> ColorSpace {
        self.space
    }

    /// Encoded value in `8.8` fixed point, always `<= U8XX_MAX`.
    ///
    /// The upper byte is the 8-bit code and the lower byte its fractional remainder.
    #[inline]
    pub fn to_u8xx(&self, v: f32) -> u16 {
        // NaN maps to 0 through the saturating cast.
        let idx = (v.clamp(0.0, 1.0) * LUT_STEPS as f32).round() as usize;
        self.table[idx.min(LUT_STEPS)]
    }

    /// Transform RGB in place with the exact curve.
    pub fn to_float_rgb(&self, rgb: &mut [f32; 3]) {
        for c in rgb.iter_mut() {
            *c = self.space.encode(*c);
        }
    }
}

/// Quantize a linear value straight to 8 bits, used when no color space is active.
#[inline]
pub fn float_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
#[path = "../../tests/unit/color/lut.rs"]
mod tests;
