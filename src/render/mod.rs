/// Owning tile buffers and the display-side buffer handle.
pub mod buffer;
/// Fork-join scanline conversion.
pub mod convert;
/// Per-pixel channel, exposure and color conversion.
pub mod pixel;
/// Upstream source images and the bridge trait.
pub mod source;
