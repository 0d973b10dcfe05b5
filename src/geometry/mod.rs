/// Mip level and tile rectangle selection.
pub mod mip;
