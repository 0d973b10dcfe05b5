/// Color spaces and linear-to-display lookup tables.
pub mod lut;
