pub mod abort;
pub mod core;
pub mod error;
