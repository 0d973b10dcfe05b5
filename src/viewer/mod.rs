pub mod config;
pub mod instance;
pub mod state;
