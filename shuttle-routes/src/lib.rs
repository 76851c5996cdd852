pub mod capability;
pub mod cli;
pub mod geocode;
pub mod load_config;
pub mod stages;

pub use cli::{run, Cli, Commands};
