pub mod cli;
pub mod load_config;
pub mod prompt;
pub mod render;
pub mod s3;

pub use cli::{run, Cli, Commands};
