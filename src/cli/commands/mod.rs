//! CLI command implementations.

mod config;
mod reflect;

pub use config::run_config;
pub use reflect::{run_reflect, TranscriptView};
