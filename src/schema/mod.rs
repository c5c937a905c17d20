//! Schema module - Configuration and initializer types for scalar fields.

mod config;
mod initializer;

pub use config::*;
pub use initializer::*;
