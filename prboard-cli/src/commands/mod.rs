//! CLI command implementations

pub mod grid;
pub mod serve;

pub use grid::GridArgs;
pub use serve::ServeArgs;
