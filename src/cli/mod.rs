//! CLI command handling

pub mod listen;

pub use listen::*;
