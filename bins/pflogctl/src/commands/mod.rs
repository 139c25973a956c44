//! Subcommand implementations.

pub mod decode;
pub mod example;
pub mod replay;
