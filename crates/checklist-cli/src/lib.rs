//! Library side of the `checklist` binary.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod summary;
