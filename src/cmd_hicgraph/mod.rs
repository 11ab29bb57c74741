//! Subcommand modules for the `hicgraph` binary.

pub mod build;
