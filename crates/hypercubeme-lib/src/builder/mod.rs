//! Builder module for the iterative hypercube-construction pipeline
//!
//! This module implements the per-dimension build loop:
//! 1. Divide the input (genotype list or previous dimension's file) into
//!    independent units of work
//! 2. Run dimension-builder workers in parallel, each writing its own
//!    locally sorted chunk file
//! 3. Fold all chunk files into one globally sorted per-dimension file via
//!    the external merge engine
//! 4. Repeat with dimension + 1 until a dimension produces nothing

pub mod config;
pub mod divide;
pub mod edges;
pub mod join;
pub mod merge;
pub mod driver;

pub use config::BuildConfiguration;
pub use divide::{divide_hypercube_file, divide_list, ChunkDescriptor};
pub use driver::{BuildSummary, HypercubeBuilder};
pub use merge::merge_sorted_files;
