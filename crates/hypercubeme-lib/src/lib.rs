// HypercubeME: combinatorially complete subsets of genotype landscapes
//
// A Rust implementation of the HypercubeME hypercube-discovery algorithm,
// scaling beyond memory via chunked parallel workers and external merging.

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod constants;
pub mod error;
pub mod genotype;
pub mod delta;
pub mod builder;
pub mod expand;

// Re-export common types at crate root
pub use error::HypercubeError;
pub use genotype::{read_genotypes, Genotype, Mutation};
pub use delta::{delta, Change, Direction};
pub use builder::{BuildConfiguration, BuildSummary, HypercubeBuilder};

/// Version information
pub fn version() -> (u8, u8, u8) {
    constants::VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let (major, minor, patch) = version();
        assert_eq!(major, 0);
        assert_eq!(minor, 1);
        assert_eq!(patch, 0);
    }
}
