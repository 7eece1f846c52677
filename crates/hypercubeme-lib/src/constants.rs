//! Shared constants for hypercube construction

/// Crate version
pub const VERSION: (u8, u8, u8) = (0, 1, 0);

/// Default budget of simultaneously open files during merging.
///
/// Linux usually allows 1024 open descriptors per process (`ulimit -n`);
/// 1021 leaves room for stdio. Windows allows more, but this value is safe
/// on both.
pub const MAX_OPEN_FILES: usize = 1021;

/// Target number of dimension-1 work chunks per worker thread.
///
/// Every core gets, on average, this many chunks of work, which evens out
/// the quadratic-but-uneven cost of the later ranges.
pub const CHUNKS_PER_CORE: usize = 10;

/// Header line of a per-dimension hypercube file
pub const HYPERCUBE_FILE_HEADER: &str = "diagonal first_genotype last_genotype";

/// The allele character denoting the wild-type state at a position
pub const WILD_TYPE_ALLELE: char = 'Z';

/// Name of the file where hypercubes of the given `dimension` are stored
pub fn hypercube_file_name(dimension: usize) -> String {
    format!("hypercubes_{dimension}.txt")
}
