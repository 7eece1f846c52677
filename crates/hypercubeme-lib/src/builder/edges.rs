//! Dimension-1 edge discovery
//!
//! An edge is a pair of genotypes whose delta has exactly one change: the
//! two genotypes differ at a single position. Edges are the dimension-1
//! hypercubes that seed the iterative join. Each worker compares every
//! genotype in its range against every *later* genotype in the full list,
//! so each unordered pair is considered exactly once across all workers.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::delta::{delta, Direction};
use crate::error::HypercubeError;
use crate::genotype::Genotype;

/// Write all edges for the genotype range `[start, start + num)` to
/// `output`, one sorted line `change \t start_genotype \t end_genotype`
/// per edge.
///
/// Duplicate genotypes in the input yield no delta and the pair is skipped.
pub fn write_edge_chunk(
    genotypes: &[Genotype],
    start: usize,
    num: usize,
    output: &Path,
) -> Result<(), HypercubeError> {
    debug_assert!(start <= genotypes.len());
    let end = (start + num).min(genotypes.len());

    let mut lines = Vec::new();
    for i in start..end {
        for j in (i + 1)..genotypes.len() {
            match delta(&genotypes[i], &genotypes[j]) {
                Ok((direction, changes)) if changes.len() == 1 => {
                    let (first, last) = match direction {
                        Direction::Forward => (&genotypes[i], &genotypes[j]),
                        Direction::Reverse => (&genotypes[j], &genotypes[i]),
                    };
                    lines.push(format!(
                        "{}\t{}\t{}",
                        changes[0].token(),
                        first.key(),
                        last.key()
                    ));
                }
                Ok(_) => {} // more than one position differs
                Err(HypercubeError::IncomparableGenotypes) => {} // duplicate genotype
                Err(e) => return Err(e),
            }
        }
    }

    lines.sort_unstable();
    let mut writer = BufWriter::new(File::create(output)?);
    for line in &lines {
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;
    Ok(())
}
