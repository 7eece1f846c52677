//! Expansion of hypercube records into their vertex genotypes
//!
//! A dimension-d record stores only its diagonal and two opposite corners.
//! Expansion enumerates all 2^d vertices by applying every subset of the
//! diagonal's changes to the start genotype.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

use tracing::info;

use crate::delta::Change;
use crate::error::HypercubeError;
use crate::genotype::{Genotype, Mutation};

/// Header line of an expanded-hypercubes file
pub const EXPANDED_FILE_HEADER: &str = "diagonal \t variations";

/// Enumerate all 2^d vertices of a hypercube given its diagonal and start
/// genotype.
///
/// Vertex `0` is the start genotype itself; in vertex `m`, change `i` of
/// the diagonal is applied exactly when bit `d - 1 - i` of `m` is set, so
/// the first change is the most significant bit. The last vertex is always
/// the hypercube's end genotype.
pub fn expand_diagonal(diagonal: &[Change], start: &Genotype) -> Vec<Genotype> {
    let dimension = diagonal.len();
    let mut vertices = Vec::with_capacity(1 << dimension);
    vertices.push(start.clone());

    for mask in 1u64..(1u64 << dimension) {
        let selected: Vec<&Change> = diagonal
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << (dimension - 1 - i)) != 0)
            .map(|(_, change)| change)
            .collect();

        let mut mutations: Vec<Mutation> = Vec::new();
        for mutation in start.point_mutations() {
            match selected.iter().find(|c| c.position() == mutation.position()) {
                Some(change) => {
                    // Substitute the allele, or drop the mutation entirely
                    // when the change ends in wild type
                    if let Some(end) = change.end_state() {
                        mutations.push(end);
                    }
                }
                None => mutations.push(mutation.clone()),
            }
        }
        // Changes starting from wild type introduce a mutation at a site
        // the start genotype does not carry; it is placed in position
        // order so the vertex renders like any pipeline-produced key
        for change in &selected {
            if change.from_allele() == crate::constants::WILD_TYPE_ALLELE {
                if let Some(end) = change.end_state() {
                    let at = mutations
                        .iter()
                        .position(|m| m.position() > end.position())
                        .unwrap_or(mutations.len());
                    mutations.insert(at, end);
                }
            }
        }
        vertices.push(Genotype::from_mutations(mutations));
    }
    vertices
}

/// Expand every record of a hypercube file into its vertex genotypes.
///
/// Writes one line `diagonal \t genotype, genotype, …` per record and
/// returns the number of records expanded. The output file must not
/// already exist.
pub fn expand_file(input: &Path, output: &Path) -> Result<usize, HypercubeError> {
    if output.exists() {
        return Err(HypercubeError::Config(format!(
            "file {} already exists, rename it or pick another output file",
            output.display()
        )));
    }
    let file = File::open(input).map_err(|e| match e.kind() {
        ErrorKind::NotFound => HypercubeError::InputNotFound(input.to_path_buf()),
        _ => HypercubeError::Io(e),
    })?;
    let reader = BufReader::new(file);
    let mut writer = BufWriter::new(File::create(output)?);
    writeln!(writer, "{EXPANDED_FILE_HEADER}")?;

    let mut num_records = 0usize;
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if idx == 0 || line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let (diagonal_field, first) = match (fields.next(), fields.next()) {
            (Some(diagonal), Some(first)) => (diagonal, first),
            _ => {
                return Err(HypercubeError::malformed(
                    &line,
                    "expected a diagonal and a start genotype",
                ))
            }
        };
        let diagonal = diagonal_field
            .split(':')
            .map(Change::parse)
            .collect::<Result<Vec<_>, _>>()?;
        let start = Genotype::parse(first)?;

        let keys: Vec<String> = expand_diagonal(&diagonal, &start)
            .iter()
            .map(Genotype::key)
            .collect();
        writeln!(writer, "{diagonal_field}\t{}", keys.join(", "))?;
        num_records += 1;
    }
    writer.flush()?;
    info!("Expanded {} hypercube records", num_records);
    Ok(num_records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write as _;
    use tempfile::TempDir;

    fn diagonal(field: &str) -> Vec<Change> {
        field.split(':').map(|t| Change::parse(t).unwrap()).collect()
    }

    fn keys(vertices: &[Genotype]) -> Vec<String> {
        vertices.iter().map(Genotype::key).collect()
    }

    #[test]
    fn test_expand_edge() {
        let vertices = expand_diagonal(&diagonal("A10Z"), &Genotype::parse("10A").unwrap());
        assert_eq!(keys(&vertices), ["10A", "0Z"]);
    }

    #[test]
    fn test_expand_square() {
        let vertices =
            expand_diagonal(&diagonal("A10Z:K20Z"), &Genotype::parse("10A:20K").unwrap());
        assert_eq!(keys(&vertices), ["10A:20K", "10A", "20K", "0Z"]);
    }

    #[test]
    fn test_expand_substitution_square() {
        let vertices =
            expand_diagonal(&diagonal("A10V:K20M"), &Genotype::parse("10A:20K").unwrap());
        assert_eq!(keys(&vertices), ["10A:20K", "10A:20M", "10V:20K", "10V:20M"]);
    }

    #[test]
    fn test_expand_wild_type_side_change() {
        // The start genotype lacks position 20; the Z20K change adds it
        let vertices =
            expand_diagonal(&diagonal("A10Z:Z20K"), &Genotype::parse("10A").unwrap());
        assert_eq!(keys(&vertices), ["10A", "10A:20K", "0Z", "20K"]);
    }

    #[test]
    fn test_expand_added_mutation_in_position_order() {
        // Z20K adds position 20, which sits before the surviving 30M
        let vertices =
            expand_diagonal(&diagonal("Z20K:M30Z"), &Genotype::parse("30M").unwrap());
        assert_eq!(keys(&vertices), ["30M", "0Z", "20K:30M", "20K"]);
    }

    #[test]
    fn test_expand_file() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("hypercubes_2.txt");
        let mut file = File::create(&input).unwrap();
        writeln!(file, "diagonal first_genotype last_genotype").unwrap();
        writeln!(file, "A10Z:K20Z\t10A:20K\t0Z").unwrap();
        drop(file);

        let output = dir.path().join("hypercubes_2_expanded.txt");
        assert_eq!(expand_file(&input, &output).unwrap(), 1);
        let text = fs::read_to_string(&output).unwrap();
        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            [
                EXPANDED_FILE_HEADER,
                "A10Z:K20Z\t10A:20K, 10A, 20K, 0Z",
            ]
        );
    }

    #[test]
    fn test_expand_file_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("hypercubes_1.txt");
        fs::write(&input, "diagonal first_genotype last_genotype\n").unwrap();
        let output = dir.path().join("out.txt");
        fs::write(&output, "existing\n").unwrap();
        assert!(matches!(
            expand_file(&input, &output),
            Err(HypercubeError::Config(_))
        ));
    }

    #[test]
    fn test_expand_file_missing_input() {
        let dir = TempDir::new().unwrap();
        let err = expand_file(
            &dir.path().join("no_such_file.txt"),
            &dir.path().join("out.txt"),
        )
        .unwrap_err();
        assert!(matches!(err, HypercubeError::InputNotFound(_)));
    }
}
