//! Dimension-(d → d+1) join of same-diagonal hypercubes
//!
//! Two dimension-(d-1) hypercubes combine into a dimension-d hypercube
//! exactly when their diagonals are identical and one more position differs
//! between their start genotypes. The extending position must be strictly
//! greater than the diagonal's last position: a cube spanning positions
//! {p1 < p2 < … < pd} is then only ever produced through the one ascending
//! extension order, never twice through different orders.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use crate::delta::{delta, Change, Direction};
use crate::error::HypercubeError;
use crate::genotype::Genotype;

use super::divide::ChunkDescriptor;

/// Join every record pair within one diagonal group and write the resulting
/// next-dimension hypercubes to `output`, sorted.
///
/// The worker re-opens `input` and seeks to the chunk's byte offset; it
/// reads exactly `num_lines` records, all sharing one diagonal.
pub fn write_join_chunk(
    input: &Path,
    chunk: ChunkDescriptor,
    output: &Path,
) -> Result<(), HypercubeError> {
    let mut reader = BufReader::new(File::open(input)?);
    reader.seek(SeekFrom::Start(chunk.byte_offset))?;

    let mut diagonal = String::new();
    let mut starts: Vec<(String, Genotype)> = Vec::with_capacity(chunk.num_lines);
    let mut ends: Vec<String> = Vec::with_capacity(chunk.num_lines);

    for _ in 0..chunk.num_lines {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Err(HypercubeError::malformed(
                &input.display().to_string(),
                "chunk extends past the end of the file",
            ));
        }
        let line = line.trim_end();
        let mut fields = line.split('\t');
        let (diag, first, last) = match (fields.next(), fields.next(), fields.next()) {
            (Some(diag), Some(first), Some(last)) => (diag, first, last),
            _ => {
                return Err(HypercubeError::malformed(
                    line,
                    "expected three tab-separated fields",
                ))
            }
        };
        diagonal = diag.to_string();
        starts.push((first.to_string(), Genotype::parse(first)?));
        ends.push(last.to_string());
    }

    // The canonical extension order is ascending in position, so only
    // positions past the diagonal's last one may extend it
    let last_token = diagonal.rsplit(':').next().unwrap_or("");
    let last_position = Change::parse(last_token)?.position();

    let mut lines = Vec::new();
    for i in 0..starts.len() {
        for j in (i + 1)..starts.len() {
            match delta(&starts[i].1, &starts[j].1) {
                Ok((direction, changes))
                    if changes.len() == 1 && changes[0].position() > last_position =>
                {
                    let extended = format!("{diagonal}:{}", changes[0].token());
                    let line = match direction {
                        Direction::Forward => {
                            format!("{extended}\t{}\t{}", starts[i].0, ends[j])
                        }
                        Direction::Reverse => {
                            format!("{extended}\t{}\t{}", starts[j].0, ends[i])
                        }
                    };
                    lines.push(line);
                }
                Ok(_) => {}
                Err(HypercubeError::IncomparableGenotypes) => {}
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write as _;
    use tempfile::TempDir;

    fn run_join(records: &[&str]) -> Vec<String> {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("hypercubes_1.txt");
        let header = "diagonal first_genotype last_genotype\n";
        let mut file = File::create(&input).unwrap();
        write!(file, "{header}").unwrap();
        for record in records {
            writeln!(file, "{record}").unwrap();
        }
        drop(file);

        let chunk = ChunkDescriptor {
            start_line: 1,
            num_lines: records.len(),
            byte_offset: header.len() as u64,
        };
        let output = dir.path().join("0.txt");
        write_join_chunk(&input, chunk, &output).unwrap();
        fs::read_to_string(&output)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_join_completes_square() {
        let lines = run_join(&["A10Z\t10A\t0Z", "A10Z\t10A:20K\t20K"]);
        assert_eq!(lines, ["A10Z:K20Z\t10A:20K\t0Z"]);
    }

    #[test]
    fn test_join_rejects_lower_position_extension() {
        // The starts differ at position 10, below the diagonal's last
        // position 20: the square was already produced via the ascending
        // order, so this group yields nothing.
        let lines = run_join(&["K20Z\t10A:20K\t10A", "K20Z\t20K\t0Z"]);
        assert!(lines.is_empty());
    }

    #[test]
    fn test_join_output_sorted_and_position_filtered() {
        let lines = run_join(&[
            "A10Z\t10A\t0Z",
            "A10Z\t10A:20K\t20K",
            "A10Z\t10A:30M\t30M",
        ]);
        assert_eq!(
            lines,
            ["A10Z:K20Z\t10A:20K\t0Z", "A10Z:M30Z\t10A:30M\t0Z"]
        );
    }

    #[test]
    fn test_join_duplicate_records_skipped() {
        let lines = run_join(&["A10Z\t10A\t0Z", "A10Z\t10A\t0Z"]);
        assert!(lines.is_empty());
    }
}
