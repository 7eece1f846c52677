//! Division of work into independent parallel units
//!
//! Dimension 1 splits the genotype list into near-equal contiguous ranges.
//! Dimension d > 1 scans the sorted dimension-(d-1) file once and emits one
//! chunk descriptor per diagonal group of two or more records; a diagonal
//! appearing only once has no pair to extend and is dropped. Each descriptor
//! is self-sufficient: a worker re-opens the file and seeks to the byte
//! offset, so the file itself is never loaded into memory.

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use memmap2::Mmap;

use crate::error::HypercubeError;

/// One unit of join work: a run of records sharing a diagonal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkDescriptor {
    /// 1-based record line the chunk starts at (header excluded)
    pub start_line: usize,
    /// Number of records in the chunk (always ≥ 2)
    pub num_lines: usize,
    /// Byte offset of the chunk's first record within the file
    pub byte_offset: u64,
}

/// Split `num_items` into `num_parts` near-equal contiguous `(start, len)`
/// ranges.
///
/// Boundaries are `round(i * num_items / num_parts)`, so the ranges
/// partition `[0, num_items)` exactly and differ in size by at most one.
/// When `num_items < num_parts` the result is `num_items` singleton ranges.
pub fn divide_list(num_items: usize, num_parts: usize) -> Vec<(usize, usize)> {
    if num_items == 0 || num_parts == 0 {
        return Vec::new();
    }
    if num_items < num_parts {
        return (0..num_items).map(|i| (i, 1)).collect();
    }
    let mut division = Vec::with_capacity(num_parts);
    for i in 0..num_parts {
        let current = ((i * num_items) as f64 / num_parts as f64).round() as usize;
        let following = (((i + 1) * num_items) as f64 / num_parts as f64).round() as usize;
        division.push((current, following - current));
    }
    division
}

/// Scan a sorted per-dimension hypercube file and return one chunk
/// descriptor per diagonal group of two or more records.
///
/// The scan is a single linear pass over the memory-mapped file; nothing is
/// parsed beyond the diagonal field of each line.
pub fn divide_hypercube_file(path: &Path) -> Result<Vec<ChunkDescriptor>, HypercubeError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => HypercubeError::InputNotFound(path.to_path_buf()),
        _ => HypercubeError::Io(e),
    })?;
    if file.metadata()?.len() == 0 {
        return Ok(Vec::new());
    }
    let mmap = unsafe { Mmap::map(&file)? };
    let data: &[u8] = &mmap;

    // Skip the header line
    let header_end = match data.iter().position(|&b| b == b'\n') {
        Some(pos) => pos,
        None => return Ok(Vec::new()),
    };

    let mut division = Vec::new();
    let mut offset = header_end + 1;
    let mut current_line = 1usize;
    let mut chunk_start_line = 1usize;
    let mut chunk_start_offset = offset as u64;
    let mut previous_diagonal: Option<&[u8]> = None;

    while offset < data.len() {
        let line_end = data[offset..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|pos| offset + pos)
            .unwrap_or(data.len());
        let line = &data[offset..line_end];
        if line.is_empty() {
            offset = line_end + 1;
            continue;
        }
        let diagonal_end = line.iter().position(|&b| b == b'\t').unwrap_or(line.len());
        let diagonal = &line[..diagonal_end];

        if let Some(previous) = previous_diagonal {
            if previous != diagonal {
                if current_line - chunk_start_line > 1 {
                    // At least two records share the diagonal: joinable
                    division.push(ChunkDescriptor {
                        start_line: chunk_start_line,
                        num_lines: current_line - chunk_start_line,
                        byte_offset: chunk_start_offset,
                    });
                }
                chunk_start_line = current_line;
                chunk_start_offset = offset as u64;
            }
        }

        previous_diagonal = Some(diagonal);
        current_line += 1;
        offset = line_end + 1;
    }

    if current_line - chunk_start_line > 1 {
        division.push(ChunkDescriptor {
            start_line: chunk_start_line,
            num_lines: current_line - chunk_start_line,
            byte_offset: chunk_start_offset,
        });
    }

    Ok(division)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn test_divide_list_empty() {
        assert!(divide_list(0, 4).is_empty());
        assert!(divide_list(4, 0).is_empty());
    }

    #[test]
    fn test_divide_list_singletons_when_fewer_items_than_parts() {
        let division = divide_list(3, 8);
        assert_eq!(division, [(0, 1), (1, 1), (2, 1)]);
    }

    #[test]
    fn test_divide_list_partitions_exactly() {
        for num_items in [1usize, 2, 7, 10, 99, 100, 1000] {
            for num_parts in [1usize, 2, 3, 7, 10, 64] {
                let division = divide_list(num_items, num_parts);
                // Ranges are contiguous and cover [0, num_items) exactly
                let mut next = 0usize;
                for &(start, len) in &division {
                    assert_eq!(start, next, "n={num_items} parts={num_parts}");
                    next = start + len;
                }
                assert_eq!(next, num_items, "n={num_items} parts={num_parts}");
                // Sizes differ by at most one
                if num_items >= num_parts {
                    let min = division.iter().map(|&(_, len)| len).min().unwrap();
                    let max = division.iter().map(|&(_, len)| len).max().unwrap();
                    assert!(max - min <= 1, "n={num_items} parts={num_parts}");
                }
            }
        }
    }

    fn hypercube_file(records: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "diagonal first_genotype last_genotype").unwrap();
        for record in records {
            writeln!(file, "{record}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_divide_hypercube_file_groups() {
        let file = hypercube_file(&[
            "A10Z\t10A\t0Z",
            "A10Z\t10A:20K\t20K",
            "K20Z\t10A:20K\t10A", // singleton diagonal, dropped
            "M30Z\t30M\t0Z",
            "M30Z\t10A:30M\t10A",
            "M30Z\t20K:30M\t20K",
        ]);
        let division = divide_hypercube_file(file.path()).unwrap();
        assert_eq!(division.len(), 2);
        assert_eq!(division[0].start_line, 1);
        assert_eq!(division[0].num_lines, 2);
        assert_eq!(division[1].start_line, 4);
        assert_eq!(division[1].num_lines, 3);

        // Every descriptor must be self-sufficient: seeking to its byte
        // offset yields exactly its records, all sharing one diagonal.
        for chunk in &division {
            let mut reader = BufReader::new(File::open(file.path()).unwrap());
            reader.seek(SeekFrom::Start(chunk.byte_offset)).unwrap();
            let mut diagonals = Vec::new();
            for _ in 0..chunk.num_lines {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                diagonals.push(line.split('\t').next().unwrap().to_string());
            }
            assert!(diagonals.windows(2).all(|w| w[0] == w[1]));
        }
    }

    #[test]
    fn test_divide_hypercube_file_all_singletons() {
        let file = hypercube_file(&["A10Z\t10A\t0Z", "K20Z\t20K\t0Z"]);
        assert!(divide_hypercube_file(file.path()).unwrap().is_empty());
    }

    #[test]
    fn test_divide_hypercube_file_header_only() {
        let file = hypercube_file(&[]);
        assert!(divide_hypercube_file(file.path()).unwrap().is_empty());
    }

    #[test]
    fn test_divide_hypercube_file_missing() {
        let err = divide_hypercube_file(Path::new("no/such/file.txt")).unwrap_err();
        assert!(matches!(err, HypercubeError::InputNotFound(_)));
    }
}
