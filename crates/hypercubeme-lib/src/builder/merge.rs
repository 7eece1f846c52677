//! External k-way merge of locally sorted chunk files
//!
//! The merge phase of a classic external merge-sort: repeatedly append the
//! lexicographically smallest current line across all open inputs, with ties
//! broken by input order (stable). When the number of inputs exceeds the
//! open-file budget, files are partitioned into groups that are merged
//! recursively into intermediates first, bounding the peak open-file count
//! at the budget regardless of total input count. Recursion depth is
//! `log_budget(file_count)`.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::HypercubeError;

/// One open input with its current (not yet consumed) line
struct FileCursor {
    reader: BufReader<File>,
    current: String,
}

impl FileCursor {
    /// Open a chunk file; `None` when the file holds no lines
    fn open(path: &Path) -> Result<Option<Self>, std::io::Error> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut current = String::new();
        if reader.read_line(&mut current)? == 0 {
            return Ok(None);
        }
        trim_newline(&mut current);
        Ok(Some(Self { reader, current }))
    }

    /// Advance to the next line; `false` when the file is exhausted
    fn advance(&mut self) -> Result<bool, std::io::Error> {
        self.current.clear();
        if self.reader.read_line(&mut self.current)? == 0 {
            return Ok(false);
        }
        trim_newline(&mut self.current);
        Ok(true)
    }
}

fn trim_newline(line: &mut String) {
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
}

/// Merge locally sorted `inputs` into `output` (appending), deleting all
/// inputs on success.
///
/// Returns whether any record was written; `false` means no input held a
/// record at all, which signals the dimension driver to terminate.
pub fn merge_sorted_files(
    inputs: &[PathBuf],
    max_open_files: usize,
    output: &Path,
) -> Result<bool, HypercubeError> {
    if max_open_files < 2 {
        return Err(HypercubeError::ResourceExceeded(max_open_files));
    }
    if inputs.is_empty() {
        return Ok(false);
    }

    if inputs.len() > max_open_files {
        // Too many files for one pass: fold groups into intermediates first
        let num_parts = inputs.len().div_ceil(max_open_files);
        let files_per_part = inputs.len().div_ceil(num_parts);
        debug!(
            "Merging {} files in {} groups of up to {}",
            inputs.len(),
            num_parts,
            files_per_part
        );

        let mut intermediates = Vec::with_capacity(num_parts);
        let mut found = false;
        for (i, group) in inputs.chunks(files_per_part).enumerate() {
            // Intermediate names derive from the group's first input, so
            // every recursion level gets fresh names that collide neither
            // with `output` nor with any of its own inputs
            let intermediate = PathBuf::from(format!("{}.{}", group[0].display(), i));
            found |= merge_sorted_files(group, max_open_files, &intermediate)?;
            intermediates.push(intermediate);
        }
        if !found {
            for intermediate in &intermediates {
                let _ = fs::remove_file(intermediate);
            }
            return Ok(false);
        }
        return merge_sorted_files(&intermediates, max_open_files, output);
    }

    let mut cursors = Vec::with_capacity(inputs.len());
    for path in inputs {
        if let Some(cursor) = FileCursor::open(path)? {
            cursors.push(cursor);
        }
    }

    let file = OpenOptions::new().create(true).append(true).open(output)?;
    let mut writer = BufWriter::with_capacity(1024 * 1024, file);
    let mut wrote = false;

    while !cursors.is_empty() {
        // Strict less-than keeps the earliest input on ties (stable)
        let mut min_idx = 0;
        for i in 1..cursors.len() {
            if cursors[i].current < cursors[min_idx].current {
                min_idx = i;
            }
        }
        writeln!(writer, "{}", cursors[min_idx].current)?;
        wrote = true;
        if !cursors[min_idx].advance()? {
            cursors.remove(min_idx);
        }
    }
    writer.flush()?;
    drop(writer);

    for path in inputs {
        fs::remove_file(path)?;
    }
    Ok(wrote)
}
