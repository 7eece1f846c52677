//! Driver for the iterative dimension loop
//!
//! Coordinates the per-dimension pipeline:
//! 1. Divide the dimension's input into independent units of work
//! 2. Run edge/join workers in parallel, one chunk file each
//! 3. Merge all chunk files into the dimension's sorted hypercube file
//! 4. Advance to dimension + 1, or stop when a dimension yields nothing

use std::fs::{self, File};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::constants::{hypercube_file_name, CHUNKS_PER_CORE, HYPERCUBE_FILE_HEADER};
use crate::delta::Change;
use crate::error::HypercubeError;
use crate::genotype::{read_genotypes, Genotype};

use super::config::BuildConfiguration;
use super::divide::{divide_hypercube_file, divide_list};
use super::edges::write_edge_chunk;
use super::join::write_join_chunk;
use super::merge::merge_sorted_files;

/// Builder running the iterative hypercube-construction loop
pub struct HypercubeBuilder {
    config: BuildConfiguration,
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct BuildSummary {
    /// The largest dimension for which at least one hypercube was found
    pub max_dimension: usize,
    /// Folder holding the per-dimension hypercube files
    pub output_dir: PathBuf,
}

impl HypercubeBuilder {
    /// Create a new builder with the given configuration
    pub fn new(config: BuildConfiguration) -> Result<Self, HypercubeError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run the full pipeline.
    ///
    /// Configuration and input-existence errors are raised before any work
    /// starts. The output folder must not pre-exist; intermediate files of
    /// a failed run are left in place for diagnosis.
    pub fn run(&self) -> Result<BuildSummary, HypercubeError> {
        if self.config.output_dir.exists() {
            return Err(HypercubeError::Config(format!(
                "folder or file {} exists, run again with another folder name",
                self.config.output_dir.display()
            )));
        }
        let input = self
            .config
            .genotype_file
            .as_ref()
            .or(self.config.hypercube_file.as_ref());
        if let Some(path) = input {
            if !path.is_file() {
                return Err(HypercubeError::InputNotFound(path.clone()));
            }
        }
        fs::create_dir(&self.config.output_dir)?;

        // num_threads == 0 means "all cores" (rayon default)
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.num_threads)
            .build()
            .map_err(|e| HypercubeError::Config(format!("failed to create thread pool: {e}")))?;

        pool.install(|| self.run_inner())
    }

    /// Inner dimension loop, runs inside the rayon thread pool
    fn run_inner(&self) -> Result<BuildSummary, HypercubeError> {
        self.config.print();
        let out_dir = &self.config.output_dir;

        let mut dimension = 1usize;
        let mut genotypes: Vec<Genotype> = Vec::new();
        match (&self.config.genotype_file, &self.config.hypercube_file) {
            (Some(input), None) => {
                genotypes = read_genotypes(input)?;
                info!("Read {} genotypes from {}", genotypes.len(), input.display());
            }
            (None, Some(resume)) => {
                dimension = detect_dimension(resume)?;
                info!(
                    "Resuming from dimension-{} hypercubes in {}",
                    dimension,
                    resume.display()
                );
                fs::copy(resume, out_dir.join(hypercube_file_name(dimension)))?;
                dimension += 1;
            }
            _ => {
                return Err(HypercubeError::Config(
                    "exactly one input file must be configured".to_string(),
                ))
            }
        }

        let mut max_dimension = dimension - 1;
        loop {
            info!("Generating hypercubes for dimension {dimension}");

            let chunk_files = if dimension == 1 {
                self.edge_chunks(&genotypes, out_dir)?
            } else {
                self.join_chunks(out_dir, dimension)?
            };
            info!("Number of chunks: {}", chunk_files.len());
            if chunk_files.is_empty() {
                break;
            }

            // Prune empty chunk files before merging; they hold no records
            let mut sorted_files = Vec::with_capacity(chunk_files.len());
            for path in chunk_files {
                match fs::metadata(&path) {
                    Ok(meta) if meta.len() > 0 => sorted_files.push(path),
                    Ok(_) => fs::remove_file(&path)?,
                    Err(_) => {}
                }
            }

            let merged = out_dir.join(hypercube_file_name(dimension));
            let mut header = File::create(&merged)?;
            writeln!(header, "{HYPERCUBE_FILE_HEADER}")?;
            drop(header);

            if !merge_sorted_files(&sorted_files, self.config.max_open_files, &merged)? {
                break;
            }
            max_dimension = dimension;
            dimension += 1;
        }

        info!("Largest complete hypercube dimension: {max_dimension}");
        Ok(BuildSummary {
            max_dimension,
            output_dir: out_dir.clone(),
        })
    }

    /// Dimension 1: emit edge chunk files in parallel over genotype ranges
    fn edge_chunks(
        &self,
        genotypes: &[Genotype],
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, HypercubeError> {
        let cores = rayon::current_num_threads();
        let parts = (cores * CHUNKS_PER_CORE).min(genotypes.len());
        let division = divide_list(genotypes.len(), parts);
        if self.config.verbose {
            let report: Vec<String> = division
                .iter()
                .map(|&(start, len)| format!("{start}-{len}"))
                .collect();
            debug!("Division into chunks (start-len): {}", report.join(", "));
        }

        division
            .par_iter()
            .enumerate()
            .map(|(i, &(start, len))| {
                let path = out_dir.join(format!("{i}.txt"));
                write_edge_chunk(genotypes, start, len, &path)?;
                Ok(path)
            })
            .collect()
    }

    /// Dimension d > 1: join diagonal groups of the previous dimension's
    /// file in parallel, one chunk file per group
    fn join_chunks(
        &self,
        out_dir: &Path,
        dimension: usize,
    ) -> Result<Vec<PathBuf>, HypercubeError> {
        let input = out_dir.join(hypercube_file_name(dimension - 1));
        let division = divide_hypercube_file(&input)?;
        if self.config.verbose {
            let report: Vec<String> = division
                .iter()
                .map(|chunk| format!("{}-{}", chunk.start_line, chunk.num_lines))
                .collect();
            debug!("Division into chunks (start-len): {}", report.join(", "));
        }

        division
            .par_iter()
            .enumerate()
            .map(|(i, &chunk)| {
                let path = out_dir.join(format!("{i}.txt"));
                write_join_chunk(&input, chunk, &path)?;
                Ok(path)
            })
            .collect()
    }
}

/// Infer the dimension of the hypercubes stored in `path` from the number
/// of colon-separated change tokens in its first diagonal.
pub fn detect_dimension(path: &Path) -> Result<usize, HypercubeError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => HypercubeError::InputNotFound(path.to_path_buf()),
        _ => HypercubeError::Io(e),
    })?;
    let mut lines = BufReader::new(file).lines();
    let _header = lines
        .next()
        .transpose()?
        .ok_or_else(|| HypercubeError::malformed(&path.display().to_string(), "file is empty"))?;
    let first = lines.next().transpose()?.ok_or_else(|| {
        HypercubeError::malformed(
            &path.display().to_string(),
            "file holds no hypercube records",
        )
    })?;
    let diagonal = first.split('\t').next().unwrap_or("");
    let mut dimension = 0;
    for token in diagonal.split(':') {
        Change::parse(token)?;
        dimension += 1;
    }
    Ok(dimension)
}
