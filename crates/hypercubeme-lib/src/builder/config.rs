//! Build configuration for hypercube construction

use std::path::PathBuf;

use crate::constants::MAX_OPEN_FILES;
use crate::error::HypercubeError;

/// Configuration parameters for a hypercube-construction run
#[derive(Debug, Clone)]
pub struct BuildConfiguration {
    /// Genotype list to start from (dimension 1 upward)
    pub genotype_file: Option<PathBuf>,

    /// Precomputed hypercube file to resume from; its dimension is inferred
    /// from the first diagonal and the loop continues at the next dimension
    pub hypercube_file: Option<PathBuf>,

    /// Folder for intermediate and result files; must not pre-exist
    pub output_dir: PathBuf,

    /// Number of threads for parallel workers (0 = all available cores)
    pub num_threads: usize,

    /// Budget of simultaneously open files during merging
    pub max_open_files: usize,

    /// Report the chunk division of every dimension
    pub verbose: bool,
}

impl Default for BuildConfiguration {
    fn default() -> Self {
        Self {
            genotype_file: None,
            hypercube_file: None,
            output_dir: PathBuf::from("hypercubes"),
            num_threads: 1,
            max_open_files: MAX_OPEN_FILES,
            verbose: false,
        }
    }
}

impl BuildConfiguration {
    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<(), HypercubeError> {
        match (&self.genotype_file, &self.hypercube_file) {
            (Some(_), None) | (None, Some(_)) => {}
            (Some(_), Some(_)) => {
                return Err(HypercubeError::Config(
                    "give either a genotype file or a hypercube file, not both".to_string(),
                ))
            }
            (None, None) => {
                return Err(HypercubeError::Config(
                    "either a genotype file or a hypercube file is required".to_string(),
                ))
            }
        }
        if self.output_dir.as_os_str().is_empty()
            || self.output_dir.to_string_lossy().trim().is_empty()
        {
            return Err(HypercubeError::Config(
                "output folder name is empty".to_string(),
            ));
        }
        if self.max_open_files < 2 {
            return Err(HypercubeError::ResourceExceeded(self.max_open_files));
        }
        Ok(())
    }

    /// Log configuration parameters via tracing
    pub fn print(&self) {
        tracing::info!("Build Configuration:");
        if let Some(path) = &self.genotype_file {
            tracing::info!("  genotypes = {}", path.display());
        }
        if let Some(path) = &self.hypercube_file {
            tracing::info!("  hypercubes = {}", path.display());
        }
        tracing::info!("  output_dir = {}", self.output_dir.display());
        if self.num_threads == 0 {
            tracing::info!("  num_threads = all available cores");
        } else {
            tracing::info!("  num_threads = {}", self.num_threads);
        }
        tracing::debug!("  max_open_files = {}", self.max_open_files);
        tracing::debug!("  verbose = {}", self.verbose);
    }
}
