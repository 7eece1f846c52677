use clap::{Parser, Subcommand};
use hypercubeme_lib::builder::BuildConfiguration;
use hypercubeme_lib::expand::expand_file;
use hypercubeme_lib::HypercubeBuilder;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

#[derive(Parser)]
#[command(name = "hypercubeme")]
#[command(version = "0.1.0")]
#[command(about = "HypercubeME: find combinatorially complete hypercubes in genotype data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find all hypercubes in a genotype list
    Find {
        /// Tab-delimited genotype file (header line, genotype in first column)
        #[arg(short, long, conflicts_with = "hypercubes", required_unless_present = "hypercubes")]
        genotypes: Option<PathBuf>,

        /// Resume from a previously generated hypercube file instead of a
        /// genotype list
        #[arg(short = 'p', long)]
        hypercubes: Option<PathBuf>,

        /// Output folder for the per-dimension hypercube files; must not exist
        #[arg(short = 'd', long, default_value = "hypercubes")]
        folder: PathBuf,

        /// Number of threads (0 = all available cores)
        #[arg(short = 'c', long, default_value = "1")]
        cores: usize,

        /// Cap on simultaneously open files during merging
        #[arg(long, default_value = "1021")]
        max_open_files: usize,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Expand hypercube records into their vertex genotypes
    Expand {
        /// Hypercube file produced by `find`
        #[arg(short = 'p', long)]
        hypercubes: PathBuf,

        /// Output file; defaults to <input stem>_expanded.txt and must not
        /// already exist
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing: use RUST_LOG if set, otherwise default to info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let start_time = Instant::now();

    match cli.command {
        Commands::Find {
            genotypes,
            hypercubes,
            folder,
            cores,
            max_open_files,
            verbose,
        } => {
            find_command(genotypes, hypercubes, folder, cores, max_open_files, verbose)?;
        }
        Commands::Expand { hypercubes, output } => {
            expand_command(hypercubes, output)?;
        }
    }

    info!("Elapsed time: {:.2?}", start_time.elapsed());
    Ok(())
}

fn find_command(
    genotypes: Option<PathBuf>,
    hypercubes: Option<PathBuf>,
    folder: PathBuf,
    cores: usize,
    max_open_files: usize,
    verbose: bool,
) -> anyhow::Result<()> {
    let config = BuildConfiguration {
        genotype_file: genotypes,
        hypercube_file: hypercubes,
        output_dir: folder,
        num_threads: cores,
        max_open_files,
        verbose,
    };

    let builder = HypercubeBuilder::new(config)?;
    let summary = builder.run()?;

    info!(
        "Found hypercubes up to dimension {}; results in {}",
        summary.max_dimension,
        summary.output_dir.display()
    );
    Ok(())
}

fn expand_command(hypercubes: PathBuf, output: Option<PathBuf>) -> anyhow::Result<()> {
    let output = output.unwrap_or_else(|| default_expanded_name(&hypercubes));

    info!("Expanding {}", hypercubes.display());
    let num_records = expand_file(&hypercubes, &output)?;
    info!(
        "Expanded {} records; output saved as {}",
        num_records,
        output.display()
    );
    Ok(())
}

/// `hypercubes_3.txt` expands to `hypercubes_3_expanded.txt` in the
/// current directory
fn default_expanded_name(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "hypercubes".to_string());
    PathBuf::from(format!("{stem}_expanded.txt"))
}
