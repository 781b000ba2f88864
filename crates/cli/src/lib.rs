use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

mod command;
mod config;
mod dataset;

pub use command::{
    CheckIndexReport, ClassifierKind, ClusterMethod, ClusterReport, ClusteredImage, EvaluateReport,
    SegmentReport, ShardReport,
};
pub use config::{
    AciConfig, ClassificationConfig, DirichletConfig, MultipleGraphsConfig, PrincipalAnglesConfig,
    SpectraConfig, TreeWalkConfig, CONFIG_ENV, DEFAULT_CONFIG_FILE,
};
pub use dataset::{CharacterEntry, DatasetManifest, ImageEntry, MANIFEST_FILE};

#[derive(Parser)]
#[command(name = "aci")]
#[command(about = "Animation character identification from segmentation graphs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file (overrides ACI_CONFIG and ./aci.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Pre-process and segment an image, writing its region image
    Segment(SegmentArgs),

    /// Cluster the images of a dataset by their segmentation graphs
    Cluster(ClusterArgs),

    /// Leave one out recognition rate of a graph classifier
    Evaluate(EvaluateArgs),

    /// Parse documentation search shards and report duplicate keys
    #[command(name = "check-index")]
    CheckIndex(CheckIndexArgs),

    /// Print the effective configuration
    Config,
}

#[derive(Args)]
struct SegmentArgs {
    /// PPM image
    #[arg(long)]
    image: PathBuf,

    /// PGM mask, zero pixels are foreground as in dataset masks (every pixel
    /// without a mask)
    #[arg(long)]
    mask: Option<PathBuf>,

    /// Non zero mask pixels are foreground instead
    #[arg(long = "no-invert-mask", requires = "mask", action = ArgAction::SetFalse)]
    invert_mask: bool,

    /// PPM region image to write
    #[arg(long, short = 'o')]
    output: PathBuf,
}

#[derive(Args)]
struct ClusterArgs {
    /// Directory holding dataset.toml and the images it lists
    #[arg(long)]
    dataset: PathBuf,

    /// Number of clusters
    #[arg(long)]
    classes: usize,

    /// Similarity between segmentation graphs
    #[arg(long, value_enum, default_value_t = ClusterMethod::Spectrum)]
    method: ClusterMethod,
}

#[derive(Args)]
struct EvaluateArgs {
    /// Directory holding dataset.toml and the images it lists
    #[arg(long)]
    dataset: PathBuf,

    /// Classifier to evaluate
    #[arg(long, value_enum, default_value_t = ClassifierKind::SpectrumDistance)]
    classifier: ClassifierKind,
}

#[derive(Args)]
struct CheckIndexArgs {
    /// Shard files, or directories searched for .js shards
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Also report the entry matching this token, ignoring case
    #[arg(long)]
    lookup: Option<String>,
}

pub fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let (config, config_path) = AciConfig::load(cli.config.as_deref())?;
    if let Some(path) = &config_path {
        log::debug!("configuration: {}", path.display());
    }

    match cli.command {
        Commands::Segment(args) => {
            let report = command::run_segment(
                &args.image,
                args.mask.as_deref(),
                args.invert_mask,
                &args.output,
                &config,
            )?;
            command::print_json(&report)?;
        }
        Commands::Cluster(args) => {
            let report = command::run_cluster(&args.dataset, args.classes, args.method, &config)?;
            command::print_json(&report)?;
        }
        Commands::Evaluate(args) => {
            let report = command::run_evaluate(&args.dataset, args.classifier, &config)?;
            command::print_json(&report)?;
        }
        Commands::CheckIndex(args) => {
            let report = command::run_check_index(&args.paths, args.lookup.as_deref())?;
            command::print_json(&report)?;
            if report.has_duplicates() {
                std::process::exit(1);
            }
        }
        Commands::Config => command::print_json(&config)?,
    }

    Ok(())
}
