use anyhow::{Context, Result};
use autodeps_bazel::{BazelClient, Workspace};
use autodeps_core::{expand_home, load_index, save_index, ConfigManager, LoggingConfig};
use autodeps_indexer::{load_graph, GraphSource, IndexBuilder, IndexOutcome};
use autodeps_resolver::{render, Resolver};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "autodeps")]
#[command(about = "Suggest Bazel deps for JVM targets from the classes they import", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (default: ./.autodeps.toml, then ~/.autodeps/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the class index from the transitive deps of a seed target
    Index(IndexArgs),

    /// Print the deps a target (//foo:bar) or a class (com.foo.Bar) needs
    Resolve(ResolveArgs),
}

#[derive(Args)]
struct IndexArgs {
    /// Seed target whose transitive deps are indexed
    #[arg(long, conflicts_with = "seed_file")]
    seed: Option<String>,

    /// Read the dependency graph from a saved `cquery --output=jsonproto` file
    #[arg(long)]
    seed_file: Option<PathBuf>,

    /// Bazel workspace directory
    #[arg(long)]
    workspace: Option<PathBuf>,

    /// Where to write the index database
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct ResolveArgs {
    /// Bazel target or fully qualified class name
    target: String,

    /// Index database to read
    #[arg(long)]
    db: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let manager =
        ConfigManager::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_logging(&manager.config().logging, cli.verbose);
    info!("{}", config_source(&manager));

    match cli.command {
        Commands::Index(args) => run_index(&manager, args),
        Commands::Resolve(args) => run_resolve(&manager, args),
    }
}

/// Where the configuration came from, logged once the subscriber is up.
fn config_source(manager: &ConfigManager) -> String {
    match manager.config_path() {
        Some(path) => format!("Using configuration from {}", path.display()),
        None => "No config file found, using defaults".to_string(),
    }
}

/// Logs go to stderr; stdout only carries the suggested deps.
fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);
    let registry = tracing_subscriber::registry().with(filter);

    match logging.format.as_str() {
        "json" => registry.with(layer.json()).init(),
        "pretty" => registry.with(layer.pretty()).init(),
        _ => registry.with(layer.compact()).init(),
    }
}

fn workspace_root(explicit: Option<PathBuf>, manager: &ConfigManager) -> Result<PathBuf> {
    match explicit
        .map(|p| expand_home(&p))
        .or_else(|| manager.workspace_root())
    {
        Some(root) => Ok(root),
        None => std::env::current_dir().context("Failed to read the current directory"),
    }
}

fn graph_source(args: &IndexArgs, default_seed: &str) -> GraphSource {
    match (&args.seed_file, &args.seed) {
        (Some(file), _) => GraphSource::Snapshot(file.clone()),
        (None, Some(seed)) => GraphSource::Seed(seed.clone()),
        (None, None) => GraphSource::Seed(default_seed.to_string()),
    }
}

fn run_index(manager: &ConfigManager, args: IndexArgs) -> Result<()> {
    let config = manager.config();
    let root = workspace_root(args.workspace.clone(), manager)?;
    let client = BazelClient::new(&config.bazel.binary, &root);

    let workspace = Workspace::discover(&root, &config.workspace, &client)
        .context("Failed to locate the bazel output directories")?;
    let source = graph_source(&args, &config.index.seed);
    let graph = load_graph(&source, &client)
        .with_context(|| format!("Failed to load the dependency graph from {:?}", source))?;

    let outcome = IndexBuilder::new(&client, &workspace, config)
        .with_progress(progress_bar()?)
        .build_from_json(&graph)
        .context("Index build failed")?;

    let output = args
        .output
        .map(|p| expand_home(&p))
        .unwrap_or_else(|| manager.database_path());
    save_index(&outcome.index, &output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    print_summary(&outcome, &output);
    Ok(())
}

fn progress_bar() -> Result<ProgressBar> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("█▉▊▋▌▍▎▏ "),
    );
    Ok(pb)
}

fn print_summary(outcome: &IndexOutcome, output: &Path) {
    let index = &outcome.index;
    let report = &outcome.report;
    eprintln!(
        "{} {} libraries, {} classes, {} aliases -> {}",
        "Indexed".green().bold(),
        index.libraries().len(),
        index.class_count(),
        index.alias().len(),
        output.display()
    );
    let ambiguous = index.class_index().ambiguous().count();
    if ambiguous > 0 {
        eprintln!(
            "{} {} classes are provided by more than one library",
            "Note:".cyan(),
            ambiguous
        );
    }
    if !report.malformed.is_empty() {
        eprintln!(
            "{} {}",
            "Malformed rules ignored:".yellow(),
            report.malformed.join(", ")
        );
    }
    if !report.skipped_kinds.is_empty() {
        let kinds: Vec<&str> = report.skipped_kinds.iter().map(String::as_str).collect();
        eprintln!("{} {}", "Skipped rule kinds:".dimmed(), kinds.join(", "));
    }
    for failure in &report.failures {
        eprintln!(
            "{} {}: {}",
            "No classes for".yellow(),
            failure.library,
            failure.reason
        );
    }
}

fn run_resolve(manager: &ConfigManager, args: ResolveArgs) -> Result<()> {
    let db = args
        .db
        .map(|p| expand_home(&p))
        .unwrap_or_else(|| manager.database_path());
    let index = load_index(&db).with_context(|| {
        format!(
            "Failed to load index {} (run `autodeps index` first)",
            db.display()
        )
    })?;

    let root = workspace_root(None, manager)?;
    let client = BazelClient::new(&manager.config().bazel.binary, &root);
    let resolution = Resolver::new(&index)
        .with_source_root(&root)
        .resolve(&args.target, &client)
        .with_context(|| format!("Failed to resolve {}", args.target))?;

    print!("{}", render(&resolution));
    if !resolution.unresolved.is_empty() {
        eprintln!(
            "{} {} imported classes are not provided by any indexed library",
            "warning:".yellow().bold(),
            resolution.unresolved.len()
        );
    }
    Ok(())
}
