use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use flags::FormatFlag;
use modview_extractor::ModuleFacts;
use modview_graph::{
    analyze, close_exports, render, DependencyGraph, ModuleDocument, OutputFormat,
};
use modview_indexer::{IndexedModules, ModuleIndexer};
use settings::Settings;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

mod flags;
pub mod settings;

/// Output path used for HTML when none is given
pub const DEFAULT_HTML_OUTPUT: &str = "module_view.html";

fn print_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "modview")]
#[command(about = "Recover a call-weighted module view of a Python source tree", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the module dependency graph and render it
    Analyze(AnalyzeArgs),

    /// Print extracted per-module facts as JSON
    Facts(FactsArgs),

    /// Render a previously written JSON module document
    Render(RenderArgs),
}

#[derive(Args)]
struct SourceArgs {
    /// Root directory of the Python source tree
    root: PathBuf,

    /// Settings file (JSON, or TOML by extension); defaults to ./settings.json
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Additional directory name to prune (repeatable)
    #[arg(long = "skip", value_name = "DIR")]
    skip: Vec<String>,

    /// Skip files that cannot be read or parsed instead of failing
    #[arg(long)]
    skip_unparsable: bool,

    /// Honour .gitignore files while walking
    #[arg(long)]
    respect_gitignore: bool,
}

#[derive(Args)]
struct AnalyzeArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "html")]
    format: FormatFlag,

    /// Output path, `-` for stdout (default: module_view.html for html, stdout otherwise)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Truncate every module name to N segments (replaces `levels`)
    #[arg(long, value_name = "N")]
    depth: Option<usize>,
}

#[derive(Args)]
struct FactsArgs {
    #[command(flatten)]
    source: SourceArgs,
}

#[derive(Args)]
struct RenderArgs {
    /// JSON module document written by `analyze --format json`
    document: PathBuf,

    /// Settings file providing the layout
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "html")]
    format: FormatFlag,

    /// Output path, `-` for stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
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

    match cli.command {
        Commands::Analyze(args) => run_analyze(args),
        Commands::Facts(args) => run_facts(args),
        Commands::Render(args) => run_render(args),
    }
}

impl SourceArgs {
    fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::load(self.config.as_deref())?;
        settings.skip_analyze.extend(self.skip.iter().cloned());
        settings.skip_unparsable |= self.skip_unparsable;
        settings.respect_gitignore |= self.respect_gitignore;
        Ok(settings)
    }
}

fn index(root: &Path, settings: &Settings) -> Result<IndexedModules> {
    let mut indexer = ModuleIndexer::new(settings.parse_error_policy())?;
    let indexed = indexer
        .index_project(root, settings.discovery_options())
        .with_context(|| format!("Failed to index {}", root.display()))?;

    if !indexed.diagnostics.is_empty() {
        log::warn!("Skipped {} unparsable modules:", indexed.diagnostics.len());
        for diagnostic in &indexed.diagnostics {
            log::warn!("  {} ({}): {}", diagnostic.module, diagnostic.path.display(), diagnostic.message);
        }
    }

    Ok(indexed)
}

fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let mut settings = args.source.settings()?;
    if let Some(depth) = args.depth {
        settings.depth = Some(depth);
        settings.levels.clear();
    }
    let policy = settings.aggregation_policy()?;

    let indexed = index(&args.source.root, &settings)?;
    let graph = analyze(&indexed.modules, &policy);

    write_artifact(&graph, args.format.as_domain(), &settings, args.output.as_deref())
}

fn run_facts(args: FactsArgs) -> Result<()> {
    let settings = args.source.settings()?;
    let indexed = index(&args.source.root, &settings)?;

    let closed: BTreeMap<String, ModuleFacts> = close_exports(&indexed.modules);
    print_stdout(&serde_json::to_string_pretty(&closed)?)
}

fn run_render(args: RenderArgs) -> Result<()> {
    let settings = Settings::load(args.config.as_deref())?;
    let content = fs::read_to_string(&args.document)
        .with_context(|| format!("Failed to read {}", args.document.display()))?;
    let document: ModuleDocument = serde_json::from_str(&content)
        .with_context(|| format!("Invalid module document {}", args.document.display()))?;

    let graph = DependencyGraph::from_document(&document);
    write_artifact(&graph, args.format.as_domain(), &settings, args.output.as_deref())
}

/// Where an artifact goes: `None` means stdout
fn output_target(format: OutputFormat, output: Option<&Path>) -> Option<PathBuf> {
    match output {
        Some(path) if path == Path::new("-") => None,
        Some(path) => Some(path.to_path_buf()),
        None if format == OutputFormat::Html => Some(PathBuf::from(DEFAULT_HTML_OUTPUT)),
        None => None,
    }
}

fn write_artifact(
    graph: &DependencyGraph,
    format: OutputFormat,
    settings: &Settings,
    output: Option<&Path>,
) -> Result<()> {
    let rendered = render(graph, format, &settings.layout)?;

    match output_target(format, output) {
        Some(path) => {
            fs::write(&path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!(
                "Wrote {format} module view ({} nodes, {} edges) to {}",
                graph.node_count(),
                graph.edge_count(),
                path.display()
            );
            Ok(())
        }
        None => print_stdout(&rendered),
    }
}
