use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stylegraph::config::Config;
use stylegraph::export::{self, DefinerLookup, ExportData, ExportFormat, FileIndex, Summary};
use stylegraph::pipeline::Pipeline;
use stylegraph::report::ReportStore;
use stylegraph::stats::{Column, MedianMode};

#[derive(Parser)]
#[command(name = "stylegraph")]
#[command(version)]
#[command(about = "SCSS import graph analyzer with export provenance and stylesheet statistics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the nearest .stylegraph.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the import graph from the root and write the report
    Analyze {
        /// Directory file ids are relative to
        #[arg(long)]
        base_dir: Option<PathBuf>,

        /// Root stylesheet, relative to the base directory
        #[arg(long)]
        root: Option<PathBuf>,

        /// Where to write the report
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// How the median is picked
        #[arg(long, value_enum)]
        median: Option<MedianMode>,

        /// Also list stylesheets the root never reaches
        #[arg(long)]
        report_unreachable: bool,

        /// Output format: json, csv, markdown
        #[arg(short, long, default_value = "markdown")]
        format: ExportFormat,
    },
    /// List files sorted by a statistics column
    Files {
        /// Report to read
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Column to sort by
        #[arg(short, long, default_value = "averageSpecificity")]
        sort: Column,

        /// Output format: json, csv, markdown
        #[arg(short, long, default_value = "markdown")]
        format: ExportFormat,
    },
    /// Show one file's exports, imports and importers
    File {
        /// File id, as listed by `files`
        id: String,

        /// Report to read
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Output format: json, csv, markdown
        #[arg(short, long, default_value = "markdown")]
        format: ExportFormat,
    },
    /// List original definitions, or where one identifier is defined
    Exports {
        /// Identifier to look up (without `$` or `@mixin`)
        identifier: Option<String>,

        /// Report to read
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Output format: json, csv, markdown
        #[arg(short, long, default_value = "markdown")]
        format: ExportFormat,
    },
    /// Summarize statistics of a report
    Stats {
        /// Report to read
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// How the median is picked
        #[arg(long, value_enum)]
        median: Option<MedianMode>,

        /// Output format: json, csv, markdown
        #[arg(short, long, default_value = "markdown")]
        format: ExportFormat,
    },
    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Diagnostics go to stderr so rendered output can be piped.
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("stylegraph={}", log_level)));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    if let Commands::Version = cli.command {
        println!("stylegraph v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            base_dir,
            root,
            output,
            median,
            report_unreachable,
            format,
        } => {
            let base_dir = base_dir.unwrap_or(config.base_dir);
            let root = root.unwrap_or(config.root);
            let output = output.unwrap_or(config.output);

            let analysis = Pipeline::new(&base_dir, &root)
                .median(median.unwrap_or(config.median))
                .report_unreachable(report_unreachable || config.report_unreachable)
                .run()
                .with_context(|| {
                    format!(
                        "Failed to analyze {} in {}",
                        root.display(),
                        base_dir.display()
                    )
                })?;
            analysis.write_report(&output)?;

            render(format, &ExportData::Summary(Summary::new(&analysis, Some(&output))))
        }
        Commands::Files {
            report,
            sort,
            format,
        } => {
            let store = open_report(report.as_deref(), &config, None)?;
            render(format, &ExportData::Files(FileIndex::new(&store, sort)))
        }
        Commands::File { id, report, format } => {
            let store = open_report(report.as_deref(), &config, None)?;
            let detail = store.file(&id)?;
            render(format, &ExportData::File(detail))
        }
        Commands::Exports {
            identifier,
            report,
            format,
        } => {
            let store = open_report(report.as_deref(), &config, None)?;
            let data = match identifier.as_deref() {
                Some(identifier) => ExportData::Definers(DefinerLookup {
                    identifier,
                    definers: store.definers(identifier),
                }),
                None => ExportData::Exports(store.exports()),
            };
            render(format, &data)
        }
        Commands::Stats {
            report,
            median,
            format,
        } => {
            let store = open_report(report.as_deref(), &config, median)?;
            render(format, &ExportData::Statistics(store.statistics()))
        }
        Commands::Version => Ok(()),
    }
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let config = match explicit {
        Some(path) => Config::load_from(path)?,
        None => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            Config::discover(&cwd)?
        }
    };
    Ok(config)
}

fn open_report(
    report: Option<&Path>,
    config: &Config,
    median: Option<MedianMode>,
) -> anyhow::Result<ReportStore> {
    let path = report.unwrap_or(&config.output);
    let store = ReportStore::load(
        path,
        Some(config.root_id()),
        median.unwrap_or(config.median),
    )?;
    tracing::debug!("{} files in {}", store.graph().node_count(), path.display());
    Ok(store)
}

fn render(format: ExportFormat, data: &ExportData) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    export::export(format, data, &mut handle).context("Failed to write output")?;
    handle.flush()?;
    Ok(())
}
