//! Command-line front end: scan one mod directory and report its overrides.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, Context};
use clap::{Parser, Subcommand};
use log::{LevelFilter, error};

use override_scanner::report::SortField;
use override_scanner::utils::logging;
use override_scanner::{
    ModHandle, OverrideKind, OverrideQuery, OverrideReport, OverrideSet, ReportFormat, ReportStorage,
    ScanOptions,
};

#[derive(Parser)]
#[command(name = "override-scan")]
#[command(about = "Detect class overrides and UI screen listeners declared by a mod", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write logs to this file instead of the console
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a mod directory for overrides
    Scan {
        /// Root directory of the mod
        mod_dir: PathBuf,

        /// Mod identifier (defaults to the directory name)
        #[arg(long)]
        id: Option<String>,

        /// Scan options file (.toml, .yaml or .yml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format (table, json or yaml)
        #[arg(short, long, default_value = "table")]
        format: ReportFormat,

        /// Write the report to this file (.json, .yaml or .yml)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only list overrides of this kind (class or listener)
        #[arg(long)]
        kind: Option<OverrideKind>,

        /// Only list overrides of this base class
        #[arg(long)]
        base_class: Option<String>,

        /// Sort by base, new or kind
        #[arg(long)]
        sort: Option<SortField>,

        /// Number of scan threads
        #[arg(long)]
        threads: Option<usize>,

        /// Show a progress bar for large source trees
        #[arg(long)]
        progress: bool,

        /// Additional source directory names to skip
        #[arg(long = "reserved")]
        reserved: Vec<String>,
    },

    /// Print a previously saved report
    Show {
        /// Report file (.json, .yaml or .yml)
        report: PathBuf,

        /// Output format (table, json or yaml)
        #[arg(short, long, default_value = "table")]
        format: ReportFormat,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    match &cli.log_file {
        Some(log_file) => {
            if let Err(e) = logging::init_file_logging(log_file, level) {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }
        None => logging::init_console_logging(level),
    }

    if let Err(e) = run(cli.command) {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Scan {
            mod_dir,
            id,
            config,
            format,
            output,
            kind,
            base_class,
            sort,
            threads,
            progress,
            reserved,
        } => {
            let mut options = match config {
                Some(path) => ScanOptions::load(&path)?,
                None => ScanOptions::default(),
            };
            if threads.is_some() {
                options.parallel_threads = threads;
            }
            options.show_progress |= progress;
            for name in reserved {
                if !options.reserved_subtrees.iter().any(|r| r.eq_ignore_ascii_case(&name)) {
                    options.reserved_subtrees.push(name);
                }
            }

            let handle = Arc::new(match id {
                Some(id) => ModHandle::new(id, &mod_dir),
                None => ModHandle::from_path(&mod_dir),
            });

            let set = OverrideSet::new(handle, &options);
            let overrides = set.get(false)
                .with_context(|| format!("Failed to scan mod {}", mod_dir.display()))?;

            let query = OverrideQuery {
                kind,
                base_class,
                sort_by: sort,
                ..Default::default()
            };
            let report = OverrideReport::new(
                set.mod_handle(),
                query.apply(&overrides),
                set.last_stats(),
                set.scanned_at().unwrap_or_else(chrono::Utc::now),
            );

            if let Some(output) = output {
                ReportStorage::new(output).save(&report)?;
            } else {
                print!("{}", report.render(format)?);
            }
        }

        Commands::Show { report, format } => {
            let report = ReportStorage::new(report).load()?;
            print!("{}", report.render(format)?);
        }
    }

    Ok(())
}
