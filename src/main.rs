use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::error;

use mcpp_migrate::config::Config;
use mcpp_migrate::logging;
use mcpp_migrate::migrate::{self, MigrationOptions, MigrationReport};

#[derive(Parser)]
#[command(name = "mcpp-migrate")]
#[command(about = "Convert Managed Extensions for C++ sources to C++/CLI")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write JSON logs to this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every source/header file in a directory
    Convert {
        /// Directory containing the managed C++ files
        src_dir: PathBuf,
        /// Output directory (defaults to the current directory)
        #[arg(long)]
        dest_dir: Option<PathBuf>,
        /// Text file with user defined managed types, one per line
        #[arg(long)]
        managed_types: Option<PathBuf>,
    },
    /// Only collect and print the managed types
    Scan {
        /// Directory containing the managed C++ files
        src_dir: PathBuf,
        /// Text file with user defined managed types, one per line
        #[arg(long)]
        managed_types: Option<PathBuf>,
        /// Print the type list as JSON
        #[arg(long)]
        json: bool,
    },
}

fn print_types(report: &MigrationReport) {
    println!("*** Managed Types ***");
    for (i, name) in report.managed_types.iter().enumerate() {
        println!("{}. {}", i + 1, name);
    }
    println!();
}

fn print_errors(report: &MigrationReport) {
    if !report.errors.is_empty() {
        println!("\n⚠️  Errors encountered:");
        for error in &report.errors {
            println!("   - {}", error);
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let _guard = logging::init_logging(cli.verbose, cli.log_dir.as_deref());

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::default(),
    };

    let report = match cli.command {
        Commands::Convert {
            src_dir,
            dest_dir,
            managed_types,
        } => {
            let dest_dir = match dest_dir {
                Some(dir) => dir,
                None => std::env::current_dir().context("resolving current directory")?,
            };
            let options = MigrationOptions {
                src_dir,
                dest_dir,
                managed_types_file: managed_types,
                config,
            };
            let report = migrate::run(&options).context("migration failed")?;

            print_types(&report);
            println!("📊 Migration Results:");
            println!("   Converted: {}", report.converted.len());
            for path in &report.converted {
                println!("   - {}", path.display());
            }
            println!("   Backups: {}", report.backups.len());
            println!("   Errors: {}", report.errors.len());
            print_errors(&report);
            report
        }
        Commands::Scan {
            src_dir,
            managed_types,
            json,
        } => {
            let options = MigrationOptions {
                dest_dir: src_dir.clone(),
                src_dir,
                managed_types_file: managed_types,
                config,
            };
            let report = migrate::list_types(&options).context("scan failed")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report.managed_types)?);
            } else {
                print_types(&report);
                print_errors(&report);
            }
            report
        }
    };

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        error!("{} file(s) failed", report.errors.len());
        Ok(ExitCode::FAILURE)
    }
}
