use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::config::Config;
use crate::converter::Converter;
use crate::error::Result;
use crate::files::{self, FilePair};
use crate::registry::{FrozenRegistry, TypeRegistry};

/// Inputs for one migration run
#[derive(Debug, Clone)]
pub struct MigrationOptions {
    pub src_dir: PathBuf,
    pub dest_dir: PathBuf,
    /// Overrides `config.managed_types_file` when set
    pub managed_types_file: Option<PathBuf>,
    pub config: Config,
}

impl MigrationOptions {
    fn types_file(&self) -> Option<&Path> {
        self.managed_types_file
            .as_deref()
            .or(self.config.managed_types_file.as_deref())
    }
}

/// Outcome of a migration run
#[derive(Debug, Default, Serialize)]
pub struct MigrationReport {
    pub managed_types: Vec<String>,
    pub converted: Vec<PathBuf>,
    pub backups: Vec<PathBuf>,
    pub errors: Vec<String>,
}

impl MigrationReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Result of the scan phase
#[derive(Debug)]
pub struct ScanOutcome {
    pub registry: FrozenRegistry,
    /// Sources that could not be read; conversion skips them
    pub failed: HashSet<PathBuf>,
    pub errors: Vec<String>,
}

/// Seed the registry from configuration and the user type list, then scan
/// every file.
#[instrument(skip_all, fields(files = pairs.len()))]
pub fn scan_types(options: &MigrationOptions, pairs: &[FilePair]) -> Result<ScanOutcome> {
    let mut registry = TypeRegistry::new();
    registry.extend(&options.config.managed_types);
    if let Some(path) = options.types_file() {
        if path.exists() {
            registry.load_type_list(path)?;
        } else {
            warn!(path = %path.display(), "managed types file not found, skipping");
        }
    }

    let mut failed = HashSet::new();
    let mut errors = Vec::new();
    for pair in pairs {
        match fs::read_to_string(&pair.source) {
            Ok(content) => {
                registry.scan(&content);
            }
            Err(e) => {
                error!(file = %pair.source.display(), "scan failed: {}", e);
                errors.push(format!("{}: {}", pair.source.display(), e));
                failed.insert(pair.source.clone());
            }
        }
    }

    Ok(ScanOutcome {
        registry: registry.freeze()?,
        failed,
        errors,
    })
}

/// Collect managed types for every file in the source directory without converting
pub fn list_types(options: &MigrationOptions) -> Result<MigrationReport> {
    let pairs = files::discover(&options.src_dir, &options.dest_dir, &options.config.extensions)?;
    let scan = scan_types(options, &pairs)?;
    Ok(MigrationReport {
        managed_types: scan
            .registry
            .registered_types()
            .iter()
            .map(|s| s.to_string())
            .collect(),
        errors: scan.errors,
        ..Default::default()
    })
}

/// Scan every input, freeze the registry, then convert each file.
///
/// A failure in one file is recorded and the run moves on to the next.
#[instrument(
    skip_all,
    fields(src = %options.src_dir.display(), dest = %options.dest_dir.display())
)]
pub fn run(options: &MigrationOptions) -> Result<MigrationReport> {
    let pairs = files::discover(&options.src_dir, &options.dest_dir, &options.config.extensions)?;
    if pairs.is_empty() {
        warn!("no input files matched the configured extensions");
    }

    // every file must be scanned before any type-aware rule exists
    let ScanOutcome {
        registry,
        failed,
        errors,
    } = scan_types(options, &pairs)?;
    let converter = Converter::new(registry)?;

    let mut report = MigrationReport {
        managed_types: converter
            .registered_types()
            .iter()
            .map(|s| s.to_string())
            .collect(),
        errors,
        ..Default::default()
    };
    info!(types = report.managed_types.len(), "managed types collected");

    // unreadable files were already reported by the scan
    for pair in pairs.iter().filter(|p| !failed.contains(&p.source)) {
        match convert_file(&converter, pair, &options.config.backup_suffix) {
            Ok(backup) => {
                info!(file = %pair.source.display(), "converted");
                report.converted.push(pair.destination.clone());
                report.backups.extend(backup);
            }
            Err(e) => {
                error!(file = %pair.source.display(), "conversion failed: {}", e);
                report.errors.push(format!("{}: {}", pair.source.display(), e));
            }
        }
    }

    Ok(report)
}

fn convert_file(
    converter: &Converter,
    pair: &FilePair,
    backup_suffix: &str,
) -> Result<Option<PathBuf>> {
    let content = fs::read_to_string(&pair.source)?;
    let converted = converter.convert(&content)?;
    files::write_output(pair, &converted, backup_suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_types_file_option_overrides_config() {
        let options = MigrationOptions {
            src_dir: PathBuf::from("src"),
            dest_dir: PathBuf::from("out"),
            managed_types_file: Some(PathBuf::from("cli.txt")),
            config: Config {
                managed_types_file: Some(PathBuf::from("config.txt")),
                ..Config::default()
            },
        };
        assert_eq!(options.types_file(), Some(Path::new("cli.txt")));
    }
}
