use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConvertError, Result};

/// A source file and the path its converted text is written to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePair {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl FilePair {
    /// True when converting would overwrite the source file
    pub fn is_in_place(&self) -> bool {
        match (
            self.source.parent().and_then(|p| p.canonicalize().ok()),
            self.destination.parent().and_then(|p| p.canonicalize().ok()),
        ) {
            (Some(src), Some(dest)) => {
                src == dest && self.source.file_name() == self.destination.file_name()
            }
            _ => self.source == self.destination,
        }
    }
}

/// Select the files directly inside `src_dir` whose extension is listed,
/// paired with the same file name under `dest_dir`. Sorted by file name.
pub fn discover(
    src_dir: &Path,
    dest_dir: &Path,
    extensions: &[String],
) -> Result<Vec<FilePair>> {
    if !src_dir.is_dir() {
        return Err(ConvertError::Config(format!(
            "source directory '{}' does not exist",
            src_dir.display()
        )));
    }

    let mut pairs = Vec::new();
    for entry in fs::read_dir(src_dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let selected = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|e| e == ext));
        if !selected {
            continue;
        }
        if let Some(name) = path.file_name() {
            pairs.push(FilePair {
                destination: dest_dir.join(name),
                source: path.clone(),
            });
        }
    }

    pairs.sort_by(|a, b| a.source.file_name().cmp(&b.source.file_name()));
    debug!(dir = %src_dir.display(), files = pairs.len(), "discovered input files");
    Ok(pairs)
}

/// Write converted text to the pair's destination. When converting in place
/// the original is first renamed with `backup_suffix`; the backup path is returned.
pub fn write_output(
    pair: &FilePair,
    content: &str,
    backup_suffix: &str,
) -> Result<Option<PathBuf>> {
    let backup = if pair.is_in_place() {
        let mut name = OsString::from(pair.source.as_os_str());
        name.push(backup_suffix);
        let backup = PathBuf::from(name);
        fs::rename(&pair.source, &backup)?;
        info!(backup = %backup.display(), "preserved original");
        Some(backup)
    } else {
        None
    };

    if let Some(parent) = pair.destination.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&pair.destination, content)?;
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extensions() -> Vec<String> {
        vec!["h".to_string(), "cpp".to_string(), "C".to_string()]
    }

    #[test]
    fn test_discover_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.cpp", "a.h", "c.C", "notes.txt", "d.hpp"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("sub.h")).unwrap();

        let out = tempfile::tempdir().unwrap();
        let pairs = discover(dir.path(), out.path(), &extensions()).unwrap();
        let names: Vec<_> = pairs
            .iter()
            .map(|p| p.source.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.h", "b.cpp", "c.C"]);
        assert_eq!(pairs[0].destination, out.path().join("a.h"));
    }

    #[test]
    fn test_discover_missing_dir() {
        let err =
            discover(Path::new("/nonexistent/src"), Path::new("."), &extensions()).unwrap_err();
        assert!(matches!(err, ConvertError::Config(_)));
    }

    #[test]
    fn test_in_place_write_keeps_backup() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.h");
        fs::write(&source, "old").unwrap();

        let pair = FilePair {
            source: source.clone(),
            destination: dir.path().join(".").join("a.h"),
        };
        assert!(pair.is_in_place());

        let backup = write_output(&pair, "new", ".bak").unwrap();
        assert_eq!(backup, Some(dir.path().join("a.h.bak")));
        assert_eq!(fs::read_to_string(dir.path().join("a.h.bak")).unwrap(), "old");
        assert_eq!(fs::read_to_string(&source).unwrap(), "new");
    }

    #[test]
    fn test_separate_destination_leaves_source() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        let source = src.path().join("a.cpp");
        fs::write(&source, "old").unwrap();

        let pair = FilePair {
            source: source.clone(),
            destination: dest.path().join("out").join("a.cpp"),
        };
        assert!(!pair.is_in_place());
        assert_eq!(write_output(&pair, "new", ".bak").unwrap(), None);
        assert_eq!(fs::read_to_string(&source).unwrap(), "old");
        assert_eq!(fs::read_to_string(&pair.destination).unwrap(), "new");
    }
}
