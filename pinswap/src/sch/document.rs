//! Schematic document handle: an absolute path, the directory used to
//! resolve relative sheet references, and the full raw text.

use crate::sch::SchematicError;
use std::path::{Component, Path, PathBuf};

/// One loaded schematic document. Immutable once read; edits produce a new
/// text that the orchestrator writes back.
#[derive(Debug, Clone)]
pub struct SchematicDocument {
    /// Normalized absolute path of the file.
    pub path: PathBuf,
    /// Directory relative sheet references resolve against.
    pub dir: PathBuf,
    /// Full raw file content.
    pub text: String,
}

impl SchematicDocument {
    /// Read a schematic file from disk.
    pub fn read(path: &Path) -> Result<Self, SchematicError> {
        let text = std::fs::read_to_string(path).map_err(|source| SchematicError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dir = path.parent().unwrap_or(Path::new("")).to_path_buf();
        Ok(Self {
            path: path.to_path_buf(),
            dir,
            text,
        })
    }

    /// File name for display.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Lexically normalize a path: resolve `.` and `..` components without
/// touching the filesystem (the legacy format stores relative subsheet
/// paths like `sub/../common.sch`).
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                match out.components().next_back() {
                    Some(Component::Normal(_)) => {
                        out.pop();
                    }
                    Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                    _ => out.push(".."),
                };
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_resolves_dots() {
        assert_eq!(
            normalize_path(Path::new("/proj/./sub/../main.sch")),
            PathBuf::from("/proj/main.sch")
        );
    }

    #[test]
    fn test_normalize_keeps_leading_parent_dirs() {
        assert_eq!(
            normalize_path(Path::new("../shared/power.sch")),
            PathBuf::from("../shared/power.sch")
        );
    }

    #[test]
    fn test_normalize_does_not_escape_root() {
        assert_eq!(
            normalize_path(Path::new("/../top.sch")),
            PathBuf::from("/top.sch")
        );
    }

    #[test]
    fn test_read_missing_file() {
        let err = SchematicDocument::read(Path::new("no_such_sheet.sch"));
        assert!(matches!(err, Err(SchematicError::Io { .. })));
    }
}
