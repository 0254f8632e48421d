//! Swap orchestration: the one component allowed to write files and mutate
//! board state. Everything it calls into is pure or read-only.

use std::path::{Path, PathBuf};

use crate::board::{Board, BoardError, PadHandle};
use crate::sch::edit::swap_labels;
use crate::sch::labels::closest_label;
use crate::sch::sheet_tree::SheetTree;
use crate::sch::SchematicError;

#[derive(Debug, thiserror::Error)]
pub enum PinSwapError {
    #[error("Schematic error: {0}")]
    Schematic(#[from] SchematicError),
    #[error("Board error: {0}")]
    Board(#[from] BoardError),
    #[error("pads {pad_1} and {pad_2} are both on net {net}, nothing to swap")]
    SameNet {
        pad_1: String,
        pad_2: String,
        net: String,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Options for a swap run.
#[derive(Clone, Debug, Default)]
pub struct PinSwapOptions {
    /// Write both outputs to `temp_`-prefixed siblings instead of
    /// overwriting the originals.
    pub dry_run: bool,
}

/// What a completed swap did, for reporting.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PinSwapReport {
    pub footprint: String,
    pub pad_1: String,
    pub pad_2: String,
    pub net_1: String,
    pub net_2: String,
    pub schematic: PathBuf,
    pub sheets: usize,
    pub label_1: (f64, f64),
    pub label_2: (f64, f64),
    pub schematic_written: PathBuf,
    pub board_written: PathBuf,
}

/// Derive the root schematic path from the board's own file path by
/// substituting the schematic extension.
pub fn derive_root_schematic(board_path: &Path) -> PathBuf {
    let mut path = board_path.to_path_buf();
    path.set_extension("sch");
    path
}

/// Net names may carry a hierarchical prefix (`/sub/CLK1`); labels only ever
/// carry the final segment.
fn label_name(net: &str) -> &str {
    net.rsplit('/').next().unwrap_or(net)
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("temp_{name}"))
}

/// The swap entry point.
pub struct PinSwapCore;

impl PinSwapCore {
    /// Swap the nets of two pads on the same footprint, keeping the owning
    /// schematic sheet's labels consistent.
    ///
    /// There is no transaction across the two writes: a failure after the
    /// schematic write but before the board write leaves the files
    /// inconsistent, and the error surfaces instead of being retried.
    pub fn swap_pins<B: Board>(
        board: &mut B,
        pad_1: PadHandle,
        pad_2: PadHandle,
        options: PinSwapOptions,
    ) -> Result<PinSwapReport, PinSwapError> {
        let footprint = board.parent_reference(pad_2)?.to_string();
        let span = tracing::info_span!("swap_pins", footprint = %footprint);
        let _guard = span.enter();

        let pad_1_name = board.pad_name(pad_1)?.to_string();
        let pad_2_name = board.pad_name(pad_2)?.to_string();
        let net_1 = board.net_name(pad_1)?.to_string();
        let net_2 = board.net_name(pad_2)?.to_string();
        let name_1 = label_name(&net_1).to_string();
        let name_2 = label_name(&net_2).to_string();
        if name_1 == name_2 {
            return Err(PinSwapError::SameNet {
                pad_1: pad_1_name,
                pad_2: pad_2_name,
                net: net_1,
            });
        }
        tracing::info!(
            pad_1 = %pad_1_name,
            pad_2 = %pad_2_name,
            net_1 = %name_1,
            net_2 = %name_2,
            "swapping pins"
        );

        let root = derive_root_schematic(board.file_path());
        tracing::info!(root = %root.display(), "resolving schematic hierarchy");
        let tree = SheetTree::resolve(&root)?;
        let owner = tree.find_owner(&footprint)?;
        tracing::info!(sheet = %owner.path.display(), "found owning sheet");

        let label_1 = closest_label(owner, &footprint, &name_1)?;
        let label_2 = closest_label(owner, &footprint, &name_2)?;
        let updated = swap_labels(&owner.text, &label_1, &label_2, &name_1, &name_2)?;

        let schematic_written = if options.dry_run {
            temp_sibling(&owner.path)
        } else {
            owner.path.clone()
        };
        std::fs::write(&schematic_written, &updated)?;
        tracing::info!(path = %schematic_written.display(), "saved schematic");

        board.swap_nets(pad_1, pad_2)?;
        let board_written = if options.dry_run {
            temp_sibling(board.file_path())
        } else {
            board.file_path().to_path_buf()
        };
        board.save_to(&board_written)?;
        tracing::info!(path = %board_written.display(), "saved board");

        Ok(PinSwapReport {
            footprint,
            pad_1: pad_1_name,
            pad_2: pad_2_name,
            net_1,
            net_2,
            schematic: owner.path.clone(),
            sheets: tree.len(),
            label_1: (label_1.x, label_1.y),
            label_2: (label_2.x, label_2.y),
            schematic_written,
            board_written,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_root_schematic() {
        assert_eq!(
            derive_root_schematic(Path::new("/proj/demo.kicad_pcb")),
            PathBuf::from("/proj/demo.sch")
        );
        assert_eq!(
            derive_root_schematic(Path::new("/proj/demo.brd")),
            PathBuf::from("/proj/demo.sch")
        );
    }

    #[test]
    fn test_label_name_strips_hierarchy() {
        assert_eq!(label_name("/sub/CLK1"), "CLK1");
        assert_eq!(label_name("CLK1"), "CLK1");
    }

    #[test]
    fn test_temp_sibling() {
        assert_eq!(
            temp_sibling(Path::new("/proj/demo.sch")),
            PathBuf::from("/proj/temp_demo.sch")
        );
    }
}
