//! Pinswap - swap two pads' nets on a KiCad board while keeping the
//! originating schematic's net labels consistent with the swap.
//!
//! The schematic side is the interesting part: the legacy EESchema format is
//! an untyped, line-oriented text format with nested `$Sheet`/`$Comp` block
//! markers. Pinswap resolves the full hierarchical sheet tree, finds the one
//! sheet holding the footprint's symbol, picks the net label nearest to the
//! symbol for each of the two nets, and exchanges the two label texts
//! without disturbing any other byte of the document.
//!
//! # Quick Start
//!
//! ```no_run
//! use pinswap::{LegacyBoard, PinSwapCore, PinSwapOptions};
//! use std::path::Path;
//!
//! let mut board = LegacyBoard::load(Path::new("project.brd")).unwrap();
//! let pad_1 = board.find_pad("U201", "21").unwrap();
//! let pad_2 = board.find_pad("U201", "22").unwrap();
//!
//! let report = PinSwapCore::swap_pins(
//!     &mut board,
//!     pad_1,
//!     pad_2,
//!     PinSwapOptions::default(),
//! ).unwrap();
//!
//! println!("swapped {} and {} on {}", report.net_1, report.net_2, report.footprint);
//! ```

pub mod board;
pub mod core;
pub mod sch;

// Re-export main types
pub use crate::core::{
    derive_root_schematic, PinSwapCore, PinSwapError, PinSwapOptions, PinSwapReport,
};
pub use board::{Board, BoardError, LegacyBoard, PadHandle};
pub use sch::document::SchematicDocument;
pub use sch::labels::{closest_label, LabelKind, NetLabel};
pub use sch::sheet_tree::SheetTree;
pub use sch::SchematicError;

/// Resolve the full hierarchical sheet tree from a root schematic
/// (convenience wrapper).
pub fn resolve_sheet_tree(root: &std::path::Path) -> Result<SheetTree, SchematicError> {
    SheetTree::resolve(root)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Board, BoardError, LegacyBoard, PadHandle, PinSwapCore, PinSwapError, PinSwapOptions,
        PinSwapReport, SchematicError, SheetTree,
    };
}
