//! Legacy EESchema (.sch) handling: document loading, hierarchical sheet
//! discovery, nearest-label search, and the label-swapping text edit.

pub mod document;
pub mod edit;
pub mod labels;
pub mod sheet_tree;

// Re-export for convenience
pub use document::{normalize_path, SchematicDocument};
pub use edit::swap_labels;
pub use labels::{closest_label, ComponentAnchor, LabelKind, NetLabel};
pub use sheet_tree::{SheetTree, SubsheetRef};

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving or editing schematic documents.
#[derive(Debug, Error)]
pub enum SchematicError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed schematic {}: {detail}", path.display())]
    MalformedDocument { path: PathBuf, detail: String },

    #[error("cannot resolve ${{{var}}} in subsheet path {path}")]
    UnresolvableReference { var: String, path: String },

    #[error("footprint {reference} not found in any resolved sheet")]
    FootprintNotFound { reference: String },

    #[error("footprint {reference} found in {} sheets, expected exactly one", documents.len())]
    AmbiguousFootprint {
        reference: String,
        documents: Vec<PathBuf>,
    },

    #[error("no label for net {net} found on sheet {}", document.display())]
    LabelNotFound { net: String, document: PathBuf },

    #[error("component block for {reference} in {} has no position line", document.display())]
    MalformedComponentBlock {
        reference: String,
        document: PathBuf,
    },

    #[error("labels for nets {net_1} and {net_2} overlap in the document text")]
    OverlappingLabels { net_1: String, net_2: String },
}
