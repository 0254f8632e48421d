//! Board-side collaborator: the minimal pad/net surface the orchestrator
//! needs, with a legacy text-board implementation for standalone use.

pub mod legacy;

pub use legacy::LegacyBoard;

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid board format: {0}")]
    InvalidFormat(String),

    #[error("pad {pad} not found on footprint {reference}")]
    PadNotFound { reference: String, pad: String },

    #[error("footprint {0} not found on board")]
    FootprintNotFound(String),

    #[error("pad handle does not refer to a pad on this board")]
    InvalidHandle,
}

/// Opaque pad identity handed out by a board lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadHandle {
    pub(crate) footprint: usize,
    pub(crate) pad: usize,
}

/// The board collaborator seam. The orchestrator reads pad identity and net
/// assignments through this trait and asks it to exchange the two nets and
/// persist the result; everything else about the board stays opaque.
pub trait Board {
    /// The board's own file path; the root schematic path derives from it.
    fn file_path(&self) -> &Path;

    /// Reference designator of the footprint owning this pad.
    fn parent_reference(&self, pad: PadHandle) -> Result<&str, BoardError>;

    /// The pad's own name/number.
    fn pad_name(&self, pad: PadHandle) -> Result<&str, BoardError>;

    /// Full name of the net assigned to this pad, hierarchical prefix
    /// included.
    fn net_name(&self, pad: PadHandle) -> Result<&str, BoardError>;

    /// Exchange the two pads' net assignments in place.
    fn swap_nets(&mut self, pad_1: PadHandle, pad_2: PadHandle) -> Result<(), BoardError>;

    /// Persist the board to `path`.
    fn save_to(&self, path: &Path) -> Result<(), BoardError>;
}
