//! Legacy PCBNEW text-board reader.
//!
//! Parses just enough of the `$MODULE`/`$PAD` structure to answer the
//! orchestrator's questions: each footprint's reference (the quoted `T0`
//! field), each pad's number (the quoted `Sh` field) and net (`Ne id
//! "name"`). The raw text is kept alongside the parsed records; a net swap
//! splices new `Ne` lines into the text so everything else round-trips
//! byte-identical.

use crate::board::{Board, BoardError, PadHandle};
use std::ops::Range;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
struct PadRecord {
    number: String,
    net_id: u32,
    net_name: String,
    /// Byte range of the `Ne` line content in the board text.
    ne_span: Range<usize>,
}

#[derive(Debug, Clone)]
struct FootprintRecord {
    reference: String,
    pads: Vec<PadRecord>,
}

/// A legacy-format board loaded from disk.
pub struct LegacyBoard {
    path: PathBuf,
    text: String,
    footprints: Vec<FootprintRecord>,
}

impl LegacyBoard {
    /// Load and parse a legacy board file.
    pub fn load(path: &Path) -> Result<Self, BoardError> {
        let text = std::fs::read_to_string(path).map_err(|source| BoardError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let footprints = parse_board(&text)?;
        tracing::debug!(
            path = %path.display(),
            footprints = footprints.len(),
            "loaded legacy board"
        );
        Ok(Self {
            path: path.to_path_buf(),
            text,
            footprints,
        })
    }

    /// Locate a pad by footprint reference and pad name.
    pub fn find_pad(&self, reference: &str, pad_name: &str) -> Result<PadHandle, BoardError> {
        let (fp_idx, footprint) = self
            .footprints
            .iter()
            .enumerate()
            .find(|(_, fp)| fp.reference == reference)
            .ok_or_else(|| BoardError::FootprintNotFound(reference.to_string()))?;
        let pad_idx = footprint
            .pads
            .iter()
            .position(|p| p.number == pad_name)
            .ok_or_else(|| BoardError::PadNotFound {
                reference: reference.to_string(),
                pad: pad_name.to_string(),
            })?;
        Ok(PadHandle {
            footprint: fp_idx,
            pad: pad_idx,
        })
    }

    /// Raw board text (for tests and diffing).
    pub fn text(&self) -> &str {
        &self.text
    }

    fn pad(&self, handle: PadHandle) -> Result<&PadRecord, BoardError> {
        self.footprints
            .get(handle.footprint)
            .and_then(|fp| fp.pads.get(handle.pad))
            .ok_or(BoardError::InvalidHandle)
    }
}

impl Board for LegacyBoard {
    fn file_path(&self) -> &Path {
        &self.path
    }

    fn parent_reference(&self, pad: PadHandle) -> Result<&str, BoardError> {
        self.footprints
            .get(pad.footprint)
            .map(|fp| fp.reference.as_str())
            .ok_or(BoardError::InvalidHandle)
    }

    fn pad_name(&self, pad: PadHandle) -> Result<&str, BoardError> {
        Ok(&self.pad(pad)?.number)
    }

    fn net_name(&self, pad: PadHandle) -> Result<&str, BoardError> {
        Ok(&self.pad(pad)?.net_name)
    }

    fn swap_nets(&mut self, pad_1: PadHandle, pad_2: PadHandle) -> Result<(), BoardError> {
        let a = self.pad(pad_1)?.clone();
        let b = self.pad(pad_2)?.clone();

        let mut edits = [
            (a.ne_span.clone(), format!("Ne {} \"{}\"", b.net_id, b.net_name)),
            (b.ne_span.clone(), format!("Ne {} \"{}\"", a.net_id, a.net_name)),
        ];
        edits.sort_by_key(|(span, _)| span.start);
        if edits[0].0.end > edits[1].0.start {
            return Err(BoardError::InvalidFormat(
                "pad net records overlap".to_string(),
            ));
        }

        let mut out = String::with_capacity(self.text.len());
        out.push_str(&self.text[..edits[0].0.start]);
        out.push_str(&edits[0].1);
        out.push_str(&self.text[edits[0].0.end..edits[1].0.start]);
        out.push_str(&edits[1].1);
        out.push_str(&self.text[edits[1].0.end..]);

        self.text = out;
        // Reparse so every record's span matches the new text; module and
        // pad ordering is unchanged, so existing handles stay valid.
        self.footprints = parse_board(&self.text)?;
        tracing::debug!(
            net_1 = %a.net_name,
            net_2 = %b.net_name,
            "swapped pad nets on board"
        );
        Ok(())
    }

    fn save_to(&self, path: &Path) -> Result<(), BoardError> {
        std::fs::write(path, &self.text).map_err(|source| BoardError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn parse_board(text: &str) -> Result<Vec<FootprintRecord>, BoardError> {
    if !text.trim_start().starts_with("PCBNEW") {
        return Err(BoardError::InvalidFormat(
            "expected PCBNEW header in legacy board file".to_string(),
        ));
    }

    let mut footprints = Vec::new();
    let mut module: Option<FootprintRecord> = None;
    let mut pad: Option<PadRecord> = None;
    let mut offset = 0;

    for raw in text.split_inclusive('\n') {
        let line = raw.trim();

        if line.starts_with("$MODULE") {
            module = Some(FootprintRecord {
                reference: String::new(),
                pads: Vec::new(),
            });
        } else if line.starts_with("$EndMODULE") {
            if let Some(fp) = module.take() {
                footprints.push(fp);
            }
        } else if line.starts_with("$PAD") {
            if module.is_some() {
                pad = Some(PadRecord {
                    number: String::new(),
                    net_id: 0,
                    net_name: String::new(),
                    ne_span: 0..0,
                });
            }
        } else if line.starts_with("$EndPAD") {
            if let (Some(fp), Some(p)) = (module.as_mut(), pad.take()) {
                fp.pads.push(p);
            }
        } else if let Some(p) = pad.as_mut() {
            if let Some(rest) = line.strip_prefix("Sh ") {
                // Sh "number" shape width height dx dy orient
                if let Some(number) = first_quoted(rest) {
                    p.number = number.to_string();
                }
            } else if let Some(rest) = line.strip_prefix("Ne ") {
                // Ne net_number "net_name"
                let mut parts = rest.splitn(2, ' ');
                if let Some(id) = parts.next() {
                    p.net_id = id.parse().unwrap_or(0);
                }
                if let Some(name) = parts.next() {
                    p.net_name = name.trim().trim_matches('"').to_string();
                }
                let trimmed = raw.trim_end_matches(['\n', '\r']);
                let lead = trimmed.len() - trimmed.trim_start().len();
                p.ne_span = (offset + lead)..(offset + trimmed.len());
            }
        } else if let Some(fp) = module.as_mut() {
            if line.starts_with("T0 ") {
                // T0 x y xsize ysize rot penwidth N visible layer "reference"
                if let Some(reference) = last_quoted(line) {
                    fp.reference = reference.to_string();
                }
            }
        }

        offset += raw.len();
    }

    Ok(footprints)
}

/// First double-quoted field on a line.
fn first_quoted(s: &str) -> Option<&str> {
    let start = s.find('"')?;
    let end = s[start + 1..].find('"')?;
    Some(&s[start + 1..start + 1 + end])
}

/// Last double-quoted field on a line.
fn last_quoted(s: &str) -> Option<&str> {
    let end = s.rfind('"')?;
    let start = s[..end].rfind('"')?;
    Some(&s[start + 1..end])
}
