//! Nearest-label search.
//!
//! Net labels in the legacy format are a header line (`Text Label x y …`,
//! `Text GLabel x y …` or `Text HLabel x y …`) followed by the label text on
//! the next line. The locator scans the document for word-bounded
//! occurrences of the net name, walks backward to the nearest label header
//! for each, and picks the occurrence closest to the footprint's `$Comp`
//! anchor position.

use crate::sch::document::SchematicDocument;
use crate::sch::SchematicError;
use std::ops::Range;

const COMP_BEGIN: &str = "$Comp";
const COMP_END: &str = "$EndComp";

/// Label kinds, in backward-search priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Local,
    Global,
    Hierarchical,
}

impl LabelKind {
    pub fn keyword(self) -> &'static str {
        match self {
            LabelKind::Local => "Text Label",
            LabelKind::Global => "Text GLabel",
            LabelKind::Hierarchical => "Text HLabel",
        }
    }
}

const LABEL_KINDS: [LabelKind; 3] = [LabelKind::Local, LabelKind::Global, LabelKind::Hierarchical];

/// One textual label occurrence: header coordinates plus the byte range of
/// the net name in the document text.
#[derive(Debug, Clone, PartialEq)]
pub struct NetLabel {
    pub x: f64,
    pub y: f64,
    pub span: Range<usize>,
    pub kind: LabelKind,
}

/// A footprint's declared position, the reference point for the nearest
/// label search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentAnchor {
    pub x: f64,
    pub y: f64,
}

impl ComponentAnchor {
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        (self.x - x).hypot(self.y - y)
    }
}

/// Find the label for `net_name` closest to `reference`'s anchor on this
/// sheet. Ties break toward the earlier occurrence in scan order.
pub fn closest_label(
    doc: &SchematicDocument,
    reference: &str,
    net_name: &str,
) -> Result<NetLabel, SchematicError> {
    tracing::debug!(net = net_name, footprint = reference, "searching for closest label");

    let labels: Vec<NetLabel> = find_word_occurrences(&doc.text, net_name)
        .into_iter()
        .filter_map(|span| label_at(&doc.text, span))
        .collect();
    if labels.is_empty() {
        return Err(SchematicError::LabelNotFound {
            net: net_name.to_string(),
            document: doc.path.clone(),
        });
    }

    let anchor = component_anchor(doc, reference)?;
    tracing::debug!(x = anchor.x, y = anchor.y, "component anchor");

    let mut best = &labels[0];
    let mut best_distance = anchor.distance_to(best.x, best.y);
    for label in &labels[1..] {
        let distance = anchor.distance_to(label.x, label.y);
        if distance < best_distance {
            best = label;
            best_distance = distance;
        }
    }
    tracing::info!(
        net = net_name,
        x = best.x,
        y = best.y,
        distance = best_distance,
        "found closest label"
    );
    Ok(best.clone())
}

/// Resolve one net-name occurrence to its enclosing label, if any.
///
/// Keywords are tried in priority order: the first kind that appears at all
/// before the occurrence supplies the header. Occurrences with no preceding
/// label keyword (a component field, a wire) yield `None`.
fn label_at(text: &str, span: Range<usize>) -> Option<NetLabel> {
    let head = &text[..span.start];
    let (header_start, kind) = LABEL_KINDS
        .iter()
        .find_map(|&kind| head.rfind(kind.keyword()).map(|pos| (pos, kind)))?;

    // Header fields: ["Text", "Label", x, y, ...]
    let fields: Vec<&str> = text[header_start..span.start].split_whitespace().collect();
    let x = fields.get(2)?.parse().ok()?;
    let y = fields.get(3)?.parse().ok()?;
    Some(NetLabel { x, y, span, kind })
}

/// Extract the footprint's anchor coordinate from its `$Comp` block: the
/// line whose first token is `P` carries the X/Y position.
pub fn component_anchor(
    doc: &SchematicDocument,
    reference: &str,
) -> Result<ComponentAnchor, SchematicError> {
    let occurrence = find_word_occurrences(&doc.text, reference)
        .into_iter()
        .next()
        .ok_or_else(|| SchematicError::FootprintNotFound {
            reference: reference.to_string(),
        })?;

    let malformed = || SchematicError::MalformedComponentBlock {
        reference: reference.to_string(),
        document: doc.path.clone(),
    };
    let begin = doc.text[..occurrence.start]
        .rfind(COMP_BEGIN)
        .ok_or_else(malformed)?;
    let end = doc.text[occurrence.start..]
        .find(COMP_END)
        .map(|rel| occurrence.start + rel)
        .ok_or_else(malformed)?;

    for line in doc.text[begin..end].lines() {
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("P") {
            continue;
        }
        if let (Some(Ok(x)), Some(Ok(y))) = (
            tokens.next().map(str::parse),
            tokens.next().map(str::parse),
        ) {
            return Ok(ComponentAnchor { x, y });
        }
    }
    Err(malformed())
}

/// Byte ranges of every word-bounded occurrence of `word` in `text`.
/// Neighboring identifier characters disqualify a match, so `A1` never
/// matches inside `A12`.
pub(crate) fn find_word_occurrences(text: &str, word: &str) -> Vec<Range<usize>> {
    if word.is_empty() {
        return Vec::new();
    }
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut from = 0;
    while let Some(rel) = text[from..].find(word) {
        let start = from + rel;
        let end = start + word.len();
        let bounded_left = start == 0 || !is_ident_byte(bytes[start - 1]);
        let bounded_right = end == text.len() || !is_ident_byte(bytes[end]);
        if bounded_left && bounded_right {
            out.push(start..end);
        }
        from = end;
    }
    out
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
