//! The label-swapping text edit.
//!
//! Both label spans were computed against the same original text. Applying
//! the replacements one after another would shift the second span whenever
//! the two net names differ in length, so the result is built in a single
//! pass: slice the original at both spans, splice both replacements in
//! ascending span order.

use crate::sch::labels::NetLabel;
use crate::sch::SchematicError;

/// Produce a new document text where `label_1`'s span carries `name_2` and
/// `label_2`'s span carries `name_1`. Every byte outside the two spans is
/// unchanged.
pub fn swap_labels(
    text: &str,
    label_1: &NetLabel,
    label_2: &NetLabel,
    name_1: &str,
    name_2: &str,
) -> Result<String, SchematicError> {
    let mut edits = [
        (label_1.span.clone(), name_2),
        (label_2.span.clone(), name_1),
    ];
    edits.sort_by_key(|(span, _)| span.start);

    let (first, second) = (&edits[0], &edits[1]);
    if first.0.end > second.0.start {
        return Err(SchematicError::OverlappingLabels {
            net_1: name_1.to_string(),
            net_2: name_2.to_string(),
        });
    }

    let mut out = String::with_capacity(text.len() + name_1.len() + name_2.len());
    out.push_str(&text[..first.0.start]);
    out.push_str(first.1);
    out.push_str(&text[first.0.end..second.0.start]);
    out.push_str(second.1);
    out.push_str(&text[second.0.end..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sch::labels::LabelKind;

    fn label(span: std::ops::Range<usize>) -> NetLabel {
        NetLabel {
            x: 0.0,
            y: 0.0,
            span,
            kind: LabelKind::Local,
        }
    }

    #[test]
    fn test_swap_equal_length_names() {
        let text = "head CLK1 mid CLK2 tail";
        let out = swap_labels(text, &label(5..9), &label(14..18), "CLK1", "CLK2").unwrap();
        assert_eq!(out, "head CLK2 mid CLK1 tail");
    }

    #[test]
    fn test_swap_unequal_length_names() {
        let text = "x SCL y SDA_LONG z";
        let out = swap_labels(text, &label(2..5), &label(8..16), "SCL", "SDA_LONG").unwrap();
        assert_eq!(out, "x SDA_LONG y SCL z");
    }

    #[test]
    fn test_swap_is_order_independent() {
        let text = "x AA y BBBB z";
        let forward = swap_labels(text, &label(2..4), &label(7..11), "AA", "BBBB").unwrap();
        let reverse = swap_labels(text, &label(7..11), &label(2..4), "BBBB", "AA").unwrap();
        assert_eq!(forward, "x BBBB y AA z");
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_bytes_outside_spans_unchanged() {
        let text = "aaNET1bbNET2cc";
        let out = swap_labels(text, &label(2..6), &label(8..12), "NET1", "NET2").unwrap();
        assert_eq!(&out[..2], "aa");
        assert_eq!(&out[6..8], "bb");
        assert_eq!(&out[12..], "cc");
    }

    #[test]
    fn test_overlapping_spans_rejected() {
        let text = "x ABCDEF y";
        let err = swap_labels(text, &label(2..6), &label(4..8), "ABCD", "CDEF").unwrap_err();
        assert!(matches!(err, SchematicError::OverlappingLabels { .. }));
    }
}
