//! Hierarchical sheet discovery.
//!
//! A root schematic references subsheets through `$Sheet…$EndSheet` blocks
//! whose `F1` field names the child file. The resolver walks the whole
//! hierarchy with an explicit worklist, deduplicating by normalized path so
//! shared and cyclic references terminate, and keeps the result as a
//! directed graph: node weights are the loaded documents, edge weights the
//! `F1` line numbers that introduced each reference.

use crate::sch::document::{normalize_path, SchematicDocument};
use crate::sch::labels::find_word_occurrences;
use crate::sch::SchematicError;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const SHEET_BEGIN: &str = "$Sheet";
const SHEET_END: &str = "$EndSheet";

/// One subsheet reference: the resolved child path and the 1-based line
/// number of the `F1` field that declared it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsheetRef {
    pub path: PathBuf,
    pub line: u32,
}

/// The resolved set of schematic documents reachable from a root sheet.
#[derive(Debug)]
pub struct SheetTree {
    graph: DiGraph<SchematicDocument, u32>,
    index: HashMap<PathBuf, NodeIndex>,
}

impl SheetTree {
    /// Resolve the full sheet tree below `root`, reading every reachable
    /// document exactly once.
    pub fn resolve(root: &Path) -> Result<Self, SchematicError> {
        let root = if root.is_absolute() {
            normalize_path(root)
        } else {
            let cwd = std::env::current_dir().map_err(|source| SchematicError::Io {
                path: root.to_path_buf(),
                source,
            })?;
            normalize_path(&cwd.join(root))
        };

        let mut tree = SheetTree {
            graph: DiGraph::new(),
            index: HashMap::new(),
        };
        let root_idx = tree.insert(SchematicDocument::read(&root)?);
        let mut worklist = vec![root_idx];

        while let Some(idx) = worklist.pop() {
            let refs = extract_subsheets(&tree.graph[idx])?;
            for subsheet in refs {
                tracing::debug!(
                    parent = %tree.graph[idx].path.display(),
                    child = %subsheet.path.display(),
                    line = subsheet.line,
                    "found subsheet reference"
                );
                let child_idx = match tree.index.get(&subsheet.path) {
                    Some(&existing) => existing,
                    None => {
                        let child = tree.insert(SchematicDocument::read(&subsheet.path)?);
                        worklist.push(child);
                        child
                    }
                };
                tree.graph.add_edge(idx, child_idx, subsheet.line);
            }
        }

        tracing::info!(sheets = tree.len(), root = %root.display(), "resolved sheet tree");
        Ok(tree)
    }

    fn insert(&mut self, document: SchematicDocument) -> NodeIndex {
        let path = document.path.clone();
        let idx = self.graph.add_node(document);
        self.index.insert(path, idx);
        idx
    }

    /// Number of distinct documents in the tree.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// The documents, in discovery order.
    pub fn documents(&self) -> impl Iterator<Item = &SchematicDocument> {
        self.graph.node_indices().map(move |i| &self.graph[i])
    }

    /// Every parent→child reference with the `F1` line that declared it.
    pub fn references(&self) -> impl Iterator<Item = (&SchematicDocument, &SchematicDocument, u32)> {
        self.graph
            .edge_references()
            .map(move |e| (&self.graph[e.source()], &self.graph[e.target()], *e.weight()))
    }

    /// Find the one document containing `reference` as a word-bounded
    /// substring. Zero matches and multiple matches are both hard errors;
    /// silently picking one by iteration order would edit the wrong sheet.
    pub fn find_owner(&self, reference: &str) -> Result<&SchematicDocument, SchematicError> {
        let owners: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&i| !find_word_occurrences(&self.graph[i].text, reference).is_empty())
            .collect();
        match owners.as_slice() {
            [only] => Ok(&self.graph[*only]),
            [] => Err(SchematicError::FootprintNotFound {
                reference: reference.to_string(),
            }),
            several => Err(SchematicError::AmbiguousFootprint {
                reference: reference.to_string(),
                documents: several.iter().map(|&i| self.graph[i].path.clone()).collect(),
            }),
        }
    }
}

/// Extract every subsheet reference from one document.
///
/// Begin and end markers are paired positionally; a count mismatch means the
/// document is damaged and no partial result is returned.
pub fn extract_subsheets(doc: &SchematicDocument) -> Result<Vec<SubsheetRef>, SchematicError> {
    let begins = find_all(&doc.text, SHEET_BEGIN);
    let ends = find_all(&doc.text, SHEET_END);
    if begins.len() != ends.len() {
        return Err(SchematicError::MalformedDocument {
            path: doc.path.clone(),
            detail: format!(
                "{} {SHEET_BEGIN} markers but {} {SHEET_END} markers",
                begins.len(),
                ends.len()
            ),
        });
    }

    let mut refs = Vec::new();
    let mut previous_end = 0;
    for (&begin, &end) in begins.iter().zip(ends.iter()) {
        // Each begin must precede its end, and blocks must not interleave;
        // anything else means the markers do not actually pair up.
        if begin >= end || begin < previous_end {
            return Err(SchematicError::MalformedDocument {
                path: doc.path.clone(),
                detail: format!(
                    "{SHEET_BEGIN}/{SHEET_END} markers out of order at byte {begin}"
                ),
            });
        }
        previous_end = end;
        let block = &doc.text[begin..end];
        let base_line = doc.text[..begin].bytes().filter(|&b| b == b'\n').count() as u32;
        for (i, line) in block.lines().enumerate() {
            if let Some(rest) = line.trim_start().strip_prefix("F1 ") {
                let raw = rest
                    .split_whitespace()
                    .next()
                    .unwrap_or("")
                    .trim_matches('"');
                let expanded = expand_env_vars(raw)?;
                let mut path = PathBuf::from(&expanded);
                if !path.is_absolute() {
                    path = doc.dir.join(path);
                }
                refs.push(SubsheetRef {
                    path: normalize_path(&path),
                    line: base_line + i as u32 + 1,
                });
                // One F1 field per sheet block; skip the rest.
                break;
            }
        }
    }
    Ok(refs)
}

/// Replace every `${NAME}` placeholder with the value of the NAME
/// environment variable. An undefined variable is a hard failure: the
/// reference cannot be resolved to a file.
fn expand_env_vars(raw: &str) -> Result<String, SchematicError> {
    let mut path = raw.to_string();
    while let Some(start) = path.find("${") {
        let end = match path[start..].find('}') {
            Some(rel) => start + rel,
            None => {
                return Err(SchematicError::UnresolvableReference {
                    var: path[start + 2..].to_string(),
                    path: raw.to_string(),
                })
            }
        };
        let var = path[start + 2..end].to_string();
        let value = std::env::var(&var).map_err(|_| SchematicError::UnresolvableReference {
            var: var.clone(),
            path: raw.to_string(),
        })?;
        path.replace_range(start..=end, &value);
    }
    Ok(path)
}

/// Byte offsets of every non-overlapping occurrence of `pat`.
fn find_all(text: &str, pat: &str) -> Vec<usize> {
    let mut out = Vec::new();
    let mut from = 0;
    while let Some(rel) = text[from..].find(pat) {
        out.push(from + rel);
        from += rel + pat.len();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_sheet(dir: &Path, name: &str, subsheets: &[&str], extra: &str) -> PathBuf {
        let mut text = String::from("EESchema Schematic File Version 4\nEELAYER 30 0\nEELAYER END\n");
        for (i, sub) in subsheets.iter().enumerate() {
            text.push_str(&format!(
                "$Sheet\nS 600 1200 2000 1500\nU 5ABC000{i}\nF0 \"{sub}\" 60\nF1 \"{sub}\" 60\n$EndSheet\n"
            ));
        }
        text.push_str(extra);
        text.push_str("$EndSCHEMATC\n");
        let path = dir.join(name);
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_resolve_dedups_shared_subsheet() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        write_sheet(dir, "common.sch", &[], "");
        write_sheet(dir, "a.sch", &["common.sch"], "");
        write_sheet(dir, "b.sch", &["common.sch"], "");
        let root = write_sheet(dir, "main.sch", &["a.sch", "b.sch"], "");

        let tree = SheetTree::resolve(&root).unwrap();
        assert_eq!(tree.len(), 4);
        let common = tree
            .documents()
            .filter(|d| d.file_name() == "common.sch")
            .count();
        assert_eq!(common, 1);
        // Both parents still reference it.
        let edges_to_common = tree
            .references()
            .filter(|(_, child, _)| child.file_name() == "common.sch")
            .count();
        assert_eq!(edges_to_common, 2);
    }

    #[test]
    fn test_resolve_terminates_on_cycle() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        write_sheet(dir, "ping.sch", &["pong.sch"], "");
        write_sheet(dir, "pong.sch", &["ping.sch"], "");
        let root = dir.join("ping.sch");

        let tree = SheetTree::resolve(&root).unwrap();
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_mismatched_markers_fail() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("broken.sch");
        fs::write(&path, "$Sheet\nF1 \"sub.sch\" 60\n").unwrap();

        let err = SheetTree::resolve(&path).unwrap_err();
        assert!(matches!(err, SchematicError::MalformedDocument { .. }));
    }

    #[test]
    fn test_inverted_markers_fail() {
        // Equal marker counts but $EndSheet comes first; positional pairing
        // must reject this instead of slicing backwards.
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("inverted.sch");
        fs::write(&path, "$EndSheet\n$Sheet\nF1 \"sub.sch\" 60\n").unwrap();

        let err = SheetTree::resolve(&path).unwrap_err();
        assert!(matches!(err, SchematicError::MalformedDocument { .. }));
    }

    #[test]
    fn test_interleaved_markers_fail() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("interleaved.sch");
        fs::write(
            &path,
            "$Sheet\n$Sheet\nF1 \"a.sch\" 60\n$EndSheet\n$EndSheet\n",
        )
        .unwrap();

        let err = SheetTree::resolve(&path).unwrap_err();
        assert!(matches!(err, SchematicError::MalformedDocument { .. }));
    }

    #[test]
    fn test_env_var_resolution() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        write_sheet(dir, "sub.sch", &[], "");
        std::env::set_var("PINSWAP_TEST_BASE", dir.to_str().unwrap());
        let root = write_sheet(dir, "main.sch", &["${PINSWAP_TEST_BASE}/sub.sch"], "");

        let tree = SheetTree::resolve(&root).unwrap();
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_unset_env_var_fails() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        let root = write_sheet(dir, "main.sch", &["${PINSWAP_TEST_UNSET}/sub.sch"], "");

        let err = SheetTree::resolve(&root).unwrap_err();
        match err {
            SchematicError::UnresolvableReference { var, .. } => {
                assert_eq!(var, "PINSWAP_TEST_UNSET");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_subsheet_line_numbers() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        write_sheet(dir, "sub.sch", &[], "");
        let root = write_sheet(dir, "main.sch", &["sub.sch"], "");

        let doc = SchematicDocument::read(&root).unwrap();
        let refs = extract_subsheets(&doc).unwrap();
        assert_eq!(refs.len(), 1);
        // F1 is the 8th line of the generated file.
        assert_eq!(refs[0].line, 8);
    }

    #[test]
    fn test_find_owner_unique() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        write_sheet(dir, "sub.sch", &[], "$Comp\nL Device:R U201\nP 100 200\n$EndComp\n");
        let root = write_sheet(dir, "main.sch", &["sub.sch"], "");

        let tree = SheetTree::resolve(&root).unwrap();
        let owner = tree.find_owner("U201").unwrap();
        assert_eq!(owner.file_name(), "sub.sch");
    }

    #[test]
    fn test_find_owner_not_found() {
        let tmp = tempdir().unwrap();
        let root = write_sheet(tmp.path(), "main.sch", &[], "");
        let tree = SheetTree::resolve(&root).unwrap();
        assert!(matches!(
            tree.find_owner("U999"),
            Err(SchematicError::FootprintNotFound { .. })
        ));
    }

    #[test]
    fn test_find_owner_ambiguous() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        write_sheet(dir, "a.sch", &[], "$Comp\nL Device:R U201\nP 1 2\n$EndComp\n");
        write_sheet(dir, "b.sch", &[], "$Comp\nL Device:R U201\nP 3 4\n$EndComp\n");
        let root = write_sheet(dir, "main.sch", &["a.sch", "b.sch"], "");

        let tree = SheetTree::resolve(&root).unwrap();
        match tree.find_owner("U201") {
            Err(SchematicError::AmbiguousFootprint { documents, .. }) => {
                assert_eq!(documents.len(), 2);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn test_find_owner_is_word_bounded() {
        // U20 must not match inside U201.
        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        let root = write_sheet(
            dir,
            "main.sch",
            &[],
            "$Comp\nL Device:R U201\nP 1 2\n$EndComp\n",
        );
        let tree = SheetTree::resolve(&root).unwrap();
        assert!(matches!(
            tree.find_owner("U20"),
            Err(SchematicError::FootprintNotFound { .. })
        ));
    }
}
