//! Line-level diff alignment for human review of corrected text.
//! Lines are paired positionally; differing lines get a character-level
//! diff whose insert/delete spans carry change-group ids so a deletion on
//! the left can be matched with its insertion on the right.

use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

/// How a span should be styled in a side-by-side rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanKind {
    Unchanged,
    Deleted,
    Inserted,
}

/// One styled run of text on either side of a diff row.
/// `change_id` links a deletion with its counterpart insertion; whitespace
/// only edits never carry an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffSpan {
    pub text: String,
    pub kind: SpanKind,
    pub change_id: Option<u32>,
}

/// A single aligned row: left renders the original line, right the
/// corrected one. `changed` is false when both lines are byte-identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffRow {
    pub left: Vec<DiffSpan>,
    pub right: Vec<DiffSpan>,
    pub changed: bool,
}

/// Align `original` against `corrected` line by line.
/// Missing lines on the shorter side compare as empty, so the row count is
/// the maximum of both line counts. The change-group counter is shared
/// across the whole document, not reset per row.
pub fn align(original: &str, corrected: &str) -> Vec<DiffRow> {
    let original_lines: Vec<&str> = original.split('\n').collect();
    let corrected_lines: Vec<&str> = corrected.split('\n').collect();
    let row_count = original_lines.len().max(corrected_lines.len());

    let mut next_group = 0u32;
    let mut rows = Vec::with_capacity(row_count);
    for i in 0..row_count {
        let o = original_lines.get(i).copied().unwrap_or("");
        let c = corrected_lines.get(i).copied().unwrap_or("");
        rows.push(align_row(o, c, &mut next_group));
    }
    rows
}

/// Diff one row and tag its edit spans, advancing the shared group counter.
fn align_row(original: &str, corrected: &str, next_group: &mut u32) -> DiffRow {
    if original == corrected {
        let span = |text: &str| DiffSpan {
            text: text.to_string(),
            kind: SpanKind::Unchanged,
            change_id: None,
        };
        return DiffRow {
            left: vec![span(original)],
            right: vec![span(corrected)],
            changed: false,
        };
    }

    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut current_group: Option<u32> = None;
    for (tag, text) in char_ops(original, corrected) {
        let whitespace = text.trim().is_empty();
        match tag {
            ChangeTag::Equal => {
                left.push(DiffSpan {
                    text: text.clone(),
                    kind: SpanKind::Unchanged,
                    change_id: None,
                });
                right.push(DiffSpan {
                    text,
                    kind: SpanKind::Unchanged,
                    change_id: None,
                });
                current_group = None;
            }
            ChangeTag::Delete => {
                // Whitespace-only edits render plainly and neither open
                // nor close a change group.
                let change_id = if whitespace {
                    None
                } else {
                    Some(enter_group(&mut current_group, next_group))
                };
                left.push(DiffSpan {
                    text,
                    kind: SpanKind::Deleted,
                    change_id,
                });
            }
            ChangeTag::Insert => {
                let change_id = if whitespace {
                    None
                } else {
                    Some(enter_group(&mut current_group, next_group))
                };
                right.push(DiffSpan {
                    text,
                    kind: SpanKind::Inserted,
                    change_id,
                });
            }
        }
    }
    DiffRow {
        left,
        right,
        changed: true,
    }
}

/// Return the id of the change group currently open, opening a new one if
/// the previous op ended it.
fn enter_group(current: &mut Option<u32>, next_group: &mut u32) -> u32 {
    if let Some(id) = *current {
        id
    } else {
        *next_group += 1;
        *current = Some(*next_group);
        *next_group
    }
}

/// Character-level Myers diff, with adjacent same-tag runs coalesced into
/// contiguous spans so the rendering stays readable.
fn char_ops(original: &str, corrected: &str) -> Vec<(ChangeTag, String)> {
    let diff = TextDiff::from_chars(original, corrected);
    let mut ops: Vec<(ChangeTag, String)> = Vec::new();
    for change in diff.iter_all_changes() {
        let tag = change.tag();
        match ops.last_mut() {
            Some((last_tag, text)) if *last_tag == tag => text.push_str(change.value()),
            _ => ops.push((tag, change.value().to_string())),
        }
    }
    ops
}
