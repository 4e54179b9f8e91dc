//! Merge policies for imported annotations.
//!
//! Each record kind has its own policy, split into a pure decision over the
//! existing state and an applier that performs it against a `TargetProgram`.
//! All policies are idempotent: applying the same record twice changes nothing
//! the second time.

pub mod symbols;

pub use symbols::{apply_symbol, plan_symbol, PlaceholderPrefixes, SymbolAction, SymbolTable};

use serde::{Deserialize, Serialize};

use crate::model::Address;
use crate::target::{TargetProgram, TargetResult};

/// How an incoming comment is recognized as already imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentMatch {
    /// Incoming text appears anywhere inside the existing comment.
    ///
    /// Compatible with earlier imports, but also skips text that merely occurs
    /// inside an unrelated comment.
    #[default]
    Substring,
    /// Incoming text matches a run of whole lines of the existing comment.
    Line,
}

/// Result of applying a single comment or bookmark record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Applied,
    AlreadyPresent,
}

/// Decide the new end-of-line comment, or `None` if nothing changes.
///
/// New text goes on top; any existing comment is kept below it.
pub fn merge_comment(existing: Option<&str>, incoming: &str, mode: CommentMatch) -> Option<String> {
    let current = existing.unwrap_or("");
    if incoming.is_empty() || comment_contains(current, incoming, mode) {
        return None;
    }
    if current.is_empty() {
        Some(incoming.to_string())
    } else {
        Some(format!("{incoming}\n{current}"))
    }
}

fn comment_contains(current: &str, incoming: &str, mode: CommentMatch) -> bool {
    match mode {
        CommentMatch::Substring => current.contains(incoming),
        CommentMatch::Line => {
            if current.is_empty() {
                return false;
            }
            let have: Vec<&str> = current.split('\n').collect();
            let want: Vec<&str> = incoming.split('\n').collect();
            have.windows(want.len()).any(|window| window == want.as_slice())
        }
    }
}

/// A bookmark is only created where none exists yet.
///
/// Debugger bookmarks carry nothing beyond their location, so any existing
/// bookmark already says everything an imported one would.
pub fn bookmark_needed(existing: usize) -> bool {
    existing == 0
}

/// Merge one comment into the end-of-line comment at `address`.
pub fn apply_comment<T: TargetProgram + ?Sized>(
    target: &mut T,
    address: Address,
    text: &str,
    mode: CommentMatch,
) -> TargetResult<MergeOutcome> {
    let existing = target.eol_comment(address)?;
    match merge_comment(existing.as_deref(), text, mode) {
        Some(merged) => {
            target.set_eol_comment(address, &merged)?;
            Ok(MergeOutcome::Applied)
        }
        None => Ok(MergeOutcome::AlreadyPresent),
    }
}

/// Bookmark `address` unless it already carries any bookmark.
pub fn apply_bookmark<T: TargetProgram + ?Sized>(
    target: &mut T,
    address: Address,
    category: &str,
    description: &str,
) -> TargetResult<MergeOutcome> {
    let existing = target.bookmarks(address)?;
    if !bookmark_needed(existing.len()) {
        return Ok(MergeOutcome::AlreadyPresent);
    }
    target.create_bookmark(address, category, description)?;
    Ok(MergeOutcome::Applied)
}
