//! Line-level LCS diff used by the duplicate wizard's side-by-side view.
//!
//! The classification comes straight from the LCS backtrace, so it must be
//! exact: an `(m+1) x (n+1)` table over the line arrays, then a backtrace
//! from the bottom-right corner that prefers "added" on ties. Inputs whose
//! table would exceed [`MAX_DIFF_CELLS`] are not compared at all.

use serde::{Deserialize, Serialize};

/// Largest LCS table computed, in cells (64 MiB of `u32`). Beyond it every
/// line is shown unmarked.
pub const MAX_DIFF_CELLS: usize = 16 * 1024 * 1024;

/// The status of a single line in a diff comparison.
///
/// - `Added`     -- present only in the imported/new side.
/// - `Removed`   -- present only in the local/old side.
/// - `Unchanged` -- part of the longest common subsequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStatus {
    Added,
    Removed,
    Unchanged,
}

impl LineStatus {
    /// String representation for display and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Unchanged => "unchanged",
        }
    }
}

impl std::fmt::Display for LineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line that appears on only one side. `index` is 0-based into that side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffLine {
    pub index: usize,
    pub line: String,
}

/// Result of [`calculate_text_diff`], both lists in ascending index order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TextDiff {
    pub added: Vec<DiffLine>,
    pub removed: Vec<DiffLine>,
    /// The texts were too large to compare; nothing is marked.
    pub too_large: bool,
}

/// Which side of the comparison to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffView {
    /// Old content, removed lines marked.
    Local,
    /// New content, added lines marked.
    Imported,
}

/// One display line, numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedLine {
    pub number: usize,
    pub text: String,
    pub status: LineStatus,
}

/// Both sides of a comparison, rendered from one diff computation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SideBySide {
    pub local: Vec<RenderedLine>,
    pub imported: Vec<RenderedLine>,
    pub too_large: bool,
}

/// Compute the LCS line diff between `old` and `new`.
///
/// Both texts are split on `\n`; an empty text is a single empty line.
/// When both are empty the diff is empty.
/// When `(m+1) x (n+1)` exceeds [`MAX_DIFF_CELLS`] the diff is empty and
/// flagged `too_large`.
pub fn calculate_text_diff(old: &str, new: &str) -> TextDiff {
    if old.is_empty() && new.is_empty() {
        return TextDiff::default();
    }

    let old_lines: Vec<&str> = old.split('\n').collect();
    let new_lines: Vec<&str> = new.split('\n').collect();
    let m = old_lines.len();
    let n = new_lines.len();
    let cells = (m + 1).checked_mul(n + 1);
    if cells.map_or(true, |cells| cells > MAX_DIFF_CELLS) {
        return TextDiff {
            too_large: true,
            ..TextDiff::default()
        };
    }

    let mut dp = vec![vec![0u32; n + 1]; m + 1];
    for i in 1..=m {
        for j in 1..=n {
            dp[i][j] = if old_lines[i - 1] == new_lines[j - 1] {
                dp[i - 1][j - 1] + 1
            } else {
                dp[i - 1][j].max(dp[i][j - 1])
            };
        }
    }

    let mut added = Vec::new();
    let mut removed = Vec::new();
    let (mut i, mut j) = (m, n);

    while i > 0 || j > 0 {
        if i > 0 && j > 0 && old_lines[i - 1] == new_lines[j - 1] {
            i -= 1;
            j -= 1;
        } else if j > 0 && (i == 0 || dp[i][j - 1] >= dp[i - 1][j]) {
            added.push(DiffLine {
                index: j - 1,
                line: new_lines[j - 1].to_string(),
            });
            j -= 1;
        } else {
            removed.push(DiffLine {
                index: i - 1,
                line: old_lines[i - 1].to_string(),
            });
            i -= 1;
        }
    }

    // The backtrace walks from the end.
    added.reverse();
    removed.reverse();

    TextDiff {
        added,
        removed,
        too_large: false,
    }
}

/// Render one side of the comparison.
pub fn render_full_content_diff(old: &str, new: &str, view: DiffView) -> Vec<RenderedLine> {
    let diff = calculate_text_diff(old, new);
    render_side(old, new, &diff, view)
}

/// Render both sides from a single diff computation.
pub fn side_by_side(old: &str, new: &str) -> SideBySide {
    let diff = calculate_text_diff(old, new);
    SideBySide {
        local: render_side(old, new, &diff, DiffView::Local),
        imported: render_side(old, new, &diff, DiffView::Imported),
        too_large: diff.too_large,
    }
}

fn render_side(old: &str, new: &str, diff: &TextDiff, view: DiffView) -> Vec<RenderedLine> {
    if old.is_empty() && new.is_empty() {
        return Vec::new();
    }

    let (text, marked, marker) = match view {
        DiffView::Local => (old, &diff.removed, LineStatus::Removed),
        DiffView::Imported => (new, &diff.added, LineStatus::Added),
    };

    let mut marked_indices = marked.iter().map(|d| d.index).peekable();

    text.split('\n')
        .enumerate()
        .map(|(index, line)| {
            let status = if marked_indices.next_if_eq(&index).is_some() {
                marker
            } else {
                LineStatus::Unchanged
            };
            RenderedLine {
                number: index + 1,
                text: line.to_string(),
                status,
            }
        })
        .collect()
}
