//! Per-buffer highlight cache, kept 1:1 with the row list.
//!
//! Invariant: `lines.len() == multiline.len() == buffer row count` at all
//! times. Invalidation always clears a suffix, so validity is a prefix
//! property: once `lines[r]` is `Some`, every `multiline[0..=r]` entry is
//! the true carry-over state for its row. Lookups exploit this by computing
//! forward from the nearest cached predecessor.

use core_syntax::{HighlightedLine, Syntax, highlight_line};
use tracing::trace;

#[derive(Debug, Default)]
pub struct HighlightCache {
    lines: Vec<Option<HighlightedLine>>,
    multiline: Vec<bool>,
}

impl HighlightCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Grow or shrink to `len` rows. Entries past a shrink are dropped;
    /// grown entries start uncached.
    pub fn resize(&mut self, len: usize) {
        self.lines.resize_with(len, || None);
        self.multiline.resize(len, false);
    }

    /// Drop cached entries for `[row, len)`. Any edit can change downstream
    /// multi-line state, so callers pass the earliest affected row.
    pub fn invalidate_from(&mut self, row: usize) {
        for entry in self.lines.iter_mut().skip(row) {
            *entry = None;
        }
        for flag in self.multiline.iter_mut().skip(row) {
            *flag = false;
        }
        trace!(target: "text.highlight", from = row, "cache_invalidated");
    }

    /// Cached segments for `row`, computing misses from the nearest valid
    /// predecessor so the carried multi-line state is always well defined.
    /// `line_at` hands back the raw bytes of a row.
    pub fn lookup<'a, F>(&mut self, syn: &Syntax, row: usize, mut line_at: F) -> &HighlightedLine
    where
        F: FnMut(usize) -> &'a [u8],
    {
        debug_assert!(row < self.lines.len(), "row within cache bounds");
        let start = (0..row)
            .rev()
            .find(|&r| self.lines[r].is_some())
            .map(|r| r + 1)
            .unwrap_or(0);
        for r in start..=row {
            if self.lines[r].is_none() {
                let prev = r > 0 && self.multiline[r - 1];
                let hl = highlight_line(syn, line_at(r), prev);
                self.multiline[r] = hl.ends_in_multiline;
                self.lines[r] = Some(hl);
            }
        }
        self.lines[row].as_ref().expect("entry computed above")
    }
}
