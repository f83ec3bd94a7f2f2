//! Byte-literal search and replace over buffer rows.
//!
//! Matches never span rows. Forward search skips the starting position so
//! repeated "find next" calls advance; backward search begins just before
//! it. Neither direction wraps at the document boundaries.

use crate::buffer::Buffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    pub row: usize,
    pub col: usize,
    pub len: usize,
}

fn find_in(row: &[u8], query: &[u8], from: usize) -> Option<usize> {
    if query.is_empty() || from > row.len() {
        return None;
    }
    row[from..]
        .windows(query.len())
        .position(|w| w == query)
        .map(|p| p + from)
}

fn rfind_in(row: &[u8], query: &[u8], before: usize) -> Option<usize> {
    if query.is_empty() {
        return None;
    }
    let upper = before.min(row.len());
    (0..upper)
        .rev()
        .find(|&c| c + query.len() <= row.len() && &row[c..c + query.len()] == query)
}

impl Buffer {
    /// Next occurrence of `query` strictly after (forward) or strictly
    /// before (backward) the given position.
    pub fn search(
        &self,
        query: &[u8],
        start_row: usize,
        start_col: usize,
        forward: bool,
    ) -> Option<SearchMatch> {
        if query.is_empty() || self.row_count() == 0 {
            return None;
        }
        if forward {
            let mut from = start_col.saturating_add(1);
            for y in start_row.min(self.row_count())..self.row_count() {
                let row = self.row(y).expect("row index in range").as_bytes();
                if let Some(col) = find_in(row, query, from.min(row.len())) {
                    return Some(SearchMatch {
                        row: y,
                        col,
                        len: query.len(),
                    });
                }
                from = 0;
            }
        } else {
            let mut y = start_row.min(self.row_count().saturating_sub(1)) as isize;
            let mut before = start_col;
            while y >= 0 {
                let row = self.row(y as usize).expect("row index in range").as_bytes();
                if let Some(col) = rfind_in(row, query, before) {
                    return Some(SearchMatch {
                        row: y as usize,
                        col,
                        len: query.len(),
                    });
                }
                y -= 1;
                if y >= 0 {
                    before = self.row(y as usize).expect("row index in range").len() + 1;
                }
            }
        }
        None
    }

    /// Occurrence at or after the given position; used by replace so a match
    /// at the very start is not skipped.
    fn search_from(&self, query: &[u8], start_row: usize, start_col: usize) -> Option<SearchMatch> {
        if query.is_empty() {
            return None;
        }
        let mut from = start_col;
        for y in start_row.min(self.row_count())..self.row_count() {
            let row = self.row(y).expect("row index in range").as_bytes();
            if let Some(col) = find_in(row, query, from.min(row.len())) {
                return Some(SearchMatch {
                    row: y,
                    col,
                    len: query.len(),
                });
            }
            from = 0;
        }
        None
    }

    /// Replace the next occurrence (or every occurrence when `all`) of
    /// `search` with `replace`, scanning forward from the document start.
    /// Returns the replacement count. Replacements do not join or split
    /// rows; multi-row patterns never match.
    pub fn replace(&mut self, search: &[u8], replace: &[u8], all: bool) -> usize {
        if search.is_empty() {
            return 0;
        }
        let mut count = 0usize;
        let mut row = 0usize;
        let mut col = 0usize;
        loop {
            let Some(m) = self.search_from(search, row, col) else {
                break;
            };
            self.replace_at(m, replace);
            count += 1;
            row = m.row;
            col = m.col + replace.len();
            if !all {
                break;
            }
        }
        count
    }

    fn replace_at(&mut self, m: SearchMatch, replacement: &[u8]) {
        let row = m.row;
        if let Some(r) = self.row_mut(row) {
            r.delete_range(m.col, m.col + m.len);
            r.insert_bytes(m.col, replacement);
        }
        self.mark_modified();
        self.invalidate_cache_from(row);
    }
}
