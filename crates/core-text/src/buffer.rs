//! The document: rows, cursor, selection, undo, and the highlight cache.
//!
//! Every mutation that changes the row count routes through the raw row
//! helpers so the highlight cache stays sized 1:1 with the rows. Edits push
//! undo records and invalidate the cache from the earliest affected row
//! (multi-line comment state can propagate arbitrarily far downstream).
//!
//! Compound edits (line split, row join, selection delete, paste) record a
//! `GroupBegin .. GroupEnd` span built from full-row replacements, so undo
//! and redo replay them as single units.

use crate::highlight::HighlightCache;
use crate::row::Row;
use crate::undo::{DEFAULT_UNDO_LIMIT, UndoAction, UndoHistory};
use anyhow::{Context, Result};
use core_syntax::{HighlightedLine, Syntax, SyntaxId, SyntaxRegistry};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};

/// Why a save could not complete. The buffer is untouched in either case.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("buffer has no filename")]
    NoFilename,
    #[error("write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Selection state: a half-open range between the anchor and the cursor,
/// normalised in reading order on access.
#[derive(Debug, Default, Clone, Copy)]
pub struct Selection {
    pub active: bool,
    pub anchor_x: usize,
    pub anchor_y: usize,
}

/// Coordinates of the bracket paired with the one under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracketMatch {
    pub row: usize,
    pub col: usize,
}

pub struct Buffer {
    rows: Vec<Row>,
    /// Byte column of the cursor.
    pub cx: usize,
    /// Row index of the cursor; may equal `rows.len()` (virtual last line).
    pub cy: usize,
    filename: Option<PathBuf>,
    modified: bool,
    syntax: Option<SyntaxId>,
    cache: HighlightCache,
    history: UndoHistory,
    selection: Selection,
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Buffer {
    pub fn new() -> Self {
        Self::with_undo_limit(DEFAULT_UNDO_LIMIT)
    }

    pub fn with_undo_limit(limit: usize) -> Self {
        Self {
            rows: Vec::new(),
            cx: 0,
            cy: 0,
            filename: None,
            modified: false,
            syntax: None,
            cache: HighlightCache::new(),
            history: UndoHistory::new(limit),
            selection: Selection::default(),
        }
    }

    /// Buffer pre-loaded from an in-memory string, one row per line. Starts
    /// unmodified with an empty history; intended for tests and scratch
    /// buffers.
    pub fn from_text(text: &str) -> Self {
        let mut buf = Self::new();
        for line in split_document(text.as_bytes()) {
            buf.rows.push(Row::from_bytes(line));
        }
        buf.sync_cache();
        buf
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, y: usize) -> Option<&Row> {
        self.rows.get(y)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn line_text(&self, y: usize) -> Option<Cow<'_, str>> {
        self.rows.get(y).map(|r| r.text())
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn set_filename(&mut self, path: Option<PathBuf>) {
        self.filename = path;
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn syntax(&self) -> Option<SyntaxId> {
        self.syntax
    }

    /// Attach (or detach) a syntax definition and reset the cache.
    pub fn attach_syntax(&mut self, syntax: Option<SyntaxId>) {
        self.syntax = syntax;
        self.sync_cache();
        self.cache.invalidate_from(0);
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn has_selection(&self) -> bool {
        self.selection.active
    }

    pub fn start_selection(&mut self) {
        self.selection = Selection {
            active: true,
            anchor_x: self.cx,
            anchor_y: self.cy,
        };
    }

    pub fn clear_selection(&mut self) {
        self.selection.active = false;
    }

    pub fn undo_depth(&self) -> usize {
        self.history.applied()
    }

    // ------------------------------------------------------------------
    // Cursor
    // ------------------------------------------------------------------

    /// Clamp the cursor into the valid range. Out-of-range positions are
    /// never an error anywhere in the editor; they clamp silently.
    pub fn clamp_cursor(&mut self) {
        if self.cy > self.rows.len() {
            self.cy = self.rows.len();
        }
        let max_x = self.rows.get(self.cy).map_or(0, Row::len);
        if self.cx > max_x {
            self.cx = max_x;
        }
    }

    pub fn set_cursor(&mut self, x: usize, y: usize) {
        self.cy = y.min(self.rows.len());
        self.cx = x;
        self.clamp_cursor();
    }

    pub fn move_left(&mut self) {
        if self.cx > 0 {
            self.cx -= 1;
        } else if self.cy > 0 {
            self.cy -= 1;
            self.cx = self.rows.get(self.cy).map_or(0, Row::len);
        }
    }

    pub fn move_right(&mut self) {
        if let Some(row) = self.rows.get(self.cy) {
            if self.cx < row.len() {
                self.cx += 1;
            } else if self.cy + 1 < self.rows.len() {
                self.cy += 1;
                self.cx = 0;
            }
        }
    }

    pub fn move_up(&mut self) {
        if self.cy > 0 {
            self.cy -= 1;
            self.clamp_cursor();
        }
    }

    /// Motion past the last row is refused rather than clamped to a virtual
    /// line.
    pub fn move_down(&mut self) {
        if self.cy + 1 < self.rows.len() {
            self.cy += 1;
            self.clamp_cursor();
        }
    }

    pub fn move_home(&mut self) {
        self.cx = 0;
    }

    pub fn move_end(&mut self) {
        self.cx = self.rows.get(self.cy).map_or(0, Row::len);
    }

    pub fn page_up(&mut self, page: usize) {
        self.cy = self.cy.saturating_sub(page.max(1));
        self.clamp_cursor();
    }

    pub fn page_down(&mut self, page: usize) {
        if self.rows.is_empty() {
            return;
        }
        self.cy = (self.cy + page.max(1)).min(self.rows.len() - 1);
        self.clamp_cursor();
    }

    // ------------------------------------------------------------------
    // Raw row plumbing (no undo records, no selection changes)
    // ------------------------------------------------------------------

    fn sync_cache(&mut self) {
        self.cache.resize(self.rows.len());
    }

    fn invalidate_from(&mut self, row: usize) {
        self.cache.invalidate_from(row);
    }

    fn raw_insert_row(&mut self, y: usize, data: Vec<u8>) {
        let y = y.min(self.rows.len());
        self.rows.insert(y, Row::from(data));
        self.sync_cache();
    }

    fn raw_delete_row(&mut self, y: usize) {
        if y < self.rows.len() {
            self.rows.remove(y);
            self.sync_cache();
        }
    }

    fn raw_insert_byte(&mut self, x: usize, y: usize, b: u8) {
        if y == self.rows.len() {
            self.rows.push(Row::new());
            self.sync_cache();
        }
        if let Some(row) = self.rows.get_mut(y) {
            row.insert_byte(x, b);
        }
    }

    fn raw_delete_byte(&mut self, x: usize, y: usize) {
        if let Some(row) = self.rows.get_mut(y) {
            row.delete_byte(x);
        }
    }

    // ------------------------------------------------------------------
    // Edits
    // ------------------------------------------------------------------

    /// Insert one byte at the cursor. On the virtual line past the end an
    /// empty row is appended first.
    pub fn insert_byte(&mut self, b: u8) {
        if self.cy == self.rows.len() {
            self.rows.push(Row::new());
            self.sync_cache();
        }
        let Some(row) = self.rows.get_mut(self.cy) else {
            return;
        };
        let (x, y) = (self.cx.min(row.len()), self.cy);
        self.history.push(UndoAction::InsertChar { x, y, byte: b });
        row.insert_byte(x, b);
        self.cx = x + 1;
        self.modified = true;
        self.invalidate_from(y);
    }

    /// Split the current row at the cursor. The new row inherits the leading
    /// whitespace of the head (auto-indent) and the cursor lands after it.
    pub fn insert_newline(&mut self) {
        if self.cy >= self.rows.len() {
            let y = self.rows.len();
            self.history.push(UndoAction::InsertLine {
                x: self.cx,
                y,
                data: Vec::new(),
            });
            self.raw_insert_row(y, Vec::new());
            self.cy = y + 1;
            self.cx = 0;
            self.modified = true;
            return;
        }

        let y = self.cy;
        let pre = (self.cx, self.cy);
        let old = self.rows[y].as_bytes().to_vec();
        let tail = self.rows[y].split_off(self.cx.min(old.len()));
        let head = self.rows[y].as_bytes().to_vec();
        let indent = self.rows[y].leading_indent();
        let mut data = Vec::with_capacity(indent + tail.len());
        data.extend_from_slice(&head[..indent]);
        data.extend_from_slice(&tail);
        self.raw_insert_row(y + 1, data.clone());
        self.cy = y + 1;
        self.cx = indent;
        self.modified = true;

        self.history.push(UndoAction::GroupBegin { x: pre.0, y: pre.1 });
        self.history.push(UndoAction::DeleteLine { x: pre.0, y, data: old });
        self.history.push(UndoAction::InsertLine { x: pre.0, y, data: head });
        self.history.push(UndoAction::InsertLine {
            x: self.cx,
            y: y + 1,
            data,
        });
        self.history.push(UndoAction::GroupEnd {
            x: self.cx,
            y: self.cy,
        });
        self.invalidate_from(y);
    }

    /// Backspace. In-row it deletes the byte before the cursor; at column 0
    /// it joins the row onto its predecessor. No-op at (0, 0).
    pub fn delete_byte_before_cursor(&mut self) {
        if self.cy >= self.rows.len() {
            return;
        }
        if self.cx == 0 && self.cy == 0 {
            return;
        }

        if self.cx > 0 {
            let (x, y) = (self.cx - 1, self.cy);
            if let Some(b) = self.rows[y].delete_byte(x) {
                self.history.push(UndoAction::DeleteChar { x, y, byte: b });
                self.cx = x;
                self.modified = true;
                self.invalidate_from(y);
            }
            return;
        }

        let y = self.cy;
        let cur = self.rows[y].as_bytes().to_vec();
        let prev = self.rows[y - 1].as_bytes().to_vec();
        let prev_len = prev.len();
        let mut merged = prev.clone();
        merged.extend_from_slice(&cur);

        self.rows[y - 1].append_bytes(&cur);
        self.raw_delete_row(y);
        self.cy = y - 1;
        self.cx = prev_len;
        self.modified = true;

        self.history.push(UndoAction::GroupBegin { x: 0, y });
        self.history.push(UndoAction::DeleteLine { x: 0, y, data: cur });
        self.history.push(UndoAction::DeleteLine {
            x: prev_len,
            y: y - 1,
            data: prev,
        });
        self.history.push(UndoAction::InsertLine {
            x: prev_len,
            y: y - 1,
            data: merged,
        });
        self.history.push(UndoAction::GroupEnd {
            x: self.cx,
            y: self.cy,
        });
        self.invalidate_from(y - 1);
    }

    /// Delete under the cursor; at end of line, join the next row up. The
    /// cursor does not move.
    pub fn delete_forward(&mut self) {
        let Some(row) = self.rows.get(self.cy) else {
            return;
        };
        if self.cx < row.len() {
            let (x, y) = (self.cx, self.cy);
            if let Some(b) = self.rows[y].delete_byte(x) {
                self.history.push(UndoAction::DeleteChar { x, y, byte: b });
                self.modified = true;
                self.invalidate_from(y);
            }
            return;
        }
        if self.cy + 1 >= self.rows.len() {
            return;
        }

        let y = self.cy;
        let cur = self.rows[y].as_bytes().to_vec();
        let next = self.rows[y + 1].as_bytes().to_vec();
        let mut merged = cur.clone();
        merged.extend_from_slice(&next);

        self.rows[y].append_bytes(&next);
        self.raw_delete_row(y + 1);
        self.modified = true;

        self.history.push(UndoAction::GroupBegin { x: self.cx, y });
        self.history.push(UndoAction::DeleteLine {
            x: 0,
            y: y + 1,
            data: next,
        });
        self.history.push(UndoAction::DeleteLine {
            x: self.cx,
            y,
            data: cur,
        });
        self.history.push(UndoAction::InsertLine {
            x: self.cx,
            y,
            data: merged,
        });
        self.history.push(UndoAction::GroupEnd { x: self.cx, y });
        self.invalidate_from(y);
    }

    /// Append a row at the end of the document (script and load surface).
    pub fn append_row(&mut self, bytes: &[u8]) {
        let y = self.rows.len();
        self.raw_insert_row(y, bytes.to_vec());
        self.modified = true;
        self.invalidate_from(y);
    }

    /// Append a row without touching the modified flag or the history; used
    /// to seed a fresh buffer with its initial empty line.
    pub fn append_row_pristine(&mut self, bytes: &[u8]) {
        let y = self.rows.len();
        self.raw_insert_row(y, bytes.to_vec());
    }

    // ------------------------------------------------------------------
    // File I/O
    // ------------------------------------------------------------------

    /// Replace the buffer content from a file: one row per line, trailing
    /// `\n` / `\r\n` stripped, syntax detected from the file name. Clears
    /// the undo history and the modified flag.
    pub fn open(&mut self, path: &Path, registry: &SyntaxRegistry) -> Result<()> {
        let content = std::fs::read(path)
            .with_context(|| format!("open {}", path.display()))?;
        self.rows = split_document(&content)
            .map(Row::from_bytes)
            .collect();
        self.filename = Some(path.to_path_buf());
        self.syntax = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| registry.find_by_filename(n));
        self.cx = 0;
        self.cy = 0;
        self.selection.active = false;
        self.history.clear();
        self.sync_cache();
        self.cache.invalidate_from(0);
        self.modified = false;
        debug!(
            target: "io",
            path = %path.display(),
            rows = self.rows.len(),
            syntax = self.syntax.is_some(),
            "buffer_opened"
        );
        Ok(())
    }

    /// Write every row followed by `\n` to the attached path and clear the
    /// modified flag. Fails without touching the buffer when no filename is
    /// attached or the write errors.
    pub fn save(&mut self) -> Result<usize, SaveError> {
        let Some(path) = self.filename.clone() else {
            return Err(SaveError::NoFilename);
        };
        let mut out = Vec::new();
        for row in &self.rows {
            out.extend_from_slice(row.as_bytes());
            out.push(b'\n');
        }
        let written = out.len();
        std::fs::write(&path, out).map_err(|source| SaveError::Io {
            path: path.clone(),
            source,
        })?;
        self.modified = false;
        debug!(target: "io", path = %path.display(), bytes = written, "buffer_saved");
        Ok(written)
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Selection endpoints normalised so start <= end in reading order.
    pub fn selection_range(&self) -> Option<((usize, usize), (usize, usize))> {
        if !self.selection.active {
            return None;
        }
        let a = (self.selection.anchor_x, self.selection.anchor_y);
        let b = (self.cx, self.cy);
        if (a.1, a.0) <= (b.1, b.0) {
            Some((a, b))
        } else {
            Some((b, a))
        }
    }

    /// Freshly allocated copy of the selected bytes with `\n` between rows.
    /// Returns `None` when no selection is active or the range is empty.
    pub fn get_selected_text(&self) -> Option<Vec<u8>> {
        let ((sx, sy), (ex, ey)) = self.selection_range()?;
        let mut text = Vec::new();
        for y in sy..=ey.min(self.rows.len().saturating_sub(1)) {
            let row = self.rows[y].as_bytes();
            if sy == ey {
                let from = sx.min(row.len());
                let to = ex.min(row.len());
                text.extend_from_slice(&row[from..to]);
            } else if y == sy {
                text.extend_from_slice(&row[sx.min(row.len())..]);
                text.push(b'\n');
            } else if y == ey {
                text.extend_from_slice(&row[..ex.min(row.len())]);
            } else {
                text.extend_from_slice(row);
                text.push(b'\n');
            }
        }
        if text.is_empty() { None } else { Some(text) }
    }

    /// Remove the selected range, joining the boundary rows when it spans
    /// several. The cursor lands at the normalised start.
    pub fn delete_selection(&mut self) {
        let Some(((sx, sy), (ex, ey))) = self.selection_range() else {
            return;
        };
        if sy >= self.rows.len() {
            self.selection.active = false;
            return;
        }

        if sy == ey {
            let old = self.rows[sy].as_bytes().to_vec();
            let to = ex.min(old.len());
            let from = sx.min(to);
            if from == to {
                self.selection.active = false;
                return;
            }
            self.rows[sy].delete_range(from, to);
            let new = self.rows[sy].as_bytes().to_vec();
            self.push_row_replacement((sx, sy), sy..=sy, vec![old], vec![new], (from, sy));
        } else {
            let ey = ey.min(self.rows.len() - 1);
            let old: Vec<Vec<u8>> = (sy..=ey)
                .map(|y| self.rows[y].as_bytes().to_vec())
                .collect();
            let end_row = self.rows[ey].as_bytes();
            let ex = ex.min(end_row.len());
            let mut merged = self.rows[sy].as_bytes()[..sx.min(self.rows[sy].len())].to_vec();
            merged.extend_from_slice(&self.rows[ey].as_bytes()[ex..]);

            for _ in sy..=ey {
                self.raw_delete_row(sy);
            }
            self.raw_insert_row(sy, merged.clone());
            self.push_row_replacement((sx, sy), sy..=ey, old, vec![merged], (sx, sy));
        }

        self.cx = self.cx.min(self.rows.get(self.cy).map_or(0, Row::len));
        self.selection.active = false;
        self.modified = true;
        self.invalidate_from(sy);
    }

    /// Record a compound edit replacing `old_span` rows with `new_rows`
    /// starting at the span's first index, and move the cursor to `post`.
    fn push_row_replacement(
        &mut self,
        pre: (usize, usize),
        old_span: std::ops::RangeInclusive<usize>,
        old_rows: Vec<Vec<u8>>,
        new_rows: Vec<Vec<u8>>,
        post: (usize, usize),
    ) {
        let first = *old_span.start();
        self.history.push(UndoAction::GroupBegin { x: pre.0, y: pre.1 });
        for data in old_rows {
            self.history.push(UndoAction::DeleteLine {
                x: pre.0,
                y: first,
                data,
            });
        }
        for (i, data) in new_rows.into_iter().enumerate() {
            self.history.push(UndoAction::InsertLine {
                x: post.0,
                y: first + i,
                data,
            });
        }
        self.history.push(UndoAction::GroupEnd { x: post.0, y: post.1 });
        self.cx = post.0;
        self.cy = post.1;
    }

    // ------------------------------------------------------------------
    // Paste
    // ------------------------------------------------------------------

    /// Insert raw text at the cursor. The first `\n`-separated fragment goes
    /// in at the cursor column; each later fragment becomes a fresh row with
    /// no auto-indent, inserted before the carried tail of the split row.
    /// Paste can change multi-line comment state anywhere downstream, so the
    /// whole cache is invalidated.
    pub fn paste_text(&mut self, text: &[u8]) {
        if text.is_empty() {
            return;
        }
        if self.cy >= self.rows.len() {
            self.rows.push(Row::new());
            self.sync_cache();
            self.cy = self.rows.len() - 1;
            self.cx = 0;
        }

        let pre = (self.cx, self.cy);
        let start_y = self.cy;
        let old = self.rows[start_y].as_bytes().to_vec();

        let mut first = true;
        for fragment in text.split(|&b| b == b'\n') {
            if first {
                let at = self.cx.min(self.rows[self.cy].len());
                self.rows[self.cy].insert_bytes(at, fragment);
                self.cx = at + fragment.len();
                first = false;
            } else {
                let tail = self.rows[self.cy].split_off(self.cx);
                self.raw_insert_row(self.cy + 1, tail);
                self.cy += 1;
                self.rows[self.cy].insert_bytes(0, fragment);
                self.cx = fragment.len();
            }
        }

        let new_rows: Vec<Vec<u8>> = (start_y..=self.cy)
            .map(|y| self.rows[y].as_bytes().to_vec())
            .collect();
        let post = (self.cx, self.cy);
        self.push_row_replacement(pre, start_y..=start_y, vec![old], new_rows, post);
        self.modified = true;
        self.invalidate_from(0);
    }

    // ------------------------------------------------------------------
    // Bracket matching
    // ------------------------------------------------------------------

    /// Scan for the bracket matching the one under the cursor, keeping a
    /// depth counter. Brackets inside strings or comments are not excluded.
    pub fn find_matching_bracket(&self) -> Option<BracketMatch> {
        let row = self.rows.get(self.cy)?;
        let c = row.byte(self.cx)?;
        let (target, forward) = match c {
            b'(' => (b')', true),
            b')' => (b'(', false),
            b'{' => (b'}', true),
            b'}' => (b'{', false),
            b'[' => (b']', true),
            b']' => (b'[', false),
            _ => return None,
        };

        let mut depth = 1usize;
        if forward {
            let mut y = self.cy;
            let mut x = self.cx + 1;
            while y < self.rows.len() {
                let bytes = self.rows[y].as_bytes();
                while x < bytes.len() {
                    let b = bytes[x];
                    if b == c {
                        depth += 1;
                    } else if b == target {
                        depth -= 1;
                        if depth == 0 {
                            return Some(BracketMatch { row: y, col: x });
                        }
                    }
                    x += 1;
                }
                y += 1;
                x = 0;
            }
        } else {
            let mut y = self.cy as isize;
            let mut x = self.cx as isize - 1;
            while y >= 0 {
                let bytes = self.rows[y as usize].as_bytes();
                while x >= 0 {
                    let b = bytes[x as usize];
                    if b == c {
                        depth += 1;
                    } else if b == target {
                        depth -= 1;
                        if depth == 0 {
                            return Some(BracketMatch {
                                row: y as usize,
                                col: x as usize,
                            });
                        }
                    }
                    x -= 1;
                }
                y -= 1;
                if y >= 0 {
                    x = self.rows[y as usize].len() as isize - 1;
                }
            }
        }
        None
    }

    // ------------------------------------------------------------------
    // Undo / redo
    // ------------------------------------------------------------------

    /// Revert the most recent undo unit (a single action or a whole group).
    /// Returns false when the history is exhausted.
    pub fn undo(&mut self) -> bool {
        let Some(action) = self.history.retreat() else {
            return false;
        };
        let mut min_row = action.row();
        match action {
            UndoAction::GroupEnd { .. } => {
                let mut depth = 1usize;
                while depth > 0 {
                    let Some(a) = self.history.retreat() else {
                        break;
                    };
                    min_row = min_row.min(a.row());
                    match a {
                        UndoAction::GroupEnd { .. } => depth += 1,
                        UndoAction::GroupBegin { x, y } => {
                            depth -= 1;
                            if depth == 0 {
                                self.cx = x;
                                self.cy = y;
                            }
                        }
                        other => self.apply_inverse(&other),
                    }
                }
            }
            // A bare GroupBegin can only appear when eviction split a group;
            // there is nothing left to invert.
            UndoAction::GroupBegin { .. } => {}
            other => self.apply_inverse(&other),
        }
        self.modified = true;
        self.selection.active = false;
        self.clamp_cursor();
        self.invalidate_from(min_row);
        trace!(target: "text.undo", depth = self.history.applied(), "undo_applied");
        true
    }

    /// Re-apply the most recently undone unit.
    pub fn redo(&mut self) -> bool {
        let Some(action) = self.history.advance() else {
            return false;
        };
        let mut min_row = action.row();
        match action {
            UndoAction::GroupBegin { .. } => {
                let mut depth = 1usize;
                while depth > 0 {
                    let Some(a) = self.history.advance() else {
                        break;
                    };
                    min_row = min_row.min(a.row());
                    match a {
                        UndoAction::GroupBegin { .. } => depth += 1,
                        UndoAction::GroupEnd { x, y } => {
                            depth -= 1;
                            if depth == 0 {
                                self.cx = x;
                                self.cy = y;
                            }
                        }
                        other => self.apply_forward(&other),
                    }
                }
            }
            UndoAction::GroupEnd { .. } => {}
            other => self.apply_forward(&other),
        }
        self.modified = true;
        self.selection.active = false;
        self.clamp_cursor();
        self.invalidate_from(min_row);
        trace!(target: "text.undo", depth = self.history.applied(), "redo_applied");
        true
    }

    fn apply_inverse(&mut self, action: &UndoAction) {
        match action {
            UndoAction::InsertChar { x, y, .. } => {
                self.raw_delete_byte(*x, *y);
                self.cx = *x;
                self.cy = *y;
            }
            UndoAction::DeleteChar { x, y, byte } => {
                self.raw_insert_byte(*x, *y, *byte);
                self.cx = *x;
                self.cy = *y;
            }
            UndoAction::InsertLine { x, y, .. } => {
                self.raw_delete_row(*y);
                self.cx = *x;
                self.cy = *y;
            }
            UndoAction::DeleteLine { x, y, data } => {
                self.raw_insert_row(*y, data.clone());
                self.cx = *x;
                self.cy = *y;
            }
            UndoAction::GroupBegin { .. } | UndoAction::GroupEnd { .. } => {}
        }
    }

    fn apply_forward(&mut self, action: &UndoAction) {
        match action {
            UndoAction::InsertChar { x, y, byte } => {
                self.raw_insert_byte(*x, *y, *byte);
                self.cx = *x + 1;
                self.cy = *y;
            }
            UndoAction::DeleteChar { x, y, .. } => {
                self.raw_delete_byte(*x, *y);
                self.cx = *x;
                self.cy = *y;
            }
            UndoAction::InsertLine { x, y, data } => {
                self.raw_insert_row(*y, data.clone());
                self.cx = *x;
                self.cy = *y;
            }
            UndoAction::DeleteLine { x, y, .. } => {
                self.raw_delete_row(*y);
                self.cx = *x;
                self.cy = *y;
            }
            UndoAction::GroupBegin { .. } | UndoAction::GroupEnd { .. } => {}
        }
    }

    // ------------------------------------------------------------------
    // Highlighting
    // ------------------------------------------------------------------

    /// Cached highlight segments for a row, computing misses (and any stale
    /// predecessors) on demand. Callers resolve the attached `SyntaxId`
    /// through the registry and hand the definition in.
    pub fn highlight_row(&mut self, syn: &Syntax, row: usize) -> Option<&HighlightedLine> {
        if row >= self.rows.len() {
            return None;
        }
        Some(self.cache.lookup(syn, row, |r| self.rows[r].as_bytes()))
    }

    // Crate-internal hooks for the search module.

    pub(crate) fn row_mut(&mut self, y: usize) -> Option<&mut Row> {
        self.rows.get_mut(y)
    }

    pub(crate) fn mark_modified(&mut self) {
        self.modified = true;
    }

    pub(crate) fn invalidate_cache_from(&mut self, row: usize) {
        self.invalidate_from(row);
    }
}

/// Split raw file content into logical lines: separators are `\n`, a
/// trailing `\r` on each line is stripped, and a final `\n` does not
/// produce a trailing empty line.
fn split_document(content: &[u8]) -> impl Iterator<Item = &[u8]> {
    let trimmed = content.strip_suffix(b"\n").unwrap_or(content);
    let empty = content.is_empty();
    trimmed
        .split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .filter(move |_| !empty)
}
