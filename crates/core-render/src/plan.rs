//! Frame planning: snapshot everything a redraw needs from the editor.
//!
//! Rendering is split in two phases. `build_plan` runs under the editor
//! borrow: it lays out the active tab, adjusts scroll offsets (the only
//! state the renderer may mutate), fills highlight-cache misses for the
//! visible rows, and copies the cells to draw. The emit phase then runs
//! without any editor borrow, so script hooks (gutter cells, custom
//! renderers) are free to call back into the editor API.

use core_model::{LeafContent, Rect};
use core_state::EditorState;
use core_syntax::HighlightKind;
use core_text::Buffer;
use tracing::trace;

/// One visible character cell of a buffer row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub kind: Option<HighlightKind>,
    pub selected: bool,
    pub bracket: bool,
}

#[derive(Debug, Clone)]
pub struct RowPlan {
    /// Document row behind this screen row; `None` past end of document.
    pub file_row: Option<usize>,
    /// 1-based number for the gutter.
    pub line_number: Option<usize>,
    pub cursor_row: bool,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone)]
pub struct BufferLeafPlan {
    pub gutter_width: u16,
    /// Line-number digits column width (excludes the script cell).
    pub number_width: u16,
    pub rows: Vec<RowPlan>,
    pub status: String,
}

#[derive(Debug, Clone)]
pub enum LeafKindPlan {
    Buffer(BufferLeafPlan),
    Custom { renderer: String, data: u32 },
}

#[derive(Debug, Clone)]
pub struct LeafPlan {
    pub rect: Rect,
    pub focused: bool,
    pub kind: LeafKindPlan,
}

#[derive(Debug, Clone)]
pub struct TabLabel {
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct FramePlan {
    pub term: (u16, u16),
    /// Present only when more than one tab exists.
    pub tab_bar: Option<Vec<TabLabel>>,
    pub leaves: Vec<LeafPlan>,
    pub status_line: String,
    /// Absolute terminal cursor position for the focused leaf.
    pub cursor: Option<(u16, u16)>,
}

fn digits(mut n: usize) -> u16 {
    let mut d = 1;
    while n >= 10 {
        n /= 10;
        d += 1;
    }
    d
}

/// Gutter width for a buffer: line-number digits plus one space plus the
/// two-column script cell; zero when line numbers are off.
pub fn gutter_width(buffer: &Buffer, show_line_numbers: bool) -> (u16, u16) {
    if !show_line_numbers || buffer.row_count() == 0 {
        return (0, 0);
    }
    let number = digits(buffer.row_count()) + 1;
    (number + 2, number)
}

/// Keep the cursor inside the vertical viewport, reserving one line for the
/// leaf status bar. Returns the adjusted offset.
pub fn adjust_row_offset(row_offset: usize, cy: usize, height: u16) -> usize {
    let height = height as usize;
    let mut offset = row_offset;
    if cy < offset {
        offset = cy;
    }
    if height > 1 && cy >= offset + height - 1 {
        offset = cy + 2 - height;
    }
    offset
}

fn leaf_status(buffer: &Buffer) -> String {
    let name = buffer
        .filename()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "[No Name]".to_string());
    let modified = if buffer.is_modified() { "[+] " } else { "" };
    format!(" {} {}| {}:{} ", name, modified, buffer.cy + 1, buffer.cx + 1)
}

/// Snapshot one redraw. Mutates only leaf scroll offsets and the highlight
/// cache.
pub fn build_plan(state: &mut EditorState, term: (u16, u16)) -> FramePlan {
    let (term_w, term_h) = term;
    let tab_bar = if state.tabs.tab_count() > 1 {
        let active = state.tabs.active_index();
        Some(
            state
                .tabs
                .groups()
                .iter()
                .enumerate()
                .map(|(i, g)| TabLabel {
                    name: format!(" {}:{} ", i + 1, g.name),
                    active: i == active,
                })
                .collect(),
        )
    } else {
        None
    };

    let top = if tab_bar.is_some() { 1 } else { 0 };
    let content_h = term_h.saturating_sub(1 + top);
    let area = Rect::new(0, top, term_w, content_h);
    let status_line = state.status.clone();

    let EditorState {
        buffers,
        registry,
        tabs,
        options,
        ..
    } = state;

    tabs.active_tab_mut().tree.resize(area);
    let active_leaf = tabs.active_leaf_id();

    let mut leaves = Vec::new();
    let mut cursor = None;

    for leaf in tabs.active_tab_mut().tree.leaves_mut() {
        let focused = leaf.id == active_leaf;
        let rect = leaf.rect;
        match &leaf.content {
            LeafContent::Custom { renderer, data } => {
                leaves.push(LeafPlan {
                    rect,
                    focused,
                    kind: LeafKindPlan::Custom {
                        renderer: renderer.clone(),
                        data: *data,
                    },
                });
            }
            LeafContent::Buffer(idx) => {
                let Some(buffer) = buffers.get_mut(*idx) else {
                    continue;
                };
                leaf.row_offset = adjust_row_offset(leaf.row_offset, buffer.cy, rect.h);

                let (gutter, number_width) = gutter_width(buffer, options.show_line_numbers);
                let text_w = rect.w.saturating_sub(gutter) as usize;
                let bracket = buffer.find_matching_bracket();
                let sel = buffer.selection_range();
                let syntax = buffer.syntax().and_then(|id| registry.get(id));

                let mut rows = Vec::new();
                let visible = rect.h.saturating_sub(1);
                for y in 0..visible {
                    let file_row = leaf.row_offset + y as usize;
                    if file_row >= buffer.row_count() {
                        rows.push(RowPlan {
                            file_row: None,
                            line_number: None,
                            cursor_row: false,
                            cells: Vec::new(),
                        });
                        continue;
                    }

                    let highlight = syntax
                        .and_then(|syn| buffer.highlight_row(syn, file_row))
                        .cloned();
                    let row = buffer.row(file_row).map(|r| r.as_bytes().to_vec()).unwrap_or_default();
                    let cursor_row = file_row == buffer.cy;

                    let sel_cols = sel.and_then(|((sx, sy), (ex, ey))| {
                        if file_row < sy || file_row > ey {
                            return None;
                        }
                        let from = if file_row == sy { sx } else { 0 };
                        let to = if file_row == ey { ex } else { row.len() };
                        Some((from, to))
                    });

                    let mut cells = Vec::new();
                    for col in leaf.col_offset..(leaf.col_offset + text_w).min(row.len()) {
                        let selected = sel_cols.is_some_and(|(f, t)| col >= f && col < t);
                        let is_bracket = bracket.is_some_and(|m| {
                            (cursor_row && col == buffer.cx)
                                || (m.row == file_row && m.col == col)
                        });
                        cells.push(Cell {
                            ch: row[col] as char,
                            kind: highlight.as_ref().and_then(|hl| hl.kind_at(col)),
                            selected,
                            bracket: is_bracket,
                        });
                    }

                    rows.push(RowPlan {
                        file_row: Some(file_row),
                        line_number: Some(file_row + 1),
                        cursor_row,
                        cells,
                    });
                }

                if focused {
                    let cx = buffer.cx.saturating_sub(leaf.col_offset) as u16;
                    let cy = buffer.cy.saturating_sub(leaf.row_offset) as u16;
                    cursor = Some((
                        (rect.x + gutter + cx).min(rect.x + rect.w.saturating_sub(1)),
                        (rect.y + cy).min(rect.y + rect.h.saturating_sub(1)),
                    ));
                }

                leaves.push(LeafPlan {
                    rect,
                    focused,
                    kind: LeafKindPlan::Buffer(BufferLeafPlan {
                        gutter_width: gutter,
                        number_width,
                        rows,
                        status: leaf_status(buffer),
                    }),
                });
            }
        }
    }

    trace!(target: "render.plan", leaves = leaves.len(), w = term_w, h = term_h, "plan_built");
    FramePlan {
        term,
        tab_bar,
        leaves,
        status_line,
        cursor,
    }
}
