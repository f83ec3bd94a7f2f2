//! Emit a frame plan into batched terminal commands.
//!
//! Runs without any editor borrow, so the hook implementations may call
//! back into the editor API freely (the gutter hook typically reads buffer
//! lines; custom renderers read their plugin state).

use crate::plan::{BufferLeafPlan, Cell, FramePlan, LeafKindPlan, TabLabel};
use crate::style::highlight_color;
use core_model::Rect;
use core_terminal::{CellStyle, Frame};
use crossterm::style::Color;

/// One positioned text run produced by a custom script renderer. Coordinates
/// are absolute terminal cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawOp {
    pub x: u16,
    pub y: u16,
    pub text: String,
}

/// Script-provided rendering surface consulted during emit.
pub trait RenderHooks {
    /// Two-column gutter cell for a document row; `None` renders blanks.
    fn gutter_cell(&self, _file_row: usize) -> Option<String> {
        None
    }

    /// Draw custom leaf content. The script is trusted to stay inside the
    /// rectangle, but output is clipped to it anyway.
    fn render_custom(&self, _renderer: &str, _data: u32, _rect: Rect) -> Vec<DrawOp> {
        Vec::new()
    }
}

/// Hooks used when no script host is attached.
pub struct NoopHooks;

impl RenderHooks for NoopHooks {}

fn cell_style(cell: &Cell, cursor_row: bool) -> CellStyle {
    CellStyle {
        fg: cell.kind.and_then(highlight_color),
        bg: cursor_row.then_some(Color::DarkGrey),
        bold: false,
        reverse: cell.selected || cell.bracket,
    }
}

fn pad_to_width(s: &str, width: usize) -> String {
    let mut out: String = s.chars().take(width).collect();
    while out.chars().count() < width {
        out.push(' ');
    }
    out
}

fn emit_tab_bar(labels: &[TabLabel], width: u16, frame: &mut Frame) {
    frame.move_to(0, 0);
    let mut col = 0u16;
    for label in labels {
        let remaining = width.saturating_sub(col) as usize;
        if remaining == 0 {
            break;
        }
        let text: String = label.name.chars().take(remaining).collect();
        let style = if label.active {
            CellStyle {
                bold: true,
                reverse: true,
                ..CellStyle::default()
            }
        } else {
            CellStyle {
                bg: Some(Color::DarkGrey),
                ..CellStyle::default()
            }
        };
        frame.style(style);
        frame.print(text.clone());
        frame.reset_style();
        col += text.chars().count() as u16;
    }
    if col < width {
        frame.style(CellStyle {
            bg: Some(Color::DarkGrey),
            ..CellStyle::default()
        });
        frame.print(" ".repeat((width - col) as usize));
        frame.reset_style();
    }
}

fn emit_buffer_leaf(rect: Rect, leaf: &BufferLeafPlan, hooks: &dyn RenderHooks, frame: &mut Frame) {
    if rect.h == 0 || rect.w == 0 {
        return;
    }
    let text_w = rect.w.saturating_sub(leaf.gutter_width) as usize;

    for (y, row) in leaf.rows.iter().enumerate() {
        frame.move_to(rect.x, rect.y + y as u16);

        if leaf.gutter_width > 0 {
            match (row.line_number, row.file_row) {
                (Some(number), Some(file_row)) => {
                    let number_style = if row.cursor_row {
                        CellStyle {
                            fg: Some(Color::Yellow),
                            bold: true,
                            ..CellStyle::default()
                        }
                    } else {
                        CellStyle::fg(Color::DarkGrey)
                    };
                    frame.style(number_style);
                    frame.print(format!(
                        "{:>width$} ",
                        number,
                        width = leaf.number_width.saturating_sub(1) as usize
                    ));
                    frame.reset_style();
                    let cell = hooks.gutter_cell(file_row).unwrap_or_default();
                    frame.print(pad_to_width(&cell, 2));
                }
                _ => frame.print(" ".repeat(leaf.gutter_width as usize)),
            }
        }

        if row.file_row.is_none() {
            frame.print("~");
            frame.print(" ".repeat(text_w.saturating_sub(1)));
            continue;
        }

        // Group cells into runs of identical style.
        let mut run = String::new();
        let mut run_style: Option<CellStyle> = None;
        for cell in &row.cells {
            let style = cell_style(cell, row.cursor_row);
            if Some(style) != run_style {
                if let Some(prev) = run_style.take() {
                    frame.style(prev);
                    frame.print(std::mem::take(&mut run));
                    frame.reset_style();
                }
                run_style = Some(style);
            }
            run.push(cell.ch);
        }
        if let Some(style) = run_style {
            frame.style(style);
            frame.print(run);
            frame.reset_style();
        }

        // Pad to the leaf edge so stale content never bleeds through; the
        // cursor line keeps its background across the full width.
        let pad = text_w.saturating_sub(row.cells.len());
        if pad > 0 {
            if row.cursor_row {
                frame.style(CellStyle {
                    bg: Some(Color::DarkGrey),
                    ..CellStyle::default()
                });
                frame.print(" ".repeat(pad));
                frame.reset_style();
            } else {
                frame.print(" ".repeat(pad));
            }
        }
    }

    frame.move_to(rect.x, rect.y + rect.h - 1);
    frame.style(CellStyle::reversed());
    frame.print(pad_to_width(&leaf.status, rect.w as usize));
    frame.reset_style();
}

fn emit_custom_leaf(
    rect: Rect,
    renderer: &str,
    data: u32,
    hooks: &dyn RenderHooks,
    frame: &mut Frame,
) {
    for op in hooks.render_custom(renderer, data, rect) {
        if op.y < rect.y || op.y >= rect.y + rect.h || op.x < rect.x || op.x >= rect.x + rect.w {
            continue;
        }
        let max = (rect.x + rect.w - op.x) as usize;
        let text: String = op.text.chars().take(max).collect();
        frame.move_to(op.x, op.y);
        frame.print(text);
    }
}

/// Translate a frame plan into terminal commands: clear, tab bar, leaves,
/// global status line, cursor parking.
pub fn emit(plan: &FramePlan, hooks: &dyn RenderHooks, frame: &mut Frame) {
    frame.hide_cursor();
    frame.clear_all();

    if let Some(bar) = &plan.tab_bar {
        emit_tab_bar(bar, plan.term.0, frame);
    }

    for leaf in &plan.leaves {
        match &leaf.kind {
            LeafKindPlan::Buffer(b) => emit_buffer_leaf(leaf.rect, b, hooks, frame),
            LeafKindPlan::Custom { renderer, data } => {
                emit_custom_leaf(leaf.rect, renderer, *data, hooks, frame);
            }
        }
    }

    frame.move_to(0, plan.term.1.saturating_sub(1));
    frame.clear_line_tail();
    let status: String = plan.status_line.chars().take(plan.term.0 as usize).collect();
    frame.print(status);

    if let Some((x, y)) = plan.cursor {
        frame.move_to(x, y);
    }
    frame.show_cursor();
}
