//! Terminal backend abstraction and crossterm implementation.
//!
//! `CrosstermBackend` owns raw mode, the alternate screen, and mouse
//! capture; `TerminalGuard` restores all three on drop so every exit path
//! (including panics) leaves the terminal usable. `Frame` batches one
//! redraw worth of commands and flushes them in a single write.

use anyhow::Result;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{
        Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
        enable_raw_mode,
    },
};
use std::io::{Write, stdout};

pub trait TerminalBackend {
    fn enter(&mut self) -> Result<()>;
    fn leave(&mut self) -> Result<()>;
    fn size(&self) -> Result<(u16, u16)>;
}

pub struct CrosstermBackend {
    entered: bool,
}

/// RAII guard ensuring terminal state restoration even if the caller
/// early-returns or panics.
pub struct TerminalGuard<'a> {
    backend: &'a mut CrosstermBackend,
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CrosstermBackend {
    pub fn new() -> Self {
        Self { entered: false }
    }

    /// Enter and return a guard that will leave on drop.
    pub fn enter_guard(&mut self) -> Result<TerminalGuard<'_>> {
        self.enter()?;
        Ok(TerminalGuard { backend: self })
    }
}

impl TerminalBackend for CrosstermBackend {
    fn enter(&mut self) -> Result<()> {
        if !self.entered {
            enable_raw_mode()?;
            execute!(stdout(), EnterAlternateScreen, EnableMouseCapture, Hide)?;
            self.entered = true;
        }
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        if self.entered {
            execute!(stdout(), DisableMouseCapture, LeaveAlternateScreen, Show)?;
            disable_raw_mode()?;
            self.entered = false;
        }
        Ok(())
    }

    fn size(&self) -> Result<(u16, u16)> {
        Ok(crossterm::terminal::size()?)
    }
}

impl Drop for CrosstermBackend {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

impl Drop for TerminalGuard<'_> {
    fn drop(&mut self) {
        let _ = self.backend.leave();
    }
}

/// Style applied to a run of printed text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellStyle {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
    pub reverse: bool,
}

impl CellStyle {
    pub fn fg(color: Color) -> Self {
        Self {
            fg: Some(color),
            ..Self::default()
        }
    }

    pub fn reversed() -> Self {
        Self {
            reverse: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    MoveTo(u16, u16),
    Print(String),
    Style(CellStyle),
    Reset,
    ClearAll,
    ClearLineTail,
    ShowCursor,
    HideCursor,
}

/// One redraw worth of batched terminal commands. Ordering is preserved and
/// nothing reaches the terminal until `flush`.
#[derive(Default)]
pub struct Frame {
    cmds: Vec<Command>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[Command] {
        &self.cmds
    }

    pub fn move_to(&mut self, x: u16, y: u16) {
        self.cmds.push(Command::MoveTo(x, y));
    }

    pub fn print(&mut self, s: impl Into<String>) {
        let s: String = s.into();
        if !s.is_empty() {
            self.cmds.push(Command::Print(s));
        }
    }

    pub fn style(&mut self, style: CellStyle) {
        self.cmds.push(Command::Style(style));
    }

    pub fn reset_style(&mut self) {
        self.cmds.push(Command::Reset);
    }

    pub fn clear_all(&mut self) {
        self.cmds.push(Command::ClearAll);
    }

    pub fn clear_line_tail(&mut self) {
        self.cmds.push(Command::ClearLineTail);
    }

    pub fn show_cursor(&mut self) {
        self.cmds.push(Command::ShowCursor);
    }

    pub fn hide_cursor(&mut self) {
        self.cmds.push(Command::HideCursor);
    }

    /// Serialise the batch into any writer. The terminal path hands in
    /// stdout; tests hand in a byte vector.
    pub fn flush_to<W: Write>(self, out: &mut W) -> Result<()> {
        for cmd in self.cmds {
            match cmd {
                Command::MoveTo(x, y) => queue!(out, MoveTo(x, y))?,
                Command::Print(s) => queue!(out, Print(s))?,
                Command::Style(style) => {
                    if let Some(fg) = style.fg {
                        queue!(out, SetForegroundColor(fg))?;
                    }
                    if let Some(bg) = style.bg {
                        queue!(out, SetBackgroundColor(bg))?;
                    }
                    if style.bold {
                        queue!(out, SetAttribute(Attribute::Bold))?;
                    }
                    if style.reverse {
                        queue!(out, SetAttribute(Attribute::Reverse))?;
                    }
                }
                Command::Reset => {
                    queue!(out, SetAttribute(Attribute::Reset), ResetColor)?;
                }
                Command::ClearAll => queue!(out, Clear(ClearType::All))?,
                Command::ClearLineTail => queue!(out, Clear(ClearType::UntilNewLine))?,
                Command::ShowCursor => queue!(out, Show)?,
                Command::HideCursor => queue!(out, Hide)?,
            }
        }
        out.flush()?;
        Ok(())
    }

    pub fn flush(self) -> Result<()> {
        self.flush_to(&mut stdout())
    }
}
