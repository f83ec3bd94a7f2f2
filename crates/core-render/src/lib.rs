//! Frame composition: walk the window tree, overlay highlights, selection,
//! and bracket matches, and batch the result for the terminal.
//!
//! Rendering is two-phase so script hooks can re-enter the editor: the plan
//! phase borrows the editor ([`plan::build_plan`]), the emit phase runs on
//! the snapshot alone ([`emit::emit`]). Callers holding the editor behind a
//! `RefCell` must drop the borrow between the phases.

pub mod emit;
pub mod plan;
pub mod style;

pub use emit::{DrawOp, NoopHooks, RenderHooks, emit};
pub use plan::{BufferLeafPlan, Cell, FramePlan, LeafKindPlan, LeafPlan, RowPlan, TabLabel, build_plan};

use core_state::EditorState;
use core_terminal::Frame;

/// Single-call convenience for callers that own the editor state directly
/// (tests, the non-shared path).
pub fn render(state: &mut EditorState, hooks: &dyn RenderHooks, term: (u16, u16)) -> Frame {
    let plan = build_plan(state, term);
    let mut frame = Frame::new();
    emit(&plan, hooks, &mut frame);
    frame
}
