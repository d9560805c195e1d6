// crates/duoscope-core/src/commands.rs
//
// Every operator action in a review is expressed as a ReviewCommand.
// UI modules emit these; ReviewSession::apply processes them after the UI pass.
// Adding a new action = add a variant here + one match arm in session.rs.

use crate::helpers::geometry::{Point, Side};
use crate::toolkit::ToolMode;

#[derive(Debug, Clone, PartialEq)]
pub enum ReviewCommand {
    // ── Playback ─────────────────────────────────────────────────────────────
    Play,
    Pause,
    TogglePlay,
    /// Re-anchor both streams at their offsets and restart together.
    Sync,
    /// Jump to an adjusted frame (relative to each stream's offset).
    SeekFrame(i64),
    /// Jump to a fraction of the shared usable range (scrubber click).
    SeekFraction(f32),
    StepFrames(i64),
    SetFrameOffset { side: Side, frame: u64 },

    // ── Measurement ──────────────────────────────────────────────────────────
    SelectTool(ToolMode),
    /// Canvas-local pointer position, already relative to the canvas origin.
    PointerMoved(Point),
    /// Primary click on the canvas: move the pointer there and apply the tool.
    Click(Point),
    BeginDrag(Point),
    DragTo(Point),
    EndDrag,
    ClearRulers,

    // ── Events ───────────────────────────────────────────────────────────────
    NextEvent,
    PreviousEvent,

    // ── Session ──────────────────────────────────────────────────────────────
    /// Drop media, rulers and events; keep the configuration.
    Reset,
}
