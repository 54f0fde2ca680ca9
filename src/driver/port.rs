//! Ports the driver renders and reports through.

use crate::error::SurfaceUnavailable;
use crate::grid::{Cell, Rule};

/// One frame handed to the rendering collaborator.
///
/// Cells carry their alive/next-alive states and screen-space centers; the
/// radius is shared across all cells.
pub struct FrameView<'a> {
    pub cells: &'a [Cell],
    pub rows: usize,
    pub cols: usize,
    pub radius: f32,
    pub generation: u64,
    /// Additionally draw a preview of cells that will be born next
    /// generation.
    pub show_next_gen: bool,
    /// Additionally mark live cells that will die next generation.
    pub mark_cells_for_death: bool,
}

/// Rendering collaborator. A [`SurfaceUnavailable`] return is treated as
/// transient: the driver skips drawing that frame and keeps simulating.
pub trait RenderSink: Send {
    fn render(&mut self, frame: FrameView<'_>) -> Result<(), SurfaceUnavailable>;
}

/// Completion notice sent to the consumer after every simulated frame.
///
/// Delivery is over an unbounded channel and never blocks the worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameNotice {
    pub generation: u64,
    /// Set when the accumulated simulated time crossed the configured
    /// background-rotate interval.
    pub rotate_background: bool,
}

/// Mutating requests funneled to the worker at iteration boundaries.
///
/// While the driver is running, these are the only way cell content or rules
/// may change; applying them between generations keeps the worker's
/// double-buffered transition free of torn reads.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Toggle { row: usize, col: usize },
    Randomize { ratio: f64 },
    Clear,
    SetRule(Rule),
    SetToroidal(bool),
}
