//! Error taxonomy for grid and driver operations.

use thiserror::Error;

/// Precondition violations reported by grid and driver operations.
///
/// Neighbor counting and the generation transition are total over well-formed
/// grids and have no error path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// Topology rebuild was requested before any cells were allocated.
    #[error("cell collection is empty; initialize cells before building topology")]
    EmptyGrid,

    /// A zero dimension was requested.
    #[error("grid dimensions must be at least 1x1, requested {rows}x{cols}")]
    ZeroDimensions { rows: usize, cols: usize },

    /// A snapshot's flat state array does not match its own dimensions.
    #[error("snapshot holds {len} cell states but claims {rows}x{cols}")]
    ShapeMismatch { rows: usize, cols: usize, len: usize },

    /// Resize or rotate was requested while the simulation worker is live.
    #[error("operation requires the simulation driver to be stopped")]
    DriverRunning,
}

/// The render surface was not ready for this frame.
///
/// Transient: the driver logs the miss and skips drawing that iteration
/// without aborting the simulation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("render surface unavailable")]
pub struct SurfaceUnavailable;
