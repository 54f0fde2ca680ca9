//! Configurable-rule Game of Life engine with a paced simulation driver.
//!
//! The [`grid`] module owns the cell grid: compass-coded neighbor topology
//! (toroidal or bounded), double-buffered generation transitions, and the
//! center-preserving resize and rotation algorithms. The [`driver`] module
//! advances generations on a worker thread at a controllable rate and
//! reports each completed frame to a consumer.

pub mod driver;
pub mod error;
pub mod grid;

pub use driver::{Command, Driver, DriverConfig, DriverState, FrameNotice, FrameView, RenderSink};
pub use error::{GridError, SurfaceUnavailable};
pub use grid::{Cell, Direction, Grid, Layout, NO_NEIGHBOR, Rule, RuleSet, Snapshot};
