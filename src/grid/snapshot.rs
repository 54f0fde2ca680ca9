//! The persisted form of a grid.

use serde::{Deserialize, Serialize};

use super::cell::Cell;
use super::engine::Grid;
use super::rules::{Rule, RuleSet};
use crate::error::GridError;

/// Dimensions, rule thresholds, and the row-major 0/1 alive states.
///
/// Derived state (topology, neighbor counts, coordinates, the scratch
/// next-generation flag) is rebuilt on load and never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub rows: usize,
    pub cols: usize,
    pub born: Vec<u8>,
    pub survive: Vec<u8>,
    pub cells: Vec<u8>,
}

impl Grid {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            rows: self.rows(),
            cols: self.cols(),
            born: self.rule().born.counts().collect(),
            survive: self.rule().survive.counts().collect(),
            cells: self.cells().iter().map(|cell| cell.alive as u8).collect(),
        }
    }

    /// Apply a persisted record.
    ///
    /// When the incoming dimensions match the live grid, alive states are
    /// written into the existing cell objects in place; otherwise the cell
    /// collection is rebuilt wholesale at the new dimensions and the
    /// neighbor tables regenerated. Either way the rules are adopted, the
    /// generation counter resets to 0, and counts plus next-state are
    /// recomputed so the grid is consistent before the first render.
    pub fn load(&mut self, snapshot: &Snapshot) -> Result<(), GridError> {
        if snapshot.rows == 0 || snapshot.cols == 0 {
            return Err(GridError::ZeroDimensions {
                rows: snapshot.rows,
                cols: snapshot.cols,
            });
        }
        if snapshot.cells.len() != snapshot.rows * snapshot.cols {
            return Err(GridError::ShapeMismatch {
                rows: snapshot.rows,
                cols: snapshot.cols,
                len: snapshot.cells.len(),
            });
        }

        self.set_rule(Rule {
            born: RuleSet::from_counts(&snapshot.born),
            survive: RuleSet::from_counts(&snapshot.survive),
        });

        if snapshot.rows == self.rows() && snapshot.cols == self.cols() {
            for (cell, &state) in self.cells_mut().iter_mut().zip(&snapshot.cells) {
                cell.alive = state != 0;
            }
        } else {
            let cells = snapshot
                .cells
                .iter()
                .map(|&state| {
                    let mut cell = Cell::new();
                    cell.alive = state != 0;
                    cell
                })
                .collect();
            self.install_cells(cells, snapshot.rows, snapshot.cols);
        }

        self.reset_generation();
        self.refresh();
        Ok(())
    }
}
