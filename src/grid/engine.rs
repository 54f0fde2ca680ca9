//! The cell grid: generation transitions, resize, rotate, randomize.

use log::debug;
use rand::Rng;
use rayon::prelude::*;

use super::cell::{Cell, NO_NEIGHBOR};
use super::layout::Layout;
use super::rules::Rule;
use super::topology;
use crate::error::GridError;

/// Grids at or above this many cells count neighbors and evaluate the rule
/// in parallel; smaller grids stay serial to avoid fork/join overhead.
const PARALLEL_MIN_CELLS: usize = 32_768;

pub const DEFAULT_ROWS: usize = 15;
pub const DEFAULT_COLS: usize = 15;

/// A rectangular automaton grid with configurable birth/survival rules and
/// toroidal or bounded topology.
///
/// Cells are stored row-major (`index = row * cols + col`). Every mutating
/// operation leaves `cells.len() == rows * cols` and the neighbor tables
/// consistent with the current `(rows, cols, toroidal)` triple.
#[derive(Clone, Debug)]
pub struct Grid {
    cells: Vec<Cell>,
    rows: usize,
    cols: usize,
    toroidal: bool,
    rule: Rule,
    generation: u64,
}

impl Grid {
    /// Create a dead toroidal grid under Conway's rule.
    pub fn new(rows: usize, cols: usize) -> Result<Self, GridError> {
        if rows == 0 || cols == 0 {
            return Err(GridError::ZeroDimensions { rows, cols });
        }
        let mut grid = Self {
            cells: vec![Cell::new(); rows * cols],
            rows,
            cols,
            toroidal: true,
            rule: Rule::CONWAY,
            generation: 0,
        };
        grid.rebuild_topology();
        Ok(grid)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_toroidal(&self) -> bool {
        self.toroidal
    }

    pub fn rule(&self) -> Rule {
        self.rule
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// The cell at `(row, col)`. Panics on out-of-range coordinates.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        assert!(row < self.rows && col < self.cols);
        &self.cells[row * self.cols + col]
    }

    pub fn population(&self) -> usize {
        self.cells.iter().filter(|cell| cell.alive).count()
    }

    pub fn set_rule(&mut self, rule: Rule) {
        self.rule = rule;
    }

    /// Switch between wrap-around and bounded edges, rebuilding the neighbor
    /// tables when the mode actually changes.
    pub fn set_toroidal(&mut self, toroidal: bool) {
        if self.toroidal == toroidal {
            return;
        }
        self.toroidal = toroidal;
        self.rebuild_topology();
    }

    pub fn set_alive(&mut self, row: usize, col: usize, alive: bool) {
        assert!(row < self.rows && col < self.cols);
        self.cells[row * self.cols + col].alive = alive;
    }

    /// Flip one cell's aliveness.
    pub fn toggle(&mut self, row: usize, col: usize) {
        assert!(row < self.rows && col < self.cols);
        let cell = &mut self.cells[row * self.cols + col];
        cell.alive = !cell.alive;
    }

    /// Set every cell's live-neighbor count against the current alive states.
    pub fn count_neighbors(&mut self) {
        let counts: Vec<u8> = if self.cells.len() >= PARALLEL_MIN_CELLS {
            self.cells
                .par_iter()
                .map(|cell| self.live_neighbors(cell))
                .collect()
        } else {
            self.cells
                .iter()
                .map(|cell| self.live_neighbors(cell))
                .collect()
        };
        for (cell, count) in self.cells.iter_mut().zip(counts) {
            cell.neighbor_count = count;
        }
    }

    fn live_neighbors(&self, cell: &Cell) -> u8 {
        cell.neighbors
            .iter()
            .filter(|&&index| index != NO_NEIGHBOR && self.cells[index as usize].alive)
            .count() as u8
    }

    /// Evaluate the rule for every cell into its scratch next-generation
    /// flag. Reads only the alive states frozen by [`count_neighbors`], so
    /// no cell's outcome depends on another cell's already-updated value.
    ///
    /// [`count_neighbors`]: Grid::count_neighbors
    pub fn compute_next(&mut self) {
        let rule = self.rule;
        if self.cells.len() >= PARALLEL_MIN_CELLS {
            self.cells
                .par_iter_mut()
                .for_each(|cell| cell.next_alive = cell.next_state(rule));
        } else {
            for cell in &mut self.cells {
                cell.next_alive = cell.next_state(rule);
            }
        }
    }

    /// Promote the scratch next-generation flags to the live states and
    /// advance the generation counter.
    pub fn commit(&mut self) {
        for cell in &mut self.cells {
            cell.alive = cell.next_alive;
        }
        self.generation += 1;
    }

    /// Advance one full generation: count, evaluate, commit.
    pub fn step(&mut self) {
        self.count_neighbors();
        self.compute_next();
        self.commit();
    }

    /// Recompute neighbor counts and next-state against the current alive
    /// states, leaving the grid consistent for rendering.
    pub fn refresh(&mut self) {
        self.count_neighbors();
        self.compute_next();
    }

    /// Set each cell alive independently with probability `ratio` and reset
    /// the generation counter.
    pub fn randomize(&mut self, ratio: f64) {
        self.randomize_with(&mut rand::rng(), ratio);
    }

    /// Seeded variant of [`randomize`] for reproducible runs.
    ///
    /// [`randomize`]: Grid::randomize
    pub fn randomize_with<R: Rng + ?Sized>(&mut self, rng: &mut R, ratio: f64) {
        for cell in &mut self.cells {
            cell.alive = rng.random::<f64>() < ratio;
        }
        self.generation = 0;
        self.refresh();
    }

    /// Kill every cell, zero all scratch state, reset the generation counter.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.alive = false;
            cell.next_alive = false;
            cell.neighbor_count = 0;
        }
        self.generation = 0;
    }

    /// Resize the grid while keeping the existing pattern centered.
    ///
    /// Surviving cells keep their `Cell` objects; new cells are dead. An odd
    /// row or column delta removes (or inserts) the extra line on the
    /// trailing edge. Neighbor tables are rebuilt afterwards; screen
    /// coordinates are the caller's to re-derive.
    pub fn resize(&mut self, new_rows: usize, new_cols: usize) -> Result<(), GridError> {
        if new_rows == 0 || new_cols == 0 {
            return Err(GridError::ZeroDimensions { rows: new_rows, cols: new_cols });
        }
        debug!(
            "resizing grid {}x{} -> {new_rows}x{new_cols}",
            self.rows, self.cols
        );
        if new_rows <= self.rows && new_cols <= self.cols {
            self.shrink(new_rows, new_cols);
        } else if new_rows >= self.rows && new_cols >= self.cols {
            self.grow(new_rows, new_cols);
        } else if new_rows < self.rows {
            // Mixed change: split into two pure passes, rows first. Each pass
            // keeps the centered split with the trailing-edge tie-break.
            self.shrink(new_rows, self.cols);
            self.grow(new_rows, new_cols);
        } else {
            self.grow(new_rows, self.cols);
            self.shrink(new_rows, new_cols);
        }
        debug_assert_eq!(self.cells.len(), self.rows * self.cols);
        self.rebuild_topology();
        Ok(())
    }

    fn shrink(&mut self, new_rows: usize, new_cols: usize) {
        let rows_before = (self.rows - new_rows) / 2;
        let cols_before = (self.cols - new_cols) / 2;
        let cols_after = (self.cols - new_cols) - cols_before;

        // Leading rows block plus the first retained row's left margin, in
        // one slice.
        self.cells.drain(0..self.cols * rows_before + cols_before);
        // After that, each retained row's right margin sits adjacent to the
        // next row's left margin.
        for row in 1..new_rows {
            let at = new_cols * row;
            self.cells.drain(at..at + cols_before + cols_after);
        }
        // Trailing margin and rows block.
        self.cells.truncate(new_cols * new_rows);

        self.rows = new_rows;
        self.cols = new_cols;
    }

    fn grow(&mut self, new_rows: usize, new_cols: usize) {
        let rows_before = (new_rows - self.rows) / 2;
        let rows_after = (new_rows - self.rows) - rows_before;
        let cols_before = (new_cols - self.cols) / 2;
        let cols_after = (new_cols - self.cols) - cols_before;

        let leading = rows_before * new_cols + cols_before;
        self.cells
            .splice(0..0, std::iter::repeat_with(Cell::new).take(leading));
        for row in 0..self.rows - 1 {
            let at = (rows_before + row) * new_cols + cols_before + self.cols;
            self.cells.splice(
                at..at,
                std::iter::repeat_with(Cell::new).take(cols_before + cols_after),
            );
        }
        let trailing = rows_after * new_cols + cols_after;
        self.cells
            .extend(std::iter::repeat_with(Cell::new).take(trailing));

        self.rows = new_rows;
        self.cols = new_cols;
    }

    /// Rotate the grid 90 degrees, reordering the existing cell objects and
    /// swapping the dimensions. Used to reconcile the logical grid with a
    /// rotated display while keeping every cell's identity and alive state.
    ///
    /// Clockwise then counterclockwise (or vice versa) restores the original
    /// row-major order.
    pub fn rotate(&mut self, clockwise: bool) {
        let rows = self.rows;
        let cols = self.cols;
        let mut old: Vec<Option<Cell>> = self.cells.drain(..).map(Some).collect();
        let mut rotated = Vec::with_capacity(old.len());

        if clockwise {
            for col in 0..cols {
                for row in (0..rows).rev() {
                    rotated.push(take_cell(&mut old, row * cols + col));
                }
            }
        } else {
            for col in (0..cols).rev() {
                for row in 0..rows {
                    rotated.push(take_cell(&mut old, row * cols + col));
                }
            }
        }

        self.cells = rotated;
        self.rows = cols;
        self.cols = rows;
        self.rebuild_topology();
    }

    /// Derive every cell's screen-space center from the layout.
    pub fn reset_coordinates(&mut self, layout: &Layout) {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let (x, y) = layout.center_of(row, col);
                let cell = &mut self.cells[row * self.cols + col];
                cell.x = x;
                cell.y = y;
            }
        }
    }

    fn rebuild_topology(&mut self) {
        // cells.len() == rows * cols >= 1 is a struct invariant
        topology::rebuild(&mut self.cells, self.rows, self.cols, self.toroidal)
            .expect("grid cell collection is never empty");
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    pub(crate) fn reset_generation(&mut self) {
        self.generation = 0;
    }

    /// Replace the cell collection wholesale at new dimensions and rebuild
    /// the topology. Dimensions must be non-zero and match the collection.
    pub(crate) fn install_cells(&mut self, cells: Vec<Cell>, rows: usize, cols: usize) {
        debug_assert!(rows >= 1 && cols >= 1);
        debug_assert_eq!(cells.len(), rows * cols);
        self.cells = cells;
        self.rows = rows;
        self.cols = cols;
        self.rebuild_topology();
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS, DEFAULT_COLS).expect("default dimensions are valid")
    }
}

fn take_cell(cells: &mut [Option<Cell>], index: usize) -> Cell {
    cells[index]
        .take()
        .expect("rotation visits each cell exactly once")
}
