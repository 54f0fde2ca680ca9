//! Neighbor-index precomputation for toroidal and bounded grids.

use log::error;

use super::cell::{Cell, Direction, NO_NEIGHBOR};
use crate::error::GridError;

/// Directed links built per cell; each also writes the partner's opposite
/// slot, so the four pairs cover all 8 compass positions in one pass.
const LINK_DIRECTIONS: [Direction; 4] = [
    Direction::East,
    Direction::South,
    Direction::NorthEast,
    Direction::NorthWest,
];

/// Rebuild every cell's neighbor table for the given dimensions and wrap mode.
///
/// Every slot is cleared to the sentinel first, so a rebuild after a
/// wrap-mode flip leaves no stale indices behind. Symmetry holds by
/// construction: whenever cell A records cell B at position P, B records A at
/// the compass-opposite position in the same assignment.
///
/// Fails with [`GridError::EmptyGrid`] if no cells have been allocated;
/// callers must initialize the collection first.
pub fn rebuild(
    cells: &mut [Cell],
    rows: usize,
    cols: usize,
    toroidal: bool,
) -> Result<(), GridError> {
    if cells.is_empty() {
        error!("topology rebuild requested on an empty cell collection");
        return Err(GridError::EmptyGrid);
    }
    debug_assert_eq!(cells.len(), rows * cols);

    for cell in cells.iter_mut() {
        cell.reset_neighbors();
    }

    for row in 0..rows {
        for col in 0..cols {
            let index = row * cols + col;
            for dir in LINK_DIRECTIONS {
                link(cells, index, neighbor_index(rows, cols, toroidal, row, col, dir), dir);
            }
        }
    }
    Ok(())
}

/// Resolve the neighbor of `(row, col)` in `dir`: wrap to the opposite edge
/// in toroidal mode, report `None` past a bounded edge. A diagonal resolves
/// only if both its row and column components do.
fn neighbor_index(
    rows: usize,
    cols: usize,
    toroidal: bool,
    row: usize,
    col: usize,
    dir: Direction,
) -> Option<usize> {
    let (d_row, d_col) = dir.offset();
    let row = wrap(row, d_row, rows, toroidal)?;
    let col = wrap(col, d_col, cols, toroidal)?;
    Some(row * cols + col)
}

fn wrap(at: usize, delta: i32, extent: usize, toroidal: bool) -> Option<usize> {
    let shifted = at as i64 + delta as i64;
    if (0..extent as i64).contains(&shifted) {
        Some(shifted as usize)
    } else if toroidal {
        Some(shifted.rem_euclid(extent as i64) as usize)
    } else {
        None
    }
}

fn link(cells: &mut [Cell], from: usize, to: Option<usize>, dir: Direction) {
    match to {
        Some(to) => {
            cells[from].neighbors[dir.index()] = to as u32;
            cells[to].neighbors[dir.opposite().index()] = from as u32;
        }
        None => cells[from].neighbors[dir.index()] = NO_NEIGHBOR,
    }
}

#[cfg(test)]
mod tests {
    use super::rebuild;
    use crate::error::GridError;

    #[test]
    fn empty_cell_collection_is_rejected() {
        let mut cells = [];
        assert_eq!(rebuild(&mut cells, 0, 0, true), Err(GridError::EmptyGrid));
    }

    #[test]
    fn single_cell_torus_is_its_own_neighbor() {
        let mut cells = vec![super::Cell::new()];
        rebuild(&mut cells, 1, 1, true).unwrap();
        assert_eq!(cells[0].neighbors, [0; 8]);
    }

    #[test]
    fn single_cell_bounded_grid_has_no_neighbors() {
        let mut cells = vec![super::Cell::new()];
        rebuild(&mut cells, 1, 1, false).unwrap();
        assert_eq!(cells[0].neighbors, super::super::cell::EMPTY_NEIGHBORS);
    }
}
