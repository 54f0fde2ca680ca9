use std::collections::HashSet;

use petri_life::{Direction, Grid, GridError, NO_NEIGHBOR};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn toroidal(rows: usize, cols: usize) -> Grid {
    Grid::new(rows, cols).expect("valid dimensions")
}

fn bounded(rows: usize, cols: usize) -> Grid {
    let mut grid = toroidal(rows, cols);
    grid.set_toroidal(false);
    grid
}

fn set_cells(grid: &mut Grid, cells: &[(usize, usize)]) {
    for &(row, col) in cells {
        grid.set_alive(row, col, true);
    }
}

fn assert_alive(grid: &Grid, cells: &[(usize, usize)]) {
    for &(row, col) in cells {
        assert!(grid.cell(row, col).alive, "expected alive at ({row},{col})");
    }
}

fn assert_dead(grid: &Grid, cells: &[(usize, usize)]) {
    for &(row, col) in cells {
        assert!(!grid.cell(row, col).alive, "expected dead at ({row},{col})");
    }
}

fn live_cells(grid: &Grid) -> HashSet<(usize, usize)> {
    let mut out = HashSet::new();
    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            if grid.cell(row, col).alive {
                out.insert((row, col));
            }
        }
    }
    out
}

/// Reference B3/S23 step counting per neighbor slot, like the engine does
/// (under toroidal wrap on a 1- or 2-wide axis, slots can reach the same
/// cell more than once).
fn step_naive(
    cells: &HashSet<(usize, usize)>,
    rows: usize,
    cols: usize,
    toroidal: bool,
) -> HashSet<(usize, usize)> {
    let mut next = HashSet::new();
    for row in 0..rows {
        for col in 0..cols {
            let mut neighbors = 0;
            for d_row in -1i64..=1 {
                for d_col in -1i64..=1 {
                    if d_row == 0 && d_col == 0 {
                        continue;
                    }
                    let r = row as i64 + d_row;
                    let c = col as i64 + d_col;
                    let (r, c) = if toroidal {
                        (r.rem_euclid(rows as i64), c.rem_euclid(cols as i64))
                    } else if (0..rows as i64).contains(&r) && (0..cols as i64).contains(&c) {
                        (r, c)
                    } else {
                        continue;
                    };
                    if cells.contains(&(r as usize, c as usize)) {
                        neighbors += 1;
                    }
                }
            }
            let alive = cells.contains(&(row, col));
            let next_alive = if alive {
                neighbors == 2 || neighbors == 3
            } else {
                neighbors == 3
            };
            if next_alive {
                next.insert((row, col));
            }
        }
    }
    next
}

#[test]
fn every_toroidal_cell_has_eight_symmetric_neighbors() {
    let grid = toroidal(4, 6);
    for (index, cell) in grid.cells().iter().enumerate() {
        for dir in Direction::ALL {
            let neighbor = cell.neighbors[dir.index()];
            assert_ne!(neighbor, NO_NEIGHBOR, "cell {index} missing {dir:?}");
            let back = grid.cells()[neighbor as usize].neighbors[dir.opposite().index()];
            assert_eq!(back, index as u32, "asymmetric link at cell {index} {dir:?}");
        }
    }
}

#[test]
fn bounded_border_cells_have_sentinel_edge_slots() {
    let grid = bounded(5, 5);

    // Top-left corner: every edge-facing slot is the sentinel.
    let corner = grid.cell(0, 0);
    for dir in [
        Direction::NorthWest,
        Direction::North,
        Direction::NorthEast,
        Direction::West,
        Direction::SouthWest,
    ] {
        assert_eq!(corner.neighbors[dir.index()], NO_NEIGHBOR);
    }
    for dir in [Direction::East, Direction::SouthEast, Direction::South] {
        assert_ne!(corner.neighbors[dir.index()], NO_NEIGHBOR);
    }

    // Interior cells keep all 8, and surviving links stay symmetric.
    for row in 1..4 {
        for col in 1..4 {
            let cell = grid.cell(row, col);
            assert!(cell.neighbors.iter().all(|&n| n != NO_NEIGHBOR));
        }
    }
    for (index, cell) in grid.cells().iter().enumerate() {
        for dir in Direction::ALL {
            let neighbor = cell.neighbors[dir.index()];
            if neighbor != NO_NEIGHBOR {
                let back = grid.cells()[neighbor as usize].neighbors[dir.opposite().index()];
                assert_eq!(back, index as u32);
            }
        }
    }
}

#[test]
fn disabling_wraparound_rebuilds_edge_topology() {
    let mut grid = toroidal(5, 5);
    assert!(grid.cell(0, 0).neighbors.iter().all(|&n| n != NO_NEIGHBOR));

    grid.set_toroidal(false);

    for col in 0..5 {
        assert_eq!(grid.cell(0, col).neighbors[Direction::North.index()], NO_NEIGHBOR);
        assert_eq!(grid.cell(4, col).neighbors[Direction::South.index()], NO_NEIGHBOR);
    }
    for row in 0..5 {
        assert_eq!(grid.cell(row, 0).neighbors[Direction::West.index()], NO_NEIGHBOR);
        assert_eq!(grid.cell(row, 4).neighbors[Direction::East.index()], NO_NEIGHBOR);
    }
    for row in 1..4 {
        for col in 1..4 {
            assert!(grid.cell(row, col).neighbors.iter().all(|&n| n != NO_NEIGHBOR));
        }
    }
}

#[test]
fn blinker_oscillates() {
    let mut grid = toroidal(10, 10);
    set_cells(&mut grid, &[(4, 3), (4, 4), (4, 5)]);

    grid.step();
    assert_alive(&grid, &[(3, 4), (4, 4), (5, 4)]);
    assert_dead(&grid, &[(4, 3), (4, 5)]);

    grid.step();
    assert_alive(&grid, &[(4, 3), (4, 4), (4, 5)]);
    assert_dead(&grid, &[(3, 4), (5, 4)]);
}

#[test]
fn block_is_stable() {
    let mut grid = toroidal(8, 8);
    let block = [(3, 3), (3, 4), (4, 3), (4, 4)];
    set_cells(&mut grid, &block);

    for _ in 0..4 {
        grid.step();
        assert_eq!(live_cells(&grid).len(), 4);
        assert_alive(&grid, &block);
    }
}

#[test]
fn three_by_three_block_matches_reference_evolution() {
    let mut grid = toroidal(10, 10);
    let mut reference = HashSet::new();
    for row in 3..6 {
        for col in 3..6 {
            grid.set_alive(row, col, true);
            reference.insert((row, col));
        }
    }

    for generation in 1..=4 {
        grid.step();
        reference = step_naive(&reference, 10, 10, true);
        assert_eq!(live_cells(&grid), reference, "diverged at generation {generation}");
    }
}

#[test]
fn random_soup_matches_reference_on_both_topologies() {
    for toroidal_mode in [true, false] {
        let mut grid = Grid::new(9, 11).expect("valid dimensions");
        grid.set_toroidal(toroidal_mode);
        let mut rng = StdRng::seed_from_u64(0xBADC_0FFE);
        grid.randomize_with(&mut rng, 0.4);

        let mut reference = live_cells(&grid);
        for generation in 1..=6 {
            grid.step();
            reference = step_naive(&reference, 9, 11, toroidal_mode);
            assert_eq!(
                live_cells(&grid),
                reference,
                "diverged at generation {generation} (toroidal={toroidal_mode})"
            );
        }
    }
}

#[test]
fn glider_translates_one_down_right_in_four_generations() {
    let mut grid = toroidal(12, 12);
    let glider = [(2, 3), (3, 4), (4, 2), (4, 3), (4, 4)];
    set_cells(&mut grid, &glider);

    for _ in 0..4 {
        grid.step();
    }

    let shifted: HashSet<(usize, usize)> =
        glider.iter().map(|&(row, col)| (row + 1, col + 1)).collect();
    assert_eq!(live_cells(&grid), shifted);
    assert_eq!(grid.generation(), 4);
}

#[test]
fn resize_to_same_dimensions_is_identity() {
    let mut grid = toroidal(6, 7);
    set_cells(&mut grid, &[(0, 0), (2, 5), (5, 6), (3, 3)]);
    let alive_before: Vec<bool> = grid.cells().iter().map(|c| c.alive).collect();
    let neighbors_before: Vec<_> = grid.cells().iter().map(|c| c.neighbors).collect();

    grid.resize(6, 7).unwrap();

    assert_eq!((grid.rows(), grid.cols()), (6, 7));
    let alive_after: Vec<bool> = grid.cells().iter().map(|c| c.alive).collect();
    let neighbors_after: Vec<_> = grid.cells().iter().map(|c| c.neighbors).collect();
    assert_eq!(alive_after, alive_before);
    assert_eq!(neighbors_after, neighbors_before);
}

#[test]
fn shrinking_keeps_the_centered_pattern() {
    // Even delta: one row/column trimmed from each side.
    let mut grid = toroidal(6, 6);
    set_cells(&mut grid, &[(1, 1), (3, 4), (4, 1)]);
    grid.resize(4, 4).unwrap();
    assert_eq!(live_cells(&grid), HashSet::from([(0, 0), (2, 3), (3, 0)]));

    // Odd delta: the extra row/column comes off the trailing edge, so
    // retained cells keep their leading-edge coordinates.
    let mut grid = toroidal(5, 5);
    set_cells(&mut grid, &[(0, 0), (3, 3), (4, 4), (0, 4)]);
    grid.resize(4, 4).unwrap();
    assert_eq!(live_cells(&grid), HashSet::from([(0, 0), (3, 3)]));
}

#[test]
fn growing_pads_dead_margins_around_the_pattern() {
    // Even delta: pattern shifts by one row and column.
    let mut grid = toroidal(3, 3);
    set_cells(&mut grid, &[(0, 0), (1, 1), (2, 2)]);
    grid.resize(5, 5).unwrap();
    assert_eq!(live_cells(&grid), HashSet::from([(1, 1), (2, 2), (3, 3)]));

    // Odd delta: the extra row/column is appended on the trailing edge.
    let mut grid = toroidal(3, 3);
    set_cells(&mut grid, &[(0, 0), (2, 2)]);
    grid.resize(4, 4).unwrap();
    assert_eq!(live_cells(&grid), HashSet::from([(0, 0), (2, 2)]));
    assert_dead(&grid, &[(3, 0), (3, 3), (0, 3)]);
}

#[test]
fn mixed_resize_changes_both_axes() {
    // Rows shrink 6 -> 4 (one trimmed from each side), columns grow 4 -> 6
    // (one added on each side).
    let mut grid = toroidal(6, 4);
    set_cells(&mut grid, &[(1, 0), (4, 3)]);
    grid.resize(4, 6).unwrap();
    assert_eq!((grid.rows(), grid.cols()), (4, 6));
    assert_eq!(live_cells(&grid), HashSet::from([(0, 1), (3, 4)]));
}

#[test]
fn resize_rejects_zero_dimensions() {
    let mut grid = toroidal(4, 4);
    assert_eq!(
        grid.resize(0, 4),
        Err(GridError::ZeroDimensions { rows: 0, cols: 4 })
    );
    // No partial mutation is left behind.
    assert_eq!((grid.rows(), grid.cols()), (4, 4));
    assert_eq!(grid.cells().len(), 16);
}

#[test]
fn rotate_round_trip_restores_the_original_order() {
    for (rows, cols) in [(1, 1), (1, 5), (5, 1), (3, 4), (4, 7)] {
        let mut grid = toroidal(rows, cols);
        let mut rng = StdRng::seed_from_u64(rows as u64 * 31 + cols as u64);
        grid.randomize_with(&mut rng, 0.5);
        let alive_before: Vec<bool> = grid.cells().iter().map(|c| c.alive).collect();

        grid.rotate(true);
        assert_eq!((grid.rows(), grid.cols()), (cols, rows));
        grid.rotate(false);

        assert_eq!((grid.rows(), grid.cols()), (rows, cols));
        let alive_after: Vec<bool> = grid.cells().iter().map(|c| c.alive).collect();
        assert_eq!(alive_after, alive_before, "round trip failed for {rows}x{cols}");

        grid.rotate(false);
        grid.rotate(true);
        let alive_again: Vec<bool> = grid.cells().iter().map(|c| c.alive).collect();
        assert_eq!(alive_again, alive_before);
    }
}

#[test]
fn rotate_clockwise_moves_cells_to_their_turned_positions() {
    let mut grid = toroidal(2, 3);
    set_cells(&mut grid, &[(0, 0), (1, 2)]);

    grid.rotate(true);

    assert_eq!((grid.rows(), grid.cols()), (3, 2));
    assert_eq!(live_cells(&grid), HashSet::from([(0, 1), (2, 0)]));
}

#[test]
fn randomize_extremes_fill_and_empty_the_grid() {
    let mut grid = toroidal(6, 6);
    set_cells(&mut grid, &[(2, 2), (2, 3), (2, 4)]);
    grid.step();
    assert_eq!(grid.generation(), 1);

    grid.randomize(0.0);
    assert_eq!(grid.generation(), 0);
    assert_eq!(grid.population(), 0);

    grid.randomize(1.0);
    assert_eq!(grid.generation(), 0);
    assert_eq!(grid.population(), 36);
    // The post-randomize refresh leaves counts and next-state consistent:
    // on a full toroidal grid every cell has 8 live neighbors and dies next.
    for cell in grid.cells() {
        assert_eq!(cell.neighbor_count, 8);
        assert!(!cell.next_alive);
    }
}

#[test]
fn clear_kills_everything_and_resets_the_counter() {
    let mut grid = toroidal(6, 6);
    set_cells(&mut grid, &[(1, 1), (1, 2), (1, 3)]);
    grid.step();
    grid.step();
    assert_eq!(grid.generation(), 2);

    grid.clear();

    assert_eq!(grid.generation(), 0);
    assert_eq!(grid.population(), 0);
    for cell in grid.cells() {
        assert!(!cell.next_alive);
        assert_eq!(cell.neighbor_count, 0);
    }
}

#[test]
fn toggle_flips_a_single_cell() {
    let mut grid = toroidal(4, 4);
    grid.toggle(2, 1);
    assert_alive(&grid, &[(2, 1)]);
    assert_eq!(grid.population(), 1);
    grid.toggle(2, 1);
    assert_eq!(grid.population(), 0);
}
