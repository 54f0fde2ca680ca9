use std::io::{Stdout, Write, stdout};
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;

use petri_life::error::SurfaceUnavailable;
use petri_life::{Driver, DriverConfig, FrameView, Grid, RenderSink, Rule, Snapshot};

const DEFAULT_ROWS: usize = 32;
const DEFAULT_COLS: usize = 32;
const DEFAULT_GENERATIONS: u64 = 200;
const DEFAULT_RATE: u32 = 30;
const DEFAULT_DENSITY: f64 = 0.35;
const SEED: u64 = 0x9E37_79B9_7F4A_7C15;

struct MainArgs {
    rows: usize,
    cols: usize,
    generations: u64,
    rate: u32,
    density: f64,
    toroidal: bool,
    rule: Rule,
    draw: bool,
    load: Option<String>,
    save: Option<String>,
}

fn parse_args() -> MainArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = MainArgs {
        rows: DEFAULT_ROWS,
        cols: DEFAULT_COLS,
        generations: DEFAULT_GENERATIONS,
        rate: DEFAULT_RATE,
        density: DEFAULT_DENSITY,
        toroidal: true,
        rule: Rule::CONWAY,
        draw: false,
        load: None,
        save: None,
    };
    let next_arg = |i: usize, flag: &str| -> &str {
        args.get(i)
            .map(String::as_str)
            .unwrap_or_else(|| panic!("{flag} requires a value"))
    };
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--rows" => {
                i += 1;
                parsed.rows = next_arg(i, "--rows")
                    .parse()
                    .ok()
                    .filter(|&n| n >= 1)
                    .expect("--rows requires a positive integer");
            }
            "--cols" => {
                i += 1;
                parsed.cols = next_arg(i, "--cols")
                    .parse()
                    .ok()
                    .filter(|&n| n >= 1)
                    .expect("--cols requires a positive integer");
            }
            "--gens" => {
                i += 1;
                parsed.generations = next_arg(i, "--gens")
                    .parse()
                    .expect("--gens requires a non-negative integer");
            }
            "--rate" => {
                i += 1;
                parsed.rate = next_arg(i, "--rate")
                    .parse()
                    .ok()
                    .filter(|&n| n >= 1)
                    .expect("--rate requires a positive integer");
            }
            "--density" => {
                i += 1;
                parsed.density = next_arg(i, "--density")
                    .parse()
                    .ok()
                    .filter(|&d| (0.0..=1.0).contains(&d))
                    .expect("--density requires a ratio in 0..=1");
            }
            "--rule" => {
                i += 1;
                parsed.rule = next_arg(i, "--rule")
                    .parse()
                    .expect("--rule requires a B3/S23-style rulestring");
            }
            "--bounded" => parsed.toroidal = false,
            "--draw" => parsed.draw = true,
            "--load" => {
                i += 1;
                parsed.load = Some(next_arg(i, "--load").to_string());
            }
            "--save" => {
                i += 1;
                parsed.save = Some(next_arg(i, "--save").to_string());
            }
            other => panic!(
                "unknown argument: {other}\nusage: petri-life [--rows N] [--cols N] [--gens N] \
                 [--rate N] [--density R] [--rule B3/S23] [--bounded] [--draw] \
                 [--load FILE] [--save FILE]"
            ),
        }
        i += 1;
    }
    parsed
}

/// Draws each frame as an ASCII board, or swallows frames in quiet mode.
struct AsciiRenderer {
    out: Stdout,
    draw: bool,
}

impl AsciiRenderer {
    fn new(draw: bool) -> Self {
        Self { out: stdout(), draw }
    }
}

impl RenderSink for AsciiRenderer {
    fn render(&mut self, frame: FrameView<'_>) -> Result<(), SurfaceUnavailable> {
        if !self.draw {
            return Ok(());
        }
        let mut board = String::with_capacity((frame.cols + 1) * frame.rows + 32);
        board.push_str("\x1b[2J\x1b[H");
        for row in 0..frame.rows {
            for col in 0..frame.cols {
                let cell = &frame.cells[row * frame.cols + col];
                board.push(if cell.alive && frame.mark_cells_for_death && !cell.next_alive {
                    'x'
                } else if cell.alive {
                    '#'
                } else if frame.show_next_gen && cell.next_alive {
                    '+'
                } else {
                    '.'
                });
            }
            board.push('\n');
        }
        board.push_str(&format!("generation {}\n", frame.generation));
        self.out
            .write_all(board.as_bytes())
            .and_then(|_| self.out.flush())
            .map_err(|_| SurfaceUnavailable)
    }
}

fn main() {
    env_logger::init();
    let args = parse_args();

    let mut grid = Grid::new(args.rows, args.cols).expect("dimensions checked during parsing");
    grid.set_toroidal(args.toroidal);
    grid.set_rule(args.rule);
    if let Some(path) = &args.load {
        let json = std::fs::read_to_string(path).expect("failed to read saved state");
        let snapshot: Snapshot = serde_json::from_str(&json).expect("malformed saved state");
        grid.load(&snapshot).expect("saved state was rejected");
    } else {
        let mut rng = StdRng::seed_from_u64(SEED);
        grid.randomize_with(&mut rng, args.density);
    }

    let config = DriverConfig::default()
        .rate(args.rate)
        .viewport(args.cols as f32 * 20.0, args.rows as f32 * 20.0);
    let (mut driver, notices) = Driver::new(grid, Box::new(AsciiRenderer::new(args.draw)), config);

    let start = Instant::now();
    driver.resume();
    let mut frames: u64 = 0;
    let mut background_rotations: u64 = 0;
    while let Ok(notice) = notices.recv_timeout(Duration::from_secs(60)) {
        frames += 1;
        if notice.rotate_background {
            background_rotations += 1;
        }
        if notice.generation >= args.generations {
            break;
        }
    }
    driver.pause();
    let elapsed = start.elapsed();

    if let Some(path) = &args.save {
        let json = serde_json::to_string_pretty(&driver.snapshot()).expect("snapshot serializes");
        std::fs::write(path, json).expect("failed to write saved state");
        println!("saved state to {path}");
    }

    driver.with_grid(|grid| {
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        let effective_rate = grid.generation() as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
        println!("\n--- Summary ({} generations) ---", grid.generation());
        println!(
            "grid {}x{} ({}), rule {}",
            grid.rows(),
            grid.cols(),
            if grid.is_toroidal() { "toroidal" } else { "bounded" },
            grid.rule(),
        );
        println!("population {}, frames {frames}, background rotations {background_rotations}", grid.population());
        println!("{elapsed_ms:.1} ms total, {effective_rate:.1} generations/s effective");
    });
}
