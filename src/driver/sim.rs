//! The simulation driver: a worker thread that paces generation advancement.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};

use super::port::{Command, FrameNotice, FrameView, RenderSink};
use crate::error::GridError;
use crate::grid::{Grid, Layout, Rule, Snapshot};

/// Pacing and display configuration for a [`Driver`].
///
/// Use `DriverConfig::default()` for the stock behavior, or customise
/// individual knobs via the builder methods.
#[derive(Clone, Debug)]
pub struct DriverConfig {
    /// Target generations per second.
    pub rate: u32,
    /// Interval of simulated time between background-rotate signals.
    pub background_rotate: Duration,
    /// Drawing area handed to the layout; any unit the host renders in.
    pub viewport: (f32, f32),
    pub show_next_gen: bool,
    pub mark_cells_for_death: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            rate: 10,
            background_rotate: Duration::from_secs(15),
            viewport: (1.0, 1.0),
            show_next_gen: true,
            mark_cells_for_death: false,
        }
    }
}

impl DriverConfig {
    pub fn rate(mut self, generations_per_second: u32) -> Self {
        self.rate = generations_per_second.max(1);
        self
    }

    pub fn background_rotate(mut self, interval: Duration) -> Self {
        self.background_rotate = interval;
        self
    }

    pub fn viewport(mut self, width: f32, height: f32) -> Self {
        self.viewport = (width, height);
        self
    }

    pub fn show_next_gen(mut self, show: bool) -> Self {
        self.show_next_gen = show;
        self
    }

    pub fn mark_cells_for_death(mut self, mark: bool) -> Self {
        self.mark_cells_for_death = mark;
        self
    }
}

/// Where the driver currently is in its pause/run cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    Stopped,
    Running,
    SingleStep,
    RedrawOnly,
}

/// What a spawned worker does after its first iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Continuous,
    SingleStep,
    RedrawOnly,
}

struct Shared {
    grid: Mutex<Grid>,
    layout: Mutex<Layout>,
    renderer: Mutex<Box<dyn RenderSink>>,
    commands: Mutex<Receiver<Command>>,
    stop: AtomicBool,
    cells_changed: AtomicBool,
    rate: AtomicU32,
    show_next_gen: AtomicBool,
    mark_cells_for_death: AtomicBool,
}

impl Shared {
    fn lock_grid(&self) -> MutexGuard<'_, Grid> {
        self.grid.lock().expect("grid lock poisoned")
    }

    fn lock_layout(&self) -> MutexGuard<'_, Layout> {
        self.layout.lock().expect("layout lock poisoned")
    }
}

/// Paces generation advancement on a worker thread.
///
/// Exactly one worker mutates the grid. Control operations issued while the
/// worker runs are queued as [`Command`]s and applied at iteration
/// boundaries; while stopped they apply directly under the grid lock.
/// [`pause`] joins the worker before returning, so once it returns no worker
/// activity can overlap with the caller's grid access.
///
/// [`pause`]: Driver::pause
pub struct Driver {
    shared: Arc<Shared>,
    command_tx: Sender<Command>,
    notice_tx: Sender<FrameNotice>,
    background_rotate: Duration,
    worker: Option<(Mode, JoinHandle<()>)>,
}

impl Driver {
    /// Take ownership of a grid and return the driver plus the receiver its
    /// frame notices arrive on.
    pub fn new(
        mut grid: Grid,
        renderer: Box<dyn RenderSink>,
        config: DriverConfig,
    ) -> (Driver, Receiver<FrameNotice>) {
        let (viewport_width, viewport_height) = config.viewport;
        let layout = Layout::new(viewport_width, viewport_height, grid.rows(), grid.cols());
        grid.reset_coordinates(&layout);
        grid.refresh();

        let (command_tx, command_rx) = channel();
        let (notice_tx, notice_rx) = channel();
        let shared = Arc::new(Shared {
            grid: Mutex::new(grid),
            layout: Mutex::new(layout),
            renderer: Mutex::new(renderer),
            commands: Mutex::new(command_rx),
            stop: AtomicBool::new(false),
            cells_changed: AtomicBool::new(false),
            rate: AtomicU32::new(config.rate.max(1)),
            show_next_gen: AtomicBool::new(config.show_next_gen),
            mark_cells_for_death: AtomicBool::new(config.mark_cells_for_death),
        });

        let driver = Driver {
            shared,
            command_tx,
            notice_tx,
            background_rotate: config.background_rotate,
            worker: None,
        };
        (driver, notice_rx)
    }

    pub fn state(&self) -> DriverState {
        match &self.worker {
            None => DriverState::Stopped,
            Some((_, handle)) if handle.is_finished() => DriverState::Stopped,
            Some((Mode::Continuous, _)) => DriverState::Running,
            Some((Mode::SingleStep, _)) => DriverState::SingleStep,
            Some((Mode::RedrawOnly, _)) => DriverState::RedrawOnly,
        }
    }

    /// Spawn the worker loop. A no-op while a worker is already live.
    pub fn resume(&mut self) {
        self.reap();
        if self.worker.is_some() {
            return;
        }
        self.spawn(Mode::Continuous);
    }

    /// Stop the worker and block until it has exited. Once this returns, no
    /// further worker access to the grid can occur. Idempotent.
    pub fn pause(&mut self) {
        let Some((_, handle)) = self.worker.take() else {
            return;
        };
        self.shared.stop.store(true, Ordering::Release);
        handle.join().expect("simulation worker panicked");
        self.shared.stop.store(false, Ordering::Release);
        debug!("driver paused at generation {}", self.lock_grid().generation());
    }

    /// Run exactly one generation commit, then return to `Stopped`. Ignored
    /// while a worker is live.
    pub fn advance_one(&mut self) {
        self.run_oneshot(Mode::SingleStep);
    }

    /// Recompute counts and next-state and render one frame without
    /// committing a generation; used after the grid changed while paused.
    /// Ignored while a worker is live.
    pub fn redraw_only(&mut self) {
        self.shared.cells_changed.store(true, Ordering::Release);
        self.run_oneshot(Mode::RedrawOnly);
    }

    /// Update the pacing target; takes effect on the worker's next
    /// iteration.
    pub fn set_rate(&self, generations_per_second: u32) {
        self.shared
            .rate
            .store(generations_per_second.max(1), Ordering::Relaxed);
    }

    pub fn set_show_next_gen(&self, show: bool) {
        self.shared.show_next_gen.store(show, Ordering::Relaxed);
    }

    pub fn set_mark_cells_for_death(&self, mark: bool) {
        self.shared.mark_cells_for_death.store(mark, Ordering::Relaxed);
    }

    /// Resize the drawing area and re-derive every cell's coordinates.
    pub fn set_viewport(&self, width: f32, height: f32) {
        let mut grid = self.lock_grid();
        let mut layout = self.shared.lock_layout();
        *layout = Layout::new(width, height, grid.rows(), grid.cols());
        grid.reset_coordinates(&layout);
    }

    pub fn toggle_cell(&mut self, row: usize, col: usize) {
        self.submit(Command::Toggle { row, col });
    }

    pub fn randomize(&mut self, ratio: f64) {
        self.submit(Command::Randomize { ratio });
    }

    pub fn clear(&mut self) {
        self.submit(Command::Clear);
    }

    pub fn set_rule(&mut self, rule: Rule) {
        self.submit(Command::SetRule(rule));
    }

    pub fn set_toroidal(&mut self, toroidal: bool) {
        self.submit(Command::SetToroidal(toroidal));
    }

    /// Resize the grid, keeping the pattern centered. Fails with
    /// [`GridError::DriverRunning`] unless the driver is stopped.
    pub fn resize(&mut self, new_rows: usize, new_cols: usize) -> Result<(), GridError> {
        self.ensure_stopped()?;
        let mut grid = self.lock_grid();
        grid.resize(new_rows, new_cols)?;
        self.relayout(&mut grid);
        self.shared.cells_changed.store(true, Ordering::Release);
        Ok(())
    }

    /// Rotate the grid 90 degrees to follow a display-orientation change.
    /// Fails with [`GridError::DriverRunning`] unless the driver is stopped.
    pub fn rotate(&mut self, clockwise: bool) -> Result<(), GridError> {
        self.ensure_stopped()?;
        let mut grid = self.lock_grid();
        grid.rotate(clockwise);
        self.relayout(&mut grid);
        self.shared.cells_changed.store(true, Ordering::Release);
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock_grid().snapshot()
    }

    /// Apply a persisted record to the grid. Fails with
    /// [`GridError::DriverRunning`] unless the driver is stopped.
    pub fn load(&mut self, snapshot: &Snapshot) -> Result<(), GridError> {
        self.ensure_stopped()?;
        let mut grid = self.lock_grid();
        grid.load(snapshot)?;
        self.relayout(&mut grid);
        self.shared.cells_changed.store(true, Ordering::Release);
        Ok(())
    }

    /// Read the grid under its lock.
    pub fn with_grid<T>(&self, f: impl FnOnce(&Grid) -> T) -> T {
        f(&self.lock_grid())
    }

    fn lock_grid(&self) -> MutexGuard<'_, Grid> {
        self.shared.lock_grid()
    }

    /// Rebuild the layout for the grid's current dimensions and re-derive
    /// cell coordinates.
    fn relayout(&self, grid: &mut Grid) {
        let mut layout = self.shared.lock_layout();
        *layout = Layout::new(layout.width(), layout.height(), grid.rows(), grid.cols());
        grid.reset_coordinates(&layout);
    }

    fn ensure_stopped(&mut self) -> Result<(), GridError> {
        self.reap();
        if self.worker.is_some() {
            return Err(GridError::DriverRunning);
        }
        Ok(())
    }

    fn submit(&mut self, command: Command) {
        self.reap();
        if self.worker.is_some() {
            // Drained by the worker at its next iteration boundary.
            let _ = self.command_tx.send(command);
        } else {
            let mut grid = self.lock_grid();
            apply_command(&mut grid, &command);
            self.shared.cells_changed.store(true, Ordering::Release);
        }
    }

    fn run_oneshot(&mut self, mode: Mode) {
        self.reap();
        if self.worker.is_some() {
            return;
        }
        self.spawn(mode);
        // A one-shot worker exits after its single iteration; joining here
        // makes the Stopped transition visible to the caller immediately.
        if let Some((_, handle)) = self.worker.take() {
            handle.join().expect("simulation worker panicked");
        }
    }

    /// Join a worker that stopped on its own (single-step, redraw-only).
    fn reap(&mut self) {
        let finished = self
            .worker
            .as_ref()
            .is_some_and(|(_, handle)| handle.is_finished());
        if finished {
            if let Some((_, handle)) = self.worker.take() {
                handle.join().expect("simulation worker panicked");
            }
        }
    }

    fn spawn(&mut self, mode: Mode) {
        debug!("spawning simulation worker in {mode:?} mode");
        self.shared.stop.store(false, Ordering::Release);
        let shared = Arc::clone(&self.shared);
        let notices = self.notice_tx.clone();
        let background_rotate = self.background_rotate;
        let handle = thread::Builder::new()
            .name("petri-life-sim".into())
            .spawn(move || worker_loop(&shared, &notices, mode, background_rotate))
            .expect("failed to spawn simulation worker");
        self.worker = Some((mode, handle));
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        self.pause();
    }
}

fn apply_command(grid: &mut Grid, command: &Command) {
    match command {
        Command::Toggle { row, col } => grid.toggle(*row, *col),
        Command::Randomize { ratio } => grid.randomize(*ratio),
        Command::Clear => grid.clear(),
        Command::SetRule(rule) => grid.set_rule(*rule),
        Command::SetToroidal(toroidal) => grid.set_toroidal(*toroidal),
    }
}

fn worker_loop(
    shared: &Shared,
    notices: &Sender<FrameNotice>,
    mode: Mode,
    background_rotate: Duration,
) {
    let rotate_after_ms = background_rotate.as_millis() as u64;
    let mut background_ms: u64 = 0;

    loop {
        let start = Instant::now();
        // Cancellation is cooperative and observed only here, at the
        // iteration boundary.
        if shared.stop.load(Ordering::Acquire) {
            break;
        }
        let rate = shared.rate.load(Ordering::Relaxed).max(1);

        let generation = {
            let mut grid = shared.lock_grid();

            {
                let commands = shared.commands.lock().expect("command lock poisoned");
                while let Ok(command) = commands.try_recv() {
                    apply_command(&mut grid, &command);
                    shared.cells_changed.store(true, Ordering::Release);
                }
            }

            // External edits invalidate the cached next-state; recompute it
            // before committing anything.
            if shared.cells_changed.swap(false, Ordering::AcqRel) {
                grid.refresh();
            }

            if mode != Mode::RedrawOnly {
                grid.commit();
            }

            // Precompute one generation ahead so direct draw and the
            // next-generation preview share this pass.
            grid.refresh();

            let layout = shared.lock_layout();
            let frame = FrameView {
                cells: grid.cells(),
                rows: grid.rows(),
                cols: grid.cols(),
                radius: layout.radius(),
                generation: grid.generation(),
                show_next_gen: shared.show_next_gen.load(Ordering::Relaxed),
                mark_cells_for_death: shared.mark_cells_for_death.load(Ordering::Relaxed),
            };
            let mut renderer = shared.renderer.lock().expect("renderer lock poisoned");
            if let Err(err) = renderer.render(frame) {
                warn!("skipping frame at generation {}: {err}", grid.generation());
            }
            grid.generation()
        };

        background_ms += 1000 / rate as u64;
        let rotate_background = background_ms > rotate_after_ms;
        if rotate_background {
            background_ms = 0;
        }

        // Completion notice; the channel is unbounded, so a slow consumer
        // never stalls the simulation. A departed consumer is not fatal.
        let _ = notices.send(FrameNotice { generation, rotate_background });

        if mode != Mode::Continuous {
            break;
        }

        let budget = Duration::from_millis(1000 / rate as u64);
        if let Some(remaining) = budget.checked_sub(start.elapsed()) {
            thread::sleep(remaining);
        }
    }
}
