//! Simulation orchestrator
//!
//! `Simulation` owns one backend-agnostic grid plus the bookkeeping a frontend
//! needs around it: pause state, elapsed simulated time, frame timing and
//! persistence. Input arrives through an explicit [`InputState`] rather than
//! shared global state.

mod config;
mod input;

pub use config::SimulationConfig;
pub use input::{InputState, PaintCommand, DEFAULT_SPAWN_RADIUS};

use std::io::{Read, Write};

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::core_types::CellType;
use crate::solver::{create_grid, CellGrid, FrameTimer, GridError, ProfilerScope, SerializedGrid};

/// A running falling-sand world
pub struct Simulation {
    /// Backend-agnostic grid (sequential or device)
    grid: Box<dyn CellGrid>,
    paused: bool,
    ticks: u64,
    simulation_time: f32,
    frame_timer: FrameTimer,
}

impl Simulation {
    /// Create a simulation with an all-AIR grid
    ///
    /// # Arguments
    ///
    /// * `config` - Grid size, backend, seed and rule constants
    pub fn new(config: &SimulationConfig) -> Self {
        info!("Creating new falling-sand simulation");

        let grid = create_grid(
            config.backend,
            config.width,
            config.height,
            config.rules,
            config.seed,
        );

        info!(
            "Simulation initialized: {}x{} grid, device={}",
            grid.width(),
            grid.height(),
            grid.is_device_grid()
        );

        Self {
            grid,
            paused: false,
            ticks: 0,
            simulation_time: 0.0,
            frame_timer: FrameTimer::new(),
        }
    }

    /// Advance one tick unless paused
    ///
    /// # Arguments
    ///
    /// * `dt` - Timestep in seconds
    pub fn update(&mut self, dt: f32) {
        if self.paused {
            return;
        }
        self.step_once(dt);
    }

    /// Advance exactly one tick, even while paused
    pub fn step_once(&mut self, dt: f32) {
        let scope = ProfilerScope::new("simulation.step");
        self.grid.simulate(dt);
        self.frame_timer.record(scope.elapsed_ms());

        self.ticks += 1;
        self.simulation_time += dt;
        debug!(
            "Simulation update: tick={}, t={:.3}s, dt={:.4}s, frame={:.3}ms",
            self.ticks,
            self.simulation_time,
            dt,
            self.frame_timer.last_frame_time_ms()
        );
    }

    /// Sync pause state and paint under the cursor
    pub fn apply_input(&mut self, input: &InputState) {
        if input.paused != self.paused {
            if input.paused {
                self.pause();
            } else {
                self.resume();
            }
        }
        if let Some(command) = input.paint_command(self.grid.width(), self.grid.height()) {
            self.paint(command);
        }
    }

    /// Run the disk brush
    pub fn paint(&mut self, command: PaintCommand) {
        debug!(
            "Painting {} at ({}, {}) radius {}",
            command.material, command.center.0, command.center.1, command.radius
        );
        self.grid
            .spawn_cells(command.center, command.radius, command.material);
    }

    /// Clear the grid back to AIR and zero the counters
    pub fn reset(&mut self) {
        self.grid.reset();
        self.ticks = 0;
        self.simulation_time = 0.0;
        info!("Simulation reset");
    }

    /// Stop advancing on `update`
    pub fn pause(&mut self) {
        self.paused = true;
        info!("Simulation paused at tick {}", self.ticks);
    }

    /// Advance again on `update`
    pub fn resume(&mut self) {
        self.paused = false;
        info!("Simulation resumed at tick {}", self.ticks);
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Cell count per material present in the grid
    pub fn census(&self) -> FxHashMap<CellType, usize> {
        let mut census = FxHashMap::default();
        for y in 0..self.grid.height() as i32 {
            for x in 0..self.grid.width() as i32 {
                *census.entry(self.grid.cell_at(x, y).cell_type).or_insert(0) += 1;
            }
        }
        census
    }

    /// Write the grid in the binary snapshot layout
    ///
    /// # Errors
    ///
    /// [`GridError::Io`] if the writer fails
    pub fn save<W: Write>(&self, writer: W) -> Result<(), GridError> {
        let snapshot = self.grid.serialize();
        snapshot.write_to(writer)?;
        info!(
            "Saved {}x{} grid snapshot at tick {}",
            snapshot.width, snapshot.height, self.ticks
        );
        Ok(())
    }

    /// Replace the grid contents with a binary snapshot
    ///
    /// # Errors
    ///
    /// * [`GridError::Io`] or [`GridError::Truncated`] if the stream is short
    /// * [`GridError::DimensionMismatch`] if the snapshot has another shape
    /// * [`GridError::InvalidCellType`] if a stored type is not a material
    pub fn load<R: Read>(&mut self, reader: R) -> Result<(), GridError> {
        let snapshot = SerializedGrid::read_from(reader)?;
        self.grid.deserialize(&snapshot)?;
        info!("Loaded {}x{} grid snapshot", snapshot.width, snapshot.height);
        Ok(())
    }

    pub fn grid(&self) -> &dyn CellGrid {
        self.grid.as_ref()
    }

    /// Direct access for editing cells
    pub fn grid_mut(&mut self) -> &mut dyn CellGrid {
        self.grid.as_mut()
    }

    /// Ticks advanced since creation or the last reset
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Simulated seconds since creation or the last reset
    pub fn simulation_time(&self) -> f32 {
        self.simulation_time
    }

    /// Wall-clock duration of the last tick
    pub fn last_frame_time_ms(&self) -> f64 {
        self.frame_timer.last_frame_time_ms()
    }

    /// Mean wall-clock duration over every tick
    pub fn average_frame_time_ms(&self) -> f64 {
        self.frame_timer.average_frame_time_ms()
    }
}
