//! Falling-Sand Simulation Core Library
//!
//! A 2D cellular-automaton engine for granular, liquid and gaseous materials:
//! sand that falls and displaces water, mass-conserving water, fire that
//! consumes flammables and emits smoke, rising smoke, and self-igniting napalm.
//!
//! ## Engines
//!
//! Two grids share one interface ([`CellGrid`]):
//! - [`Grid`]: sequential push rules over a double buffer, bottom-to-top
//! - [`DeviceGrid`]: data-parallel pull kernels where every cell writes only itself
//!
//! [`Simulation`] wraps either one with pause state, input handling,
//! frame timing and binary save/load.

// Core types: cells and neighborhoods
pub mod core_types;

// Per-material update rules for the sequential grid
pub mod rules;

// Grids, kernels and persistence
pub mod solver;

// Orchestration around a grid
pub mod simulation;

// Re-export core types
pub use core_types::{get_context, Cell, CellSource, CellType, Context, DeviceCell};

// Re-export grid types
pub use solver::{
    create_grid, CellBuffer, CellGrid, DeviceGrid, Grid, GridBackend, GridError, RuleParams,
    SerializedGrid,
};

// Re-export orchestration types
pub use simulation::{InputState, PaintCommand, Simulation, SimulationConfig};
