//! Core types: the cell model and neighborhood sampling

pub mod cell;
pub mod context;

pub use cell::{Cell, CellType, DeviceCell};
pub use context::{get_context, CellSource, Context, NEIGHBOR_OFFSETS};
