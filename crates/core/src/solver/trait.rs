//! Cell grid trait definition
//!
//! This module defines the `CellGrid` trait, the backend-agnostic interface of
//! a falling-sand grid. The sequential [`Grid`](super::Grid) and the parallel
//! [`DeviceGrid`](super::DeviceGrid) both implement it, so callers can swap
//! engines without touching painting, rendering or persistence code.

use super::error::GridError;
use super::serialize::{SerializedGrid, STRIDE};
use crate::core_types::{Cell, CellSource, CellType};

/// Backend-agnostic interface for a double-buffered cell grid
///
/// Reads go through [`CellSource::cell_at`], which always observes the
/// current buffer and returns the `NONE` sentinel out of bounds.
pub trait CellGrid: CellSource + Send + Sync {
    /// Advance the grid by one tick
    ///
    /// # Arguments
    ///
    /// * `dt` - Timestep in seconds, used by velocity integration
    fn simulate(&mut self, dt: f32);

    /// Fill both buffers with AIR
    fn reset(&mut self);

    /// Disk paint tool
    ///
    /// Writes a fresh cell of `target` into every in-bounds position within
    /// Euclidean distance `radius` of `center`. Painting only fills AIR;
    /// painting AIR (erasing) overwrites anything.
    fn spawn_cells(&mut self, center: (u32, u32), radius: u32, target: CellType);

    /// Bounds-checked write into the current buffer (initialization/painting only)
    ///
    /// # Returns
    ///
    /// `false` when out of bounds
    fn set_curr(&mut self, x: i32, y: i32, cell: Cell) -> bool;

    /// Grid width in cells
    fn width(&self) -> u32;

    /// Grid height in cells
    fn height(&self) -> u32;

    /// Floats per serialized cell
    fn stride(&self) -> u32 {
        STRIDE
    }

    /// Check if this is the data-parallel pull engine
    fn is_device_grid(&self) -> bool;

    /// Number of completed ticks since construction or the last reset
    fn tick(&self) -> u64;

    /// Flat snapshot of `(type, mass)` pairs, rows vertically mirrored
    fn serialize(&self) -> SerializedGrid;

    /// Replace the grid contents with a snapshot of identical shape
    ///
    /// Velocity and the updated flag reset to defaults. On error the grid
    /// is left untouched.
    ///
    /// # Errors
    ///
    /// * [`GridError::DimensionMismatch`] if width, height or stride differ
    /// * [`GridError::BufferSize`] if the buffer length is inconsistent
    /// * [`GridError::InvalidCellType`] if a type value is not a material
    fn deserialize(&mut self, data: &SerializedGrid) -> Result<(), GridError>;

    /// Fill the current buffer with a random mix of materials
    fn initialize_random(&mut self);

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width() && (y as u32) < self.height()
    }

    /// Current cell is AIR
    fn is_empty(&self, x: i32, y: i32) -> bool {
        self.cell_at(x, y).cell_type == CellType::Air
    }

    /// Number of cells of one material
    fn count(&self, kind: CellType) -> usize {
        positions(self.width(), self.height())
            .filter(|&(x, y)| self.cell_at(x, y).cell_type == kind)
            .count()
    }

    /// Summed mass of one material
    fn total_mass(&self, kind: CellType) -> f32 {
        positions(self.width(), self.height())
            .map(|(x, y)| self.cell_at(x, y))
            .filter(|cell| cell.cell_type == kind)
            .map(|cell| cell.mass)
            .sum()
    }

    /// Current buffer as rows of material glyphs
    fn render_ascii(&self) -> String {
        let mut out = String::with_capacity((self.width() as usize + 1) * self.height() as usize);
        for y in 0..self.height() as i32 {
            for x in 0..self.width() as i32 {
                out.push(self.cell_at(x, y).cell_type.symbol());
            }
            out.push('\n');
        }
        out
    }
}

/// All positions of a `width × height` grid in row-major order
pub(crate) fn positions(width: u32, height: u32) -> impl Iterator<Item = (i32, i32)> {
    (0..height as i32).flat_map(move |y| (0..width as i32).map(move |x| (x, y)))
}
