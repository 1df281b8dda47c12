//! Data-parallel pull grid
//!
//! Same material taxonomy and external contract as the sequential
//! [`Grid`](super::Grid), but each tick is a fixed chain of pull passes (see
//! [`kernel`](super::kernel)) where every cell writes only its own slot. Rows
//! run in parallel on the rayon pool; results do not depend on thread count.
//! Cells are stored in the packed [`DeviceCell`] layout, so SAND carries no
//! velocity here and there is no updated flag to clear.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace};

use super::brush;
use super::buffer::CellBuffer;
use super::error::GridError;
use super::kernel::{run_pass, PassInput, TICK_PASSES};
use super::params::RuleParams;
use super::profiler::ProfilerScope;
use super::serialize::{decode_cells, encode_cells, SerializedGrid};
use super::CellGrid;
use crate::core_types::{Cell, CellSource, CellType, DeviceCell};

/// Parallel pull-formulation grid
pub struct DeviceGrid {
    current: CellBuffer<DeviceCell>,
    scratch: CellBuffer<DeviceCell>,
    width: u32,
    height: u32,
    delta_time: f32,
    tick: u64,
    seed: u64,
    params: RuleParams,
    /// Only used host-side, for painting and random initialization
    host_rng: StdRng,
}

impl DeviceGrid {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_params(width, height, RuleParams::default(), None)
    }

    #[must_use]
    pub fn with_seed(width: u32, height: u32, seed: u64) -> Self {
        Self::with_params(width, height, RuleParams::default(), Some(seed))
    }

    /// Create an all-AIR device grid
    ///
    /// # Arguments
    ///
    /// * `width` - Grid width in cells
    /// * `height` - Grid height in cells
    /// * `params` - Rule constants
    /// * `seed` - Seed of the kernel hash and host RNG, `None` picks one at random
    #[must_use]
    pub fn with_params(width: u32, height: u32, params: RuleParams, seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| rand::rng().random());
        info!("Creating device grid {}x{} (seed: {})", width, height, seed);

        Self {
            current: CellBuffer::new(width as usize, height as usize, DeviceCell::air()),
            scratch: CellBuffer::new(width as usize, height as usize, DeviceCell::air()),
            width,
            height,
            delta_time: 0.0,
            tick: 0,
            seed,
            params,
            host_rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Step size of the last tick
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Rule constants in effect
    pub fn params(&self) -> &RuleParams {
        &self.params
    }

    /// Current buffer as raw bytes, ready for a texture or buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.current.as_slice())
    }
}

impl CellSource for DeviceGrid {
    fn cell_at(&self, x: i32, y: i32) -> Cell {
        self.current.cell_at(x, y)
    }
}

impl CellGrid for DeviceGrid {
    fn simulate(&mut self, dt: f32) {
        let _scope = ProfilerScope::new("device.simulate");
        self.delta_time = dt;

        for (name, kernel) in TICK_PASSES {
            let _pass = ProfilerScope::new(name);
            let input = PassInput {
                cells: &self.current,
                params: &self.params,
                seed: self.seed,
                tick: self.tick,
            };
            run_pass(&input, &mut self.scratch, kernel);
            std::mem::swap(&mut self.current, &mut self.scratch);
        }

        self.tick += 1;
        debug!("Device grid tick {} (dt = {:.4})", self.tick, dt);
    }

    fn reset(&mut self) {
        self.current.fill(DeviceCell::air());
        self.scratch.fill(DeviceCell::air());
        self.tick = 0;
        info!("Reset device grid {}x{}", self.width, self.height);
    }

    fn spawn_cells(&mut self, center: (u32, u32), radius: u32, target: CellType) {
        if target == CellType::None {
            return;
        }
        for (x, y) in brush::disk(center, radius, self.width, self.height) {
            if brush::may_paint(self.cell_at(x, y).cell_type, target) {
                let cell = Cell::spawn(target, &self.params, &mut self.host_rng);
                self.current.set(x, y, cell.into());
            }
        }
    }

    fn set_curr(&mut self, x: i32, y: i32, cell: Cell) -> bool {
        let written = self.current.set(x, y, cell.into());
        if !written {
            trace!("set_curr out of bounds at ({}, {})", x, y);
        }
        written
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn is_device_grid(&self) -> bool {
        true
    }

    fn tick(&self) -> u64 {
        self.tick
    }

    fn serialize(&self) -> SerializedGrid {
        encode_cells(&self.current, self.width, self.height)
    }

    fn deserialize(&mut self, data: &SerializedGrid) -> Result<(), GridError> {
        let cells = decode_cells(data, self.width, self.height, self.params.max_water_mass())?;
        for (slot, cell) in self.current.as_mut_slice().iter_mut().zip(cells) {
            *slot = cell.into();
        }
        info!("Loaded {}x{} grid snapshot into device grid", self.width, self.height);
        Ok(())
    }

    fn initialize_random(&mut self) {
        let materials = CellType::ALL_MATERIALS;
        for slot in self.current.as_mut_slice() {
            let kind = materials[self.host_rng.random_range(0..materials.len())];
            *slot = Cell::spawn(kind, &self.params, &mut self.host_rng).into();
        }
        info!("Randomized device grid {}x{}", self.width, self.height);
    }
}

impl fmt::Display for DeviceGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_ascii())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_device_grid_contract() {
        let grid = DeviceGrid::with_seed(8, 4, 1);
        assert!(grid.is_device_grid());
        assert_eq!(grid.count(CellType::Air), 32);
        assert_eq!(grid.cell_at(8, 0).cell_type, CellType::None);
        assert_eq!(grid.as_bytes().len(), 32 * 8);
    }

    #[test]
    fn test_as_bytes_matches_packed_layout() {
        let mut grid = DeviceGrid::with_seed(2, 1, 1);
        grid.set_curr(1, 0, Cell::new(CellType::Water, 0.5));
        let bytes = grid.as_bytes();
        assert_eq!(&bytes[8..12], &4_u32.to_ne_bytes());
        assert_eq!(&bytes[12..16], &0.5_f32.to_ne_bytes());
    }

    #[test]
    fn test_sand_falls_and_settles() {
        let mut grid = DeviceGrid::with_seed(3, 5, 1);
        for x in 0..3 {
            grid.set_curr(x, 4, Cell::new(CellType::Stone, 0.0));
        }
        grid.set_curr(1, 0, Cell::new(CellType::Sand, 0.0));
        for _ in 0..6 {
            grid.simulate(0.016);
        }
        assert_eq!(grid.cell_at(1, 3).cell_type, CellType::Sand);
        assert_eq!(grid.count(CellType::Sand), 1);
    }

    #[test]
    fn test_same_seed_same_result() {
        let build = || {
            let mut grid = DeviceGrid::with_seed(16, 16, 99);
            grid.spawn_cells((8, 4), 3, CellType::Sand);
            grid.spawn_cells((4, 10), 2, CellType::Fire);
            grid.spawn_cells((12, 10), 2, CellType::Water);
            for _ in 0..20 {
                grid.simulate(0.016);
            }
            grid.serialize()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_water_pool_conserves_mass() {
        let mut grid = DeviceGrid::with_seed(10, 6, 5);
        for x in 0..10 {
            grid.set_curr(x, 5, Cell::new(CellType::Stone, 0.0));
        }
        grid.spawn_cells((2, 2), 2, CellType::Water);
        let before = grid.total_mass(CellType::Water);
        for _ in 0..100 {
            grid.simulate(0.016);
        }
        assert_relative_eq!(grid.total_mass(CellType::Water), before, epsilon = 1e-3);
    }
}
