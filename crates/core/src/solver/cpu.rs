//! Sequential double-buffered grid
//!
//! Each tick copies `current` into `next`, visits every position bottom-to-top
//! and right-to-left, and lets the rule of the current material write its
//! outcome into `next`. Rules may write into neighboring cells ("push"), so
//! two rules can target the same destination in one pass. The `updated` flag
//! is the only mutual exclusion: a relocated cell is written with
//! `updated = true`, other rules treat such a position as claimed, and the
//! pass skips it. Which grain wins a contested slot depends on traversal order
//! and is not defined to match the device engine.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace};

use super::brush;
use super::buffer::CellBuffer;
use super::error::GridError;
use super::params::RuleParams;
use super::profiler::ProfilerScope;
use super::serialize::{decode_cells, encode_cells, SerializedGrid};
use super::CellGrid;
use crate::core_types::{Cell, CellSource, CellType, NEIGHBOR_OFFSETS};
use crate::rules;

/// Sequential falling-sand grid
pub struct Grid {
    current: CellBuffer,
    next: CellBuffer,
    width: u32,
    height: u32,
    delta_time: f32,
    tick: u64,
    params: RuleParams,
    rng: StdRng,
}

impl Grid {
    /// Create an all-AIR grid with default rules and an entropy-seeded RNG
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_params(width, height, RuleParams::default(), None)
    }

    /// Create an all-AIR grid whose random rolls are reproducible
    #[must_use]
    pub fn with_seed(width: u32, height: u32, seed: u64) -> Self {
        Self::with_params(width, height, RuleParams::default(), Some(seed))
    }

    /// Create an all-AIR grid
    ///
    /// # Arguments
    ///
    /// * `width` - Grid width in cells
    /// * `height` - Grid height in cells
    /// * `params` - Rule constants
    /// * `seed` - RNG seed, `None` draws from OS entropy
    #[must_use]
    pub fn with_params(width: u32, height: u32, params: RuleParams, seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        info!("Creating sequential grid {}x{} (seed: {:?})", width, height, seed);

        Self {
            current: CellBuffer::new(width as usize, height as usize, Cell::air()),
            next: CellBuffer::new(width as usize, height as usize, Cell::air()),
            width,
            height,
            delta_time: 0.0,
            tick: 0,
            params,
            rng,
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

    pub(crate) fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Cell in the next buffer; the sentinel when out of bounds
    pub fn next_at(&self, x: i32, y: i32) -> Cell {
        self.next.cell_at(x, y)
    }

    /// Bounds-checked write into the next buffer
    ///
    /// # Returns
    ///
    /// `false` (logged, not fatal) when out of bounds
    pub fn set_next(&mut self, x: i32, y: i32, cell: Cell) -> bool {
        let written = self.next.set(x, y, cell);
        if !written {
            trace!("set_next out of bounds at ({}, {})", x, y);
        }
        written
    }

    /// Flag a position as taken for the rest of this tick
    ///
    /// The mark lands in the current buffer, so `cell_at` reports it.
    pub fn mark_updated(&mut self, x: i32, y: i32) -> bool {
        match self.current.get_mut(x, y) {
            Some(cell) => {
                cell.updated = true;
                true
            }
            None => false,
        }
    }

    /// Something was already relocated into or out of this position this tick
    ///
    /// Out-of-bounds positions count as claimed.
    pub fn is_claimed(&self, x: i32, y: i32) -> bool {
        match (self.current.get(x, y), self.next.get(x, y)) {
            (Some(curr), Some(next)) => curr.updated || next.updated,
            _ => true,
        }
    }

    /// First liquid among the 8 neighbors, in packed neighbor order
    pub fn is_in_liquid(&self, x: i32, y: i32) -> Option<(i32, i32)> {
        NEIGHBOR_OFFSETS
            .iter()
            .map(|&(dx, dy)| (x + dx, y + dy))
            .find(|&(nx, ny)| self.cell_at(nx, ny).cell_type.is_liquid())
    }

    /// Move water mass between two next-buffer cells
    ///
    /// The source must still hold water and the destination must hold water
    /// or a gas; a gas destination becomes WATER. The amount is capped by
    /// what the source holds and by the destination's room below
    /// `max_mass + max_compress`. A source left without mass becomes AIR.
    ///
    /// # Returns
    ///
    /// The mass actually moved (0 when refused)
    pub fn transfer_mass(&mut self, from: (i32, i32), to: (i32, i32), amount: f32) -> f32 {
        if amount <= 0.0 || from == to {
            return 0.0;
        }
        let (Some(mut source), Some(mut dest)) =
            (self.next.get(from.0, from.1), self.next.get(to.0, to.1))
        else {
            return 0.0;
        };
        if source.cell_type != CellType::Water {
            return 0.0;
        }

        let dest_mass = match dest.cell_type {
            CellType::Water => dest.mass,
            kind if kind.is_gas() => 0.0,
            _ => return 0.0,
        };
        let room = (self.params.max_water_mass() - dest_mass).max(0.0);
        let amount = amount.min(source.mass.max(0.0)).min(room);
        if amount <= 0.0 {
            return 0.0;
        }

        if dest.cell_type == CellType::Water {
            dest.mass += amount;
        } else {
            dest = Cell::new(CellType::Water, amount).marked_updated();
        }

        source.mass -= amount;
        if source.mass <= 0.0 {
            source = Cell {
                updated: source.updated,
                ..Cell::air()
            };
        }

        self.next.set(to.0, to.1, dest);
        self.next.set(from.0, from.1, source);
        amount
    }

    /// Hand the position over to AIR once the next buffer holds no water mass
    pub(crate) fn drain_if_empty(&mut self, x: i32, y: i32) {
        let next = self.next_at(x, y);
        if next.cell_type == CellType::Water && next.mass <= 0.0 {
            self.set_next(x, y, Cell::air());
        }
    }
}

impl CellSource for Grid {
    fn cell_at(&self, x: i32, y: i32) -> Cell {
        self.current.cell_at(x, y)
    }
}

impl CellGrid for Grid {
    fn simulate(&mut self, dt: f32) {
        let _scope = ProfilerScope::new("grid.simulate");
        self.delta_time = dt;
        self.next.copy_from(&self.current);

        for y in (0..self.height as i32).rev() {
            for x in (0..self.width as i32).rev() {
                // Something moved in here earlier in the pass
                if self.next_at(x, y).updated {
                    continue;
                }
                let kind = self.cell_at(x, y).cell_type;
                rules::dispatch(kind, (x, y), self);
            }
        }

        for cell in self.next.as_mut_slice() {
            cell.updated = false;
        }
        std::mem::swap(&mut self.current, &mut self.next);
        self.tick += 1;
        debug!("Sequential grid tick {} (dt = {:.4})", self.tick, dt);
    }

    fn reset(&mut self) {
        self.current.fill(Cell::air());
        self.next.fill(Cell::air());
        self.tick = 0;
        info!("Reset sequential grid {}x{}", self.width, self.height);
    }

    fn spawn_cells(&mut self, center: (u32, u32), radius: u32, target: CellType) {
        if target == CellType::None {
            return;
        }
        for (x, y) in brush::disk(center, radius, self.width, self.height) {
            if brush::may_paint(self.cell_at(x, y).cell_type, target) {
                let cell = Cell::spawn(target, &self.params, &mut self.rng);
                self.current.set(x, y, cell);
            }
        }
    }

    fn set_curr(&mut self, x: i32, y: i32, cell: Cell) -> bool {
        let written = self.current.set(x, y, cell);
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
        false
    }

    fn tick(&self) -> u64 {
        self.tick
    }

    fn serialize(&self) -> SerializedGrid {
        encode_cells(&self.current, self.width, self.height)
    }

    fn deserialize(&mut self, data: &SerializedGrid) -> Result<(), GridError> {
        let cells = decode_cells(data, self.width, self.height, self.params.max_water_mass())?;
        self.current.as_mut_slice().copy_from_slice(&cells);
        self.next.copy_from(&self.current);
        info!("Loaded {}x{} grid snapshot", self.width, self.height);
        Ok(())
    }

    fn initialize_random(&mut self) {
        let materials = CellType::ALL_MATERIALS;
        for cell in self.current.as_mut_slice() {
            let kind = materials[self.rng.random_range(0..materials.len())];
            *cell = Cell::spawn(kind, &self.params, &mut self.rng);
        }
        self.next.copy_from(&self.current);
        info!("Randomized sequential grid {}x{}", self.width, self.height);
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_ascii())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_grid_is_air() {
        let grid = Grid::with_seed(4, 3, 1);
        assert_eq!(grid.count(CellType::Air), 12);
        assert!(!grid.is_device_grid());
        assert_eq!(grid.stride(), 2);
    }

    #[test]
    fn test_out_of_bounds_access_is_soft() {
        let mut grid = Grid::with_seed(3, 3, 1);
        assert_eq!(grid.cell_at(-1, 0).cell_type, CellType::None);
        assert_eq!(grid.cell_at(3, 0).cell_type, CellType::None);
        assert!(!grid.set_next(0, 3, Cell::air()));
        assert!(!grid.set_curr(-1, -1, Cell::air()));
        assert!(grid.set_curr(2, 2, Cell::new(CellType::Stone, 0.0)));
        assert!(!grid.in_bounds(3, 2));
        assert!(!grid.is_empty(2, 2));
    }

    #[test]
    fn test_mark_updated_is_visible() {
        let mut grid = Grid::with_seed(3, 3, 1);
        assert!(!grid.cell_at(1, 1).updated);
        assert!(grid.mark_updated(1, 1));
        assert!(grid.cell_at(1, 1).updated);
        assert!(grid.is_claimed(1, 1));
        assert!(!grid.mark_updated(5, 5));
    }

    #[test]
    fn test_is_in_liquid() {
        let mut grid = Grid::with_seed(3, 3, 1);
        assert_eq!(grid.is_in_liquid(1, 1), None);
        grid.set_curr(2, 2, Cell::new(CellType::Oil, 0.0));
        grid.set_curr(0, 1, Cell::new(CellType::Water, 1.0));
        // Left comes before bottom-right in neighbor order
        assert_eq!(grid.is_in_liquid(1, 1), Some((0, 1)));
    }

    #[test]
    fn test_transfer_mass_into_air_and_drain() {
        let mut grid = Grid::with_seed(2, 1, 1);
        grid.set_curr(0, 0, Cell::new(CellType::Water, 0.5));
        grid.next.copy_from(&grid.current);

        let moved = grid.transfer_mass((0, 0), (1, 0), 0.2);
        assert_relative_eq!(moved, 0.2);
        assert_eq!(grid.next_at(1, 0).cell_type, CellType::Water);
        assert!(grid.next_at(1, 0).updated);
        assert_relative_eq!(grid.next_at(0, 0).mass, 0.3);

        // Only what the source holds can move
        let moved = grid.transfer_mass((0, 0), (1, 0), 5.0);
        assert_relative_eq!(moved, 0.3);
        assert_eq!(grid.next_at(0, 0).cell_type, CellType::Air);
    }

    #[test]
    fn test_transfer_mass_refuses_solids() {
        let mut grid = Grid::with_seed(2, 1, 1);
        grid.set_curr(0, 0, Cell::new(CellType::Water, 0.5));
        grid.set_curr(1, 0, Cell::new(CellType::Stone, 0.0));
        grid.next.copy_from(&grid.current);

        assert_eq!(grid.transfer_mass((0, 0), (1, 0), 0.2), 0.0);
        assert_eq!(grid.transfer_mass((1, 0), (0, 0), 0.2), 0.0);
        assert_relative_eq!(grid.next_at(0, 0).mass, 0.5);
    }

    #[test]
    fn test_transfer_mass_respects_capacity() {
        let mut grid = Grid::with_seed(2, 1, 1);
        grid.set_curr(0, 0, Cell::new(CellType::Water, 1.0));
        grid.set_curr(1, 0, Cell::new(CellType::Water, 1.0));
        grid.next.copy_from(&grid.current);

        let moved = grid.transfer_mass((0, 0), (1, 0), 0.5);
        assert_relative_eq!(moved, 0.02, epsilon = 1e-6);
        assert!(grid.next_at(1, 0).mass <= grid.params().max_water_mass());
    }

    #[test]
    fn test_updated_flags_cleared_after_tick() {
        let mut grid = Grid::with_seed(3, 3, 1);
        grid.set_curr(1, 0, Cell::new(CellType::Sand, 0.0));
        grid.simulate(0.001);
        assert_eq!(grid.cell_at(1, 1).cell_type, CellType::Sand);
        for y in 0..3 {
            for x in 0..3 {
                assert!(!grid.cell_at(x, y).updated);
            }
        }
        assert_eq!(grid.tick(), 1);
    }

    #[test]
    fn test_display_renders_rows() {
        let mut grid = Grid::with_seed(3, 2, 1);
        grid.set_curr(0, 1, Cell::new(CellType::Stone, 0.0));
        grid.set_curr(2, 0, Cell::new(CellType::Water, 1.0));
        assert_eq!(grid.to_string(), "..W\n#..\n");
    }

    #[test]
    fn test_initialize_random_only_stores_materials() {
        let mut grid = Grid::with_seed(16, 16, 3);
        grid.initialize_random();
        let total: usize = CellType::ALL_MATERIALS.iter().map(|&k| grid.count(k)).sum();
        assert_eq!(total, 256);
        assert_eq!(grid.count(CellType::None), 0);
    }
}
