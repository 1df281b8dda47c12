//! Sticky combustible liquids: NAPALM and OIL.
//!
//! Both fall straight down into AIR or SMOKE and otherwise wander one cell
//! sideways. Only NAPALM self-ignites; OIL burns when fire reaches it.

use rand::Rng;

use crate::core_types::{Cell, CellSource, CellType};
use crate::solver::Grid;

pub fn step(pos: (i32, i32), grid: &mut Grid) {
    let (x, y) = pos;
    let params = *grid.params();
    let current = grid.cell_at(x, y);
    let below = grid.cell_at(x, y + 1).cell_type;

    if current.cell_type == CellType::Napalm {
        let roll = grid.rng().random::<f32>();
        let ignition = if below == CellType::Napalm {
            (roll < params.napalm_chain_chance).then_some(params.napalm_chain_intensity)
        } else if !below.is_fluid() {
            (roll < params.napalm_contact_chance).then_some(params.napalm_contact_intensity)
        } else {
            None
        };
        if let Some(intensity) = ignition {
            let fuel = if intensity > 0.0 {
                grid.rng().random_range(0.0..intensity)
            } else {
                0.0
            };
            grid.set_next(x, y, Cell::new(CellType::Fire, fuel));
            return;
        }
    }

    if try_flow(grid, pos, (x, y + 1), current) {
        return;
    }
    let direction = grid.rng().random_range(-1..=1);
    if direction != 0 && try_flow(grid, pos, (x + direction, y), current) {
        return;
    }

    grid.set_next(x, y, current);
}

/// Move into `dest` when it holds unclaimed AIR or SMOKE; the source becomes AIR
fn try_flow(grid: &mut Grid, pos: (i32, i32), dest: (i32, i32), cell: Cell) -> bool {
    let kind = grid.cell_at(dest.0, dest.1).cell_type;
    if !matches!(kind, CellType::Air | CellType::Smoke) || grid.is_claimed(dest.0, dest.1) {
        return false;
    }
    grid.mark_updated(dest.0, dest.1);
    grid.set_next(dest.0, dest.1, cell.marked_updated());
    grid.set_next(pos.0, pos.1, Cell::air());
    true
}
