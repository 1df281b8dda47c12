//! Mass-conserving water flow.
//!
//! Flow order is down, right, left, then up while compressed. Every flow goes
//! through [`Grid::transfer_mass`], which accumulates into the next buffer, so
//! inflows from cells processed earlier in the pass are never lost.

use crate::core_types::{Cell, CellSource, CellType};
use crate::solver::Grid;

pub fn step(pos: (i32, i32), grid: &mut Grid) {
    let (x, y) = pos;
    let params = *grid.params();
    let mut remaining = grid.cell_at(x, y).mass;

    if remaining <= 0.0 {
        grid.drain_if_empty(x, y);
        return;
    }

    // Down
    let below = (x, y + 1);
    if let Some(below_mass) = receptive_mass(grid, below) {
        let flow = params.stable_state_below(remaining + below_mass) - below_mass;
        let flow = params.smooth_flow(flow, params.max_speed.min(remaining));
        remaining -= grid.transfer_mass(pos, below, flow);
        if remaining <= 0.0 {
            return;
        }
    }

    // Right, then left
    for side in [(x + 1, y), (x - 1, y)] {
        if let Some(side_mass) = receptive_mass(grid, side) {
            let flow = params.smooth_flow((remaining - side_mass) / 4.0, remaining);
            remaining -= grid.transfer_mass(pos, side, flow);
            if remaining <= 0.0 {
                return;
            }
        }
    }

    // Up, only the excess beyond the stable split
    let above = (x, y - 1);
    if let Some(above_mass) = receptive_mass(grid, above) {
        let flow = remaining - params.stable_state_below(remaining + above_mass);
        let flow = params.smooth_flow(flow, params.max_speed.min(remaining));
        grid.transfer_mass(pos, above, flow);
    }
}

/// Water mass at `pos` if water may flow there (WATER or a gas), else `None`
fn receptive_mass(grid: &Grid, pos: (i32, i32)) -> Option<f32> {
    let cell: Cell = grid.cell_at(pos.0, pos.1);
    match cell.cell_type {
        CellType::Water => Some(cell.mass),
        kind if kind.is_gas() => Some(0.0),
        _ => None,
    }
}
