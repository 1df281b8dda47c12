//! Rising, decaying smoke.

use rand::Rng;

use crate::core_types::{get_context, Cell, CellSource, CellType};
use crate::solver::Grid;

/// Rise directions in priority order: up, up-left, up-right
const RISE_OFFSETS: [(i32, i32); 3] = [(0, -1), (-1, -1), (1, -1)];

pub fn step(pos: (i32, i32), grid: &mut Grid) {
    let (x, y) = pos;
    let params = *grid.params();
    let mass = grid.cell_at(x, y).mass;

    if mass <= 0.0 {
        grid.set_next(x, y, Cell::air());
        return;
    }
    let decayed = Cell::new(CellType::Smoke, (mass - params.smoke_decay).max(0.0));

    // The first fluid direction is the only candidate; one roll per tick
    let context = get_context(x, y, grid);
    let roll = grid.rng().random::<f32>();
    let rise = RISE_OFFSETS
        .into_iter()
        .find(|&(dx, dy)| context.get(dx, dy).is_fluid());

    if let Some((dx, dy)) = rise {
        let dest = (x + dx, y + dy);
        if roll < params.smoke_rise_chance && !grid.is_claimed(dest.0, dest.1) {
            // Liquids and other gases sink into the vacated cell
            let displaced = grid.next_at(dest.0, dest.1);
            let displaced = if displaced.cell_type == CellType::Air {
                Cell::air()
            } else {
                displaced.marked_updated()
            };
            grid.set_next(dest.0, dest.1, decayed.marked_updated());
            grid.set_next(x, y, displaced);
            return;
        }
    }

    grid.set_next(x, y, decayed);
}
