//! Velocity-integrated granular solid.

use nalgebra::Vector2;
use rand::Rng;

use crate::core_types::{Cell, CellSource, CellType};
use crate::solver::{CellGrid, Grid};

/// Fallback moves in priority order: down, down-left, down-right
const FALL_OFFSETS: [(i32, i32); 3] = [(0, 1), (-1, 1), (1, 1)];

pub fn step(pos: (i32, i32), grid: &mut Grid) {
    let (x, y) = pos;
    let params = *grid.params();
    let dt = grid.delta_time();
    let current = grid.cell_at(x, y);

    let mut moved = current;
    moved.velocity.y = (moved.velocity.y + params.gravity * params.sand_gravity_scale * dt)
        .clamp(-params.sand_max_speed, params.sand_max_speed);

    // Resting contact damping
    let below = grid.cell_at(x, y + 1);
    if grid.in_bounds(x, y + 1) && !below.is_empty() && below.cell_type != CellType::Water {
        moved.velocity.y /= 2.0;
    }

    let target = (
        x + moved.velocity.x.round() as i32,
        y + moved.velocity.y.round() as i32,
    );
    if target != pos && can_jump_into(grid, current, target) {
        jump(grid, pos, target, moved);
        return;
    }

    for (dx, dy) in FALL_OFFSETS {
        let dest = (x + dx, y + dy);
        let kind = grid.cell_at(dest.0, dest.1).cell_type;
        if !grid.in_bounds(dest.0, dest.1)
            || grid.is_claimed(dest.0, dest.1)
            || !(kind == CellType::Air || kind == CellType::Water)
        {
            continue;
        }

        moved.velocity.y += params.gravity * dt;
        if dx != 0 {
            moved.velocity.x = if grid.is_in_liquid(x, y).is_some() {
                0.0
            } else {
                grid.rng()
                    .random_range(-params.sand_scatter..=params.sand_scatter)
            };
        }
        swap_into(grid, pos, dest, moved);
        return;
    }

    if grid.rng().random::<f32>() < params.sand_sink_chance {
        if let Some(liquid) = grid.is_in_liquid(x, y) {
            if !grid.is_claimed(liquid.0, liquid.1) {
                swap_into(grid, pos, liquid, moved);
                return;
            }
        }
    }

    grid.set_next(x, y, moved);
}

/// Velocity move: the target must be free AIR, or WATER that is outrunning
/// the grain by more than the displacement threshold.
fn can_jump_into(grid: &Grid, sand: Cell, target: (i32, i32)) -> bool {
    if !grid.in_bounds(target.0, target.1) || grid.is_claimed(target.0, target.1) {
        return false;
    }
    let cell = grid.cell_at(target.0, target.1);
    match cell.cell_type {
        CellType::Air => true,
        CellType::Water => {
            cell.velocity.norm() - sand.velocity.norm() > grid.params().water_displace_speed
        }
        _ => false,
    }
}

/// Land on `target`. Displaced water is thrown into the first free slot of
/// the window above the target, or lost when none is free.
fn jump(grid: &mut Grid, pos: (i32, i32), target: (i32, i32), moved: Cell) {
    let params = *grid.params();
    let (tx, ty) = target;

    if grid.cell_at(tx, ty).cell_type == CellType::Water {
        let spread = params.displace_spread;
        let rx = grid.rng().random_range(-spread..=spread);
        let thrown = grid
            .next_at(tx, ty)
            .with_velocity(Vector2::new(rx as f32, -params.displace_kick))
            .marked_updated();

        let slot = (-params.displace_search_rows..0)
            .flat_map(|dy| {
                (-params.displace_search_half_width..params.displace_search_half_width)
                    .map(move |dx| (tx + dx, ty + dy))
            })
            .find(|&(sx, sy)| grid.is_empty(sx, sy) && !grid.is_claimed(sx, sy));
        if let Some((sx, sy)) = slot {
            grid.set_next(sx, sy, thrown);
        }
    }

    grid.set_next(tx, ty, moved.marked_updated());
    grid.set_next(pos.0, pos.1, Cell::air());
}

/// Exchange the grain with whatever the next buffer holds at `dest`
fn swap_into(grid: &mut Grid, pos: (i32, i32), dest: (i32, i32), moved: Cell) {
    let displaced = grid.next_at(dest.0, dest.1);
    let displaced = if displaced.cell_type == CellType::Air {
        Cell::air()
    } else {
        displaced.marked_updated()
    };
    grid.set_next(dest.0, dest.1, moved.marked_updated());
    grid.set_next(pos.0, pos.1, displaced);
}
