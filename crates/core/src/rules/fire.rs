//! Burning cells: fuel decay, ignition of flammable neighbors, smoke.

use rand::Rng;

use crate::core_types::{get_context, Cell, CellSource, CellType};
use crate::solver::Grid;

pub fn step(pos: (i32, i32), grid: &mut Grid) {
    let (x, y) = pos;
    let params = *grid.params();
    let remaining = grid.cell_at(x, y).mass - params.fire_decay;

    // Burnout
    if remaining <= 0.0 {
        grid.set_next(x, y, Cell::new(CellType::Smoke, 0.0));
        return;
    }

    let context = get_context(x, y, grid);
    for ((dx, dy), kind) in context.iter() {
        let (nx, ny) = (x + dx, y + dy);
        if grid.is_claimed(nx, ny) {
            continue;
        }
        if kind.is_flammable() {
            grid.set_next(nx, ny, Cell::new(CellType::Fire, remaining).marked_updated());
        } else if kind == CellType::Air && grid.rng().random::<f32>() < params.smoke_spawn_chance {
            let smoke = Cell::new(CellType::Smoke, (remaining - params.smoke_decay).max(0.0));
            grid.set_next(nx, ny, smoke.marked_updated());
        }
    }

    grid.set_next(x, y, Cell::new(CellType::Fire, remaining.max(0.0)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::CellGrid;
    use approx::assert_relative_eq;

    #[test]
    fn test_fire_burns_out_into_smoke() {
        let mut grid = Grid::with_seed(3, 3, 1);
        grid.set_curr(1, 1, Cell::new(CellType::Fire, 0.05));
        grid.simulate(0.016);
        let cell = grid.cell_at(1, 1);
        assert_eq!(cell.cell_type, CellType::Smoke);
        assert_eq!(cell.mass, 0.0);
    }

    #[test]
    fn test_fire_decays() {
        let mut grid = Grid::with_seed(1, 1, 1);
        grid.set_curr(0, 0, Cell::new(CellType::Fire, 0.8));
        grid.simulate(0.016);
        assert_eq!(grid.cell_at(0, 0).cell_type, CellType::Fire);
        assert_relative_eq!(grid.cell_at(0, 0).mass, 0.75, epsilon = 1e-6);
    }

    #[test]
    fn test_fire_ignites_oil_but_not_stone() {
        let mut grid = Grid::with_seed(3, 1, 1);
        grid.set_curr(0, 0, Cell::new(CellType::Oil, 0.0));
        grid.set_curr(1, 0, Cell::new(CellType::Fire, 0.5));
        grid.set_curr(2, 0, Cell::new(CellType::Stone, 0.0));
        grid.simulate(0.016);

        assert_eq!(grid.cell_at(0, 0).cell_type, CellType::Fire);
        assert_relative_eq!(grid.cell_at(0, 0).mass, 0.45, epsilon = 1e-6);
        assert_eq!(grid.cell_at(2, 0).cell_type, CellType::Stone);
    }

    #[test]
    fn test_fire_only_makes_smoke_from_air() {
        let mut grid = Grid::with_seed(5, 5, 42);
        grid.set_curr(2, 2, Cell::new(CellType::Fire, 1.0));
        grid.simulate(0.016);
        let smoke = grid.count(CellType::Smoke);
        assert!(smoke <= 8);
        assert_eq!(grid.count(CellType::Fire), 1);
        for y in 0..5 {
            for x in 0..5 {
                let cell = grid.cell_at(x, y);
                if cell.cell_type == CellType::Smoke {
                    assert!((x - 2_i32).abs() <= 1 && (y - 2_i32).abs() <= 1);
                    assert_relative_eq!(cell.mass, 0.945, epsilon = 1e-6);
                }
            }
        }
    }
}
