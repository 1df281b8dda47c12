//! Material rule engine for the sequential grid
//!
//! One state-transition function per material. Every rule reads the current
//! buffer only (through `cell_at`/`get_context`) and writes through the
//! grid's next-buffer accessors. Dispatch is a plain `match` over the
//! material; AIR, STONE and the sentinel are passive.

pub mod fire;
pub mod napalm;
pub mod sand;
pub mod smoke;
pub mod water;

use crate::core_types::CellType;
use crate::solver::Grid;

/// Signature shared by every material rule
pub type RuleFn = fn((i32, i32), &mut Grid);

/// Rule for a material, `None` for passive materials
pub fn rule_for(kind: CellType) -> Option<RuleFn> {
    match kind {
        CellType::Sand => Some(sand::step),
        CellType::Water => Some(water::step),
        CellType::Fire => Some(fire::step),
        CellType::Smoke => Some(smoke::step),
        CellType::Napalm | CellType::Oil => Some(napalm::step),
        CellType::Air | CellType::Stone | CellType::None => None,
    }
}

/// Run the rule of `kind` for the cell at `pos`
#[inline]
pub fn dispatch(kind: CellType, pos: (i32, i32), grid: &mut Grid) {
    if let Some(step) = rule_for(kind) {
        step(pos, grid);
    }
}
