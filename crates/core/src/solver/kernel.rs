//! Per-cell pull kernels of the device engine
//!
//! Every kernel computes the next state of exactly one cell from the 3×3
//! neighborhood of the pass input and writes nothing else. A move therefore
//! happens only when the source and the destination independently reach the
//! same verdict, so every predicate used to decide a move is evaluated
//! identically from both ends:
//!
//! - **Reactions**: fire decay and ignition, smoke creation and decay,
//!   napalm self-ignition, drained water turning to AIR
//! - **Falling**: SAND, NAPALM and OIL move down, then diagonally toward this
//!   tick's side; NAPALM and OIL also spread sideways. A destination accepts
//!   vertical over diagonal over lateral movers.
//! - **Rising**: SMOKE moves up into AIR, then diagonally
//! - **Water flux**: pairwise fluxes that depend only on the two cells
//!
//! Random rolls come from a stateless hash of `(seed, tick, x, y, salt)`, so a
//! roll made by a source is reproduced exactly by its destination.

use rayon::prelude::*;

use super::buffer::CellBuffer;
use super::params::RuleParams;
use crate::core_types::{CellType, DeviceCell, NEIGHBOR_OFFSETS};

const SALT_NAPALM: u64 = 1;
const SALT_NAPALM_FUEL: u64 = 2;
const SALT_RISE: u64 = 3;
/// Offset by the neighbor index of the fire that emits the smoke
const SALT_SMOKE_SPAWN: u64 = 16;

/// Read-only input of one pass
pub(crate) struct PassInput<'a> {
    pub cells: &'a CellBuffer<DeviceCell>,
    pub params: &'a RuleParams,
    pub seed: u64,
    pub tick: u64,
}

/// One kernel: next state of the cell at `(x, y)`
pub(crate) type CellKernel = fn(&PassInput<'_>, i32, i32) -> DeviceCell;

/// The kernels of one tick, in execution order
pub(crate) const TICK_PASSES: [(&str, CellKernel); 4] = [
    ("react", react),
    ("fall", fall),
    ("rise", rise),
    ("flux", flux),
];

impl PassInput<'_> {
    #[inline]
    fn cell(&self, x: i32, y: i32) -> DeviceCell {
        self.cells
            .get(x, y)
            .unwrap_or(DeviceCell::new(CellType::None, 0.0))
    }

    #[inline]
    fn kind(&self, x: i32, y: i32) -> CellType {
        self.cell(x, y).cell_type()
    }

    /// Diagonal/lateral direction of this tick; alternates to avoid drift
    #[inline]
    fn side(&self) -> i32 {
        if self.tick % 2 == 0 {
            1
        } else {
            -1
        }
    }

    #[inline]
    fn roll(&self, x: i32, y: i32, salt: u64) -> f32 {
        hash_unit(self.seed, self.tick, x, y, salt)
    }
}

/// Deterministic pseudo-random value in [0, 1)
///
/// Splitmix-style integer mixing of the inputs.
#[inline]
pub(crate) fn hash_unit(seed: u64, tick: u64, x: i32, y: i32, salt: u64) -> f32 {
    let position = (u64::from(x as u32) << 32) | u64::from(y as u32);
    let mut h = seed
        ^ tick.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ position.wrapping_mul(0xBF58_476D_1CE4_E5B9)
        ^ salt.wrapping_mul(0x94D0_49BB_1331_11EB);
    h = (h ^ (h >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h = (h ^ (h >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    h ^= h >> 31;
    (h >> 40) as f32 / (1_u64 << 24) as f32
}

/// Run `kernel` over every cell of `output`, rows in parallel
pub(crate) fn run_pass(
    input: &PassInput<'_>,
    output: &mut CellBuffer<DeviceCell>,
    kernel: CellKernel,
) {
    let width = output.width();
    if width == 0 {
        return;
    }
    output
        .as_mut_slice()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                *out = kernel(input, x as i32, y as i32);
            }
        });
}

// ============================================================================
// REACTIONS
// ============================================================================

/// Fuel a FIRE at `(x, y)` keeps after this tick's decay, if it survives
#[inline]
fn live_fire(input: &PassInput<'_>, x: i32, y: i32) -> Option<f32> {
    let cell = input.cell(x, y);
    if cell.cell_type() != CellType::Fire {
        return None;
    }
    let remaining = cell.mass - input.params.fire_decay;
    (remaining > 0.0).then_some(remaining)
}

pub(crate) fn react(input: &PassInput<'_>, x: i32, y: i32) -> DeviceCell {
    let params = input.params;
    let cell = input.cell(x, y);

    match cell.cell_type() {
        CellType::Fire => match live_fire(input, x, y) {
            Some(remaining) => DeviceCell::new(CellType::Fire, remaining),
            None => DeviceCell::new(CellType::Smoke, 0.0),
        },
        CellType::Smoke => {
            if cell.mass <= 0.0 {
                DeviceCell::air()
            } else {
                DeviceCell::new(CellType::Smoke, (cell.mass - params.smoke_decay).max(0.0))
            }
        }
        CellType::Water if cell.mass <= 0.0 => DeviceCell::air(),
        CellType::Napalm => napalm_ignition(input, x, y).unwrap_or(cell),
        kind if kind.is_flammable() => NEIGHBOR_OFFSETS
            .iter()
            .filter_map(|&(dx, dy)| live_fire(input, x + dx, y + dy))
            .reduce(f32::max)
            .map_or(cell, |fuel| DeviceCell::new(CellType::Fire, fuel)),
        CellType::Air => NEIGHBOR_OFFSETS
            .iter()
            .enumerate()
            .find_map(|(i, &(dx, dy))| {
                let remaining = live_fire(input, x + dx, y + dy)?;
                let roll = input.roll(x, y, SALT_SMOKE_SPAWN + i as u64);
                (roll < params.smoke_spawn_chance).then(|| {
                    DeviceCell::new(CellType::Smoke, (remaining - params.smoke_decay).max(0.0))
                })
            })
            .unwrap_or(cell),
        _ => cell,
    }
}

fn napalm_ignition(input: &PassInput<'_>, x: i32, y: i32) -> Option<DeviceCell> {
    let params = input.params;
    let below = input.kind(x, y + 1);
    let (chance, intensity) = if below == CellType::Napalm {
        (params.napalm_chain_chance, params.napalm_chain_intensity)
    } else if !below.is_fluid() {
        (params.napalm_contact_chance, params.napalm_contact_intensity)
    } else {
        return None;
    };

    (input.roll(x, y, SALT_NAPALM) < chance).then(|| {
        let fuel = input.roll(x, y, SALT_NAPALM_FUEL) * intensity;
        DeviceCell::new(CellType::Fire, fuel)
    })
}

// ============================================================================
// FALLING
// ============================================================================

#[inline]
fn is_faller(kind: CellType) -> bool {
    matches!(kind, CellType::Sand | CellType::Napalm | CellType::Oil)
}

#[inline]
fn is_spreader(kind: CellType) -> bool {
    matches!(kind, CellType::Napalm | CellType::Oil)
}

/// Cells a faller may move into
#[inline]
fn is_vacant(kind: CellType) -> bool {
    matches!(kind, CellType::Air | CellType::Smoke)
}

/// Faller at `(x, y)` moves straight down (SAND also sinks into WATER)
fn can_fall(input: &PassInput<'_>, x: i32, y: i32) -> bool {
    let kind = input.kind(x, y);
    let below = input.kind(x, y + 1);
    is_faller(kind) && (is_vacant(below) || (kind == CellType::Sand && below == CellType::Water))
}

/// Faller at `(x, y)` moves to `(x + s, y + 1)`; a faller directly above
/// that destination would take it first.
fn can_slide(input: &PassInput<'_>, x: i32, y: i32, s: i32) -> bool {
    is_faller(input.kind(x, y))
        && !can_fall(input, x, y)
        && is_vacant(input.kind(x + s, y + 1))
        && !is_faller(input.kind(x + s, y))
}

/// NAPALM/OIL at `(x, y)` moves to `(x + s, y)`; fallers above either cell
/// would claim the destination first.
fn can_spread(input: &PassInput<'_>, x: i32, y: i32, s: i32) -> bool {
    is_spreader(input.kind(x, y))
        && !can_fall(input, x, y)
        && !can_slide(input, x, y, s)
        && is_vacant(input.kind(x + s, y))
        && !is_faller(input.kind(x + s, y - 1))
        && !is_faller(input.kind(x, y - 1))
}

pub(crate) fn fall(input: &PassInput<'_>, x: i32, y: i32) -> DeviceCell {
    let s = input.side();
    let cell = input.cell(x, y);
    let kind = cell.cell_type();

    // Source side: take whatever the destination held
    if is_faller(kind) {
        if can_fall(input, x, y) {
            return input.cell(x, y + 1);
        }
        if can_slide(input, x, y, s) {
            return input.cell(x + s, y + 1);
        }
        if can_spread(input, x, y, s) {
            return input.cell(x + s, y);
        }
        return cell;
    }

    // Destination side, in priority order
    if is_vacant(kind) {
        if is_faller(input.kind(x, y - 1)) {
            return input.cell(x, y - 1);
        }
        if can_slide(input, x - s, y - 1, s) {
            return input.cell(x - s, y - 1);
        }
        if can_spread(input, x - s, y, s) {
            return input.cell(x - s, y);
        }
        return cell;
    }

    if kind == CellType::Water && input.kind(x, y - 1) == CellType::Sand {
        return input.cell(x, y - 1);
    }
    cell
}

// ============================================================================
// RISING
// ============================================================================

/// SMOKE at `(x, y)` wants to move this tick
fn rises(input: &PassInput<'_>, x: i32, y: i32) -> bool {
    input.kind(x, y) == CellType::Smoke
        && input.roll(x, y, SALT_RISE) < input.params.smoke_rise_chance
}

fn can_rise(input: &PassInput<'_>, x: i32, y: i32) -> bool {
    rises(input, x, y) && input.kind(x, y - 1) == CellType::Air
}

fn can_drift(input: &PassInput<'_>, x: i32, y: i32, s: i32) -> bool {
    rises(input, x, y)
        && !can_rise(input, x, y)
        && input.kind(x + s, y - 1) == CellType::Air
        && !rises(input, x + s, y)
}

pub(crate) fn rise(input: &PassInput<'_>, x: i32, y: i32) -> DeviceCell {
    let s = input.side();
    let cell = input.cell(x, y);

    match cell.cell_type() {
        CellType::Smoke => {
            if can_rise(input, x, y) {
                input.cell(x, y - 1)
            } else if can_drift(input, x, y, s) {
                input.cell(x + s, y - 1)
            } else {
                cell
            }
        }
        CellType::Air => {
            if rises(input, x, y + 1) {
                input.cell(x, y + 1)
            } else if can_drift(input, x - s, y + 1, s) {
                input.cell(x - s, y + 1)
            } else {
                cell
            }
        }
        _ => cell,
    }
}

// ============================================================================
// WATER FLUX
// ============================================================================

/// Water mass of a cell water may flow into; gases hold none
#[inline]
fn receptive_mass(cell: DeviceCell) -> Option<f32> {
    match cell.cell_type() {
        CellType::Water => Some(cell.mass),
        kind if kind.is_gas() => Some(0.0),
        _ => None,
    }
}

/// Mass of a WATER cell able to send, if any
#[inline]
fn sender_mass(cell: DeviceCell) -> Option<f32> {
    (cell.cell_type() == CellType::Water && cell.mass > 0.0).then_some(cell.mass)
}

#[inline]
fn room(params: &RuleParams, mass: f32) -> f32 {
    (params.max_water_mass() - mass).max(0.0)
}

// Sender budgets: down ½, each side ⅛, up ¼. Receiver budgets mirror them,
// so neither end can leave its mass range.

fn flux_down(params: &RuleParams, sender: f32, receiver: f32) -> f32 {
    let flow = params.stable_state_below(sender + receiver) - receiver;
    let flow = flow.clamp(0.0, params.max_speed.min(sender)) * 0.5;
    flow.min(room(params, receiver) * 0.5)
}

fn flux_side(params: &RuleParams, sender: f32, receiver: f32) -> f32 {
    let flow = ((sender - receiver) / 4.0).clamp(0.0, sender) * 0.5;
    flow.min(room(params, receiver) / 8.0)
}

fn flux_up(params: &RuleParams, sender: f32, receiver: f32) -> f32 {
    let flow = sender - params.stable_state_below(sender + receiver);
    let flow = flow.clamp(0.0, params.max_speed.min(sender)) * 0.5;
    flow.min(sender / 4.0).min(room(params, receiver) / 4.0)
}

pub(crate) fn flux(input: &PassInput<'_>, x: i32, y: i32) -> DeviceCell {
    let params = input.params;
    let cell = input.cell(x, y);
    let Some(own) = receptive_mass(cell) else {
        return cell;
    };

    let mut mass = own;

    // Outflows
    if let Some(sender) = sender_mass(cell) {
        if let Some(below) = receptive_mass(input.cell(x, y + 1)) {
            mass -= flux_down(params, sender, below);
        }
        for dx in [1, -1] {
            if let Some(side) = receptive_mass(input.cell(x + dx, y)) {
                mass -= flux_side(params, sender, side);
            }
        }
        if let Some(above) = receptive_mass(input.cell(x, y - 1)) {
            mass -= flux_up(params, sender, above);
        }
    }

    // Inflows, computed exactly as the senders compute them
    let mut inflow = 0.0;
    if let Some(above) = sender_mass(input.cell(x, y - 1)) {
        inflow += flux_down(params, above, own);
    }
    for dx in [1, -1] {
        if let Some(side) = sender_mass(input.cell(x + dx, y)) {
            inflow += flux_side(params, side, own);
        }
    }
    if let Some(below) = sender_mass(input.cell(x, y + 1)) {
        inflow += flux_up(params, below, own);
    }
    mass += inflow;

    if cell.cell_type() == CellType::Water {
        if mass <= 0.0 {
            DeviceCell::air()
        } else {
            DeviceCell::new(CellType::Water, mass)
        }
    } else if inflow > 0.0 {
        DeviceCell::new(CellType::Water, mass)
    } else {
        cell
    }
}
