//! Cell model: material taxonomy and the per-position cell value.
//!
//! Every grid position holds exactly one [`Cell`]. The material
//! classification helpers on [`CellType`] are pure functions used by every
//! rule, so they are `const fn` and cheap to call in the hot path.

use std::fmt;

use bytemuck::{Pod, Zeroable};
use nalgebra::Vector2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::solver::{GridError, RuleParams};

/// Closed material taxonomy.
///
/// Discriminants are stable: they are the values written by serialization
/// and uploaded to the device buffers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum CellType {
    /// Out-of-bounds sentinel. Never stored inside a grid.
    None = 0,
    /// Empty space
    #[default]
    Air = 1,
    /// Rising, decaying smoke (mass = density)
    Smoke = 2,
    /// Burning cell (mass = remaining fuel)
    Fire = 3,
    /// Mass-conserving liquid (mass = volume)
    Water = 4,
    /// Flammable liquid
    Oil = 5,
    /// Granular solid with velocity
    Sand = 6,
    /// Sticky self-igniting liquid (called jello in older saves)
    Napalm = 7,
    /// Immovable solid
    Stone = 8,
}

impl CellType {
    /// Every material that may be stored in a grid (excludes the sentinel).
    pub const ALL_MATERIALS: [CellType; 8] = [
        CellType::Air,
        CellType::Smoke,
        CellType::Fire,
        CellType::Water,
        CellType::Oil,
        CellType::Sand,
        CellType::Napalm,
        CellType::Stone,
    ];

    /// WATER, OIL and NAPALM.
    #[inline]
    pub const fn is_liquid(self) -> bool {
        matches!(self, CellType::Water | CellType::Oil | CellType::Napalm)
    }

    /// AIR, SMOKE and FIRE.
    #[inline]
    pub const fn is_gas(self) -> bool {
        matches!(self, CellType::Air | CellType::Smoke | CellType::Fire)
    }

    /// Displaceable: anything liquid or gaseous.
    #[inline]
    pub const fn is_fluid(self) -> bool {
        self.is_liquid() || self.is_gas()
    }

    /// Fire-spread eligibility scalar.
    #[inline]
    pub const fn flammability(self) -> f32 {
        match self {
            CellType::Oil => 1.0,
            CellType::Sand => 0.5,
            _ => 0.0,
        }
    }

    /// Fire can spread into this material
    #[inline]
    pub const fn is_flammable(self) -> bool {
        self.flammability() > 0.0
    }

    /// Glyph used by ASCII dumps of a grid.
    pub const fn symbol(self) -> char {
        match self {
            CellType::None => '-',
            CellType::Air => '.',
            CellType::Smoke => '*',
            CellType::Fire => 'F',
            CellType::Water => 'W',
            CellType::Oil => 'O',
            CellType::Sand => 'S',
            CellType::Napalm => 'N',
            CellType::Stone => '#',
        }
    }

    /// Lower-case material name.
    pub const fn name(self) -> &'static str {
        match self {
            CellType::None => "none",
            CellType::Air => "air",
            CellType::Smoke => "smoke",
            CellType::Fire => "fire",
            CellType::Water => "water",
            CellType::Oil => "oil",
            CellType::Sand => "sand",
            CellType::Napalm => "napalm",
            CellType::Stone => "stone",
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for CellType {
    type Error = GridError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => CellType::None,
            1 => CellType::Air,
            2 => CellType::Smoke,
            3 => CellType::Fire,
            4 => CellType::Water,
            5 => CellType::Oil,
            6 => CellType::Sand,
            7 => CellType::Napalm,
            8 => CellType::Stone,
            _ => return Err(GridError::InvalidCellType(f32::from(value))),
        })
    }
}

/// Serialized buffers store the type as a float; only exact integers map back.
impl TryFrom<f32> for CellType {
    type Error = GridError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        if value.fract() != 0.0 || !(0.0..=f32::from(u8::MAX)).contains(&value) {
            return Err(GridError::InvalidCellType(value));
        }
        CellType::try_from(value as u8).map_err(|_| GridError::InvalidCellType(value))
    }
}

impl std::str::FromStr for CellType {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        let alias = if lower == "jello" { "napalm" } else { lower.as_str() };
        CellType::ALL_MATERIALS
            .into_iter()
            .find(|kind| kind.name() == alias)
            .ok_or(GridError::UnknownMaterial(s.to_string()))
    }
}

/// Per-position state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub cell_type: CellType,
    /// Fuel for FIRE, density for SMOKE, volume for WATER, 0 otherwise
    pub mass: f32,
    /// Only SAND carries a non-zero velocity
    pub velocity: Vector2<f32>,
    /// Already relocated during the current tick
    pub updated: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self::air()
    }
}

impl Cell {
    /// Cell of a material with the given mass, at rest
    #[must_use]
    pub fn new(cell_type: CellType, mass: f32) -> Self {
        Self {
            cell_type,
            mass,
            velocity: Vector2::zeros(),
            updated: false,
        }
    }

    /// Empty AIR cell
    #[must_use]
    pub fn air() -> Self {
        Self::new(CellType::Air, 0.0)
    }

    /// Sentinel returned for out-of-bounds reads.
    #[must_use]
    pub fn none() -> Self {
        Self::new(CellType::None, 0.0)
    }

    #[must_use]
    pub fn with_velocity(mut self, velocity: Vector2<f32>) -> Self {
        self.velocity = velocity;
        self
    }

    #[must_use]
    pub fn marked_updated(mut self) -> Self {
        self.updated = true;
        self
    }

    /// Fresh cell as produced by the paint tool.
    ///
    /// WATER starts full, FIRE draws its fuel from the configured spawn range,
    /// every other material starts massless.
    pub fn spawn<R: Rng + ?Sized>(cell_type: CellType, params: &RuleParams, rng: &mut R) -> Self {
        let mass = match cell_type {
            CellType::Water => params.max_mass,
            CellType::Fire if params.fire_spawn_min < params.fire_spawn_max => {
                rng.random_range(params.fire_spawn_min..=params.fire_spawn_max)
            }
            CellType::Fire => params.fire_spawn_min,
            _ => 0.0,
        };
        Self::new(cell_type, mass)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cell_type == CellType::Air
    }
}

/// Packed cell layout used by the device buffers.
///
/// 8 bytes, `repr(C)`, so the whole buffer can be handed to an uploader as
/// raw bytes. Velocity and the updated flag do not exist on the device.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct DeviceCell {
    /// `CellType` discriminant
    pub kind: u32,
    pub mass: f32,
}

impl DeviceCell {
    #[must_use]
    pub const fn new(kind: CellType, mass: f32) -> Self {
        Self {
            kind: kind as u32,
            mass,
        }
    }

    #[must_use]
    pub const fn air() -> Self {
        Self::new(CellType::Air, 0.0)
    }

    /// Decoded material. Garbage discriminants read as the sentinel.
    #[inline]
    pub fn cell_type(self) -> CellType {
        u8::try_from(self.kind)
            .ok()
            .and_then(|k| CellType::try_from(k).ok())
            .unwrap_or(CellType::None)
    }
}

impl From<Cell> for DeviceCell {
    fn from(cell: Cell) -> Self {
        Self::new(cell.cell_type, cell.mass)
    }
}

impl From<DeviceCell> for Cell {
    fn from(cell: DeviceCell) -> Self {
        Cell::new(cell.cell_type(), cell.mass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_classification() {
        assert!(CellType::Water.is_liquid());
        assert!(CellType::Napalm.is_liquid());
        assert!(CellType::Oil.is_fluid());
        assert!(CellType::Fire.is_gas());
        assert!(!CellType::Stone.is_fluid());
        assert!(!CellType::Sand.is_fluid());
        assert!(!CellType::None.is_fluid());
    }

    #[test]
    fn test_flammability() {
        assert_eq!(CellType::Oil.flammability(), 1.0);
        assert_eq!(CellType::Sand.flammability(), 0.5);
        for kind in [CellType::Air, CellType::Water, CellType::Stone, CellType::Napalm] {
            assert!(!kind.is_flammable(), "{kind} should not burn");
        }
    }

    #[test]
    fn test_type_from_float() {
        assert_eq!(CellType::try_from(6.0_f32).unwrap(), CellType::Sand);
        assert!(CellType::try_from(6.5_f32).is_err());
        assert!(CellType::try_from(9.0_f32).is_err());
        assert!(CellType::try_from(-1.0_f32).is_err());
        for kind in CellType::ALL_MATERIALS {
            assert_eq!(CellType::try_from(f32::from(kind as u8)).unwrap(), kind);
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("Water".parse::<CellType>().unwrap(), CellType::Water);
        assert_eq!("jello".parse::<CellType>().unwrap(), CellType::Napalm);
        assert!("lava".parse::<CellType>().is_err());
    }

    #[test]
    fn test_spawn_masses() {
        let params = RuleParams::default();
        let mut rng = StdRng::seed_from_u64(7);

        assert_eq!(Cell::spawn(CellType::Water, &params, &mut rng).mass, 1.0);
        assert_eq!(Cell::spawn(CellType::Sand, &params, &mut rng).mass, 0.0);
        for _ in 0..100 {
            let fire = Cell::spawn(CellType::Fire, &params, &mut rng);
            assert!((0.6..=1.0).contains(&fire.mass), "fire mass {}", fire.mass);
            assert!(!fire.updated);
            assert_eq!(fire.velocity, Vector2::zeros());
        }
    }

    #[test]
    fn test_device_cell_layout() {
        assert_eq!(std::mem::size_of::<DeviceCell>(), 8);
        assert_eq!(DeviceCell::zeroed().cell_type(), CellType::None);

        let packed = DeviceCell::from(Cell::new(CellType::Water, 0.5));
        assert_eq!(packed.kind, 4);
        let back = Cell::from(packed);
        assert_eq!(back.cell_type, CellType::Water);
        assert_eq!(back.mass, 0.5);

        let garbage = DeviceCell { kind: 99, mass: 0.0 };
        assert_eq!(garbage.cell_type(), CellType::None);
    }
}
