//! Bounds-safe 8-neighbor sampling.

use std::fmt;

use super::cell::{Cell, CellType};

/// Anything that can answer a bounds-safe cell read.
///
/// Out-of-bounds positions must return [`Cell::none`], never panic.
pub trait CellSource {
    fn cell_at(&self, x: i32, y: i32) -> Cell;
}

/// Packed types of the 8 neighbors of one position.
///
/// Computed on demand from the current buffer and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    pub top_left: CellType,
    pub top: CellType,
    pub top_right: CellType,
    pub left: CellType,
    pub right: CellType,
    pub bottom_left: CellType,
    pub bottom: CellType,
    pub bottom_right: CellType,
}

/// Neighbor offsets in packed order. `y` grows downwards.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Sample the 8 neighbors of `(x, y)`; out-of-bounds neighbors read as `NONE`.
pub fn get_context<S: CellSource + ?Sized>(x: i32, y: i32, source: &S) -> Context {
    let at = |dx: i32, dy: i32| source.cell_at(x + dx, y + dy).cell_type;
    Context {
        top_left: at(-1, -1),
        top: at(0, -1),
        top_right: at(1, -1),
        left: at(-1, 0),
        right: at(1, 0),
        bottom_left: at(-1, 1),
        bottom: at(0, 1),
        bottom_right: at(1, 1),
    }
}

impl Context {
    /// Neighbor type by offset. `(0, 0)` and offsets outside the 3×3 block
    /// read as `NONE`.
    pub fn get(&self, dx: i32, dy: i32) -> CellType {
        match (dx, dy) {
            (-1, -1) => self.top_left,
            (0, -1) => self.top,
            (1, -1) => self.top_right,
            (-1, 0) => self.left,
            (1, 0) => self.right,
            (-1, 1) => self.bottom_left,
            (0, 1) => self.bottom,
            (1, 1) => self.bottom_right,
            _ => CellType::None,
        }
    }

    /// All neighbors with their offsets, in packed order.
    pub fn iter(&self) -> impl Iterator<Item = ((i32, i32), CellType)> + '_ {
        NEIGHBOR_OFFSETS
            .iter()
            .map(move |&(dx, dy)| ((dx, dy), self.get(dx, dy)))
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for dy in -1..=1 {
            for dx in -1..=1 {
                let glyph = if dx == 0 && dy == 0 {
                    '_'
                } else {
                    self.get(dx, dy).symbol()
                };
                write!(f, "{glyph}")?;
            }
            if dy < 1 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
