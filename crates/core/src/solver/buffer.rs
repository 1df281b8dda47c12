//! Flat cell storage shared by both grid backends
//!
//! Cells are stored in a single `Vec` in row-major order (`y * width + x`),
//! `y` growing downwards. All coordinate accessors take signed positions so
//! rules can probe neighbors of edge cells without casting; anything outside
//! the buffer is rejected rather than wrapped.

use crate::core_types::{Cell, CellSource};

/// Row-major 2D buffer of cells
#[derive(Debug, Clone, PartialEq)]
pub struct CellBuffer<T = Cell> {
    data: Vec<T>,
    width: usize,
    height: usize,
}

impl<T: Copy> CellBuffer<T> {
    /// Create a buffer with every position set to `fill`
    ///
    /// # Arguments
    ///
    /// * `width` - Buffer width in cells
    /// * `height` - Buffer height in cells
    /// * `fill` - Initial value for all cells
    #[must_use]
    pub fn new(width: usize, height: usize, fill: T) -> Self {
        Self {
            data: vec![fill; width * height],
            width,
            height,
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Flat index of `(x, y)`, or `None` when out of bounds
    #[inline]
    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some()
    }

    /// Value at `(x, y)`, or `None` when out of bounds
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<T> {
        self.index(x, y).map(|i| self.data[i])
    }

    #[inline]
    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut T> {
        let i = self.index(x, y)?;
        Some(&mut self.data[i])
    }

    /// Write `value` at `(x, y)`
    ///
    /// # Returns
    ///
    /// `false` (and no write) when the position is out of bounds
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, value: T) -> bool {
        match self.get_mut(x, y) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Fill entire buffer with a value
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Overwrite this buffer with the contents of a same-shaped buffer
    ///
    /// # Panics
    ///
    /// Panics if the buffers differ in shape
    pub fn copy_from(&mut self, other: &Self) {
        assert!(
            self.width == other.width && self.height == other.height,
            "Buffer shapes differ"
        );
        self.data.copy_from_slice(&other.data);
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T: Copy + Into<Cell>> CellSource for CellBuffer<T> {
    #[inline]
    fn cell_at(&self, x: i32, y: i32) -> Cell {
        self.get(x, y).map_or_else(Cell::none, Into::into)
    }
}
