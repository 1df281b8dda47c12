//! Error types for grid persistence and configuration.
//!
//! Out-of-bounds access is not an error anywhere in the engine: reads return
//! the `NONE` sentinel and writes report `false`. Only loading external data
//! can fail hard.

use thiserror::Error;

use crate::core_types::CellType;

/// Failures when rehydrating or decoding grid data.
#[derive(Debug, Error)]
pub enum GridError {
    /// Serialized grid shape differs from the target grid (resizing is unsupported)
    #[error(
        "Dimension mismatch: grid is {expected:?} (width, height, stride), data is {actual:?}"
    )]
    DimensionMismatch {
        /// Shape of the grid being loaded into
        expected: (u32, u32, u32),
        /// Shape found in the data
        actual: (u32, u32, u32),
    },

    /// Flat buffer length does not equal `width * height * stride`
    #[error("Buffer size mismatch: expected {expected} floats, got {actual}")]
    BufferSize {
        /// Required length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// A type value that is not a storable material
    #[error("Invalid cell type value: {0}")]
    InvalidCellType(f32),

    /// A mass that no valid grid state can hold
    #[error("Invalid mass {mass} for {material:?}")]
    InvalidMass {
        /// Material of the offending cell
        material: CellType,
        /// Mass found in the data
        mass: f32,
    },

    /// A material name that does not parse
    #[error("Unknown material: {0}")]
    UnknownMaterial(String),

    /// Byte stream shorter than its header promises
    #[error("Truncated data: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Bytes required
        expected: usize,
        /// Bytes available
        actual: usize,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON configuration
    #[error("Config parse error: {0}")]
    Config(#[from] serde_json::Error),
}
