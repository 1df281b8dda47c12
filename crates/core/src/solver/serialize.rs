//! Flat serialized form of a grid and its byte layout
//!
//! A grid serializes to `(type, mass)` float pairs in row-major order with
//! rows vertically mirrored: output row `r` holds grid row `height - 1 - r`,
//! matching the renderer's bottom-up texture convention.
//!
//! Byte layout: `width: u32`, `height: u32`, `stride: u32`, then
//! `width * height * stride` floats, everything little-endian. Choosing file
//! names and opening files is left to the caller.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use super::error::GridError;
use crate::core_types::{Cell, CellSource, CellType};

/// Floats per serialized cell: type then mass
pub const STRIDE: u32 = 2;

/// Size of the fixed header in bytes
pub const HEADER_LEN: usize = 12;

/// Flat, renderer-facing snapshot of a grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedGrid {
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub buffer: Vec<f32>,
}

impl SerializedGrid {
    /// `width * height * stride`, saturating at `usize::MAX`
    #[must_use]
    pub fn expected_len(&self) -> usize {
        payload_len(self.width, self.height, self.stride).unwrap_or(usize::MAX)
    }

    /// Check that the buffer length agrees with the header.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::BufferSize`] on disagreement
    pub fn validate(&self) -> Result<(), GridError> {
        let expected = self.expected_len();
        if self.buffer.len() == expected {
            Ok(())
        } else {
            Err(GridError::BufferSize {
                expected,
                actual: self.buffer.len(),
            })
        }
    }

    /// Encode to the little-endian byte layout.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + self.buffer.len() * 4);
        bytes.extend_from_slice(&self.width.to_le_bytes());
        bytes.extend_from_slice(&self.height.to_le_bytes());
        bytes.extend_from_slice(&self.stride.to_le_bytes());
        for value in &self.buffer {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    /// Decode from the little-endian byte layout.
    ///
    /// # Errors
    ///
    /// * [`GridError::Truncated`] when the data is shorter than its header promises
    /// * [`GridError::BufferSize`] when trailing bytes follow the declared buffer
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GridError> {
        if bytes.len() < HEADER_LEN {
            return Err(GridError::Truncated {
                expected: HEADER_LEN,
                actual: bytes.len(),
            });
        }
        let word = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        let (width, height, stride) = (word(0), word(4), word(8));

        // A header too large to address can never be satisfied
        let Some((count, expected)) = payload_len(width, height, stride).and_then(|count| {
            let expected = count.checked_mul(4)?.checked_add(HEADER_LEN)?;
            Some((count, expected))
        }) else {
            return Err(GridError::Truncated {
                expected: usize::MAX,
                actual: bytes.len(),
            });
        };
        if bytes.len() < expected {
            return Err(GridError::Truncated {
                expected,
                actual: bytes.len(),
            });
        }
        if bytes.len() > expected {
            return Err(GridError::BufferSize {
                expected: count,
                actual: (bytes.len() - HEADER_LEN) / 4,
            });
        }

        let buffer = bytes[HEADER_LEN..]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Ok(Self {
            width,
            height,
            stride,
            buffer,
        })
    }

    /// Stream the byte layout into a writer.
    ///
    /// # Errors
    ///
    /// Propagates IO errors from the writer
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), GridError> {
        writer.write_all(&self.to_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Read a complete byte layout from a reader.
    ///
    /// # Errors
    ///
    /// Propagates IO errors and the decoding errors of [`Self::from_bytes`]
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self, GridError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }
}

/// Float count promised by a header, `None` when it overflows `usize`
fn payload_len(width: u32, height: u32, stride: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(stride as usize)
}

/// Snapshot any cell source of the given shape.
pub(crate) fn encode_cells<S: CellSource + ?Sized>(
    source: &S,
    width: u32,
    height: u32,
) -> SerializedGrid {
    let mut buffer = Vec::with_capacity(width as usize * height as usize * STRIDE as usize);
    for row in 0..height as i32 {
        let y = height as i32 - 1 - row;
        for x in 0..width as i32 {
            let cell = source.cell_at(x, y);
            buffer.push(f32::from(cell.cell_type as u8));
            buffer.push(cell.mass);
        }
    }
    SerializedGrid {
        width,
        height,
        stride: STRIDE,
        buffer,
    }
}

/// Validate `data` against a target shape and decode it into grid order.
///
/// The returned cells are row-major with `y` growing downwards (mirror
/// undone), velocity zero and `updated` clear. Nothing is returned unless the
/// whole buffer is valid, so callers can apply it atomically. Masses must be
/// finite and non-negative, and WATER may not exceed `max_water_mass`.
pub(crate) fn decode_cells(
    data: &SerializedGrid,
    width: u32,
    height: u32,
    max_water_mass: f32,
) -> Result<Vec<Cell>, GridError> {
    if data.width != width || data.height != height || data.stride != STRIDE {
        return Err(GridError::DimensionMismatch {
            expected: (width, height, STRIDE),
            actual: (data.width, data.height, data.stride),
        });
    }
    data.validate()?;

    let (w, h) = (width as usize, height as usize);
    let mut cells = vec![Cell::air(); w * h];
    for (i, pair) in data.buffer.chunks_exact(STRIDE as usize).enumerate() {
        let cell_type = CellType::try_from(pair[0])?;
        if cell_type == CellType::None {
            return Err(GridError::InvalidCellType(pair[0]));
        }
        let mass = pair[1];
        let over_cap = cell_type == CellType::Water && mass > max_water_mass;
        if !mass.is_finite() || mass < 0.0 || over_cap {
            return Err(GridError::InvalidMass {
                material: cell_type,
                mass,
            });
        }
        let (row, x) = (i / w, i % w);
        let y = h - 1 - row;
        cells[y * w + x] = Cell::new(cell_type, mass);
    }
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::CellBuffer;

    fn tiny() -> SerializedGrid {
        SerializedGrid {
            width: 1,
            height: 2,
            stride: STRIDE,
            buffer: vec![4.0, 0.5, 8.0, 0.0],
        }
    }

    #[test]
    fn test_byte_layout_is_little_endian() {
        let bytes = tiny().to_bytes();
        assert_eq!(bytes.len(), HEADER_LEN + 16);
        assert_eq!(&bytes[0..4], &[1, 0, 0, 0]);
        assert_eq!(&bytes[4..8], &[2, 0, 0, 0]);
        assert_eq!(&bytes[8..12], &[2, 0, 0, 0]);
        assert_eq!(&bytes[12..16], &4.0_f32.to_le_bytes());
        assert_eq!(&bytes[16..20], &0.5_f32.to_le_bytes());
    }

    #[test]
    fn test_bytes_round_trip() {
        let grid = tiny();
        let decoded = SerializedGrid::from_bytes(&grid.to_bytes()).unwrap();
        assert_eq!(decoded, grid);
    }

    #[test]
    fn test_truncated_bytes() {
        let bytes = tiny().to_bytes();
        assert!(matches!(
            SerializedGrid::from_bytes(&bytes[..8]),
            Err(GridError::Truncated { expected: 12, actual: 8 })
        ));
        assert!(matches!(
            SerializedGrid::from_bytes(&bytes[..bytes.len() - 1]),
            Err(GridError::Truncated { .. })
        ));

        let mut long = bytes.clone();
        long.extend_from_slice(&[0, 0, 0, 0]);
        assert!(matches!(
            SerializedGrid::from_bytes(&long),
            Err(GridError::BufferSize { .. })
        ));
    }

    #[test]
    fn test_oversized_header_is_an_error() {
        assert!(matches!(
            SerializedGrid::from_bytes(&[0xFF; HEADER_LEN]),
            Err(GridError::Truncated { actual: HEADER_LEN, .. })
        ));

        let mut header = Vec::new();
        header.extend_from_slice(&u32::MAX.to_le_bytes());
        header.extend_from_slice(&u32::MAX.to_le_bytes());
        header.extend_from_slice(&STRIDE.to_le_bytes());
        header.extend_from_slice(&[0; 8]);
        assert!(SerializedGrid::from_bytes(&header).is_err());

        let huge = SerializedGrid {
            width: u32::MAX,
            height: u32::MAX,
            stride: u32::MAX,
            buffer: vec![0.0; 4],
        };
        assert_eq!(huge.expected_len(), usize::MAX);
        assert!(matches!(huge.validate(), Err(GridError::BufferSize { .. })));
    }

    #[test]
    fn test_stream_round_trip() {
        let grid = tiny();
        let mut sink = Vec::new();
        grid.write_to(&mut sink).unwrap();
        let back = SerializedGrid::read_from(sink.as_slice()).unwrap();
        assert_eq!(back, grid);
    }

    #[test]
    fn test_encode_mirrors_rows() {
        // Row 0 water, row 1 stone
        let mut buffer = CellBuffer::new(1, 2, Cell::air());
        buffer.set(0, 0, Cell::new(CellType::Water, 0.5));
        buffer.set(0, 1, Cell::new(CellType::Stone, 0.0));

        let encoded = encode_cells(&buffer, 1, 2);
        assert_eq!(encoded.buffer, vec![8.0, 0.0, 4.0, 0.5]);

        let decoded = decode_cells(&encoded, 1, 2, 1.02).unwrap();
        assert_eq!(decoded[0].cell_type, CellType::Water);
        assert_eq!(decoded[1].cell_type, CellType::Stone);
    }

    #[test]
    fn test_decode_rejects_bad_data() {
        assert!(matches!(
            decode_cells(&tiny(), 2, 1, 1.02),
            Err(GridError::DimensionMismatch { .. })
        ));

        let mut short = tiny();
        short.buffer.pop();
        assert!(matches!(
            decode_cells(&short, 1, 2, 1.02),
            Err(GridError::BufferSize { expected: 4, actual: 3 })
        ));

        let mut sentinel = tiny();
        sentinel.buffer[0] = 0.0;
        assert!(matches!(
            decode_cells(&sentinel, 1, 2, 1.02),
            Err(GridError::InvalidCellType(_))
        ));
    }

    #[test]
    fn test_decode_rejects_bad_masses() {
        for mass in [5.0, -0.1, f32::NAN, f32::INFINITY] {
            let mut data = tiny();
            data.buffer[1] = mass;
            assert!(
                matches!(
                    decode_cells(&data, 1, 2, 1.02),
                    Err(GridError::InvalidMass {
                        material: CellType::Water,
                        ..
                    })
                ),
                "mass {mass} accepted"
            );
        }

        // Fuel and density have no cap
        let mut fire = tiny();
        fire.buffer[0] = f32::from(CellType::Fire as u8);
        fire.buffer[1] = 5.0;
        assert!(decode_cells(&fire, 1, 2, 1.02).is_ok());
    }
}
