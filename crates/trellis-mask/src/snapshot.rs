//! 1-bit-per-pixel snapshots of a [`Raster`].
//!
//! Bits are packed MSB-first along the row-major cell order: cell `i` lives
//! in byte `i / 8` at bit `7 - i % 8`. The final byte is zero-padded.

use crate::error::{MaskError, Result};
use crate::raster::Raster;

/// Bytes needed to pack `cells` cells.
pub fn packed_len(cells: usize) -> usize {
    cells.div_ceil(8)
}

/// Pack cells to bits; any nonzero cell becomes 1.
pub fn pack_bits(cells: &[u8]) -> Vec<u8> {
    let mut bits = vec![0u8; packed_len(cells.len())];
    for (i, &cell) in cells.iter().enumerate() {
        if cell != 0 {
            bits[i / 8] |= 0x80 >> (i % 8);
        }
    }
    bits
}

/// Unpack exactly `width * height` cells as 0/1.
pub fn unpack_bits(bits: &[u8], width: usize, height: usize) -> Result<Raster> {
    let cells = checked_cells(width, height)?;
    check_len(bits, width, height, cells)?;
    Ok(expand(bits, width, height, cells, 1))
}

fn checked_cells(width: usize, height: usize) -> Result<usize> {
    width
        .checked_mul(height)
        .ok_or(MaskError::InvalidDimensions { width, height })
}

fn check_len(bits: &[u8], width: usize, height: usize, cells: usize) -> Result<()> {
    let expected = packed_len(cells);
    if bits.len() != expected {
        return Err(MaskError::DimensionMismatch {
            width,
            height,
            expected,
            actual: bits.len(),
        });
    }
    Ok(())
}

fn expand(bits: &[u8], width: usize, height: usize, cells: usize, on: u8) -> Raster {
    let data = (0..cells)
        .map(|i| {
            if bits[i / 8] & (0x80 >> (i % 8)) != 0 {
                on
            } else {
                0
            }
        })
        .collect();
    Raster::from_raw(width, height, data)
}

/// One entry of the undo history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedSnapshot {
    width: usize,
    height: usize,
    bits: Vec<u8>,
}

impl PackedSnapshot {
    pub fn pack(raster: &Raster) -> Self {
        Self {
            width: raster.width(),
            height: raster.height(),
            bits: pack_bits(raster.as_bytes()),
        }
    }

    /// Rebuild a snapshot from stored parts, validating the byte count.
    pub fn from_parts(width: usize, height: usize, bits: Vec<u8>) -> Result<Self> {
        let cells = checked_cells(width, height)?;
        check_len(&bits, width, height, cells)?;
        Ok(Self {
            width,
            height,
            bits,
        })
    }

    /// Cells as 0/1.
    pub fn unpack(&self) -> Raster {
        self.unpack_with(1)
    }

    /// Cells as 0/`on`.
    pub fn unpack_with(&self, on: u8) -> Raster {
        expand(
            &self.bits,
            self.width,
            self.height,
            self.width * self.height,
            on,
        )
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    pub fn byte_len(&self) -> usize {
        self.bits.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msb_first() {
        assert_eq!(pack_bits(&[255, 0, 0, 0, 0, 0, 0, 1]), vec![0b1000_0001]);
        assert_eq!(pack_bits(&[0, 7, 0]), vec![0b0100_0000]);
        assert!(pack_bits(&[]).is_empty());
    }

    #[test]
    fn test_pads_final_byte() {
        let raster = Raster::filled(5, 5, 255);
        let snap = PackedSnapshot::pack(&raster);
        assert_eq!(snap.byte_len(), 4);
        assert_eq!(snap.as_bytes()[3], 0b1000_0000);
    }

    #[test]
    fn test_unpack_with_value() {
        let raster = Raster::from_vec(3, 1, vec![0, 200, 1]).unwrap();
        let snap = PackedSnapshot::pack(&raster);
        assert_eq!(snap.unpack().as_bytes(), &[0, 1, 1]);
        assert_eq!(snap.unpack_with(255).as_bytes(), &[0, 255, 255]);
    }

    #[test]
    fn test_length_is_validated() {
        assert!(unpack_bits(&[0, 0], 3, 3).is_ok());
        assert!(matches!(
            unpack_bits(&[0], 3, 3),
            Err(MaskError::DimensionMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
        assert!(PackedSnapshot::from_parts(4, 4, vec![0; 3]).is_err());
        assert!(PackedSnapshot::from_parts(4, 4, vec![0; 2]).is_ok());
    }
}
