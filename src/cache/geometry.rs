// Copyright (c) 2024 Mudit Bhargava
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//

// geometry.rs
//
// Cache geometry: the three log2 exponents that describe a set-associative
// cache, and the pure address decoder derived from them.

use crate::errors::SimulatorError;

/// A cache's shape, expressed as log2 exponents: `c` total capacity, `b`
/// block size, `s` associativity (ways per set).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub c: u32,
    pub b: u32,
    pub s: u32,
    pub ways: u64,
    pub lines: u64,
    pub sets: u64,
    pub index_bits: u32,
}

impl Geometry {
    /// Builds a geometry, rejecting configurations with zero ways or zero sets.
    pub fn new(c: u32, b: u32, s: u32) -> Result<Self, SimulatorError> {
        let b_plus_s = b.checked_add(s).ok_or_else(|| SimulatorError::InvalidGeometry {
            reason: format!("b ({}) + s ({}) overflows", b, s),
        })?;
        if b_plus_s > c {
            return Err(SimulatorError::InvalidGeometry {
                reason: format!("b + s ({}) exceeds c ({})", b_plus_s, c),
            });
        }

        let ways = 1u64 << s;
        let lines = 1u64 << (c - b);
        let sets = lines / ways;
        let index_bits = c - b - s;

        if ways == 0 || sets == 0 {
            return Err(SimulatorError::InvalidGeometry {
                reason: "geometry yields zero ways or zero sets".to_string(),
            });
        }

        Ok(Self { c, b, s, ways, lines, sets, index_bits })
    }

    /// Splits a 64-bit address into `(tag, set_index)`, discarding the
    /// block offset. Full-width shifts only; no 32-bit truncation.
    pub fn decode(&self, address: u64) -> (u64, u64) {
        let index_mask = mask(self.index_bits);
        let index = (address >> self.b) & index_mask;
        let tag = address >> (self.b + self.index_bits);
        (tag, index)
    }

    /// Reconstructs the block-aligned address of a line given its tag and
    /// the set it lives in.
    pub fn block_address(&self, tag: u64, set_index: u64) -> u64 {
        let masked_index = set_index & mask(self.index_bits);
        (tag << (self.b + self.index_bits)) | (masked_index << self.b)
    }

    /// The way-major offset of way `w` within the flat line array (way `w`
    /// of set `i` lives at `w * sets + i`).
    pub fn line_offset(&self, way: u64, set_index: u64) -> usize {
        (way * self.sets + set_index) as usize
    }
}

/// Bits `0..bits` set, half-open.
fn mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_oversized_associativity() {
        assert!(Geometry::new(3, 2, 2).is_err());
    }

    #[test]
    fn rejects_overflowing_exponents_without_panicking() {
        assert!(Geometry::new(10, u32::MAX, u32::MAX).is_err());
    }

    #[test]
    fn direct_mapped_decode() {
        // C=3,B=1,S=0 -> 4 lines, 4 sets, 1 way, 2-byte blocks.
        let g = Geometry::new(3, 1, 0).unwrap();
        assert_eq!(g.ways, 1);
        assert_eq!(g.lines, 4);
        assert_eq!(g.sets, 4);
        assert_eq!(g.index_bits, 2);

        let (tag, index) = g.decode(0x00);
        assert_eq!((tag, index), (0, 0));

        let (tag, index) = g.decode(0x08);
        assert_eq!((tag, index), (1, 0));
    }

    #[test]
    fn block_address_roundtrip() {
        let g = Geometry::new(3, 1, 0).unwrap();
        let (tag, index) = g.decode(0x08);
        assert_eq!(g.block_address(tag, index), 0x08);
    }

    #[test]
    fn two_way_decode_shares_set() {
        // C=4,B=1,S=1 -> 8 lines, 4 sets, 2 ways.
        let g = Geometry::new(4, 1, 1).unwrap();
        assert_eq!(g.sets, 4);
        let (_, idx_a) = g.decode(0x00);
        let (_, idx_b) = g.decode(0x08);
        assert_eq!(idx_a, idx_b);
    }
}
