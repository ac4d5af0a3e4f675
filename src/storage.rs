//! Storage core: buffer management, raw bit access and bit-range copies.
//!
//! The buffer of a [`BitVector`] is a `Vec<u8>` whose length is the allocated
//! capacity. Only the first `bits_to_bytes(len)` bytes are in use; the bits
//! past `len` in the last used byte are unspecified until cleared.

use std::cmp::min;

use log::{debug, warn};

use crate::bitvec::BitVector;
use crate::error::{BitError, Result};
use crate::types::{bit_position, AddressWidth};
use crate::utils::{bits_to_bytes, tail_mask};

/// Requests at or past this many bytes beyond the current size are allocated exactly.
const EXACT_GROWTH_BYTES: usize = 65536;

/// Validates a requested length against the address-space ceiling of `width`.
pub(crate) fn check_overflow(nbits: u64, width: AddressWidth) -> Result<usize> {
    if let Some(max) = width.max_bits() {
        if nbits > max {
            return Err(BitError::Overflow { requested: nbits, max });
        }
    }
    usize::try_from(nbits).map_err(|_| BitError::Overflow {
        requested: nbits,
        max: usize::MAX as u64,
    })
}

/// Allocates a zero-filled buffer of exactly `bytes` bytes.
pub(crate) fn allocate(bytes: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(bytes).map_err(|_| BitError::ResourceError { bytes })?;
    buf.resize(bytes, 0);
    Ok(buf)
}

/// Capacity chosen for a buffer that must hold `new_size` bytes.
fn grown_capacity(new_size: usize, old_size: usize) -> usize {
    if new_size == 0 {
        return 0;
    }
    if new_size >= old_size.saturating_add(EXACT_GROWTH_BYTES) {
        return new_size;
    }
    new_size + (new_size >> 4) + if new_size < 8 { 3 } else { 7 }
}

/// Proof of an outstanding buffer export.
///
/// While any export of a vector is alive, operations that change the vector's
/// length fail with [`BitError::BufferLocked`]. Hand the token back through
/// [`BitVector::release_buffer`] to lift the lock.
#[must_use = "an export keeps the vector locked until it is released"]
#[derive(Debug)]
pub struct BufferExport {
    _private: (),
}

impl BitVector {
    /// Number of bytes in use.
    pub fn used_bytes(&self) -> usize {
        bits_to_bytes(self.nbits)
    }
    /// Number of allocated bytes.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }
    /// Address-space ceiling this vector checks lengths against.
    pub fn address_width(&self) -> AddressWidth {
        self.width
    }
    /// Number of outstanding buffer exports.
    pub fn exports(&self) -> usize {
        self.exports
    }

    /// Raw used bytes, including unspecified bits past the end.
    pub fn as_raw_bytes(&self) -> &[u8] {
        &self.buf[..self.used_bytes()]
    }

    pub(crate) fn ensure_unlocked(&self) -> Result<()> {
        if self.exports > 0 {
            return Err(BitError::BufferLocked { exports: self.exports });
        }
        Ok(())
    }

    /// Registers a new export of the buffer.
    pub fn export_buffer(&mut self) -> BufferExport {
        self.exports += 1;
        debug!("export buffer: {} outstanding", self.exports);
        BufferExport { _private: () }
    }

    /// Releases an export obtained from [`export_buffer`][Self::export_buffer].
    pub fn release_buffer(&mut self, export: BufferExport) {
        let BufferExport { .. } = export;
        self.exports = self.exports.saturating_sub(1);
    }

    /// Used bytes of an exported buffer.
    pub fn exported(&self, _export: &BufferExport) -> &[u8] {
        self.as_raw_bytes()
    }

    /// Used bytes of an exported buffer, writable in place.
    pub fn exported_mut(&mut self, _export: &BufferExport) -> &mut [u8] {
        let n = self.used_bytes();
        &mut self.buf[..n]
    }

    /// Changes the length to `nbits`.
    ///
    /// Bits below `min(old, new)` are preserved; new bits are unspecified.
    pub fn resize(&mut self, nbits: usize) -> Result<()> {
        self.ensure_unlocked()?;
        self.resize_storage(nbits)
    }

    /// Resizes without the export check.
    ///
    /// The buffer is kept when it is large enough and not more than twice too
    /// large. Otherwise a new buffer is allocated, over-allocating small
    /// growth. A failed shrink keeps the old buffer.
    pub(crate) fn resize_storage(&mut self, nbits: usize) -> Result<()> {
        check_overflow(nbits as u64, self.width)?;

        let allocated = self.buf.len();
        let new_size = bits_to_bytes(nbits);
        if allocated >= new_size && new_size >= allocated >> 1 {
            self.nbits = nbits;
            return Ok(());
        }

        let old_size = self.used_bytes();
        let new_allocated = grown_capacity(new_size, old_size);
        match allocate(new_allocated) {
            Ok(mut buf) => {
                let keep = min(old_size, new_size);
                buf[..keep].copy_from_slice(&self.buf[..keep]);
                debug!("realloc: {} -> {} bytes for {} bits", allocated, new_allocated, nbits);
                self.buf = buf;
            }
            Err(e) if new_size <= allocated => {
                warn!("shrink to {} bytes failed, keeping {} bytes: {}", new_allocated, allocated, e);
            }
            Err(e) => return Err(e),
        }
        self.nbits = nbits;
        Ok(())
    }

    #[inline]
    pub(crate) fn get_bit(&self, index: usize) -> bool {
        debug_assert!(index < self.nbits, "bit {} out of {}", index, self.nbits);
        let (byte, mask) = bit_position(index, self.order);
        self.buf[byte] & mask != 0
    }

    #[inline]
    pub(crate) fn set_bit(&mut self, index: usize, value: bool) {
        debug_assert!(index < 8 * self.used_bytes(), "bit {} out of buffer", index);
        let (byte, mask) = bit_position(index, self.order);
        if value {
            self.buf[byte] |= mask;
        } else {
            self.buf[byte] &= !mask;
        }
    }

    /// Zeroes the bits past the end in the last used byte.
    ///
    /// Returns the number of such bits.
    pub(crate) fn clear_unused(&mut self) -> usize {
        let padding = 8 * self.used_bytes() - self.nbits;
        if padding > 0 {
            let last = self.used_bytes() - 1;
            self.buf[last] &= tail_mask(self.nbits, self.order);
        }
        padding
    }

    /// Copies `n` bits of `src` starting at `b` into `self` starting at `a`.
    pub(crate) fn copy_bits_from(&mut self, a: usize, src: &BitVector, b: usize, n: usize) {
        if n == 0 {
            return;
        }
        debug_assert!(a + n <= self.nbits && b + n <= src.nbits);
        if self.order == src.order && a % 8 == 0 && b % 8 == 0 && n >= 8 {
            let bytes = n / 8;
            self.buf[a / 8..a / 8 + bytes].copy_from_slice(&src.buf[b / 8..b / 8 + bytes]);
            for i in 8 * bytes..n {
                self.set_bit(a + i, src.get_bit(b + i));
            }
            return;
        }
        for i in 0..n {
            self.set_bit(a + i, src.get_bit(b + i));
        }
    }

    /// Copies `n` bits from position `b` to position `a`; the ranges may overlap.
    pub(crate) fn copy_bits_within(&mut self, a: usize, b: usize, n: usize) {
        if n == 0 || a == b {
            return;
        }
        debug_assert!(a + n <= self.nbits && b + n <= self.nbits);
        if a % 8 == 0 && b % 8 == 0 && n >= 8 {
            let bytes = n / 8;
            let bits = 8 * bytes;
            // The byte move may overwrite the source of the tail when moving up.
            if a < b {
                self.buf.copy_within(b / 8..b / 8 + bytes, a / 8);
                self.copy_bits_within(a + bits, b + bits, n - bits);
            } else {
                self.copy_bits_within(a + bits, b + bits, n - bits);
                self.buf.copy_within(b / 8..b / 8 + bytes, a / 8);
            }
            return;
        }
        if a < b {
            for i in 0..n {
                let bit = self.get_bit(b + i);
                self.set_bit(a + i, bit);
            }
        } else {
            for i in (0..n).rev() {
                let bit = self.get_bit(b + i);
                self.set_bit(a + i, bit);
            }
        }
    }

    /// Copies `n` bits of `src` starting at `src_start` over `self` starting at `dst_start`.
    pub fn copy_range(&mut self, dst_start: usize, src: &BitVector, src_start: usize, n: usize) -> Result<()> {
        check_range(dst_start, n, self.nbits)?;
        check_range(src_start, n, src.nbits)?;
        self.copy_bits_from(dst_start, src, src_start, n);
        Ok(())
    }

    /// Copies `n` bits of `self` from `src_start` to `dst_start`, like `memmove`.
    pub fn copy_range_within(&mut self, dst_start: usize, src_start: usize, n: usize) -> Result<()> {
        check_range(dst_start, n, self.nbits)?;
        check_range(src_start, n, self.nbits)?;
        self.copy_bits_within(dst_start, src_start, n);
        Ok(())
    }

    /// Removes `n` bits at `start`, shifting the rest down.
    pub(crate) fn delete_n(&mut self, start: usize, n: usize) -> Result<()> {
        debug_assert!(start + n <= self.nbits);
        if n == 0 {
            return Ok(());
        }
        self.copy_bits_within(start, start + n, self.nbits - start - n);
        self.resize_storage(self.nbits - n)
    }

    /// Opens a gap of `n` unspecified bits at `start`, shifting the rest up.
    pub(crate) fn insert_n(&mut self, start: usize, n: usize) -> Result<()> {
        debug_assert!(start <= self.nbits);
        if n == 0 {
            return Ok(());
        }
        let nbits = self.nbits;
        let total = nbits.checked_add(n).ok_or(BitError::Overflow {
            requested: u64::MAX,
            max: usize::MAX as u64,
        })?;
        self.resize_storage(total)?;
        self.copy_bits_within(start + n, start, nbits - start);
        Ok(())
    }

    /// Overwrites `self` with the bits of `src` in a single byte copy.
    ///
    /// Both vectors must have the same length and bit order.
    pub fn fast_copy(&mut self, src: &BitVector) -> Result<()> {
        if self.order != src.order {
            return Err(BitError::invalid("bit orders differ"));
        }
        if self.nbits != src.nbits {
            return Err(BitError::LengthMismatch {
                left: self.nbits,
                right: src.nbits,
            });
        }
        let n = self.used_bytes();
        self.buf[..n].copy_from_slice(&src.buf[..n]);
        Ok(())
    }
}

fn check_range(start: usize, n: usize, len: usize) -> Result<()> {
    match start.checked_add(n) {
        Some(end) if end <= len => Ok(()),
        _ => Err(BitError::OutOfRange {
            index: start.saturating_add(n) as isize,
            len,
        }),
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::types::BitOrder;

    fn bits(s: &str) -> BitVector {
        BitVector::from_01(s, BitOrder::Big).unwrap()
    }

    #[test]
    fn test_growth_curve() {
        let mut v = BitVector::new();
        let mut capacities = Vec::new();
        for n in 0..=800 {
            v.resize(n).unwrap();
            assert!(v.capacity() * 8 >= n);
            if capacities.last() != Some(&v.capacity()) {
                capacities.push(v.capacity());
            }
        }
        assert_eq!(&capacities[..10], &[0, 4, 8, 16, 25, 34, 44, 54, 65, 77]);
    }

    #[test]
    fn test_resize_hysteresis() {
        let mut v = BitVector::zeros(800, BitOrder::Big).unwrap();
        let cap = v.capacity();
        v.resize(8 * cap / 2 + 8).unwrap();
        assert_eq!(v.capacity(), cap);
        v.resize(8).unwrap();
        assert!(v.capacity() < cap);
        v.resize(0).unwrap();
        assert_eq!(v.capacity(), 0);
    }

    #[test]
    fn test_large_growth_is_exact() {
        let mut v = BitVector::new();
        v.resize(8 * 100_000).unwrap();
        assert_eq!(v.capacity(), 100_000);
    }

    #[test]
    fn test_resize_preserves_prefix() {
        let mut v = bits("1011001110");
        v.resize(4).unwrap();
        assert_eq!(v.to_01(), "1011");
        v.resize(3000).unwrap();
        assert_eq!(v.len(), 3000);
        let mut w = v.clone();
        w.resize(4).unwrap();
        assert_eq!(w.to_01(), "1011");
    }

    #[test]
    fn test_overflow_narrow() {
        let mut v = BitVector::with_width(BitOrder::Little, AddressWidth::Narrow);
        let err = v.resize_storage(usize::try_from(1u64 << 35).unwrap_or(usize::MAX));
        assert!(matches!(err, Err(BitError::Overflow { .. })));
        assert_eq!(v.len(), 0);
        assert!(check_overflow(1 << 34, AddressWidth::Narrow).is_ok());
        assert!(check_overflow((1 << 34) + 1, AddressWidth::Narrow).is_err());
    }

    #[test]
    fn test_export_lock() {
        let mut v = bits("10101");
        let export = v.export_buffer();
        assert_eq!(v.exports(), 1);
        assert_eq!(v.resize(10), Err(BitError::BufferLocked { exports: 1 }));
        assert_eq!(v.len(), 5);
        v.exported_mut(&export)[0] = 0xff;
        assert_eq!(v.to_01(), "11111");
        v.release_buffer(export);
        assert_eq!(v.exports(), 0);
        v.resize(10).unwrap();
        assert_eq!(v.len(), 10);
    }

    #[test]
    fn test_clear_unused() {
        let mut v = BitVector::zeros(3, BitOrder::Little).unwrap();
        v.buf[0] = 0xff;
        assert_eq!(v.clear_unused(), 5);
        assert_eq!(v.buf[0], 0b0000_0111);

        let mut v = BitVector::zeros(16, BitOrder::Big).unwrap();
        assert_eq!(v.clear_unused(), 0);
    }

    #[test]
    fn test_copy_within_overlapping() {
        let orig: Vec<bool> = (0..16).map(|i| i % 3 == 0).collect();
        let mut v = BitVector::from_bools(&orig, BitOrder::Big);
        v.copy_range_within(1, 0, 15).unwrap();
        assert_eq!(v.to_bools()[1..], orig[..15]);

        let mut v = BitVector::from_bools(&orig, BitOrder::Little);
        v.copy_range_within(0, 3, 13).unwrap();
        assert_eq!(v.to_bools()[..13], orig[3..]);
    }

    #[test]
    fn test_copy_within_aligned() {
        let src: Vec<bool> = (0..40).map(|i| i % 3 == 0 || i % 7 == 0).collect();
        let mut v = BitVector::from_bools(&src, BitOrder::Big);
        v.copy_range_within(8, 0, 29).unwrap();
        assert_eq!(v.to_bools()[8..37], src[..29]);

        let mut v = BitVector::from_bools(&src, BitOrder::Big);
        v.copy_range_within(0, 8, 29).unwrap();
        assert_eq!(v.to_bools()[..29], src[8..37]);
    }

    #[test]
    fn test_copy_range_across_orders() {
        let a = bits("110010111");
        let mut b = BitVector::zeros(12, BitOrder::Little).unwrap();
        b.copy_range(2, &a, 1, 8).unwrap();
        assert_eq!(b.to_01(), "001001011100");
        assert!(b.copy_range(5, &a, 0, 9).is_err());
    }

    #[test]
    fn test_insert_delete_n() {
        let mut v = bits("11110000");
        v.insert_n(4, 3).unwrap();
        assert_eq!(v.len(), 11);
        v.set_range(4, 7, true).unwrap();
        assert_eq!(v.to_01(), "11111110000");
        v.delete_n(0, 5).unwrap();
        assert_eq!(v.to_01(), "110000");
    }

    #[test]
    fn test_fast_copy() {
        let a = bits("1011");
        let mut b = BitVector::zeros(4, BitOrder::Big).unwrap();
        b.fast_copy(&a).unwrap();
        assert_eq!(a, b);

        let mut c = BitVector::zeros(4, BitOrder::Little).unwrap();
        assert!(c.fast_copy(&a).is_err());
        let mut d = BitVector::zeros(5, BitOrder::Big).unwrap();
        assert_eq!(d.fast_copy(&a), Err(BitError::LengthMismatch { left: 5, right: 4 }));
    }
}
