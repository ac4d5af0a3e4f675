//! The packed bit vector.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FusedIterator;

use log::debug;

use crate::error::{BitError, Result};
use crate::storage::{allocate, check_overflow};
use crate::types::{AddressWidth, BitOrder};
use crate::utils::{bits_to_bytes, tail_mask, BYTE_REVERSE};

/// A growable sequence of bits packed eight to a byte.
///
/// # Invariants
///
/// - `bits_to_bytes(len) <= capacity`
/// - The bit order never changes after construction
/// - Bits past `len` in the last used byte carry no meaning and are cleared
///   before any operation that exposes whole bytes
pub struct BitVector {
    pub(crate) buf: Vec<u8>,
    pub(crate) nbits: usize,
    pub(crate) order: BitOrder,
    pub(crate) width: AddressWidth,
    pub(crate) exports: usize,
}

impl BitVector {
    /// Creates an empty vector with the default bit order.
    pub fn new() -> Self {
        Self::with_order(BitOrder::default())
    }

    /// Creates an empty vector with the given bit order.
    pub fn with_order(order: BitOrder) -> Self {
        Self::with_width(order, AddressWidth::native())
    }

    /// Creates an empty vector that checks lengths against `width`.
    pub fn with_width(order: BitOrder, width: AddressWidth) -> Self {
        Self {
            buf: Vec::new(),
            nbits: 0,
            order,
            width,
            exports: 0,
        }
    }

    /// Creates a vector of `nbits` zero bits.
    pub fn zeros(nbits: usize, order: BitOrder) -> Result<Self> {
        Self::zeros_in(nbits as u64, order, AddressWidth::native())
    }

    /// Creates a vector of `nbits` zero bits, checking the length against `width`.
    pub fn zeros_in(nbits: u64, order: BitOrder, width: AddressWidth) -> Result<Self> {
        let nbits = check_overflow(nbits, width)?;
        let buf = allocate(bits_to_bytes(nbits))?;
        Ok(Self {
            buf,
            nbits,
            order,
            width,
            exports: 0,
        })
    }

    /// Creates a vector of `nbits` one bits.
    pub fn ones(nbits: usize, order: BitOrder) -> Result<Self> {
        let mut v = Self::zeros(nbits, order)?;
        v.setall(true);
        Ok(v)
    }

    /// Creates a vector holding the given bits.
    pub fn from_bools(bits: &[bool], order: BitOrder) -> Self {
        let mut v = Self {
            buf: vec![0; bits_to_bytes(bits.len())],
            nbits: bits.len(),
            order,
            width: AddressWidth::native(),
            exports: 0,
        };
        for (i, &b) in bits.iter().enumerate() {
            v.set_bit(i, b);
        }
        v
    }

    /// Creates a vector of `8 * bytes.len()` bits over a copy of `bytes`.
    pub fn from_bytes(bytes: &[u8], order: BitOrder) -> Self {
        Self {
            buf: bytes.to_vec(),
            nbits: 8 * bytes.len(),
            order,
            width: AddressWidth::native(),
            exports: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.nbits
    }
    pub fn is_empty(&self) -> bool {
        self.nbits == 0
    }
    pub fn order(&self) -> BitOrder {
        self.order
    }

    /// Returns bit `index`, or `None` past the end.
    pub fn bit(&self, index: usize) -> Option<bool> {
        (index < self.nbits).then(|| self.get_bit(index))
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            vec: self,
            front: 0,
            back: self.nbits,
        }
    }

    pub fn to_bools(&self) -> Vec<bool> {
        self.iter().collect()
    }

    /// A copy with the same bits stored under `order`.
    pub fn to_order(&self, order: BitOrder) -> BitVector {
        let mut v = self.clone();
        if order != self.order {
            let n = v.used_bytes();
            for b in &mut v.buf[..n] {
                *b = BYTE_REVERSE[*b as usize];
            }
            v.order = order;
        }
        v
    }

    /// A copy of the same bytes read under `order`.
    ///
    /// Unlike [`to_order`][Self::to_order], the bit values change when the
    /// orders differ.
    pub fn reinterpret(&self, order: BitOrder) -> BitVector {
        let mut v = self.clone();
        v.order = order;
        v
    }

    /// Appends one bit.
    pub fn append(&mut self, value: bool) -> Result<()> {
        self.ensure_unlocked()?;
        self.resize_storage(self.nbits + 1)?;
        self.set_bit(self.nbits - 1, value);
        Ok(())
    }

    /// Appends all bits of `other`.
    pub fn extend(&mut self, other: &BitVector) -> Result<()> {
        self.ensure_unlocked()?;
        let start = self.nbits;
        self.resize_storage(start + other.nbits)?;
        self.copy_bits_from(start, other, 0, other.nbits);
        Ok(())
    }

    /// Appends the given bits.
    pub fn extend_bools<I>(&mut self, bits: I) -> Result<()>
    where
        I: IntoIterator<Item = bool>,
    {
        self.ensure_unlocked()?;
        let bits: Vec<bool> = bits.into_iter().collect();
        let start = self.nbits;
        self.resize_storage(start + bits.len())?;
        for (i, b) in bits.into_iter().enumerate() {
            self.set_bit(start + i, b);
        }
        Ok(())
    }

    /// Sets every bit to `value`.
    pub fn setall(&mut self, value: bool) {
        let n = self.used_bytes();
        self.buf[..n].fill(if value { 0xff } else { 0x00 });
    }

    /// Flips every bit.
    pub fn invert(&mut self) {
        let n = self.used_bytes();
        for b in &mut self.buf[..n] {
            *b = !*b;
        }
    }

    /// Sets bits `start..stop` to `value`.
    pub fn set_range(&mut self, start: usize, stop: usize, value: bool) -> Result<()> {
        if stop > self.nbits {
            return Err(BitError::OutOfRange {
                index: stop as isize,
                len: self.nbits,
            });
        }
        self.fill_range(start, stop, value);
        Ok(())
    }

    fn fill_range(&mut self, start: usize, stop: usize, value: bool) {
        debug_assert!(stop <= self.nbits);
        if start >= stop {
            return;
        }
        if stop - start >= 8 {
            let byte_start = bits_to_bytes(start);
            let byte_stop = stop / 8;
            for i in start..8 * byte_start {
                self.set_bit(i, value);
            }
            self.buf[byte_start..byte_stop].fill(if value { 0xff } else { 0x00 });
            for i in 8 * byte_stop..stop {
                self.set_bit(i, value);
            }
        } else {
            for i in start..stop {
                self.set_bit(i, value);
            }
        }
    }

    /// Extends the length to a multiple of 8 with zero bits.
    ///
    /// Returns the number of bits added. The buffer is not reallocated.
    pub fn fill(&mut self) -> usize {
        let padding = self.clear_unused();
        self.nbits += padding;
        padding
    }

    /// Sorts the bits: zeros first, or ones first when `reverse` is set.
    pub fn sort(&mut self, reverse: bool) {
        let ones = self.count_ones();
        let n = self.nbits;
        let split = if reverse { ones } else { n - ones };
        self.fill_range(0, split, reverse);
        self.fill_range(split, n, !reverse);
    }

    /// Reverses the order of the bits.
    pub fn reverse(&mut self) {
        let n = self.nbits;
        for i in 0..n / 2 {
            let (a, b) = (self.get_bit(i), self.get_bit(n - 1 - i));
            self.set_bit(i, b);
            self.set_bit(n - 1 - i, a);
        }
    }

    /// Reverses the bit order inside every used byte.
    ///
    /// Bits past the end are cleared first, so they may become visible as
    /// zeros when the length is not a multiple of 8.
    pub fn bytereverse(&mut self) {
        self.clear_unused();
        let n = self.used_bytes();
        for b in &mut self.buf[..n] {
            *b = BYTE_REVERSE[*b as usize];
        }
    }

    /// Replaces the contents with `times` concatenated copies.
    ///
    /// A non-positive count empties the vector.
    pub fn repeat(&mut self, times: isize) -> Result<()> {
        self.ensure_unlocked()?;
        if times <= 0 {
            return self.resize_storage(0);
        }
        let times = times as usize;
        if times == 1 || self.nbits == 0 {
            return Ok(());
        }
        let n = self.nbits;
        let total = n.checked_mul(times).ok_or(BitError::Overflow {
            requested: (n as u64).saturating_mul(times as u64),
            max: usize::MAX as u64,
        })?;
        debug!("repeat {} bits {} times", n, times);
        self.resize_storage(total)?;
        for i in 1..times {
            self.copy_bits_within(i * n, 0, n);
        }
        Ok(())
    }

    /// Checks that `other` has the same length, returning it.
    pub(crate) fn same_len(&self, other: &BitVector) -> Result<usize> {
        if self.nbits != other.nbits {
            return Err(BitError::LengthMismatch {
                left: self.nbits,
                right: other.nbits,
            });
        }
        Ok(self.nbits)
    }
}

impl Default for BitVector {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for BitVector {
    /// Copies the used bytes only; the clone has no exports.
    fn clone(&self) -> Self {
        Self {
            buf: self.buf[..self.used_bytes()].to_vec(),
            nbits: self.nbits,
            order: self.order,
            width: self.width,
            exports: 0,
        }
    }
}

impl PartialEq for BitVector {
    fn eq(&self, other: &Self) -> bool {
        if self.nbits != other.nbits {
            return false;
        }
        if self.order != other.order {
            return (0..self.nbits).all(|i| self.get_bit(i) == other.get_bit(i));
        }
        let n = self.used_bytes();
        if n == 0 {
            return true;
        }
        let mask = tail_mask(self.nbits, self.order);
        self.buf[..n - 1] == other.buf[..n - 1] && (self.buf[n - 1] ^ other.buf[n - 1]) & mask == 0
    }
}

impl Eq for BitVector {}

impl PartialOrd for BitVector {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BitVector {
    /// Lexicographic on bits, then by length.
    fn cmp(&self, other: &Self) -> Ordering {
        let n = self.nbits.min(other.nbits);
        (0..n)
            .map(|i| self.get_bit(i).cmp(&other.get_bit(i)))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| self.nbits.cmp(&other.nbits))
    }
}

impl Hash for BitVector {
    /// Hashes the bits in big-endian byte form, so equal vectors of
    /// different orders hash alike.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.nbits.hash(state);
        let n = self.used_bytes();
        for (i, &b) in self.buf[..n].iter().enumerate() {
            let mut b = match self.order {
                BitOrder::Big => b,
                BitOrder::Little => BYTE_REVERSE[b as usize],
            };
            if i == n - 1 {
                b &= tail_mask(self.nbits, BitOrder::Big);
            }
            state.write_u8(b);
        }
    }
}

impl fmt::Display for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.iter() {
            f.write_str(if b { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitVector({}, '{}')", self.order, self)
    }
}

impl FromIterator<bool> for BitVector {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let bits: Vec<bool> = iter.into_iter().collect();
        Self::from_bools(&bits, BitOrder::default())
    }
}

impl<'a> IntoIterator for &'a BitVector {
    type Item = bool;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the bits of a [`BitVector`].
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    vec: &'a BitVector,
    front: usize,
    back: usize,
}

impl Iterator for Iter<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let b = self.vec.get_bit(self.front);
        self.front += 1;
        Some(b)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.vec.get_bit(self.back))
    }
}

impl ExactSizeIterator for Iter<'_> {}
impl FusedIterator for Iter<'_> {}
