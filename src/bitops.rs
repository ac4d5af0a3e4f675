//! Bitwise combination, population counts and searching.

use std::borrow::Cow;
use std::iter::FusedIterator;

use log::debug;

use crate::bitvec::BitVector;
use crate::error::{BitError, Result};
use crate::slice::normalize_index;
use crate::types::Op;
use crate::utils::{bits_to_bytes, popcount_swar, tail_mask, Word, BYTE_POPCOUNT};

/// Applies `op` in place over `dst` and `src`: 16-byte blocks, then 8-byte
/// words, then single bytes.
pub(crate) fn apply_bytes(dst: &mut [u8], src: &[u8], op: Op) {
    debug_assert_eq!(dst.len(), src.len());
    let i = apply_words::<u128>(dst, src, op, 0);
    let i = apply_words::<u64>(dst, src, op, i);
    apply_words::<u8>(dst, src, op, i);
}

fn apply_words<W>(dst: &mut [u8], src: &[u8], op: Op, mut i: usize) -> usize
where
    W: Word + std::ops::BitAnd<Output = W> + std::ops::BitOr<Output = W> + std::ops::BitXor<Output = W>,
{
    while i + W::BYTES <= dst.len() {
        let r = op.apply(W::load(&dst[i..]), W::load(&src[i..]));
        r.store(&mut dst[i..]);
        i += W::BYTES;
    }
    i
}

/// Weight of `a op b` over whole byte buffers, with the last byte masked by `tail`.
pub(crate) fn combined_weight(a: &[u8], b: &[u8], op: Op, tail: u8) -> u64 {
    debug_assert_eq!(a.len(), b.len());
    let size = a.len();
    if size == 0 {
        return 0;
    }
    let body = size - 1;
    let mut weight = 0u64;
    let mut i = 0;
    while i + 8 <= body {
        weight += op.apply(u64::load(&a[i..]), u64::load(&b[i..])).weight();
        i += 8;
    }
    while i < body {
        weight += BYTE_POPCOUNT[op.apply(a[i], b[i]) as usize] as u64;
        i += 1;
    }
    weight + BYTE_POPCOUNT[(op.apply(a[body], b[body]) & tail) as usize] as u64
}

impl BitVector {
    /// Combines `other` into `self` bit by bit.
    ///
    /// An operand of the other bit order is converted first.
    pub fn bitwise(&mut self, other: &BitVector, op: Op) -> Result<()> {
        self.same_len(other)?;
        let other = if other.order == self.order {
            Cow::Borrowed(other)
        } else {
            Cow::Owned(other.to_order(self.order))
        };
        let n = self.used_bytes();
        apply_bytes(&mut self.buf[..n], &other.buf[..n], op);
        self.clear_unused();
        Ok(())
    }

    pub fn and_assign(&mut self, other: &BitVector) -> Result<()> {
        self.bitwise(other, Op::And)
    }
    pub fn or_assign(&mut self, other: &BitVector) -> Result<()> {
        self.bitwise(other, Op::Or)
    }
    pub fn xor_assign(&mut self, other: &BitVector) -> Result<()> {
        self.bitwise(other, Op::Xor)
    }

    /// Number of bits equal to `value` in `start..stop`.
    ///
    /// Both endpoints are clamped like slice endpoints.
    pub fn count(&self, value: bool, start: isize, stop: isize) -> usize {
        let start = normalize_index(self.nbits, start);
        let stop = normalize_index(self.nbits, stop);
        self.count_range(value, start, stop)
    }

    pub fn count_ones(&self) -> usize {
        self.count_range(true, 0, self.nbits)
    }
    pub fn count_zeros(&self) -> usize {
        self.count_range(false, 0, self.nbits)
    }

    pub(crate) fn count_range(&self, value: bool, start: usize, stop: usize) -> usize {
        if start >= stop {
            return 0;
        }
        let ones = if stop - start >= 8 {
            let byte_start = bits_to_bytes(start);
            let byte_stop = stop / 8;
            let mut res = (start..8 * byte_start).filter(|&i| self.get_bit(i)).count();
            let mut j = byte_start;
            while j + 8 <= byte_stop {
                res += popcount_swar(u64::load(&self.buf[j..])) as usize;
                j += 8;
            }
            res += self.buf[j..byte_stop]
                .iter()
                .map(|&b| BYTE_POPCOUNT[b as usize] as usize)
                .sum::<usize>();
            res + (8 * byte_stop..stop).filter(|&i| self.get_bit(i)).count()
        } else {
            (start..stop).filter(|&i| self.get_bit(i)).count()
        };
        if value {
            ones
        } else {
            stop - start - ones
        }
    }

    /// Whether any bit is set.
    pub fn any(&self) -> bool {
        self.find_first_in(true, 0, self.nbits).is_some()
    }

    /// Whether all bits are set. True when empty.
    pub fn all(&self) -> bool {
        self.find_first_in(false, 0, self.nbits).is_none()
    }

    /// Position of the first bit equal to `value` in `start..stop`.
    pub fn find_first(&self, value: bool, start: isize, stop: isize) -> Option<usize> {
        let start = normalize_index(self.nbits, start);
        let stop = normalize_index(self.nbits, stop);
        self.find_first_in(value, start, stop)
    }

    /// Like [`find_first`](Self::find_first), failing when there is no match.
    pub fn index_of(&self, value: bool, start: isize, stop: isize) -> Result<usize> {
        self.find_first(value, start, stop)
            .ok_or_else(|| BitError::invalid(format!("{} not in bit vector", value as u8)))
    }

    pub(crate) fn find_first_in(&self, value: bool, start: usize, stop: usize) -> Option<usize> {
        if start >= stop {
            return None;
        }
        let mut from = start;
        if stop - start >= 8 {
            // Whole bytes holding no match are skipped.
            let skip = if value { 0x00 } else { 0xff };
            let last = bits_to_bytes(stop);
            let mut j = start / 8;
            while j < last && self.buf[j] == skip {
                j += 1;
            }
            from = from.max(8 * j);
        }
        (from..stop).find(|&i| self.get_bit(i) == value)
    }

    fn check_needle(needle: &BitVector) -> Result<()> {
        if needle.is_empty() {
            return Err(BitError::invalid("cannot search for an empty bit vector"));
        }
        Ok(())
    }

    fn matches_at(&self, needle: &BitVector, position: usize) -> bool {
        (0..needle.nbits).all(|i| self.get_bit(position + i) == needle.get_bit(i))
    }

    fn search_from(&self, needle: &BitVector, from: usize) -> Option<usize> {
        let (n, m) = (self.nbits, needle.nbits);
        if m > n {
            return None;
        }
        (from..=n - m).find(|&p| self.matches_at(needle, p))
    }

    /// Position of the first occurrence of `needle` at or after `from`.
    pub fn search(&self, needle: &BitVector, from: usize) -> Result<Option<usize>> {
        Self::check_needle(needle)?;
        Ok(self.search_from(needle, from))
    }

    /// Positions of occurrences of `needle`, overlapping ones included, up to `limit`.
    pub fn search_all(&self, needle: &BitVector, limit: Option<usize>) -> Result<Vec<usize>> {
        let iter = self.search_iter(needle)?;
        let res: Vec<usize> = match limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        };
        debug!("search_all: {} matches of {} bits", res.len(), needle.len());
        Ok(res)
    }

    /// Lazy iterator over positions of `needle`.
    pub fn search_iter<'a>(&'a self, needle: &'a BitVector) -> Result<SearchIter<'a>> {
        Self::check_needle(needle)?;
        Ok(SearchIter {
            haystack: self,
            needle,
            next: 0,
        })
    }

    /// Whether `needle` occurs in `self`.
    pub fn contains_bits(&self, needle: &BitVector) -> Result<bool> {
        Ok(self.search(needle, 0)?.is_some())
    }
}

/// Iterator over the positions of a needle in a bit vector.
#[derive(Debug, Clone)]
pub struct SearchIter<'a> {
    haystack: &'a BitVector,
    needle: &'a BitVector,
    next: usize,
}

impl Iterator for SearchIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        match self.haystack.search_from(self.needle, self.next) {
            Some(p) => {
                self.next = p + 1;
                Some(p)
            }
            None => {
                self.next = usize::MAX;
                None
            }
        }
    }
}

impl FusedIterator for SearchIter<'_> {}

/// Number of set bits in `a op b`, without materializing it.
///
/// Both vectors must be distinct, of equal length and of the same bit order.
pub fn combine_weight(a: &BitVector, b: &BitVector, op: Op) -> Result<u64> {
    if std::ptr::eq(a, b) {
        return Err(BitError::invalid("operands must be distinct bit vectors"));
    }
    a.same_len(b)?;
    if a.order != b.order {
        return Err(BitError::invalid("bit orders differ"));
    }
    let n = a.used_bytes();
    Ok(combined_weight(&a.buf[..n], &b.buf[..n], op, tail_mask(a.nbits, a.order)))
}

pub fn count_and(a: &BitVector, b: &BitVector) -> Result<u64> {
    combine_weight(a, b, Op::And)
}
pub fn count_or(a: &BitVector, b: &BitVector) -> Result<u64> {
    combine_weight(a, b, Op::Or)
}
pub fn count_xor(a: &BitVector, b: &BitVector) -> Result<u64> {
    combine_weight(a, b, Op::Xor)
}

/// Number of positions at which `a` and `b` differ.
pub fn bitdiff(a: &BitVector, b: &BitVector) -> Result<u64> {
    a.same_len(b)?;
    if std::ptr::eq(a, b) {
        return Ok(0);
    }
    if a.order != b.order {
        let b = b.to_order(a.order);
        return combine_weight(a, &b, Op::Xor);
    }
    combine_weight(a, b, Op::Xor)
}
