//! Index and slice access with negative indices and stepped slices.
//!
//! Indices are `isize`; negative values count from the end. Slices follow
//! the usual `start:stop:step` resolution: endpoints are clamped, a missing
//! endpoint defaults according to the sign of the step.

use log::debug;

use crate::bitvec::BitVector;
use crate::error::{BitError, Result};

/// Clamps a possibly negative index into `[0, len]`.
pub(crate) fn normalize_index(len: usize, index: isize) -> usize {
    if index < 0 {
        let i = index + len as isize;
        if i < 0 {
            0
        } else {
            i as usize
        }
    } else {
        (index as usize).min(len)
    }
}

/// Resolves a possibly negative index into `[0, len)`.
pub(crate) fn checked_index(len: usize, index: isize) -> Result<usize> {
    let i = if index < 0 { index + len as isize } else { index };
    if i < 0 || i as usize >= len {
        return Err(BitError::OutOfRange { index, len });
    }
    Ok(i as usize)
}

/// A `start:stop:step` slice with optional parts.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct SliceSpec {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: Option<isize>,
}

impl SliceSpec {
    /// The full slice `::`.
    pub const FULL: SliceSpec = SliceSpec {
        start: None,
        stop: None,
        step: None,
    };

    pub fn new(start: Option<isize>, stop: Option<isize>, step: Option<isize>) -> Self {
        Self { start, stop, step }
    }

    /// The unit-step slice `start:stop`.
    pub fn range(start: isize, stop: isize) -> Self {
        Self::new(Some(start), Some(stop), None)
    }

    /// The slice `::step`.
    pub fn step(step: isize) -> Self {
        Self::new(None, None, Some(step))
    }

    /// Resolves the slice against a sequence of length `len`.
    pub fn resolve(&self, len: usize) -> Result<ResolvedSlice> {
        let n = len as isize;
        let step = match self.step {
            None => 1,
            Some(0) => return Err(BitError::invalid("slice step cannot be zero")),
            Some(s) => s,
        };
        let negative = step < 0;

        let start = match self.start {
            None if negative => n - 1,
            None => 0,
            Some(s) => {
                let s = if s < 0 { s + n } else { s };
                if s < 0 {
                    if negative {
                        -1
                    } else {
                        0
                    }
                } else if s >= n {
                    if negative {
                        n - 1
                    } else {
                        n
                    }
                } else {
                    s
                }
            }
        };
        let stop = match self.stop {
            None if negative => -1,
            None => n,
            Some(s) => {
                let s = if s < 0 { s + n } else { s };
                if s < 0 {
                    -1
                } else {
                    s.min(n)
                }
            }
        };

        let count = if (negative && stop >= start) || (!negative && start >= stop) {
            0
        } else if negative {
            (stop - start + 1) / step + 1
        } else {
            (stop - start - 1) / step + 1
        };
        Ok(ResolvedSlice {
            start,
            stop,
            step,
            len: count as usize,
        })
    }
}

impl From<std::ops::Range<isize>> for SliceSpec {
    fn from(r: std::ops::Range<isize>) -> Self {
        SliceSpec::range(r.start, r.end)
    }
}

/// A slice resolved against a concrete length.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResolvedSlice {
    pub start: isize,
    pub stop: isize,
    pub step: isize,
    /// Number of selected positions.
    pub len: usize,
}

impl ResolvedSlice {
    /// The `k`-th selected position.
    pub fn position(&self, k: usize) -> usize {
        (self.start + k as isize * self.step) as usize
    }

    /// Selected positions, in slice order.
    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).map(move |k| self.position(k))
    }

    /// The same positions visited in ascending order with a positive step.
    fn ascending(&self) -> ResolvedSlice {
        if self.step > 0 || self.len == 0 {
            return *self;
        }
        let step = -self.step;
        let start = self.start + self.step * (self.len as isize - 1);
        ResolvedSlice {
            start,
            stop: self.start + 1,
            step,
            len: self.len,
        }
    }
}

/// Value assigned to a slice.
#[derive(Debug, Copy, Clone)]
pub enum SliceValue<'a> {
    /// Every selected bit is set to this value.
    Bit(bool),
    /// The selected bits are replaced by these bits.
    Bits(&'a BitVector),
}

impl From<bool> for SliceValue<'_> {
    fn from(b: bool) -> Self {
        SliceValue::Bit(b)
    }
}

impl<'a> From<&'a BitVector> for SliceValue<'a> {
    fn from(v: &'a BitVector) -> Self {
        SliceValue::Bits(v)
    }
}

impl BitVector {
    /// Returns bit `index`; negative indices count from the end.
    pub fn get(&self, index: isize) -> Result<bool> {
        let i = checked_index(self.nbits, index)?;
        Ok(self.get_bit(i))
    }

    /// Sets bit `index`; negative indices count from the end.
    pub fn set(&mut self, index: isize, value: bool) -> Result<()> {
        let i = checked_index(self.nbits, index)?;
        self.set_bit(i, value);
        Ok(())
    }

    /// Copies the selected bits into a new vector of the same order.
    pub fn get_slice(&self, slice: impl Into<SliceSpec>) -> Result<BitVector> {
        let s = slice.into().resolve(self.nbits)?;
        let mut res = BitVector::zeros_in(s.len as u64, self.order, self.width)?;
        if s.step == 1 {
            res.copy_bits_from(0, self, s.start as usize, s.len);
        } else {
            for (k, i) in s.positions().enumerate() {
                res.set_bit(k, self.get_bit(i));
            }
        }
        Ok(res)
    }

    /// Assigns to the selected bits.
    ///
    /// A single bit is broadcast to every selected position. A vector must
    /// have as many bits as the slice selects, except for unit-step slices,
    /// which grow or shrink to fit it.
    pub fn set_slice<'a>(&mut self, slice: impl Into<SliceSpec>, value: impl Into<SliceValue<'a>>) -> Result<()> {
        let s = slice.into().resolve(self.nbits)?;
        match value.into() {
            SliceValue::Bit(b) => {
                if s.step == 1 {
                    self.set_range(s.start as usize, s.start as usize + s.len, b)?;
                } else {
                    for i in s.positions() {
                        self.set_bit(i, b);
                    }
                }
                Ok(())
            }
            SliceValue::Bits(other) => self.assign_slice(s, other),
        }
    }

    fn assign_slice(&mut self, s: ResolvedSlice, other: &BitVector) -> Result<()> {
        if other.nbits == s.len {
            if s.step == 1 {
                self.copy_bits_from(s.start as usize, other, 0, s.len);
            } else {
                for (k, i) in s.positions().enumerate() {
                    self.set_bit(i, other.get_bit(k));
                }
            }
            return Ok(());
        }
        if s.step != 1 {
            return Err(BitError::invalid(format!(
                "attempt to assign sequence of size {} to extended slice of size {}",
                other.nbits, s.len
            )));
        }
        self.ensure_unlocked()?;
        let start = s.start as usize;
        debug!("slice assignment resizes {} bits to {}", s.len, other.nbits);
        if other.nbits > s.len {
            self.insert_n(start, other.nbits - s.len)?;
        } else {
            self.delete_n(start, s.len - other.nbits)?;
        }
        self.copy_bits_from(start, other, 0, other.nbits);
        Ok(())
    }

    /// Removes bit `index`.
    pub fn delete(&mut self, index: isize) -> Result<()> {
        self.ensure_unlocked()?;
        let i = checked_index(self.nbits, index)?;
        self.delete_n(i, 1)
    }

    /// Removes the selected bits, keeping the rest in order.
    pub fn delete_slice(&mut self, slice: impl Into<SliceSpec>) -> Result<()> {
        self.ensure_unlocked()?;
        let s = slice.into().resolve(self.nbits)?.ascending();
        if s.len == 0 {
            return Ok(());
        }
        let start = s.start as usize;
        if s.step == 1 {
            return self.delete_n(start, s.len);
        }
        let stop = s.position(s.len - 1) + 1;
        let step = s.step as usize;
        let mut j = start;
        for i in start..self.nbits {
            if i >= stop || (i - start) % step != 0 {
                let bit = self.get_bit(i);
                self.set_bit(j, bit);
                j += 1;
            }
        }
        self.resize_storage(self.nbits - s.len)
    }

    /// Inserts `value` before position `index`, clamped into `[0, len]`.
    pub fn insert(&mut self, index: isize, value: bool) -> Result<()> {
        self.ensure_unlocked()?;
        let i = normalize_index(self.nbits, index);
        self.insert_n(i, 1)?;
        self.set_bit(i, value);
        Ok(())
    }

    /// Removes and returns bit `index`.
    pub fn pop(&mut self, index: isize) -> Result<bool> {
        self.ensure_unlocked()?;
        let i = checked_index(self.nbits, index)?;
        let bit = self.get_bit(i);
        self.delete_n(i, 1)?;
        Ok(bit)
    }

    /// Removes and returns the last bit, or `None` when empty.
    pub fn pop_last(&mut self) -> Result<Option<bool>> {
        if self.is_empty() {
            return Ok(None);
        }
        self.pop(-1).map(Some)
    }

    /// Removes the first occurrence of `value`.
    pub fn remove(&mut self, value: bool) -> Result<()> {
        self.ensure_unlocked()?;
        match self.find_first(value, 0, self.nbits as isize) {
            Some(i) => self.delete_n(i, 1),
            None => Err(BitError::invalid(format!("remove: {} not in bit vector", value as u8))),
        }
    }
}
