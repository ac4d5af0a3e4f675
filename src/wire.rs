//! Conversions between bit vectors and bytes or text.
//!
//! # Wire format
//!
//! A vector of `n` bits serializes as one header byte holding the number of
//! unused bits in the last byte (`0..=7`), followed by the used bytes with
//! the unused bits cleared. The empty vector serializes as the empty string.
//!
//! ```text
//! [8 * bytes(n) - n] [byte 0] [byte 1] ... [byte bytes(n) - 1]
//! ```

use std::str::FromStr;

use log::debug;

use crate::bitvec::BitVector;
use crate::error::{BitError, Result};
use crate::types::{AddressWidth, BitOrder};
use crate::utils::tail_mask;

fn parse_01(s: &str) -> Result<Vec<bool>> {
    s.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .map(|c| match c {
            '0' => Ok(false),
            '1' => Ok(true),
            _ => Err(BitError::invalid(format!("character must be '0' or '1', found '{}'", c))),
        })
        .collect()
}

impl BitVector {
    /// Parses a string of `'0'` and `'1'` characters.
    ///
    /// Whitespace and underscores are ignored.
    pub fn from_01(s: &str, order: BitOrder) -> Result<Self> {
        Ok(Self::from_bools(&parse_01(s)?, order))
    }

    /// Appends the bits spelled by a `'0'`/`'1'` string.
    pub fn extend_01(&mut self, s: &str) -> Result<()> {
        let bits = parse_01(s)?;
        self.extend_bools(bits)
    }

    /// Renders the bits as a `'0'`/`'1'` string.
    pub fn to_01(&self) -> String {
        self.iter().map(|b| if b { '1' } else { '0' }).collect()
    }

    /// Used bytes with the unused bits cleared.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.as_raw_bytes().to_vec();
        if let Some(last) = bytes.last_mut() {
            *last &= tail_mask(self.nbits, self.order);
        }
        bytes
    }

    /// Appends `8 * bytes.len()` bits read from `bytes`.
    ///
    /// The appended bits start right after the current last bit, whatever
    /// its alignment.
    pub fn extend_from_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_unlocked()?;
        if bytes.is_empty() {
            return Ok(());
        }
        let start = self.nbits;
        let padding = self.clear_unused();
        let aligned = start + padding;
        self.nbits = aligned;
        if let Err(e) = self.resize_storage(aligned + 8 * bytes.len()) {
            self.nbits = start;
            return Err(e);
        }
        let from = aligned / 8;
        self.buf[from..from + bytes.len()].copy_from_slice(bytes);
        self.delete_n(start, padding)
    }

    /// Serializes into the wire format.
    pub fn to_wire(&self) -> Vec<u8> {
        if self.is_empty() {
            return Vec::new();
        }
        let mut res = Vec::with_capacity(1 + self.used_bytes());
        res.push((8 * self.used_bytes() - self.nbits) as u8);
        res.extend_from_slice(&self.to_bytes());
        res
    }

    /// Deserializes the wire format.
    pub fn from_wire(bytes: &[u8], order: BitOrder) -> Result<Self> {
        Self::from_wire_in(bytes, order, AddressWidth::native())
    }

    /// Deserializes the wire format, checking the length against `width`.
    pub fn from_wire_in(bytes: &[u8], order: BitOrder, width: AddressWidth) -> Result<Self> {
        let Some((&unused, payload)) = bytes.split_first() else {
            return Ok(Self::with_width(order, width));
        };
        if unused >= 8 {
            return Err(BitError::invalid(format!(
                "first byte must be the number of unused bits (0..=7), found {}",
                unused
            )));
        }
        if payload.is_empty() && unused > 0 {
            return Err(BitError::invalid(format!("did not expect 0x0{} as single byte", unused)));
        }
        let nbits = 8 * payload.len() - unused as usize;
        let mut v = Self::zeros_in(nbits as u64, order, width)?;
        v.buf[..payload.len()].copy_from_slice(payload);
        debug!("from_wire: {} bits, {} unused", nbits, unused);
        Ok(v)
    }

    /// Creates a vector with one bit per byte: zero bytes become `0`, others `1`.
    pub fn pack(bytes: &[u8], order: BitOrder) -> Self {
        let bools: Vec<bool> = bytes.iter().map(|&b| b != 0).collect();
        Self::from_bools(&bools, order)
    }

    /// One byte per bit: `zero` for `0` bits and `one` for `1` bits.
    pub fn unpack(&self, zero: u8, one: u8) -> Vec<u8> {
        self.iter().map(|b| if b { one } else { zero }).collect()
    }
}

impl FromStr for BitVector {
    type Err = BitError;

    /// Parses a `'0'`/`'1'` string into a vector of the default bit order.
    fn from_str(s: &str) -> Result<Self> {
        Self::from_01(s, BitOrder::default())
    }
}
