//! Small value types carried by every bit vector.
//!
//! The bit order and the address-space ceiling are explicit per-vector state
//! rather than global configuration, so two vectors with different settings
//! can coexist and every operation sees the settings of its own operands.
use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor};
use std::str::FromStr;

use crate::error::BitError;

/// Order of bits inside a byte.
///
/// # Invariants
///
/// - Fixed at construction of a vector
/// - Copied by value on slicing and cloning
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum BitOrder {
    /// Bit 0 of a byte is its least-significant bit.
    Little,
    /// Bit 0 of a byte is its most-significant bit.
    #[default]
    Big,
}

impl BitOrder {
    /// Returns `"little"` or `"big"`.
    pub fn as_str(self) -> &'static str {
        match self {
            BitOrder::Little => "little",
            BitOrder::Big => "big",
        }
    }
}

impl fmt::Display for BitOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BitOrder {
    type Err = BitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "little" => Ok(BitOrder::Little),
            "big" => Ok(BitOrder::Big),
            _ => Err(BitError::invalid("bit order must be 'little' or 'big'")),
        }
    }
}

/// Byte offset and mask addressing bit `index` under `order`.
///
/// ```text
/// little: (index / 8, 1 << (index % 8))
/// big:    (index / 8, 1 << (7 - index % 8))
/// ```
#[inline]
pub const fn bit_position(index: usize, order: BitOrder) -> (usize, u8) {
    let shift = match order {
        BitOrder::Little => index % 8,
        BitOrder::Big => 7 - index % 8,
    };
    (index / 8, 1u8 << shift)
}

/// Address-space ceiling applied to requested lengths.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AddressWidth {
    /// 32-bit address space: at most 2^34 bits.
    Narrow,
    /// 64-bit address space: bounded only by `usize`.
    Wide,
}

impl AddressWidth {
    /// Largest length accepted on a narrow address space.
    pub const NARROW_MAX_BITS: u64 = 1 << 34;

    /// The width of the target this crate is compiled for.
    pub const fn native() -> Self {
        if cfg!(target_pointer_width = "32") {
            AddressWidth::Narrow
        } else {
            AddressWidth::Wide
        }
    }

    /// Maximal number of bits, if this width imposes an explicit ceiling.
    pub const fn max_bits(self) -> Option<u64> {
        match self {
            AddressWidth::Narrow => Some(Self::NARROW_MAX_BITS),
            AddressWidth::Wide => None,
        }
    }
}

impl Default for AddressWidth {
    fn default() -> Self {
        Self::native()
    }
}

/// Binary Boolean operator applied bitwise.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Op {
    And,
    Or,
    Xor,
}

impl Op {
    /// Applies the operator to two words of any width.
    #[inline]
    pub fn apply<T>(self, a: T, b: T) -> T
    where
        T: BitAnd<Output = T> + BitOr<Output = T> + BitXor<Output = T>,
    {
        match self {
            Op::And => a & b,
            Op::Or => a | b,
            Op::Xor => a ^ b,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Op::And => "and",
            Op::Or => "or",
            Op::Xor => "xor",
        };
        f.write_str(s)
    }
}

impl FromStr for Op {
    type Err = BitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "and" | "&" => Ok(Op::And),
            "or" | "|" => Ok(Op::Or),
            "xor" | "^" => Ok(Op::Xor),
            _ => Err(BitError::invalid(format!("unknown operator '{}'", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_position() {
        assert_eq!(bit_position(0, BitOrder::Little), (0, 0b0000_0001));
        assert_eq!(bit_position(0, BitOrder::Big), (0, 0b1000_0000));
        assert_eq!(bit_position(7, BitOrder::Little), (0, 0b1000_0000));
        assert_eq!(bit_position(7, BitOrder::Big), (0, 0b0000_0001));
        assert_eq!(bit_position(10, BitOrder::Little), (1, 0b0000_0100));
        assert_eq!(bit_position(10, BitOrder::Big), (1, 0b0010_0000));
    }

    #[test]
    fn test_order_parse() {
        assert_eq!("little".parse::<BitOrder>(), Ok(BitOrder::Little));
        assert_eq!("big".parse::<BitOrder>(), Ok(BitOrder::Big));
        assert!("middle".parse::<BitOrder>().is_err());
        assert_eq!(BitOrder::default().to_string(), "big");
    }

    #[test]
    fn test_address_width() {
        assert_eq!(AddressWidth::Narrow.max_bits(), Some(1 << 34));
        assert_eq!(AddressWidth::Wide.max_bits(), None);
    }

    #[test]
    fn test_op_apply() {
        assert_eq!(Op::And.apply(0b1100u8, 0b1010), 0b1000);
        assert_eq!(Op::Or.apply(0b1100u8, 0b1010), 0b1110);
        assert_eq!(Op::Xor.apply(0b1100u64, 0b1010), 0b0110);
        assert_eq!("XOR".parse::<Op>(), Ok(Op::Xor));
    }
}
