//! Lazy operator expressions over borrowed bit vectors.
//!
//! `&a & &b` builds an expression instead of a new vector. Evaluate it with
//! [`Eval::eval`], or count its set bits with [`Eval::weight`] without
//! materializing the result.

use std::ops::{BitAnd, BitOr, BitXor, Not};

use crate::bitops::combine_weight;
use crate::bitvec::BitVector;
use crate::error::Result;
use crate::types::Op;

pub struct BitAndOp<'a> {
    f: &'a BitVector,
    g: &'a BitVector,
}

impl<'a> BitAnd for &'a BitVector {
    type Output = BitAndOp<'a>;

    fn bitand(self, rhs: Self) -> Self::Output {
        BitAndOp { f: self, g: rhs }
    }
}

pub struct BitOrOp<'a> {
    f: &'a BitVector,
    g: &'a BitVector,
}

impl<'a> BitOr for &'a BitVector {
    type Output = BitOrOp<'a>;

    fn bitor(self, rhs: Self) -> Self::Output {
        BitOrOp { f: self, g: rhs }
    }
}

pub struct BitXorOp<'a> {
    f: &'a BitVector,
    g: &'a BitVector,
}

impl<'a> BitXor for &'a BitVector {
    type Output = BitXorOp<'a>;

    fn bitxor(self, rhs: Self) -> Self::Output {
        BitXorOp { f: self, g: rhs }
    }
}

pub struct BitNotOp<'a> {
    f: &'a BitVector,
}

impl<'a> Not for &'a BitVector {
    type Output = BitNotOp<'a>;

    fn not(self) -> Self::Output {
        BitNotOp { f: self }
    }
}

pub trait Eval {
    /// Computes the expression into a new vector of the left operand's order.
    fn eval(&self) -> Result<BitVector>;

    /// Number of set bits in the result.
    fn weight(&self) -> Result<u64>;
}

impl Eval for BitVector {
    fn eval(&self) -> Result<BitVector> {
        Ok(self.clone())
    }
    fn weight(&self) -> Result<u64> {
        Ok(self.count_ones() as u64)
    }
}

fn eval_binary(f: &BitVector, g: &BitVector, op: Op) -> Result<BitVector> {
    let mut res = f.clone();
    res.bitwise(g, op)?;
    Ok(res)
}

fn weight_binary(f: &BitVector, g: &BitVector, op: Op) -> Result<u64> {
    if std::ptr::eq(f, g) {
        // x & x == x | x == x, x ^ x == 0
        return Ok(match op {
            Op::And | Op::Or => f.count_ones() as u64,
            Op::Xor => 0,
        });
    }
    if f.order() != g.order() {
        return combine_weight(f, &g.to_order(f.order()), op);
    }
    combine_weight(f, g, op)
}

impl Eval for BitAndOp<'_> {
    fn eval(&self) -> Result<BitVector> {
        eval_binary(self.f, self.g, Op::And)
    }
    fn weight(&self) -> Result<u64> {
        weight_binary(self.f, self.g, Op::And)
    }
}

impl Eval for BitOrOp<'_> {
    fn eval(&self) -> Result<BitVector> {
        eval_binary(self.f, self.g, Op::Or)
    }
    fn weight(&self) -> Result<u64> {
        weight_binary(self.f, self.g, Op::Or)
    }
}

impl Eval for BitXorOp<'_> {
    fn eval(&self) -> Result<BitVector> {
        eval_binary(self.f, self.g, Op::Xor)
    }
    fn weight(&self) -> Result<u64> {
        weight_binary(self.f, self.g, Op::Xor)
    }
}

impl Eval for BitNotOp<'_> {
    fn eval(&self) -> Result<BitVector> {
        let mut res = self.f.clone();
        res.invert();
        Ok(res)
    }
    fn weight(&self) -> Result<u64> {
        Ok(self.f.count_zeros() as u64)
    }
}
