//! Boolean term evaluation over a basis of equal-length bit vectors.
//!
//! A *term* combines `d` distinct basis vectors with one Boolean operator;
//! its *weight* is the number of set bits in the result. [`TermSearch`]
//! enumerates every term of a given degree and keeps those whose weight
//! deviates most from a center value. [`Polynomial`]s are XORs of AND-terms,
//! evaluated in a blocked scan without materializing intermediate vectors.

use std::fmt;

use log::debug;

use crate::bitops::{apply_bytes, combined_weight};
use crate::bitvec::BitVector;
use crate::combination::{binomial, Combinations};
use crate::error::{BitError, Result};
use crate::heap::BoundedHeap;
use crate::types::{BitOrder, Op};
use crate::utils::{bits_to_bytes, tail_mask, Word};

/// Indexed set of equal-length, same-order bit vectors, possibly with holes.
#[derive(Debug, Clone)]
pub struct Basis<'a> {
    slots: Vec<Option<&'a BitVector>>,
    nbits: usize,
    order: BitOrder,
}

impl<'a> Basis<'a> {
    /// A basis with no holes.
    pub fn new(vectors: &'a [BitVector]) -> Result<Self> {
        Self::from_slots(vectors.iter().map(Some))
    }

    /// A basis where `None` marks an unusable slot.
    pub fn from_slots<I>(slots: I) -> Result<Self>
    where
        I: IntoIterator<Item = Option<&'a BitVector>>,
    {
        let slots: Vec<Option<&'a BitVector>> = slots.into_iter().collect();
        let mut present = slots.iter().flatten();
        let (nbits, order) = match present.next() {
            Some(first) => (first.len(), first.order()),
            None => (0, BitOrder::default()),
        };
        for v in present {
            if v.len() != nbits {
                return Err(BitError::LengthMismatch {
                    left: nbits,
                    right: v.len(),
                });
            }
            if v.order() != order {
                return Err(BitError::invalid("basis vectors must share one bit order"));
            }
        }
        Ok(Self { slots, nbits, order })
    }

    /// Number of slots, holes included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
    /// Length of every vector in the basis.
    pub fn bit_len(&self) -> usize {
        self.nbits
    }
    pub fn order(&self) -> BitOrder {
        self.order
    }

    pub fn get(&self, index: usize) -> Option<&'a BitVector> {
        self.slots.get(index).copied().flatten()
    }

    pub fn is_valid(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Whether the basis has no holes.
    pub fn is_dense(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Bit `i` set iff slot `i` holds a vector.
    pub fn validity(&self) -> BitVector {
        self.slots.iter().map(Option::is_some).collect()
    }

    fn vector(&self, index: usize) -> Result<&'a BitVector> {
        self.get(index)
            .ok_or_else(|| BitError::invalid(format!("basis slot {} is empty or out of range", index)))
    }

    fn dense(&self) -> Result<Vec<&'a BitVector>> {
        (0..self.len()).map(|i| self.vector(i)).collect()
    }

    /// Weights of `polynomials`, each evaluated over this basis.
    pub fn eval_polynomials_weight(&self, polynomials: &[Polynomial]) -> Result<Vec<u64>> {
        let resolved = polynomials
            .iter()
            .map(|p| self.resolve(p))
            .collect::<Result<Vec<_>>>()?;
        let size = bits_to_bytes(self.nbits);
        let mut weights = vec![0u64; polynomials.len()];
        if size == 0 {
            return Ok(weights);
        }
        // The last used byte is handled apart so its padding can be masked.
        let body = size - 1;
        let off = accumulate_weights::<u128>(&resolved, &mut weights, 0, body);
        let off = accumulate_weights::<u64>(&resolved, &mut weights, off, body);
        accumulate_weights::<u8>(&resolved, &mut weights, off, body);
        let tail = tail_mask(self.nbits, self.order);
        for (mono, w) in resolved.iter().zip(weights.iter_mut()) {
            *w += (eval_word::<u8>(mono, body) & tail).weight();
        }
        debug!("evaluated {} polynomials over {} bits", polynomials.len(), self.nbits);
        Ok(weights)
    }

    /// Weight of `polynomial` over this basis.
    pub fn eval_polynomial_weight(&self, polynomial: &Polynomial) -> Result<u64> {
        let weights = self.eval_polynomials_weight(std::slice::from_ref(polynomial))?;
        Ok(weights[0])
    }

    /// Materializes `polynomial` as a vector.
    pub fn eval_polynomial(&self, polynomial: &Polynomial) -> Result<BitVector> {
        let mono = self.resolve(polynomial)?;
        let mut res = BitVector::zeros(self.nbits, self.order)?;
        let size = res.used_bytes();
        let mut off = 0;
        while off + 8 <= size {
            eval_word::<u64>(&mono, off).store(&mut res.buf[off..]);
            off += 8;
        }
        while off < size {
            res.buf[off] = eval_word::<u8>(&mono, off);
            off += 1;
        }
        res.clear_unused();
        Ok(res)
    }

    fn resolve(&self, polynomial: &Polynomial) -> Result<Vec<Vec<&'a [u8]>>> {
        let size = bits_to_bytes(self.nbits);
        let mut res = Vec::with_capacity(polynomial.monomials.len());
        for m in &polynomial.monomials {
            let mut vectors = Vec::with_capacity(m.len());
            for &i in m {
                vectors.push(&self.vector(i)?.buf[..size]);
            }
            res.push(vectors);
        }
        Ok(res)
    }
}

/// XOR over monomials of the AND over their vectors, one word at `off`.
fn eval_word<W: Word>(monomials: &[Vec<&[u8]>], off: usize) -> W {
    monomials.iter().fold(W::ZERO, |acc, mono| {
        let term = mono.iter().fold(W::ONES, |t, v| t.and(W::load(&v[off..])));
        acc.xor(term)
    })
}

fn accumulate_weights<W: Word>(polys: &[Vec<Vec<&[u8]>>], weights: &mut [u64], mut off: usize, end: usize) -> usize {
    while off + W::BYTES <= end {
        for (mono, w) in polys.iter().zip(weights.iter_mut()) {
            *w += eval_word::<W>(mono, off).weight();
        }
        off += W::BYTES;
    }
    off
}

/// XOR of AND-monomials over basis indices.
///
/// An empty monomial is the constant one; an empty polynomial is the constant zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Polynomial {
    monomials: Vec<Vec<usize>>,
}

impl Polynomial {
    pub fn new(monomials: Vec<Vec<usize>>) -> Self {
        Self { monomials }
    }

    /// A single monomial.
    pub fn monomial(indices: impl IntoIterator<Item = usize>) -> Self {
        Self::new(vec![indices.into_iter().collect()])
    }

    /// Largest monomial size.
    pub fn degree(&self) -> usize {
        self.monomials.iter().map(Vec::len).max().unwrap_or(0)
    }
}

impl FromIterator<Vec<usize>> for Polynomial {
    fn from_iter<I: IntoIterator<Item = Vec<usize>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.monomials.is_empty() {
            return write!(f, "0");
        }
        for (i, m) in self.monomials.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            if m.is_empty() {
                write!(f, "1")?;
            }
            for (j, x) in m.iter().enumerate() {
                if j > 0 {
                    write!(f, "*")?;
                }
                write!(f, "x{}", x)?;
            }
        }
        Ok(())
    }
}

/// One evaluated term.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TermScore {
    /// `|weight - center|`.
    pub deviation: u64,
    pub weight: u64,
    /// Lexicographic rank of the term's index tuple.
    pub index: u64,
}

impl TermScore {
    /// The basis indices of this term.
    pub fn indices(&self, basis_len: usize, degree: usize) -> Result<Vec<usize>> {
        crate::combination::unrank(basis_len, degree, &self.index.into())
    }
}

/// Configuration of a top-`k` term search.
///
/// ```
/// use bitarray_rs::terms::{Basis, TermSearch};
/// use bitarray_rs::{BitOrder, BitVector, Op};
///
/// let vectors: Vec<BitVector> = ["1100", "1010", "0110"]
///     .iter()
///     .map(|s| BitVector::from_01(s, BitOrder::Big).unwrap())
///     .collect();
/// let basis = Basis::new(&vectors).unwrap();
///
/// let top = TermSearch::default().with_op(Op::Xor).with_top_k(1).run(&basis).unwrap();
/// assert_eq!(top[0].weight, 2);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TermSearch {
    pub degree: usize,
    pub op: Op,
    pub top_k: usize,
    pub weight_center: u64,
}

impl Default for TermSearch {
    fn default() -> Self {
        Self {
            degree: 2,
            op: Op::And,
            top_k: 128,
            weight_center: 0,
        }
    }
}

impl TermSearch {
    pub fn with_degree(mut self, degree: usize) -> Self {
        self.degree = degree;
        self
    }
    pub fn with_op(mut self, op: Op) -> Self {
        self.op = op;
        self
    }
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
    pub fn with_weight_center(mut self, center: u64) -> Self {
        self.weight_center = center;
        self
    }

    /// Evaluates every term of the configured degree over `basis`.
    ///
    /// Returns at most `top_k` terms with the greatest deviation, greatest
    /// first. Among terms of equal deviation, those enumerated first are
    /// kept and listed first.
    pub fn run(&self, basis: &Basis<'_>) -> Result<Vec<TermScore>> {
        let d = self.degree;
        let m = basis.len();
        if d < 2 {
            return Err(BitError::invalid("term degree must be at least 2"));
        }
        if d > m {
            return Err(BitError::invalid(format!("term degree {} exceeds basis size {}", d, m)));
        }
        let vectors = basis.dense()?;
        let size = bits_to_bytes(basis.bit_len());
        let tail = tail_mask(basis.bit_len(), basis.order());

        debug!(
            "term search: {} terms of degree {} ({}) over {} bits, top {}",
            binomial(m, d),
            d,
            self.op,
            basis.bit_len(),
            self.top_k
        );

        let mut heap = BoundedHeap::with_comparator(self.top_k, |a: &TermScore, b: &TermScore| a.deviation.cmp(&b.deviation));
        // prefix[l] holds the combination of the first `l + 1` vectors of the tuple.
        let mut prefix: Vec<Vec<u8>> = vec![vec![0; size]; d - 1];
        let mut tuples = Combinations::new(m, d)?;
        let mut dirty = 0;
        let mut index = 0u64;
        loop {
            let tuple = tuples.current();
            for level in dirty..d - 1 {
                let src = &vectors[tuple[level]].buf[..size];
                let (lower, upper) = prefix.split_at_mut(level);
                let dst = &mut upper[0];
                match lower.last() {
                    None => dst.copy_from_slice(src),
                    Some(prev) => {
                        dst.copy_from_slice(prev);
                        apply_bytes(dst, src, self.op);
                    }
                }
            }
            let last = &vectors[tuple[d - 1]].buf[..size];
            let weight = combined_weight(&prefix[d - 2], last, self.op, tail);
            heap.offer(TermScore {
                deviation: weight.abs_diff(self.weight_center),
                weight,
                index,
            });
            index += 1;
            match tuples.advance() {
                Some(p) => dirty = p,
                None => break,
            }
        }

        debug!("term search done: {} terms evaluated, {} kept", index, heap.len());
        let mut top = heap.into_vec();
        top.sort_by(|a, b| b.deviation.cmp(&a.deviation).then(a.index.cmp(&b.index)));
        Ok(top)
    }
}

impl BitVector {
    /// Replaces the contents with every `blocksize`-th bit of `data`, starting at `index`.
    ///
    /// Equivalent to slicing `data[index::blocksize]`.
    pub fn eval_monic(&mut self, data: &BitVector, index: usize, blocksize: usize) -> Result<()> {
        if blocksize == 0 {
            return Err(BitError::invalid("block size must be at least 1"));
        }
        if index >= blocksize {
            return Err(BitError::invalid(format!(
                "index {} must be less than block size {}",
                index, blocksize
            )));
        }
        let n = if index < data.len() {
            (data.len() - index).div_ceil(blocksize)
        } else {
            0
        };
        if n != self.nbits {
            self.resize(n)?;
        }
        for k in 0..n {
            self.set_bit(k, data.get_bit(index + k * blocksize));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::bitops::combine_weight;

    fn pattern(n: usize, order: BitOrder, f: impl Fn(usize) -> bool) -> BitVector {
        let bools: Vec<bool> = (0..n).map(f).collect();
        BitVector::from_bools(&bools, order)
    }

    fn sample_basis(m: usize, n: usize) -> Vec<BitVector> {
        (0..m)
            .map(|j| pattern(n, BitOrder::Little, |i| (i * (j + 3) + j * j) % (j + 2) == 0))
            .collect()
    }

    fn brute_force(vectors: &[BitVector], d: usize, op: Op) -> Vec<u64> {
        Combinations::new(vectors.len(), d)
            .unwrap()
            .map(|t| {
                let mut acc = vectors[t[0]].clone();
                for &i in &t[1..] {
                    acc.bitwise(&vectors[i], op).unwrap();
                }
                acc.count_ones() as u64
            })
            .collect()
    }

    #[test]
    fn test_basis_validation() {
        let a = pattern(10, BitOrder::Big, |i| i % 2 == 0);
        let b = pattern(11, BitOrder::Big, |i| i % 2 == 0);
        let c = pattern(10, BitOrder::Little, |i| i % 2 == 0);
        assert!(matches!(
            Basis::from_slots([Some(&a), Some(&b)]),
            Err(BitError::LengthMismatch { .. })
        ));
        assert!(matches!(
            Basis::from_slots([Some(&a), Some(&c)]),
            Err(BitError::InvalidArgument(_))
        ));

        let basis = Basis::from_slots([Some(&a), None, Some(&a)]).unwrap();
        assert_eq!(basis.len(), 3);
        assert!(!basis.is_dense());
        assert!(basis.is_valid(2));
        assert!(!basis.is_valid(1));
        assert!(!basis.is_valid(7));
        assert_eq!(basis.validity().to_01(), "101");
    }

    #[test]
    fn test_search_degree_2_and() {
        let vectors = sample_basis(6, 100);
        let basis = Basis::new(&vectors).unwrap();
        let top = TermSearch::default().with_top_k(100).run(&basis).unwrap();
        let expected = brute_force(&vectors, 2, Op::And);
        assert_eq!(top.len(), expected.len());
        for t in &top {
            assert_eq!(t.weight, expected[t.index as usize]);
            assert_eq!(t.deviation, t.weight);
        }
        assert!(top.windows(2).all(|w| w[0].deviation >= w[1].deviation));
    }

    #[test]
    fn test_search_degree_3_matches_brute_force() {
        let vectors = sample_basis(7, 77);
        let basis = Basis::new(&vectors).unwrap();
        for op in [Op::And, Op::Or, Op::Xor] {
            let top = TermSearch::default()
                .with_degree(3)
                .with_op(op)
                .with_top_k(1000)
                .run(&basis)
                .unwrap();
            let expected = brute_force(&vectors, 3, op);
            assert_eq!(top.len(), 35);
            for t in &top {
                assert_eq!(t.weight, expected[t.index as usize], "op {}, term {}", op, t.index);
            }
        }
    }

    #[test]
    fn test_search_prefix_reuse_degree_4() {
        let vectors = sample_basis(8, 130);
        let basis = Basis::new(&vectors).unwrap();
        let top = TermSearch::default()
            .with_degree(4)
            .with_op(Op::Xor)
            .with_top_k(100)
            .run(&basis)
            .unwrap();
        let expected = brute_force(&vectors, 4, Op::Xor);
        assert_eq!(top.len(), 70);
        for t in &top {
            assert_eq!(t.weight, expected[t.index as usize]);
        }
    }

    #[test]
    fn test_search_top_k_and_center() {
        let vectors = sample_basis(6, 64);
        let basis = Basis::new(&vectors).unwrap();
        let center = 16;
        let top = TermSearch::default()
            .with_weight_center(center)
            .with_top_k(3)
            .run(&basis)
            .unwrap();
        let mut deviations: Vec<u64> = brute_force(&vectors, 2, Op::And)
            .into_iter()
            .map(|w| w.abs_diff(center))
            .collect();
        deviations.sort_unstable_by(|a, b| b.cmp(a));
        let got: Vec<u64> = top.iter().map(|t| t.deviation).collect();
        assert_eq!(got, deviations[..3]);
    }

    #[test]
    fn test_search_errors() {
        let vectors = sample_basis(3, 16);
        let basis = Basis::new(&vectors).unwrap();
        assert!(TermSearch::default().with_degree(1).run(&basis).is_err());
        assert!(TermSearch::default().with_degree(4).run(&basis).is_err());

        let holey = Basis::from_slots([Some(&vectors[0]), None, Some(&vectors[2])]).unwrap();
        assert!(TermSearch::default().run(&holey).is_err());

        let none = TermSearch::default().with_top_k(0).run(&basis).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_term_indices() {
        let vectors = sample_basis(5, 20);
        let basis = Basis::new(&vectors).unwrap();
        let top = TermSearch::default().with_degree(3).with_top_k(10).run(&basis).unwrap();
        for t in &top {
            let idx = t.indices(5, 3).unwrap();
            let w = Polynomial::monomial(idx);
            assert_eq!(basis.eval_polynomial_weight(&w).unwrap(), t.weight);
        }
    }

    #[test]
    fn test_polynomial_weight() {
        for n in [0, 5, 8, 63, 64, 200] {
            let vectors = sample_basis(4, n);
            let basis = Basis::new(&vectors).unwrap();
            let p = Polynomial::new(vec![vec![0, 1], vec![2], vec![1, 2, 3]]);
            let expected = (0..n)
                .filter(|&i| {
                    let b = |j: usize| vectors[j].bit(i).unwrap();
                    (b(0) & b(1)) ^ b(2) ^ (b(1) & b(2) & b(3))
                })
                .count() as u64;
            assert_eq!(basis.eval_polynomial_weight(&p).unwrap(), expected, "n = {}", n);
            let v = basis.eval_polynomial(&p).unwrap();
            assert_eq!(v.count_ones() as u64, expected);
        }
    }

    #[test]
    fn test_polynomial_constants() {
        let vectors = sample_basis(2, 13);
        let basis = Basis::new(&vectors).unwrap();
        assert_eq!(basis.eval_polynomial_weight(&Polynomial::default()).unwrap(), 0);
        assert_eq!(basis.eval_polynomial_weight(&Polynomial::new(vec![vec![]])).unwrap(), 13);
        let v = basis.eval_polynomial(&Polynomial::new(vec![vec![]])).unwrap();
        assert!(v.all());
    }

    #[test]
    fn test_polynomials_batch() {
        let vectors = sample_basis(3, 150);
        let basis = Basis::new(&vectors).unwrap();
        let polys: Vec<Polynomial> = vec![Polynomial::monomial([0, 1]), Polynomial::monomial([2]), Polynomial::new(vec![vec![0], vec![1]])];
        let weights = basis.eval_polynomials_weight(&polys).unwrap();
        assert_eq!(weights[0], combine_weight(&vectors[0], &vectors[1], Op::And).unwrap());
        assert_eq!(weights[1], vectors[2].count_ones() as u64);
        assert_eq!(weights[2], combine_weight(&vectors[0], &vectors[1], Op::Xor).unwrap());
    }

    #[test]
    fn test_polynomial_holes() {
        let a = pattern(10, BitOrder::Big, |i| i < 5);
        let basis = Basis::from_slots([Some(&a), None]).unwrap();
        assert_eq!(basis.eval_polynomial_weight(&Polynomial::monomial([0])).unwrap(), 5);
        assert!(basis.eval_polynomial_weight(&Polynomial::monomial([1])).is_err());
        assert!(basis.eval_polynomial_weight(&Polynomial::monomial([9])).is_err());
    }

    #[test]
    fn test_polynomial_display() {
        let p = Polynomial::new(vec![vec![0, 2], vec![], vec![1]]);
        assert_eq!(p.to_string(), "x0*x2 + 1 + x1");
        assert_eq!(Polynomial::default().to_string(), "0");
        assert_eq!(p.degree(), 2);
    }

    #[test]
    fn test_eval_monic() {
        let data = BitVector::from_01("110100111", BitOrder::Big).unwrap();
        let mut out = BitVector::new();
        out.eval_monic(&data, 1, 3).unwrap();
        assert_eq!(out.to_01(), "101");
        out.eval_monic(&data, 0, 2).unwrap();
        assert_eq!(out.to_01(), "10011");
        assert!(out.eval_monic(&data, 3, 3).is_err());
        assert!(out.eval_monic(&data, 0, 0).is_err());
    }
}
