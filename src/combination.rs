//! Lexicographic enumeration of `k`-subsets of `0..n`.
//!
//! Tuples are strictly increasing index sequences. The enumerator advances
//! like an odometer and reports the leftmost changed position, so callers can
//! reuse work done for the unchanged prefix.

use num_bigint::BigUint;

use crate::error::{BitError, Result};

/// Odometer over all strictly increasing `k`-tuples of `0..n`.
///
/// ```text
/// n = 4, k = 2:  01 02 03 12 13 23
/// ```
#[derive(Debug, Clone)]
pub struct Combinations {
    current: Vec<usize>,
    n: usize,
    pending: bool,
    exhausted: bool,
}

impl Combinations {
    /// Starts at `0, 1, ..., k - 1`. Requires `1 <= k <= n`.
    pub fn new(n: usize, k: usize) -> Result<Self> {
        if k == 0 || k > n {
            return Err(BitError::invalid(format!("cannot choose {} out of {}", k, n)));
        }
        Ok(Self {
            current: (0..k).collect(),
            n,
            pending: true,
            exhausted: false,
        })
    }

    /// The current tuple.
    pub fn current(&self) -> &[usize] {
        &self.current
    }

    /// Moves to the next tuple.
    ///
    /// Returns the leftmost position whose index changed, or `None` once all
    /// tuples have been produced.
    pub fn advance(&mut self) -> Option<usize> {
        self.pending = false;
        if self.exhausted {
            return None;
        }
        let k = self.current.len();
        let Some(p) = (0..k).rev().find(|&p| self.current[p] < self.n - k + p) else {
            self.exhausted = true;
            return None;
        };
        self.current[p] += 1;
        for j in p + 1..k {
            self.current[j] = self.current[j - 1] + 1;
        }
        Some(p)
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        if self.pending {
            self.pending = false;
            return Some(self.current.clone());
        }
        self.advance()?;
        Some(self.current.clone())
    }
}

/// Number of `k`-subsets of an `n`-set.
pub fn binomial(n: usize, k: usize) -> BigUint {
    if k > n {
        return BigUint::ZERO;
    }
    let k = k.min(n - k);
    let mut res = BigUint::from(1u32);
    for i in 0..k {
        res = res * (n - i) / (i + 1);
    }
    res
}

/// Lexicographic rank of a strictly increasing tuple among all tuples of its size.
pub fn rank(n: usize, tuple: &[usize]) -> Result<BigUint> {
    let k = tuple.len();
    if tuple.windows(2).any(|w| w[0] >= w[1]) || tuple.last().is_some_and(|&x| x >= n) {
        return Err(BitError::invalid("tuple must be strictly increasing and below n"));
    }
    let mut res = BigUint::ZERO;
    let mut from = 0;
    for (slot, &x) in tuple.iter().enumerate() {
        for skipped in from..x {
            res += binomial(n - skipped - 1, k - slot - 1);
        }
        from = x + 1;
    }
    Ok(res)
}

/// The tuple of lexicographic rank `index` among the `k`-subsets of `0..n`.
pub fn unrank(n: usize, k: usize, index: &BigUint) -> Result<Vec<usize>> {
    if *index >= binomial(n, k) {
        return Err(BitError::invalid(format!("rank {} out of range for C({}, {})", index, n, k)));
    }
    let mut rest = index.clone();
    let mut res = Vec::with_capacity(k);
    let mut next = 0;
    for slot in 0..k {
        loop {
            let c = binomial(n - next - 1, k - slot - 1);
            if rest < c {
                res.push(next);
                next += 1;
                break;
            }
            rest -= c;
            next += 1;
        }
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_enumeration_order() {
        let all: Vec<Vec<usize>> = Combinations::new(4, 2).unwrap().collect();
        assert_eq!(all, vec![vec![0, 1], vec![0, 2], vec![0, 3], vec![1, 2], vec![1, 3], vec![2, 3]]);

        let all: Vec<Vec<usize>> = Combinations::new(3, 3).unwrap().collect();
        assert_eq!(all, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_advance_reports_changed_position() {
        let mut c = Combinations::new(4, 3).unwrap();
        assert_eq!(c.current(), &[0, 1, 2]);
        assert_eq!(c.advance(), Some(2));
        assert_eq!(c.current(), &[0, 1, 3]);
        assert_eq!(c.advance(), Some(1));
        assert_eq!(c.current(), &[0, 2, 3]);
        assert_eq!(c.advance(), Some(0));
        assert_eq!(c.current(), &[1, 2, 3]);
        assert_eq!(c.advance(), None);
        assert_eq!(c.advance(), None);
    }

    #[test]
    fn test_invalid() {
        assert!(Combinations::new(3, 0).is_err());
        assert!(Combinations::new(3, 4).is_err());
    }

    #[test]
    fn test_binomial() {
        assert_eq!(binomial(5, 2), BigUint::from(10u32));
        assert_eq!(binomial(10, 0), BigUint::from(1u32));
        assert_eq!(binomial(3, 4), BigUint::ZERO);
        assert_eq!(binomial(64, 32), BigUint::from(1_832_624_140_942_590_534u64));
    }

    #[test]
    fn test_rank_unrank() {
        for (i, tuple) in Combinations::new(7, 3).unwrap().enumerate() {
            let r = rank(7, &tuple).unwrap();
            assert_eq!(r, BigUint::from(i));
            assert_eq!(unrank(7, 3, &r).unwrap(), tuple);
        }
        assert!(unrank(7, 3, &BigUint::from(35u32)).is_err());
        assert!(rank(5, &[2, 1]).is_err());
        assert!(rank(5, &[1, 5]).is_err());
    }
}
