//! Bounded min-heap keeping the `k` greatest items seen.

use std::cmp::Ordering;

const PREALLOCATE_MAX: usize = 1024;

#[inline]
fn parent(i: usize) -> usize {
    (i - 1) / 2
}
#[inline]
fn left(i: usize) -> usize {
    2 * i + 1
}
#[inline]
fn right(i: usize) -> usize {
    2 * i + 2
}

/// A min-heap of at most `capacity` items under the comparator `C`.
///
/// The root is the least item kept. Once full, an offered item replaces the
/// root only if it is strictly greater, so among equal items the earliest
/// offered ones are kept.
pub struct BoundedHeap<T, C = fn(&T, &T) -> Ordering> {
    items: Vec<T>,
    capacity: usize,
    cmp: C,
}

impl<T: Ord> BoundedHeap<T> {
    pub fn new(capacity: usize) -> Self {
        Self::with_comparator(capacity, T::cmp)
    }
}

impl<T, C> BoundedHeap<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    pub fn with_comparator(capacity: usize, cmp: C) -> Self {
        Self {
            items: Vec::with_capacity(capacity.min(PREALLOCATE_MAX)),
            capacity,
            cmp,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The least item kept.
    pub fn peek(&self) -> Option<&T> {
        self.items.first()
    }

    /// Offers an item; returns whether it was kept.
    pub fn offer(&mut self, item: T) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if self.items.len() < self.capacity {
            self.items.push(item);
            self.sift_up(self.items.len() - 1);
            return true;
        }
        if (self.cmp)(&item, &self.items[0]) != Ordering::Greater {
            return false;
        }
        self.items[0] = item;
        self.sift_down(0);
        true
    }

    fn less(&self, i: usize, j: usize) -> bool {
        (self.cmp)(&self.items[i], &self.items[j]) == Ordering::Less
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let p = parent(i);
            if !self.less(i, p) {
                break;
            }
            self.items.swap(i, p);
            i = p;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let n = self.items.len();
        loop {
            let (l, r) = (left(i), right(i));
            let mut least = i;
            if l < n && self.less(l, least) {
                least = l;
            }
            if r < n && self.less(r, least) {
                least = r;
            }
            if least == i {
                break;
            }
            self.items.swap(i, least);
            i = least;
        }
    }

    /// Items in heap order, root first.
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }

    /// Items sorted from greatest to least.
    pub fn into_sorted_vec(self) -> Vec<T> {
        let Self { mut items, cmp, .. } = self;
        items.sort_by(|a, b| cmp(b, a));
        items
    }
}
