use crate::types::BitOrder;

/// Number of bytes needed to hold `bits` bits.
///
/// ```text
/// bits -> ceil(bits / 8)
/// ```
#[inline]
pub const fn bits_to_bytes(bits: usize) -> usize {
    bits.div_ceil(8)
}

const M1: u64 = 0x5555_5555_5555_5555;
const M2: u64 = 0x3333_3333_3333_3333;
const M4: u64 = 0x0f0f_0f0f_0f0f_0f0f;
const H01: u64 = 0x0101_0101_0101_0101;

/// Population count of a 64-bit word via the [SWAR][swar] reduction.
///
/// [swar]: https://en.wikipedia.org/wiki/Hamming_weight#Efficient_implementation
#[inline]
pub const fn popcount_swar(x: u64) -> u32 {
    let x = x - ((x >> 1) & M1);
    let x = (x & M2) + ((x >> 2) & M2);
    let x = (x + (x >> 4)) & M4;
    (x.wrapping_mul(H01) >> 56) as u32
}

const fn build_popcount_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 1;
    while i < 256 {
        table[i] = (i & 1) as u8 + table[i / 2];
        i += 1;
    }
    table
}

const fn build_reverse_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = (i as u8).reverse_bits();
        i += 1;
    }
    table
}

/// Number of set bits in each byte value.
pub static BYTE_POPCOUNT: [u8; 256] = build_popcount_table();

/// Each byte value with its bit order reversed.
pub static BYTE_REVERSE: [u8; 256] = build_reverse_table();

/// Mask of the meaningful bits of the last used byte of a vector of `nbits` bits.
///
/// All ones when `nbits` is a multiple of 8.
#[inline]
pub const fn tail_mask(nbits: usize, order: BitOrder) -> u8 {
    let r = nbits % 8;
    if r == 0 {
        return 0xff;
    }
    match order {
        BitOrder::Little => (1u8 << r) - 1,
        BitOrder::Big => !(0xffu8 >> r),
    }
}

/// Machine word used by the blocked kernels.
pub(crate) trait Word: Copy {
    const BYTES: usize;
    const ZERO: Self;
    const ONES: Self;

    /// Loads a word from the first `BYTES` bytes of `bytes`.
    fn load(bytes: &[u8]) -> Self;
    /// Stores the word into the first `BYTES` bytes of `bytes`.
    fn store(self, bytes: &mut [u8]);
    fn and(self, other: Self) -> Self;
    fn xor(self, other: Self) -> Self;
    fn weight(self) -> u64;
}

impl Word for u8 {
    const BYTES: usize = 1;
    const ZERO: Self = 0;
    const ONES: Self = u8::MAX;

    fn load(bytes: &[u8]) -> Self {
        bytes[0]
    }
    fn store(self, bytes: &mut [u8]) {
        bytes[0] = self;
    }
    fn and(self, other: Self) -> Self {
        self & other
    }
    fn xor(self, other: Self) -> Self {
        self ^ other
    }
    fn weight(self) -> u64 {
        BYTE_POPCOUNT[self as usize] as u64
    }
}

impl Word for u64 {
    const BYTES: usize = 8;
    const ZERO: Self = 0;
    const ONES: Self = u64::MAX;

    fn load(bytes: &[u8]) -> Self {
        let mut w = [0u8; 8];
        w.copy_from_slice(&bytes[..8]);
        u64::from_ne_bytes(w)
    }
    fn store(self, bytes: &mut [u8]) {
        bytes[..8].copy_from_slice(&self.to_ne_bytes());
    }
    fn and(self, other: Self) -> Self {
        self & other
    }
    fn xor(self, other: Self) -> Self {
        self ^ other
    }
    fn weight(self) -> u64 {
        popcount_swar(self) as u64
    }
}

impl Word for u128 {
    const BYTES: usize = 16;
    const ZERO: Self = 0;
    const ONES: Self = u128::MAX;

    fn load(bytes: &[u8]) -> Self {
        let mut w = [0u8; 16];
        w.copy_from_slice(&bytes[..16]);
        u128::from_ne_bytes(w)
    }
    fn store(self, bytes: &mut [u8]) {
        bytes[..16].copy_from_slice(&self.to_ne_bytes());
    }
    fn and(self, other: Self) -> Self {
        self & other
    }
    fn xor(self, other: Self) -> Self {
        self ^ other
    }
    fn weight(self) -> u64 {
        popcount_swar(self as u64) as u64 + popcount_swar((self >> 64) as u64) as u64
    }
}
