//! Error type shared by every bit vector operation.
//!
//! All errors are terminal for the call that raised them: a failed mutating
//! call leaves the vector in the state it had before the call.

use thiserror::Error;

/// Result type for bit vector operations.
pub type Result<T> = std::result::Result<T, BitError>;

/// Errors raised by bit vectors, prefix codes and term evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitError {
    /// Bad argument value (zero step, empty needle, degree out of range, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Binary operation on vectors of different lengths.
    #[error("bit vectors of equal length expected, got {left} and {right}")]
    LengthMismatch { left: usize, right: usize },

    /// Integer index outside of `[0, len)`.
    #[error("index {index} out of range for bit vector of length {len}")]
    OutOfRange { index: isize, len: usize },

    /// A codeword is a prefix of another one, or a codeword is duplicated.
    #[error("prefix code ambiguous")]
    AmbiguousCode,

    /// The data contains a bit sequence that no codeword starts with.
    #[error("prefix code does not match data at bit {position}")]
    CodeMismatch { position: usize },

    /// The data ends in the middle of a codeword.
    #[error("decoding not terminated at bit {position}")]
    TruncatedCode { position: usize },

    /// A symbol to encode has no codeword.
    #[error("symbol not defined in prefix code")]
    UnknownSymbol,

    /// The prefix code has no entries.
    #[error("prefix code is empty")]
    EmptyCode,

    /// A codeword has zero length.
    #[error("non-empty codeword expected")]
    InvalidCodeword,

    /// Allocation failure.
    #[error("failed to allocate {bytes} bytes")]
    ResourceError { bytes: usize },

    /// Requested length exceeds the address-space ceiling.
    #[error("cannot create bit vector of {requested} bits, max is {max}")]
    Overflow { requested: u64, max: u64 },

    /// Structural mutation while buffer exports are outstanding.
    #[error("cannot resize bit vector with {exports} exported buffer(s)")]
    BufferLocked { exports: usize },
}

impl BitError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        BitError::InvalidArgument(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = BitError::LengthMismatch { left: 3, right: 5 };
        assert_eq!(e.to_string(), "bit vectors of equal length expected, got 3 and 5");

        let e = BitError::invalid("slice step cannot be zero");
        assert_eq!(e.to_string(), "invalid argument: slice step cannot be zero");

        let e = BitError::Overflow {
            requested: 1 << 40,
            max: 1 << 34,
        };
        assert!(e.to_string().contains("17179869184"));
    }
}
