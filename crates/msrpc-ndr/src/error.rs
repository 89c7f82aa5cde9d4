//! NDR error types

use thiserror::Error;

/// Default ceiling on any single element count read from the wire
pub const MAX_NDR_ARRAY_ELEMENTS: usize = 16 * 1024 * 1024;

/// NDR encoding/decoding errors
#[derive(Debug, Error)]
pub enum NdrError {
    /// Buffer underflow - not enough data
    #[error("buffer underflow: needed {needed} bytes, have {have}")]
    BufferUnderflow { needed: usize, have: usize },

    /// Declared count cannot fit in what is left of the buffer
    #[error("buffer/size mismatch: declared {declared} elements, {remaining} bytes remain")]
    SizeMismatch { declared: u64, remaining: usize },

    /// Declared count is above the configured element ceiling
    #[error("allocation limit exceeded: requested {requested}, limit {limit}")]
    AllocationLimitExceeded { requested: u64, limit: usize },

    /// Count does not fit in the wire field
    #[error("count {0} does not fit in a 32-bit NDR field")]
    CountOverflow(u64),

    /// Invalid pointer - referent ID used inconsistently or never resolved
    #[error("malformed referent: ID 0x{0:08x}")]
    MalformedReferent(u64),

    /// A pointer's referent was never decoded, so it cannot be encoded
    #[error("pointer referent is pending and has no value to encode")]
    PendingReferent,

    /// Array size mismatch
    #[error("array size mismatch: expected {expected}, got {got}")]
    ArraySizeMismatch { expected: usize, got: usize },

    /// Conformance mismatch
    #[error("conformance mismatch: max_count={max_count}, actual_count={actual_count}")]
    ConformanceMismatch { max_count: u64, actual_count: u64 },

    /// Alignment outside of {1, 2, 4, 8}
    #[error("invalid alignment: {0}")]
    InvalidAlignment(usize),

    /// Arithmetic on a wire count overflowed
    #[error("integer overflow in NDR size computation")]
    IntegerOverflow,

    /// Invalid discriminant for union
    #[error("invalid union discriminant: {0}")]
    InvalidDiscriminant(i64),

    /// Invalid enum value
    #[error("invalid enum value: {0}")]
    InvalidEnumValue(u32),

    /// A payload preparation hook rejected the payload
    #[error("payload hook failed: {0}")]
    Hook(String),
}

impl NdrError {
    /// True for errors caused by running out of input
    pub fn is_truncation(&self) -> bool {
        matches!(self, NdrError::BufferUnderflow { .. })
    }

    /// True for errors raised by the size sanity checks
    pub fn is_bounds_violation(&self) -> bool {
        matches!(
            self,
            NdrError::SizeMismatch { .. } | NdrError::AllocationLimitExceeded { .. }
        )
    }
}

/// Result type for NDR operations
pub type Result<T> = std::result::Result<T, NdrError>;
