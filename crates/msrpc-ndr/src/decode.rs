//! NDR decoding trait

use crate::{NdrReader, Result};

/// Trait for types that can be decoded from NDR format
pub trait NdrDecode: Sized {
    /// Decode a value at the reader's current position.
    ///
    /// Embedded pointers come back as pending referents which are filled in
    /// when the reader's deferred queue is drained by `read_deferred`.
    fn ndr_decode(r: &mut NdrReader) -> Result<Self>;

    /// Get the NDR alignment requirement for this type
    ///
    /// This is the NDR20 value. Types that widen under NDR64 (referent IDs,
    /// `Uint3264`) still report 4, which is a lower bound on their wire size
    /// and is what `NdrReader::check_count` relies on.
    fn ndr_align() -> usize {
        1
    }
}
