//! NDR encoding trait

use crate::{NdrWriter, Result};

/// Trait for types that can be encoded to NDR format
///
/// The lifetime ties the value to the writer: pointer bodies are queued as
/// deferred writes that borrow from the value until `write_deferred` runs.
pub trait NdrEncode {
    /// Encode this value at the writer's current position.
    ///
    /// Embedded pointers write only their referent ID here; their bodies are
    /// queued on the writer and emitted by the next `write_deferred`.
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()>;

    /// Get the NDR alignment requirement for this type
    ///
    /// This is the NDR20 value. Types that widen under NDR64 (referent IDs,
    /// `Uint3264`) still report 4, which is a lower bound on their wire size
    /// and is what `NdrReader::check_count` relies on.
    fn ndr_align() -> usize
    where
        Self: Sized,
    {
        1
    }
}
