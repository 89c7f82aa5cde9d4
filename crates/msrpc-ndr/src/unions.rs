//! Discriminated unions
//!
//! An encapsulated union carries its discriminant on the wire right before
//! the selected arm. A non-encapsulated union takes its discriminant from a
//! sibling field, so only the arm is written; generated code calls
//! [`NdrUnion::ndr_encode_arm`] and [`NdrUnion::ndr_decode_arm`] directly for
//! those.

use crate::{NdrReader, NdrWriter, Result};

/// A union whose arm is selected by an `i32` discriminant
pub trait NdrUnion: Sized {
    /// Discriminant of the arm this value holds
    fn ndr_switch_value(&self) -> i32;

    /// Alignment of the largest arm; applied only under NDR64
    fn ndr_union_align() -> usize {
        1
    }

    /// Encode the selected arm without the discriminant
    fn ndr_encode_arm<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()>;

    /// Decode the arm selected by `switch`
    ///
    /// Unknown discriminants should fail with
    /// [`NdrError::InvalidDiscriminant`](crate::NdrError::InvalidDiscriminant)
    /// unless the union declares a default arm.
    fn ndr_decode_arm(r: &mut NdrReader, switch: i32) -> Result<Self>;
}

/// Encode an encapsulated union: discriminant, then arm
pub fn encode_union<'a, U: NdrUnion>(value: &'a U, w: &mut NdrWriter<'a>) -> Result<()> {
    let align = U::ndr_union_align();
    w.write_union_align(align)?;
    w.write_switch(value.ndr_switch_value())?;
    w.write_union_align(align)?;
    value.ndr_encode_arm(w)
}

/// Decode an encapsulated union
pub fn decode_union<U: NdrUnion>(r: &mut NdrReader) -> Result<U> {
    let align = U::ndr_union_align();
    r.read_union_align(align)?;
    let switch = r.read_switch()?;
    r.read_union_align(align)?;
    U::ndr_decode_arm(r, switch)
}
