//! Conformance (size) announcements
//!
//! NDR announces the maximum count of a conformant construct once, ahead of
//! the outermost structure that embeds it. A conformant structure nested
//! inside another therefore must not write its own sizes again; it consults
//! the ones its container already announced.
//!
//! The announced dimensions travel as an explicit [`SizeInfo`] argument
//! through [`NdrConformant`] so that every nesting level sees the same
//! values and sibling fields never share them by accident.

use crate::{NdrError, NdrReader, NdrWriter, Result};

/// Dimension counts announced for one conformant construct
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SizeInfo(Vec<u64>);

impl SizeInfo {
    pub fn new(dims: Vec<u64>) -> Self {
        Self(dims)
    }

    /// Single-dimension announcement
    pub fn single(count: u64) -> Self {
        Self(vec![count])
    }

    pub fn dims(&self) -> &[u64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Count for dimension `index`
    pub fn dim(&self, index: usize) -> Result<u64> {
        self.0.get(index).copied().ok_or(NdrError::ArraySizeMismatch {
            expected: index + 1,
            got: self.0.len(),
        })
    }

    /// Use `count` for a dimension that arrived as zero
    ///
    /// Some peers leave the conformance at zero while the sibling count
    /// field carries the real length.
    pub fn fill_missing(&mut self, index: usize, count: u64) {
        if let Some(dim) = self.0.get_mut(index) {
            if *dim == 0 && count > 0 {
                *dim = count;
            }
        }
    }

    /// Write every dimension as a size field
    pub fn write(&self, w: &mut NdrWriter<'_>) -> Result<()> {
        for dim in &self.0 {
            w.write_size(*dim)?;
        }
        Ok(())
    }

    /// Read `dims` size fields
    pub fn read(r: &mut NdrReader, dims: usize) -> Result<Self> {
        let mut sizes = Vec::with_capacity(dims);
        for _ in 0..dims {
            sizes.push(r.read_size()?);
        }
        Ok(Self(sizes))
    }
}

/// A construct whose size is announced ahead of it
pub trait NdrConformant: Sized {
    /// Dimensions this value would announce if it were outermost
    fn ndr_size_info(&self) -> SizeInfo;

    /// Number of size fields to read when decoding as outermost
    fn ndr_dimensions() -> usize {
        1
    }

    /// Encode the body using sizes announced by the caller
    fn ndr_encode_sized<'a>(&'a self, w: &mut NdrWriter<'a>, sizes: &SizeInfo) -> Result<()>;

    /// Decode the body using sizes the caller already read
    fn ndr_decode_sized(r: &mut NdrReader, sizes: &SizeInfo) -> Result<Self>;
}

/// Announce `value`'s sizes, then encode it
pub fn encode_conformant<'a, T: NdrConformant>(value: &'a T, w: &mut NdrWriter<'a>) -> Result<()> {
    let sizes = value.ndr_size_info();
    sizes.write(w)?;
    value.ndr_encode_sized(w, &sizes)
}

/// Read the announced sizes, then decode a `T` with them
pub fn decode_conformant<T: NdrConformant>(r: &mut NdrReader) -> Result<T> {
    let sizes = SizeInfo::read(r, T::ndr_dimensions())?;
    T::ndr_decode_sized(r, &sizes)
}
