//! NDR array types
//!
//! Four array shapes exist on the wire. A fixed array carries only its
//! elements. A conformant array is preceded by its maximum count. A varying
//! array carries an offset and an actual count in front of the elements it
//! transmits, and a conformant varying array carries all three.
//!
//! Every count read from the wire goes through `NdrReader::check_count`
//! before a container is allocated for it.

use std::marker::PhantomData;

use crate::sizes::{decode_conformant, encode_conformant, NdrConformant, SizeInfo};
use crate::{NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter, Result};

fn encode_elements<'a, T: NdrEncode>(elements: &'a [T], w: &mut NdrWriter<'a>) -> Result<()> {
    for elem in elements {
        elem.ndr_encode(w)?;
    }
    Ok(())
}

fn decode_elements<T: NdrDecode>(r: &mut NdrReader, count: u64) -> Result<Vec<T>> {
    let count = r.check_count(count, T::ndr_align())?;
    let mut elements = Vec::with_capacity(count);
    for _ in 0..count {
        elements.push(T::ndr_decode(r)?);
    }
    Ok(elements)
}

/// Fixed-size array
///
/// Only the elements travel; `N` is agreed on by both sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedArray<T, const N: usize> {
    pub elements: [T; N],
}

impl<T: Default + Copy, const N: usize> Default for FixedArray<T, N> {
    fn default() -> Self {
        Self {
            elements: [T::default(); N],
        }
    }
}

impl<T, const N: usize> FixedArray<T, N> {
    pub fn new(elements: [T; N]) -> Self {
        Self { elements }
    }
}

impl<T: NdrEncode, const N: usize> NdrEncode for FixedArray<T, N> {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        encode_elements(&self.elements, w)
    }

    fn ndr_align() -> usize {
        T::ndr_align()
    }
}

impl<T: NdrDecode + Default + Copy, const N: usize> NdrDecode for FixedArray<T, N> {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let mut elements = [T::default(); N];
        for elem in &mut elements {
            *elem = T::ndr_decode(r)?;
        }
        Ok(Self { elements })
    }

    fn ndr_align() -> usize {
        T::ndr_align()
    }
}

/// Array whose length travels in front of it
///
/// ```text
/// size_t   max_count
/// T        elements[max_count]
/// ```
///
/// When the array is the last member of a structure, max_count is announced
/// at the start of the outermost structure and the elements stay at the end
/// (see [`NdrConformant`]).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConformantArray<T> {
    pub elements: Vec<T>,
}

impl<T> ConformantArray<T> {
    pub fn new(elements: Vec<T>) -> Self {
        Self { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl<T> From<Vec<T>> for ConformantArray<T> {
    fn from(elements: Vec<T>) -> Self {
        Self { elements }
    }
}

impl<T: NdrEncode + NdrDecode> NdrConformant for ConformantArray<T> {
    fn ndr_size_info(&self) -> SizeInfo {
        SizeInfo::single(self.elements.len() as u64)
    }

    fn ndr_encode_sized<'a>(&'a self, w: &mut NdrWriter<'a>, sizes: &SizeInfo) -> Result<()> {
        let max_count = sizes.dim(0)?;
        if max_count != self.elements.len() as u64 {
            return Err(NdrError::ArraySizeMismatch {
                expected: max_count as usize,
                got: self.elements.len(),
            });
        }
        encode_elements(&self.elements, w)
    }

    fn ndr_decode_sized(r: &mut NdrReader, sizes: &SizeInfo) -> Result<Self> {
        let elements = decode_elements(r, sizes.dim(0)?)?;
        Ok(Self { elements })
    }
}

impl<T: NdrEncode + NdrDecode> NdrEncode for ConformantArray<T> {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        encode_conformant(self, w)
    }

    fn ndr_align() -> usize {
        4 // For max_count
    }
}

impl<T: NdrEncode + NdrDecode> NdrDecode for ConformantArray<T> {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        decode_conformant(r)
    }

    fn ndr_align() -> usize {
        4
    }
}

/// Window into a fixed-capacity array of `N` elements
///
/// ```text
/// size_t   offset
/// size_t   actual_count
/// T        elements[actual_count]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaryingArray<T, const N: usize> {
    pub offset: usize,
    pub elements: Vec<T>,
    _marker: PhantomData<[T; N]>,
}

impl<T, const N: usize> Default for VaryingArray<T, N> {
    fn default() -> Self {
        Self {
            offset: 0,
            elements: Vec::new(),
            _marker: PhantomData,
        }
    }
}

impl<T, const N: usize> VaryingArray<T, N> {
    pub fn new(elements: Vec<T>) -> Self {
        Self::with_offset(0, elements)
    }

    pub fn with_offset(offset: usize, elements: Vec<T>) -> Self {
        Self {
            offset,
            elements,
            _marker: PhantomData,
        }
    }
}

impl<T: NdrEncode, const N: usize> NdrEncode for VaryingArray<T, N> {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        let total = self.offset.checked_add(self.elements.len()).ok_or(NdrError::IntegerOverflow)?;
        if total > N {
            return Err(NdrError::ArraySizeMismatch { expected: N, got: total });
        }
        w.write_size(self.offset as u64)?;
        w.write_size(self.elements.len() as u64)?;
        encode_elements(&self.elements, w)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl<T: NdrDecode, const N: usize> NdrDecode for VaryingArray<T, N> {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let offset = r.read_size()?;
        let actual_count = r.read_size()?;

        let total = offset.checked_add(actual_count).ok_or(NdrError::IntegerOverflow)?;
        if total > N as u64 {
            return Err(NdrError::ArraySizeMismatch {
                expected: N,
                got: usize::try_from(total).unwrap_or(usize::MAX),
            });
        }

        let elements = decode_elements(r, actual_count)?;
        Ok(Self {
            offset: offset as usize,
            elements,
            _marker: PhantomData,
        })
    }

    fn ndr_align() -> usize {
        4
    }
}

/// Window into an array whose capacity travels on the wire
///
/// ```text
/// size_t   max_count
/// size_t   offset
/// size_t   actual_count
/// T        elements[actual_count]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConformantVaryingArray<T> {
    pub max_count: usize,
    pub offset: usize,
    pub elements: Vec<T>,
}

impl<T> ConformantVaryingArray<T> {
    pub fn new(elements: Vec<T>) -> Self {
        let len = elements.len();
        Self {
            max_count: len,
            offset: 0,
            elements,
        }
    }

    pub fn with_max(max_count: usize, elements: Vec<T>) -> Self {
        Self {
            max_count,
            offset: 0,
            elements,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl<T: NdrEncode + NdrDecode> NdrConformant for ConformantVaryingArray<T> {
    fn ndr_size_info(&self) -> SizeInfo {
        SizeInfo::single(self.max_count as u64)
    }

    fn ndr_encode_sized<'a>(&'a self, w: &mut NdrWriter<'a>, sizes: &SizeInfo) -> Result<()> {
        let max_count = sizes.dim(0)?;
        let total = self.offset.checked_add(self.elements.len()).ok_or(NdrError::IntegerOverflow)?;
        if total as u64 > max_count {
            return Err(NdrError::ConformanceMismatch {
                max_count,
                actual_count: total as u64,
            });
        }
        w.write_size(self.offset as u64)?;
        w.write_size(self.elements.len() as u64)?;
        encode_elements(&self.elements, w)
    }

    fn ndr_decode_sized(r: &mut NdrReader, sizes: &SizeInfo) -> Result<Self> {
        let max_count = sizes.dim(0)?;
        let offset = r.read_size()?;
        let actual_count = r.read_size()?;

        // offset + actual may not wrap
        let total = offset.checked_add(actual_count).ok_or(NdrError::IntegerOverflow)?;
        if total > max_count {
            return Err(NdrError::ConformanceMismatch {
                max_count,
                actual_count: total,
            });
        }

        let elements = decode_elements(r, actual_count)?;
        Ok(Self {
            max_count: usize::try_from(max_count).map_err(|_| NdrError::IntegerOverflow)?,
            offset: offset as usize,
            elements,
        })
    }
}

impl<T: NdrEncode + NdrDecode> NdrEncode for ConformantVaryingArray<T> {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        encode_conformant(self, w)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl<T: NdrEncode + NdrDecode> NdrDecode for ConformantVaryingArray<T> {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        decode_conformant(r)
    }

    fn ndr_align() -> usize {
        4
    }
}
