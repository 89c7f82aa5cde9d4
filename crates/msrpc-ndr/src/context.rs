//! NDR encoding/decoding context
//!
//! The context carries the negotiated data representation for one codec
//! pass: byte order, transfer syntax and the allocation ceiling applied to
//! counts read from the wire. It also provides helpers for alignment and
//! primitive encoding/decoding.

use bytes::{Buf, BufMut};

use crate::error::MAX_NDR_ARRAY_ELEMENTS;

/// Negotiated transfer syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferSyntax {
    /// NDR 2.0: 32-bit counts and referent IDs
    #[default]
    Ndr20,
    /// NDR64: 64-bit counts and referent IDs
    Ndr64,
}

/// NDR encoding/decoding context
///
/// Tracks the current byte order and transfer syntax and provides methods
/// for encoding/decoding primitives in that byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NdrContext {
    /// Whether to use little-endian byte order
    pub little_endian: bool,
    /// Transfer syntax the stub data is encoded in
    pub syntax: TransferSyntax,
    /// Largest element count accepted from the wire
    pub max_elements: usize,
}

impl NdrContext {
    /// Create a new NDR context with little-endian byte order (default)
    pub fn new() -> Self {
        Self {
            little_endian: true,
            syntax: TransferSyntax::Ndr20,
            max_elements: MAX_NDR_ARRAY_ELEMENTS,
        }
    }

    /// Create a context with big-endian byte order
    pub fn big_endian() -> Self {
        Self::with_byte_order(false)
    }

    /// Create a context with specified byte order
    pub fn with_byte_order(little_endian: bool) -> Self {
        Self {
            little_endian,
            ..Self::new()
        }
    }

    /// Create a context from a 4-byte data representation label
    ///
    /// Byte 0 bits 4-7 carry the integer representation (0 = big-endian,
    /// 1 = little-endian). Character and floating point representations are
    /// not interpreted.
    pub fn from_drep(drep: [u8; 4]) -> Self {
        Self::with_byte_order((drep[0] >> 4) & 0x0F != 0)
    }

    /// Set the transfer syntax
    pub fn with_syntax(mut self, syntax: TransferSyntax) -> Self {
        self.syntax = syntax;
        self
    }

    /// Set the element ceiling for counts read from the wire
    pub fn with_max_elements(mut self, max_elements: usize) -> Self {
        self.max_elements = max_elements;
        self
    }

    /// Whether NDR64 is in use
    #[inline]
    pub fn is_ndr64(&self) -> bool {
        self.syntax == TransferSyntax::Ndr64
    }

    /// Width (and alignment) of sizes, offsets, counts and referent IDs
    #[inline]
    pub fn size_width(&self) -> usize {
        match self.syntax {
            TransferSyntax::Ndr20 => 4,
            TransferSyntax::Ndr64 => 8,
        }
    }

    /// Alignment of a pointer (referent ID)
    #[inline]
    pub fn pointer_align(&self) -> usize {
        self.size_width()
    }

    /// Width of a plain (non `v1_enum`) enum
    #[inline]
    pub fn enum_width(&self) -> usize {
        match self.syntax {
            TransferSyntax::Ndr20 => 2,
            TransferSyntax::Ndr64 => 4,
        }
    }

    /// Calculate padding needed to align to the given boundary
    #[inline]
    pub fn align_padding(position: usize, alignment: usize) -> usize {
        if alignment == 0 || alignment == 1 {
            return 0;
        }
        let remainder = position % alignment;
        if remainder == 0 {
            0
        } else {
            alignment - remainder
        }
    }
}

/// Byte-order-aware put/get pairs for each scalar.
///
/// Single bytes have no byte order. Reads assume the caller has already
/// checked that enough bytes remain.
macro_rules! scalar_codec {
    ($($ty:ty: $put:ident, $get:ident, $put_le:ident, $get_le:ident;)*) => {
        impl NdrContext {
            #[inline]
            pub fn put_u8<B: BufMut>(&self, buf: &mut B, value: u8) {
                buf.put_u8(value);
            }

            #[inline]
            pub fn put_i8<B: BufMut>(&self, buf: &mut B, value: i8) {
                buf.put_i8(value);
            }

            #[inline]
            pub fn get_u8<B: Buf>(&self, buf: &mut B) -> u8 {
                buf.get_u8()
            }

            #[inline]
            pub fn get_i8<B: Buf>(&self, buf: &mut B) -> i8 {
                buf.get_i8()
            }

            $(
                #[inline]
                pub fn $put<B: BufMut>(&self, buf: &mut B, value: $ty) {
                    if self.little_endian {
                        buf.$put_le(value)
                    } else {
                        buf.$put(value)
                    }
                }

                #[inline]
                pub fn $get<B: Buf>(&self, buf: &mut B) -> $ty {
                    if self.little_endian {
                        buf.$get_le()
                    } else {
                        buf.$get()
                    }
                }
            )*
        }
    };
}

scalar_codec! {
    u16: put_u16, get_u16, put_u16_le, get_u16_le;
    i16: put_i16, get_i16, put_i16_le, get_i16_le;
    u32: put_u32, get_u32, put_u32_le, get_u32_le;
    i32: put_i32, get_i32, put_i32_le, get_i32_le;
    u64: put_u64, get_u64, put_u64_le, get_u64_le;
    i64: put_i64, get_i64, put_i64_le, get_i64_le;
    f32: put_f32, get_f32, put_f32_le, get_f32_le;
    f64: put_f64, get_f64, put_f64_le, get_f64_le;
}

impl Default for NdrContext {
    fn default() -> Self {
        Self::new()
    }
}
