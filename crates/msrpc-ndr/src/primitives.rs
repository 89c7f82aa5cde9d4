//! NDR primitive type implementations
//!
//! NDR primitive types and their encodings:
//!
//! | MIDL Type     | Rust Type | Size | Alignment |
//! |---------------|-----------|------|-----------|
//! | boolean       | bool      | 1    | 1         |
//! | byte/char     | u8        | 1    | 1         |
//! | small         | i8        | 1    | 1         |
//! | short         | i16       | 2    | 2         |
//! | long/int      | i32       | 4    | 4         |
//! | hyper         | i64       | 8    | 8         |
//! | unsigned short| u16       | 2    | 2         |
//! | unsigned long | u32       | 4    | 4         |
//! | unsigned hyper| u64       | 8    | 8         |
//! | float         | f32       | 4    | 4         |
//! | double        | f64       | 8    | 8         |
//! | wchar_t       | u16       | 2    | 2         |
//! | error_status_t| u32       | 4    | 4         |
//! | __int3264     | Int3264   | 4/8  | 4/8       |
//!
//! Every primitive is aligned to its own size on the wire. Enums are not
//! primitives here: callers convert them to their declared width first.

use bytes::{Bytes, BytesMut};

use crate::{NdrContext, NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter, Result};

/// A fixed-width scalar that `write_data`/`read_data` can transport
pub trait NdrPrimitive: Copy + Sized {
    /// Size on the wire, which is also the alignment
    fn wire_size(ctx: &NdrContext) -> usize;

    /// Append the value in the context's byte order
    fn put(self, buf: &mut BytesMut, ctx: &NdrContext) -> Result<()>;

    /// Take the value from the buffer; the caller has checked the length
    fn get(buf: &mut Bytes, ctx: &NdrContext) -> Self;
}

macro_rules! impl_ndr_primitive {
    ($ty:ty, $size:expr, $put:ident, $get:ident) => {
        impl NdrPrimitive for $ty {
            #[inline]
            fn wire_size(_ctx: &NdrContext) -> usize {
                $size
            }

            #[inline]
            fn put(self, buf: &mut BytesMut, ctx: &NdrContext) -> Result<()> {
                ctx.$put(buf, self);
                Ok(())
            }

            #[inline]
            fn get(buf: &mut Bytes, ctx: &NdrContext) -> Self {
                ctx.$get(buf)
            }
        }
    };
}

impl_ndr_primitive!(u8, 1, put_u8, get_u8);
impl_ndr_primitive!(i8, 1, put_i8, get_i8);
impl_ndr_primitive!(u16, 2, put_u16, get_u16);
impl_ndr_primitive!(i16, 2, put_i16, get_i16);
impl_ndr_primitive!(u32, 4, put_u32, get_u32);
impl_ndr_primitive!(i32, 4, put_i32, get_i32);
impl_ndr_primitive!(u64, 8, put_u64, get_u64);
impl_ndr_primitive!(i64, 8, put_i64, get_i64);
impl_ndr_primitive!(f32, 4, put_f32, get_f32);
impl_ndr_primitive!(f64, 8, put_f64, get_f64);

/// NDR boolean - encoded as a single byte (0x00 = false, 0x01 = true)
impl NdrPrimitive for bool {
    fn wire_size(_ctx: &NdrContext) -> usize {
        1
    }

    fn put(self, buf: &mut BytesMut, ctx: &NdrContext) -> Result<()> {
        ctx.put_u8(buf, u8::from(self));
        Ok(())
    }

    fn get(buf: &mut Bytes, ctx: &NdrContext) -> Self {
        ctx.get_u8(buf) != 0
    }
}

/// `unsigned __int3264`: 32 bits under NDR20, 64 bits under NDR64
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Uint3264(pub u64);

/// `__int3264`: 32 bits under NDR20, 64 bits under NDR64
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Int3264(pub i64);

impl NdrPrimitive for Uint3264 {
    fn wire_size(ctx: &NdrContext) -> usize {
        ctx.size_width()
    }

    fn put(self, buf: &mut BytesMut, ctx: &NdrContext) -> Result<()> {
        if ctx.is_ndr64() {
            ctx.put_u64(buf, self.0);
        } else {
            let value = u32::try_from(self.0).map_err(|_| NdrError::CountOverflow(self.0))?;
            ctx.put_u32(buf, value);
        }
        Ok(())
    }

    fn get(buf: &mut Bytes, ctx: &NdrContext) -> Self {
        if ctx.is_ndr64() {
            Self(ctx.get_u64(buf))
        } else {
            Self(u64::from(ctx.get_u32(buf)))
        }
    }
}

impl NdrPrimitive for Int3264 {
    fn wire_size(ctx: &NdrContext) -> usize {
        ctx.size_width()
    }

    fn put(self, buf: &mut BytesMut, ctx: &NdrContext) -> Result<()> {
        if ctx.is_ndr64() {
            ctx.put_i64(buf, self.0);
        } else {
            let value = i32::try_from(self.0).map_err(|_| NdrError::IntegerOverflow)?;
            ctx.put_i32(buf, value);
        }
        Ok(())
    }

    fn get(buf: &mut Bytes, ctx: &NdrContext) -> Self {
        if ctx.is_ndr64() {
            Self(ctx.get_i64(buf))
        } else {
            Self(i64::from(ctx.get_i32(buf)))
        }
    }
}

// Primitives are also complete NDR types, so they can be array elements
// and pointer bodies.
macro_rules! impl_ndr_scalar {
    ($($ty:ty => $align:expr),* $(,)?) => {
        $(
            impl NdrEncode for $ty {
                fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
                    w.write_data(*self)
                }

                fn ndr_align() -> usize {
                    $align
                }
            }

            impl NdrDecode for $ty {
                fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
                    r.read_data()
                }

                fn ndr_align() -> usize {
                    $align
                }
            }
        )*
    };
}

impl_ndr_scalar!(
    bool => 1,
    u8 => 1,
    i8 => 1,
    u16 => 2,
    i16 => 2,
    u32 => 4,
    i32 => 4,
    u64 => 8,
    i64 => 8,
    f32 => 4,
    f64 => 8,
    // NDR20 width; the NDR64 encoding is wider, so this stays a lower bound
    Uint3264 => 4,
    Int3264 => 4,
);

/// NDR error_status_t - HRESULT-like error code
pub type ErrorStatusT = u32;
