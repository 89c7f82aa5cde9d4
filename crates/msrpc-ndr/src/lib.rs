//! NDR (Network Data Representation) codec core
//!
//! This crate is the runtime every MSRPC/DCOM stub calls into to turn
//! operation parameters into stub data and back, following the NDR wire
//! format of DCE RPC as profiled by MS-RPCE.
//!
//! # NDR Wire Format
//!
//! - Primitives align to their natural size (1, 2, 4, or 8 bytes), padded with zeros
//! - Conformant data announces its maximum count ahead of the outermost structure
//! - Varying data carries an offset and an actual count before its elements
//! - Unique and full pointers are written as referent IDs; their bodies are
//!   deferred until the enclosing construct is complete
//! - Full pointers to the same referent share one referent ID and one body
//! - Strings are conformant varying arrays, usually including a null terminator
//!
//! One [`NdrWriter`] or [`NdrReader`] covers exactly one PDU. Its referent
//! table and deferred queue are never shared between passes.

mod arrays;
mod context;
mod context_handle;
mod decode;
mod encode;
mod error;
mod operation;
mod pointers;
mod primitives;
mod reader;
mod sizes;
mod strings;
mod unions;
mod writer;

pub use arrays::{ConformantArray, ConformantVaryingArray, FixedArray, VaryingArray};
pub use context::{NdrContext, TransferSyntax};
pub use context_handle::{ContextHandle, Guid};
pub use decode::NdrDecode;
pub use encode::NdrEncode;
pub use error::{NdrError, Result, MAX_NDR_ARRAY_ELEMENTS};
pub use operation::{decode_request, decode_response, encode_request, encode_response, Operation, PayloadHooks};
pub use pointers::{
    FullPtr, NdrPtr, RefPtr, Referent, ReferentKey, UniquePtr, FIRST_REFERENT_ID, REFERENT_ID_STEP,
};
pub use primitives::{ErrorStatusT, Int3264, NdrPrimitive, Uint3264};
pub use reader::{DeferredRead, NdrReader};
pub use sizes::{decode_conformant, encode_conformant, NdrConformant, SizeInfo};
pub use strings::{char_nlen, multi_sz_len, utf16_nlen, BString, NdrString, NdrWString};
pub use unions::{decode_union, encode_union, NdrUnion};
pub use writer::{DeferredWrite, NdrWriter};

/// Re-export bytes for convenience
pub use bytes::{Buf, BufMut, Bytes, BytesMut};
