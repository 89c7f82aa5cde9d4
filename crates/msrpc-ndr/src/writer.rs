//! NDR stub data writer
//!
//! One `NdrWriter` serves exactly one PDU encode pass. It owns the output
//! buffer, the referent table used to deduplicate aliased pointers and the
//! queue of deferred pointer bodies.
//!
//! Pointer bodies are never written at the point of reference: `write_pointer`
//! emits a referent ID and queues the body, and `write_deferred` emits the
//! queued bodies in FIFO order once the enclosing construct's fixed part is
//! complete. Bodies queued while a body is being written are flushed right
//! after that body, before its next sibling.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::pointers::{ReferentKey, FIRST_REFERENT_ID, REFERENT_ID_STEP};
use crate::primitives::{NdrPrimitive, Uint3264};
use crate::{NdrContext, NdrError, Result};

/// A queued pointer body
pub type DeferredWrite<'a> = Box<dyn FnOnce(&mut NdrWriter<'a>) -> Result<()> + 'a>;

/// Validate an alignment argument
pub(crate) fn check_alignment(alignment: usize) -> Result<()> {
    match alignment {
        1 | 2 | 4 | 8 => Ok(()),
        other => Err(NdrError::InvalidAlignment(other)),
    }
}

/// Append-only NDR encoder for one PDU
pub struct NdrWriter<'a> {
    buf: BytesMut,
    ctx: NdrContext,
    referents: HashMap<ReferentKey, u64>,
    next_referent: u64,
    deferred: VecDeque<DeferredWrite<'a>>,
}

impl<'a> NdrWriter<'a> {
    /// Create an empty writer for the given data representation
    pub fn new(ctx: NdrContext) -> Self {
        Self::with_capacity(ctx, 0)
    }

    /// Create an empty writer with preallocated output space
    pub fn with_capacity(ctx: NdrContext, capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            ctx,
            referents: HashMap::new(),
            next_referent: FIRST_REFERENT_ID,
            deferred: VecDeque::new(),
        }
    }

    /// Data representation of this pass
    pub fn context(&self) -> &NdrContext {
        &self.ctx
    }

    /// Current offset from the start of the stub data
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Bytes written so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Whether pointer bodies are waiting for `write_deferred`
    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Flush any outstanding pointer bodies and return the stub data
    pub fn finish(mut self) -> Result<Bytes> {
        self.write_deferred()?;
        Ok(self.buf.freeze())
    }

    /// Return the stub data as written, dropping unflushed bodies
    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    /// Pad with zero bytes to the next multiple of `alignment`
    pub fn write_align(&mut self, alignment: usize) -> Result<()> {
        check_alignment(alignment)?;
        let padding = NdrContext::align_padding(self.buf.len(), alignment);
        self.buf.resize(self.buf.len() + padding, 0);
        Ok(())
    }

    /// Write a naturally aligned primitive
    pub fn write_data<T: NdrPrimitive>(&mut self, value: T) -> Result<()> {
        let size = T::wire_size(&self.ctx);
        self.write_align(size)?;
        value.put(&mut self.buf, &self.ctx)
    }

    /// Write raw bytes with no alignment
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write a conformance, offset or count field
    ///
    /// Under NDR20 the field is 32 bits wide and values above `u32::MAX` are
    /// rejected rather than truncated.
    pub fn write_size(&mut self, size: u64) -> Result<()> {
        self.write_data(Uint3264(size))
    }

    /// Write a plain enum (16 bits under NDR20, 32 bits under NDR64)
    ///
    /// `v1_enum` values are 32 bits in both syntaxes and go through
    /// `write_data` instead.
    pub fn write_enum(&mut self, value: u16) -> Result<()> {
        if self.ctx.is_ndr64() {
            self.write_data(u32::from(value))
        } else {
            self.write_data(value)
        }
    }

    /// Write a union discriminant
    pub fn write_switch(&mut self, switch: i32) -> Result<()> {
        self.write_data(switch)
    }

    /// Align a union arm; only NDR64 aligns union arms explicitly
    pub fn write_union_align(&mut self, alignment: usize) -> Result<()> {
        if self.ctx.is_ndr64() {
            self.write_align(alignment)
        } else {
            check_alignment(alignment)
        }
    }

    /// Pad a structure's tail; only NDR64 carries trailing gaps
    pub fn write_trailing_gap(&mut self, alignment: usize) -> Result<()> {
        self.write_union_align(alignment)
    }

    /// Write the null referent ID
    pub fn write_null_pointer(&mut self) -> Result<()> {
        self.write_data(Uint3264(0))
    }

    /// Write a pointer whose referent may be aliased
    ///
    /// The first time `key` is seen a new referent ID is assigned and `body`
    /// is queued. Later occurrences of the same key repeat the ID and drop
    /// `body`, so the referent is serialized once per PDU.
    pub fn write_pointer<F>(&mut self, key: ReferentKey, body: F) -> Result<()>
    where
        F: FnOnce(&mut NdrWriter<'a>) -> Result<()> + 'a,
    {
        if let Some(&id) = self.referents.get(&key) {
            trace!(referent_id = id, "aliased referent");
            return self.write_data(Uint3264(id));
        }
        let id = self.allocate_referent();
        self.referents.insert(key, id);
        self.write_data(Uint3264(id))?;
        self.deferred.push_back(Box::new(body));
        Ok(())
    }

    /// Write a non-null pointer that never aliases another
    pub fn write_unique_pointer<F>(&mut self, body: F) -> Result<()>
    where
        F: FnOnce(&mut NdrWriter<'a>) -> Result<()> + 'a,
    {
        let id = self.allocate_referent();
        self.write_data(Uint3264(id))?;
        self.deferred.push_back(Box::new(body));
        Ok(())
    }

    /// Emit every queued pointer body
    ///
    /// Bodies are written in the order their pointers were encountered.
    /// Pointers met inside a body are flushed immediately after that body.
    /// The walk is iterative, so stack use does not grow with the length of
    /// a pointer chain.
    pub fn write_deferred(&mut self) -> Result<()> {
        if self.deferred.is_empty() {
            return Ok(());
        }
        let mut pending = std::mem::take(&mut self.deferred);
        trace!(count = pending.len(), position = self.buf.len(), "writing deferred bodies");
        while let Some(body) = pending.pop_front() {
            body(self)?;
            // children go ahead of the remaining siblings, in queue order
            while let Some(child) = self.deferred.pop_back() {
                pending.push_front(child);
            }
        }
        Ok(())
    }

    fn allocate_referent(&mut self) -> u64 {
        let id = self.next_referent;
        self.next_referent += REFERENT_ID_STEP;
        id
    }
}

impl fmt::Debug for NdrWriter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NdrWriter")
            .field("ctx", &self.ctx)
            .field("position", &self.buf.len())
            .field("referents", &self.referents.len())
            .field("deferred", &self.deferred.len())
            .finish()
    }
}
