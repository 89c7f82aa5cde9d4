//! NDR stub data reader
//!
//! Mirror image of [`NdrWriter`](crate::NdrWriter): one reader serves one
//! PDU decode pass over a fixed buffer. Pointer bodies are decoded from the
//! deferred queue, and repeated referent IDs resolve to the same
//! [`Referent`] handle.

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::fmt;

use bytes::{Buf, Bytes};
use tracing::{debug, trace};

use crate::pointers::Referent;
use crate::primitives::{NdrPrimitive, Uint3264};
use crate::writer::check_alignment;
use crate::{NdrContext, NdrError, Result};

/// A queued pointer body decode
pub type DeferredRead = Box<dyn FnOnce(&mut NdrReader) -> Result<()>>;

/// Cursor-based NDR decoder for one PDU
pub struct NdrReader {
    buf: Bytes,
    start_len: usize,
    ctx: NdrContext,
    referents: HashMap<u64, Box<dyn Any>>,
    deferred: VecDeque<DeferredRead>,
}

impl NdrReader {
    /// Start decoding `buf` with the given data representation
    pub fn new(buf: impl Into<Bytes>, ctx: NdrContext) -> Self {
        let buf = buf.into();
        Self {
            start_len: buf.len(),
            buf,
            ctx,
            referents: HashMap::new(),
            deferred: VecDeque::new(),
        }
    }

    /// Data representation of this pass
    pub fn context(&self) -> &NdrContext {
        &self.ctx
    }

    /// Current offset from the start of the stub data
    pub fn position(&self) -> usize {
        self.start_len - self.buf.remaining()
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(NdrError::BufferUnderflow {
                needed,
                have: self.buf.remaining(),
            });
        }
        Ok(())
    }

    /// Skip padding up to the next multiple of `alignment`
    ///
    /// Padding content is not checked.
    pub fn read_align(&mut self, alignment: usize) -> Result<()> {
        check_alignment(alignment)?;
        let padding = NdrContext::align_padding(self.position(), alignment);
        self.ensure(padding)?;
        if self.buf[..padding].iter().any(|b| *b != 0) {
            trace!(position = self.position(), padding, "non-zero alignment padding");
        }
        self.buf.advance(padding);
        Ok(())
    }

    /// Read a naturally aligned primitive
    pub fn read_data<T: NdrPrimitive>(&mut self) -> Result<T> {
        let size = T::wire_size(&self.ctx);
        check_alignment(size)?;
        let padding = NdrContext::align_padding(self.position(), size);
        self.ensure(padding + size)?;
        self.buf.advance(padding);
        Ok(T::get(&mut self.buf, &self.ctx))
    }

    /// Read raw bytes with no alignment
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        self.ensure(len)?;
        Ok(self.buf.split_to(len))
    }

    /// Read a conformance, offset or count field
    pub fn read_size(&mut self) -> Result<u64> {
        Ok(self.read_data::<Uint3264>()?.0)
    }

    /// Sanity-check a declared element count before allocating for it
    ///
    /// `element_size` is a lower bound on each element's wire size. Fails
    /// when the count is above the configured ceiling or when that many
    /// elements cannot fit in the remaining bytes.
    pub fn check_count(&self, count: u64, element_size: usize) -> Result<usize> {
        let limit = self.ctx.max_elements;
        if count > limit as u64 {
            debug!(count, limit, "declared count above element limit");
            return Err(NdrError::AllocationLimitExceeded {
                requested: count,
                limit,
            });
        }
        let remaining = self.buf.remaining();
        let fits = count
            .checked_mul(element_size.max(1) as u64)
            .map_or(false, |bytes| bytes <= remaining as u64);
        if !fits {
            debug!(count, remaining, "declared count exceeds remaining buffer");
            return Err(NdrError::SizeMismatch {
                declared: count,
                remaining,
            });
        }
        usize::try_from(count).map_err(|_| NdrError::IntegerOverflow)
    }

    /// Read a plain enum (16 bits under NDR20, 32 bits under NDR64)
    pub fn read_enum(&mut self) -> Result<u16> {
        if self.ctx.is_ndr64() {
            let value: u32 = self.read_data()?;
            u16::try_from(value).map_err(|_| NdrError::InvalidEnumValue(value))
        } else {
            self.read_data()
        }
    }

    /// Read a union discriminant
    pub fn read_switch(&mut self) -> Result<i32> {
        self.read_data()
    }

    /// Align a union arm; only NDR64 aligns union arms explicitly
    pub fn read_union_align(&mut self, alignment: usize) -> Result<()> {
        if self.ctx.is_ndr64() {
            self.read_align(alignment)
        } else {
            check_alignment(alignment)
        }
    }

    /// Skip a structure's tail padding; only NDR64 carries trailing gaps
    pub fn read_trailing_gap(&mut self, alignment: usize) -> Result<()> {
        self.read_union_align(alignment)
    }

    /// Read a pointer and queue its body
    ///
    /// Returns `None` for the null referent ID. The first occurrence of an
    /// ID queues `body` and returns a pending referent; later occurrences
    /// return the same referent without consuming any more input. Reusing an
    /// ID for a referent of another type is a protocol violation.
    pub fn read_pointer<T, F>(&mut self, body: F) -> Result<Option<Referent<T>>>
    where
        T: 'static,
        F: FnOnce(&mut NdrReader) -> Result<T> + 'static,
    {
        let id = self.read_size()?;
        if id == 0 {
            return Ok(None);
        }
        if let Some(entry) = self.referents.get(&id) {
            trace!(referent_id = id, "aliased referent");
            return entry
                .downcast_ref::<Referent<T>>()
                .cloned()
                .map(Some)
                .ok_or(NdrError::MalformedReferent(id));
        }

        let referent = Referent::pending();
        self.referents.insert(id, Box::new(referent.clone()));

        let slot = referent.clone();
        self.deferred.push_back(Box::new(move |r: &mut NdrReader| {
            let value = body(r)?;
            slot.resolve(value);
            Ok(())
        }));
        Ok(Some(referent))
    }

    /// Decode every queued pointer body
    ///
    /// Same order as `NdrWriter::write_deferred`: FIFO, with pointers met
    /// inside a body decoded right after that body. Iterative, so a long
    /// chain of pointers from the wire cannot exhaust the stack.
    pub fn read_deferred(&mut self) -> Result<()> {
        if self.deferred.is_empty() {
            return Ok(());
        }
        let mut pending = std::mem::take(&mut self.deferred);
        trace!(count = pending.len(), position = self.position(), "reading deferred bodies");
        while let Some(body) = pending.pop_front() {
            body(self)?;
            while let Some(child) = self.deferred.pop_back() {
                pending.push_front(child);
            }
        }
        Ok(())
    }

    /// Finish the pass by draining the deferred queue
    ///
    /// Every non-null referent ID queues exactly one body, so once the queue
    /// is empty every referent handed out by this reader is resolved. A body
    /// missing from the stub data fails here as truncation.
    pub fn finish(&mut self) -> Result<()> {
        self.read_deferred()?;
        trace!(position = self.position(), referents = self.referents.len(), "decode pass finished");
        Ok(())
    }
}

impl fmt::Debug for NdrReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NdrReader")
            .field("ctx", &self.ctx)
            .field("position", &self.position())
            .field("remaining", &self.buf.remaining())
            .field("referents", &self.referents.len())
            .field("deferred", &self.deferred.len())
            .finish()
    }
}
