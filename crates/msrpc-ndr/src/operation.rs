//! Per-operation stub data passes
//!
//! Every RPC operation marshals its `[in]` parameters into request stub data
//! and its `[out]` parameters into response stub data. The helpers here run
//! one such pass with a fresh writer or reader, so the referent table and the
//! deferred queue never outlive a single PDU.

use bytes::Bytes;
use tracing::trace;

use crate::{NdrContext, NdrReader, NdrWriter, Result};

/// Optional hooks run after an operation has prepared its payload
///
/// Hand-written extensions implement these to adjust or validate fields
/// before the payload is marshaled. Failures should use
/// [`NdrError::Hook`](crate::NdrError::Hook).
pub trait PayloadHooks {
    fn after_prepare_request_payload(&mut self) -> Result<()> {
        Ok(())
    }

    fn after_prepare_response_payload(&mut self) -> Result<()> {
        Ok(())
    }
}

/// One RPC operation with its request and response parameters
pub trait Operation: PayloadHooks {
    /// Operation number within the interface
    fn opnum(&self) -> u16;

    /// Display name, e.g. `"/efsrpc/v1/EfsRpcOpenFileRaw"`
    fn name(&self) -> &'static str;

    /// Derive dependent fields (counts, lengths) before the request is marshaled
    fn prepare_request_payload(&mut self) -> Result<()> {
        Ok(())
    }

    /// Derive dependent fields before the response is marshaled
    fn prepare_response_payload(&mut self) -> Result<()> {
        Ok(())
    }

    /// Write `[in]` parameters in declaration order
    fn marshal_request<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()>;

    /// Read `[in]` parameters in declaration order
    fn unmarshal_request(&mut self, r: &mut NdrReader) -> Result<()>;

    /// Write `[out]` parameters and the return value
    fn marshal_response<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()>;

    /// Read `[out]` parameters and the return value
    fn unmarshal_response(&mut self, r: &mut NdrReader) -> Result<()>;
}

/// Marshal an operation's request stub data
pub fn encode_request<O: Operation>(op: &mut O, ctx: NdrContext) -> Result<Bytes> {
    op.prepare_request_payload()?;
    op.after_prepare_request_payload()?;

    let op: &O = op;
    let mut w = NdrWriter::new(ctx);
    op.marshal_request(&mut w)?;
    let stub = w.finish()?;
    trace!(opnum = op.opnum(), name = op.name(), len = stub.len(), "encoded request");
    Ok(stub)
}

/// Unmarshal an operation's request stub data into `op`
pub fn decode_request<O: Operation>(op: &mut O, stub: impl Into<Bytes>, ctx: NdrContext) -> Result<()> {
    let mut r = NdrReader::new(stub, ctx);
    op.unmarshal_request(&mut r)?;
    r.finish()?;
    trace!(
        opnum = op.opnum(),
        name = op.name(),
        trailing = r.remaining(),
        "decoded request"
    );
    Ok(())
}

/// Marshal an operation's response stub data
pub fn encode_response<O: Operation>(op: &mut O, ctx: NdrContext) -> Result<Bytes> {
    op.prepare_response_payload()?;
    op.after_prepare_response_payload()?;

    let op: &O = op;
    let mut w = NdrWriter::new(ctx);
    op.marshal_response(&mut w)?;
    let stub = w.finish()?;
    trace!(opnum = op.opnum(), name = op.name(), len = stub.len(), "encoded response");
    Ok(stub)
}

/// Unmarshal an operation's response stub data into `op`
pub fn decode_response<O: Operation>(op: &mut O, stub: impl Into<Bytes>, ctx: NdrContext) -> Result<()> {
    let mut r = NdrReader::new(stub, ctx);
    op.unmarshal_response(&mut r)?;
    r.finish()?;
    trace!(
        opnum = op.opnum(),
        name = op.name(),
        trailing = r.remaining(),
        "decoded response"
    );
    Ok(())
}
