//! Stubs in the shape of generated interface code
//!
//! Each type below is written the way a stub generator emits it for the
//! MIDL declaration quoted in its doc comment: fields are visited in
//! declaration order and every codec call goes through `msrpc_ndr`.

use msrpc_ndr::{
    encode_conformant, decode_conformant, decode_union, encode_union, ConformantArray, ContextHandle,
    FullPtr, NdrConformant, NdrDecode, NdrEncode, NdrError, NdrReader, NdrUnion, NdrWString,
    NdrWriter, Operation, PayloadHooks, Result, SizeInfo, UniquePtr,
};
use tracing::debug;

/// `typedef struct { [ptr] PCONTEXT_HANDLE primary; [ptr] PCONTEXT_HANDLE secondary; } HANDLE_PAIR;`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HandlePair {
    pub primary: FullPtr<ContextHandle>,
    pub secondary: FullPtr<ContextHandle>,
}

impl NdrEncode for HandlePair {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_align(4)?;
        self.primary.ndr_encode(w)?;
        self.secondary.ndr_encode(w)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for HandlePair {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        r.read_align(4)?;
        let primary = FullPtr::ndr_decode(r)?;
        let secondary = FullPtr::ndr_decode(r)?;
        Ok(Self { primary, secondary })
    }

    fn ndr_align() -> usize {
        4
    }
}

/// `typedef struct { unsigned long cb; [size_is(cb)] byte data[]; } BYTE_BLOB;`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ByteBlob {
    pub size: u32,
    pub data: Vec<u8>,
}

impl ByteBlob {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            size: data.len() as u32,
            data,
        }
    }
}

impl NdrConformant for ByteBlob {
    fn ndr_size_info(&self) -> SizeInfo {
        SizeInfo::single(self.data.len() as u64)
    }

    fn ndr_encode_sized<'a>(&'a self, w: &mut NdrWriter<'a>, sizes: &SizeInfo) -> Result<()> {
        let dim = sizes.dim(0)?;
        if dim != self.data.len() as u64 {
            return Err(NdrError::ArraySizeMismatch {
                expected: dim as usize,
                got: self.data.len(),
            });
        }
        w.write_align(4)?;
        w.write_data(self.size)?;
        w.write_bytes(&self.data);
        Ok(())
    }

    fn ndr_decode_sized(r: &mut NdrReader, sizes: &SizeInfo) -> Result<Self> {
        r.read_align(4)?;
        let size: u32 = r.read_data()?;
        let mut sizes = sizes.clone();
        sizes.fill_missing(0, u64::from(size));
        let count = r.check_count(sizes.dim(0)?, 1)?;
        let data = r.read_bytes(count)?.to_vec();
        Ok(Self { size, data })
    }
}

impl NdrEncode for ByteBlob {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        encode_conformant(self, w)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for ByteBlob {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        decode_conformant(r)
    }

    fn ndr_align() -> usize {
        4
    }
}

/// `typedef struct { unsigned long flags; BYTE_BLOB blob; } ENVELOPE;`
///
/// Conformant because its last member is; the blob's count is announced
/// ahead of `flags`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Envelope {
    pub flags: u32,
    pub blob: ByteBlob,
}

impl NdrConformant for Envelope {
    fn ndr_size_info(&self) -> SizeInfo {
        self.blob.ndr_size_info()
    }

    fn ndr_encode_sized<'a>(&'a self, w: &mut NdrWriter<'a>, sizes: &SizeInfo) -> Result<()> {
        w.write_align(4)?;
        w.write_data(self.flags)?;
        self.blob.ndr_encode_sized(w, sizes)
    }

    fn ndr_decode_sized(r: &mut NdrReader, sizes: &SizeInfo) -> Result<Self> {
        r.read_align(4)?;
        let flags = r.read_data()?;
        let blob = ByteBlob::ndr_decode_sized(r, sizes)?;
        Ok(Self { flags, blob })
    }
}

impl NdrEncode for Envelope {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        encode_conformant(self, w)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for Envelope {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        decode_conformant(r)
    }

    fn ndr_align() -> usize {
        4
    }
}

/// `typedef struct { unsigned long rows; unsigned long cols;
///                   [size_is(rows, cols)] unsigned short cells[][]; } GRID;`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Grid {
    pub rows: u32,
    pub cols: u32,
    pub cells: Vec<u16>,
}

impl NdrConformant for Grid {
    fn ndr_size_info(&self) -> SizeInfo {
        SizeInfo::new(vec![u64::from(self.rows), u64::from(self.cols)])
    }

    fn ndr_dimensions() -> usize {
        2
    }

    fn ndr_encode_sized<'a>(&'a self, w: &mut NdrWriter<'a>, sizes: &SizeInfo) -> Result<()> {
        let total = sizes
            .dim(0)?
            .checked_mul(sizes.dim(1)?)
            .ok_or(NdrError::IntegerOverflow)?;
        if total != self.cells.len() as u64 {
            return Err(NdrError::ArraySizeMismatch {
                expected: total as usize,
                got: self.cells.len(),
            });
        }
        w.write_align(4)?;
        w.write_data(self.rows)?;
        w.write_data(self.cols)?;
        for cell in &self.cells {
            w.write_data(*cell)?;
        }
        Ok(())
    }

    fn ndr_decode_sized(r: &mut NdrReader, sizes: &SizeInfo) -> Result<Self> {
        r.read_align(4)?;
        let rows = r.read_data()?;
        let cols = r.read_data()?;
        let total = sizes
            .dim(0)?
            .checked_mul(sizes.dim(1)?)
            .ok_or(NdrError::IntegerOverflow)?;
        let count = r.check_count(total, 2)?;
        let mut cells = Vec::with_capacity(count);
        for _ in 0..count {
            cells.push(r.read_data()?);
        }
        Ok(Self { rows, cols, cells })
    }
}

impl NdrEncode for Grid {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        encode_conformant(self, w)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for Grid {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        decode_conformant(r)
    }

    fn ndr_align() -> usize {
        4
    }
}

/// `typedef enum { FileClosed = 0, FileOpen = 1, FileLocked = 2 } FILE_STATE;`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u16)]
pub enum FileState {
    #[default]
    Closed = 0,
    Open = 1,
    Locked = 2,
}

impl FileState {
    pub fn from_wire(value: u16) -> Result<Self> {
        match value {
            0 => Ok(Self::Closed),
            1 => Ok(Self::Open),
            2 => Ok(Self::Locked),
            other => Err(NdrError::InvalidEnumValue(u32::from(other))),
        }
    }
}

impl NdrEncode for FileState {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_enum(*self as u16)
    }

    fn ndr_align() -> usize {
        2
    }
}

impl NdrDecode for FileState {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        Self::from_wire(r.read_enum()?)
    }

    fn ndr_align() -> usize {
        2
    }
}

/// ```text
/// typedef [switch_type(unsigned long)] union {
///     [case(1)] [string, unique] wchar_t* name;
///     [case(2)] unsigned __int64 id;
///     [default] ;
/// } OBJECT_INFO;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectInfo {
    Name(UniquePtr<NdrWString>),
    Id(u64),
    /// Default arm; keeps the discriminant it was decoded with
    Empty(i32),
}

impl NdrUnion for ObjectInfo {
    fn ndr_switch_value(&self) -> i32 {
        match self {
            ObjectInfo::Name(_) => 1,
            ObjectInfo::Id(_) => 2,
            ObjectInfo::Empty(switch) => *switch,
        }
    }

    fn ndr_union_align() -> usize {
        8
    }

    fn ndr_encode_arm<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        match self {
            ObjectInfo::Name(name) => name.ndr_encode(w),
            ObjectInfo::Id(id) => w.write_data(*id),
            ObjectInfo::Empty(_) => Ok(()),
        }
    }

    fn ndr_decode_arm(r: &mut NdrReader, switch: i32) -> Result<Self> {
        match switch {
            1 => Ok(ObjectInfo::Name(UniquePtr::ndr_decode(r)?)),
            2 => Ok(ObjectInfo::Id(r.read_data()?)),
            other => Ok(ObjectInfo::Empty(other)),
        }
    }
}

impl NdrEncode for ObjectInfo {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        encode_union(self, w)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for ObjectInfo {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        decode_union(r)
    }

    fn ndr_align() -> usize {
        4
    }
}

/// `typedef struct _NODE { unsigned long value; [unique] struct _NODE* next; } NODE;`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub value: u32,
    pub next: UniquePtr<Node>,
}

impl Node {
    /// Build a list holding `values` in order
    pub fn list(values: &[u32]) -> UniquePtr<Node> {
        values.iter().rev().fold(UniquePtr::null(), |next, &value| {
            UniquePtr::new(Node { value, next })
        })
    }

    /// Values of the list starting at `head`
    pub fn values(head: &UniquePtr<Node>) -> Vec<u32> {
        let mut out = Vec::new();
        let mut cur = head.as_ref();
        while let Some(node) = cur {
            out.push(node.value);
            cur = node.next.as_ref();
        }
        out
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        // unlink iteratively; the default drop recurses once per node
        let mut next = std::mem::take(&mut self.next);
        while let Some(referent) = next.0.take() {
            match referent.try_into_inner() {
                Ok(mut node) => next = std::mem::take(&mut node.next),
                Err(_) => break,
            }
        }
    }
}

impl NdrEncode for Node {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_align(4)?;
        w.write_data(self.value)?;
        self.next.ndr_encode(w)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for Node {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        r.read_align(4)?;
        let value = r.read_data()?;
        let next = UniquePtr::ndr_decode(r)?;
        Ok(Self { value, next })
    }

    fn ndr_align() -> usize {
        4
    }
}

/// `long EfsRpcOpenFileRaw([out] PEXIMPORT_CONTEXT_HANDLE* hContext,
///                         [in, string] wchar_t* FileName, [in] long Flags);`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OpenFileRawOperation {
    pub file_name: String,
    pub flags: i32,
    pub context: ContextHandle,
    pub return_value: i32,
}

impl PayloadHooks for OpenFileRawOperation {}

impl Operation for OpenFileRawOperation {
    fn opnum(&self) -> u16 {
        0
    }

    fn name(&self) -> &'static str {
        "/efsrpc/v1/EfsRpcOpenFileRaw"
    }

    fn marshal_request<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_utf16_nstring(&self.file_name)?;
        w.write_data(self.flags)
    }

    fn unmarshal_request(&mut self, r: &mut NdrReader) -> Result<()> {
        self.file_name = r.read_utf16_nstring()?;
        self.flags = r.read_data()?;
        Ok(())
    }

    fn marshal_response<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        self.context.ndr_encode(w)?;
        w.write_data(self.return_value)
    }

    fn unmarshal_response(&mut self, r: &mut NdrReader) -> Result<()> {
        self.context = ContextHandle::ndr_decode(r)?;
        self.return_value = r.read_data()?;
        Ok(())
    }
}

/// `void EfsRpcCloseRaw([in, out] PEXIMPORT_CONTEXT_HANDLE* hContext);`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CloseRawOperation {
    pub context: ContextHandle,
}

impl PayloadHooks for CloseRawOperation {}

impl Operation for CloseRawOperation {
    fn opnum(&self) -> u16 {
        1
    }

    fn name(&self) -> &'static str {
        "/efsrpc/v1/EfsRpcCloseRaw"
    }

    fn marshal_request<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        self.context.ndr_encode(w)
    }

    fn unmarshal_request(&mut self, r: &mut NdrReader) -> Result<()> {
        self.context = ContextHandle::ndr_decode(r)?;
        Ok(())
    }

    fn marshal_response<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        self.context.ndr_encode(w)
    }

    fn unmarshal_response(&mut self, r: &mut NdrReader) -> Result<()> {
        self.context = ContextHandle::ndr_decode(r)?;
        Ok(())
    }
}

/// Most attribute names a SetAttributes request may carry
pub const MAX_ATTRIBUTES: u32 = 16;

/// ```text
/// long SetAttributes([in] unsigned long count,
///                    [in, unique, size_is(count)] LPWSTR* names,
///                    [in] FILE_STATE state);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetAttributesOperation {
    pub count: u32,
    pub names: UniquePtr<ConformantArray<UniquePtr<NdrWString>>>,
    pub state: FileState,
    pub return_value: i32,
}

impl SetAttributesOperation {
    pub fn new<S: AsRef<str>>(names: &[S], state: FileState) -> Self {
        let names = names
            .iter()
            .map(|s| UniquePtr::new(NdrWString::new(s.as_ref())))
            .collect::<Vec<_>>();
        Self {
            count: 0,
            names: UniquePtr::new(ConformantArray::new(names)),
            state,
            return_value: 0,
        }
    }

    /// Decoded names, skipping null entries
    pub fn name_list(&self) -> Vec<String> {
        self.names
            .as_ref()
            .map(|arr| {
                arr.elements
                    .iter()
                    .filter_map(|p| p.as_ref().map(|s| s.as_str().to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl PayloadHooks for SetAttributesOperation {
    fn after_prepare_request_payload(&mut self) -> Result<()> {
        if self.count > MAX_ATTRIBUTES {
            debug!(count = self.count, "too many attributes");
            return Err(NdrError::Hook(format!(
                "{} attributes exceeds the limit of {}",
                self.count, MAX_ATTRIBUTES
            )));
        }
        Ok(())
    }
}

impl Operation for SetAttributesOperation {
    fn opnum(&self) -> u16 {
        7
    }

    fn name(&self) -> &'static str {
        "/attrs/v1/SetAttributes"
    }

    fn prepare_request_payload(&mut self) -> Result<()> {
        if let Some(names) = self.names.as_ref() {
            self.count = names.len() as u32;
        }
        Ok(())
    }

    fn marshal_request<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_data(self.count)?;
        self.names.ndr_encode(w)?;
        w.write_deferred()?;
        self.state.ndr_encode(w)
    }

    fn unmarshal_request(&mut self, r: &mut NdrReader) -> Result<()> {
        self.count = r.read_data()?;
        self.names = UniquePtr::ndr_decode(r)?;
        r.read_deferred()?;
        self.state = FileState::ndr_decode(r)?;
        Ok(())
    }

    fn marshal_response<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_data(self.return_value)
    }

    fn unmarshal_response(&mut self, r: &mut NdrReader) -> Result<()> {
        self.return_value = r.read_data()?;
        Ok(())
    }
}
