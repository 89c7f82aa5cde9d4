//! GUIDs and RPC context handles
//!
//! A context handle is a 20-byte token a server hands out and a client
//! echoes back. The codec moves the bytes and nothing else: it never checks
//! whether a handle is null, open or already closed.

use std::fmt;

use crate::{NdrDecode, NdrEncode, NdrReader, NdrWriter, Result};

/// GUID in MS-DTYP layout
///
/// `data1`, `data2` and `data3` follow the negotiated integer byte order on
/// the wire; `data4` is always sent as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, PartialOrd, Ord)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Guid {
    /// Nil GUID (all zeros)
    pub const NIL: Self = Self {
        data1: 0,
        data2: 0,
        data3: 0,
        data4: [0; 8],
    };

    pub const fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }

    /// Parse from string "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx", braces optional
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let s = s
            .strip_prefix('{')
            .and_then(|inner| inner.strip_suffix('}'))
            .unwrap_or(s);
        if s.len() != 36 {
            return None;
        }
        let parts: Vec<&str> = s.split('-').collect();
        let widths = [8, 4, 4, 4, 12];
        if parts.len() != widths.len() {
            return None;
        }
        // from_str_radix alone would accept a leading '+'
        let well_formed = parts
            .iter()
            .zip(widths)
            .all(|(part, width)| part.len() == width && part.bytes().all(|b| b.is_ascii_hexdigit()));
        if !well_formed {
            return None;
        }

        let data1 = u32::from_str_radix(parts[0], 16).ok()?;
        let data2 = u16::from_str_radix(parts[1], 16).ok()?;
        let data3 = u16::from_str_radix(parts[2], 16).ok()?;
        let clock = u16::from_str_radix(parts[3], 16).ok()?;

        let mut data4 = [0u8; 8];
        data4[..2].copy_from_slice(&clock.to_be_bytes());
        for (i, byte) in data4[2..].iter_mut().enumerate() {
            *byte = u8::from_str_radix(parts[4].get(i * 2..i * 2 + 2)?, 16).ok()?;
        }

        Some(Self::new(data1, data2, data3, data4))
    }

    pub fn is_nil(&self) -> bool {
        *self == Self::NIL
    }

    /// The 16 bytes in little-endian GUID layout
    pub fn to_bytes_le(&self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[0..4].copy_from_slice(&self.data1.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.data2.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.data3.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.data4);
        bytes
    }

    pub fn from_bytes_le(bytes: [u8; 16]) -> Self {
        let mut data4 = [0u8; 8];
        data4.copy_from_slice(&bytes[8..16]);
        Self {
            data1: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            data2: u16::from_le_bytes([bytes[4], bytes[5]]),
            data3: u16::from_le_bytes([bytes[6], bytes[7]]),
            data4,
        }
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.data1,
            self.data2,
            self.data3,
            self.data4[0],
            self.data4[1],
            self.data4[2],
            self.data4[3],
            self.data4[4],
            self.data4[5],
            self.data4[6],
            self.data4[7],
        )
    }
}

impl NdrEncode for Guid {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        // aligns like its first field
        w.write_align(4)?;
        w.write_data(self.data1)?;
        w.write_data(self.data2)?;
        w.write_data(self.data3)?;
        w.write_bytes(&self.data4);
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for Guid {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        r.read_align(4)?;
        let data1 = r.read_data()?;
        let data2 = r.read_data()?;
        let data3 = r.read_data()?;
        let mut data4 = [0u8; 8];
        data4.copy_from_slice(&r.read_bytes(8)?);
        Ok(Self::new(data1, data2, data3, data4))
    }

    fn ndr_align() -> usize {
        4
    }
}

/// RPC context handle: 4-byte attributes followed by a 16-byte GUID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ContextHandle {
    pub attributes: u32,
    pub uuid: Guid,
}

impl ContextHandle {
    /// Wire size of a context handle
    pub const WIRE_SIZE: usize = 20;

    /// The all-zero handle servers return from a close call
    pub const NULL: Self = Self {
        attributes: 0,
        uuid: Guid::NIL,
    };

    pub fn new(attributes: u32, uuid: Guid) -> Self {
        Self { attributes, uuid }
    }

    /// Whether every byte is zero
    ///
    /// Informational only: the codec encodes and decodes null handles like
    /// any other.
    pub fn is_null(&self) -> bool {
        self.attributes == 0 && self.uuid.is_nil()
    }
}

impl NdrEncode for ContextHandle {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_data(self.attributes)?;
        self.uuid.ndr_encode(w)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for ContextHandle {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let attributes = r.read_data()?;
        let uuid = Guid::ndr_decode(r)?;
        Ok(Self { attributes, uuid })
    }

    fn ndr_align() -> usize {
        4
    }
}
