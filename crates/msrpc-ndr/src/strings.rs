//! NDR string types
//!
//! NDR strings are conformant varying arrays of characters.
//!
//! Wire format:
//! ```text
//! max_count: u32    # Maximum elements
//! offset: u32       # Always 0 when written
//! actual_count: u32 # Transmitted elements
//! chars[actual_count]
//! ```
//!
//! The `nstring` flavours append a null terminator and include it in both
//! counts. The plain flavours send the characters as given. On read the
//! declared actual count is trusted: max count and offset are not checked
//! against it, and invalid character data is replaced rather than rejected.

use crate::{NdrDecode, NdrEncode, NdrReader, NdrWriter, Result};

/// Length of `s` in UTF-16 code units, terminator included
pub fn utf16_nlen(s: &str) -> usize {
    s.encode_utf16().count() + 1
}

/// Length of `s` in bytes, terminator included
pub fn char_nlen(s: &str) -> usize {
    s.len() + 1
}

/// Length of a REG_MULTI_SZ block in UTF-16 code units
///
/// Every entry carries its own terminator and the block ends with one more.
pub fn multi_sz_len<S: AsRef<str>>(entries: &[S]) -> usize {
    entries.iter().map(|s| utf16_nlen(s.as_ref())).sum::<usize>() + 1
}

impl<'a> NdrWriter<'a> {
    /// Write a null-terminated UTF-16 string
    pub fn write_utf16_nstring(&mut self, s: &str) -> Result<()> {
        let mut units: Vec<u16> = s.encode_utf16().collect();
        units.push(0);
        self.write_utf16_units(&units)
    }

    /// Write a UTF-16 string without adding a terminator
    pub fn write_utf16_string(&mut self, s: &str) -> Result<()> {
        let units: Vec<u16> = s.encode_utf16().collect();
        self.write_utf16_units(&units)
    }

    /// Write a null-terminated 8-bit string
    pub fn write_char_nstring(&mut self, s: &str) -> Result<()> {
        self.write_varying_header(char_nlen(s))?;
        self.write_bytes(s.as_bytes());
        self.write_bytes(&[0]);
        Ok(())
    }

    /// Write an 8-bit string without adding a terminator
    pub fn write_char_string(&mut self, s: &str) -> Result<()> {
        self.write_varying_header(s.len())?;
        self.write_bytes(s.as_bytes());
        Ok(())
    }

    fn write_utf16_units(&mut self, units: &[u16]) -> Result<()> {
        self.write_varying_header(units.len())?;
        for unit in units {
            self.write_data(*unit)?;
        }
        Ok(())
    }

    fn write_varying_header(&mut self, count: usize) -> Result<()> {
        let count = count as u64;
        self.write_size(count)?;
        self.write_size(0)?;
        self.write_size(count)
    }
}

impl NdrReader {
    /// Read a null-terminated UTF-16 string, dropping the terminator
    pub fn read_utf16_nstring(&mut self) -> Result<String> {
        let mut units = self.read_utf16_units()?;
        if units.last() == Some(&0) {
            units.pop();
        }
        Ok(String::from_utf16_lossy(&units))
    }

    /// Read a UTF-16 string, stopping at the first null if there is one
    pub fn read_utf16_string(&mut self) -> Result<String> {
        let units = self.read_utf16_units()?;
        let end = units.iter().position(|u| *u == 0).unwrap_or(units.len());
        Ok(String::from_utf16_lossy(&units[..end]))
    }

    /// Read a null-terminated 8-bit string, dropping the terminator
    pub fn read_char_nstring(&mut self) -> Result<String> {
        let count = self.read_varying_header(1)?;
        let bytes = self.read_bytes(count)?;
        let content = match bytes.last() {
            Some(0) => &bytes[..count - 1],
            _ => &bytes[..],
        };
        Ok(String::from_utf8_lossy(content).into_owned())
    }

    /// Read an 8-bit string, stopping at the first null if there is one
    pub fn read_char_string(&mut self) -> Result<String> {
        let count = self.read_varying_header(1)?;
        let bytes = self.read_bytes(count)?;
        let end = bytes.iter().position(|b| *b == 0).unwrap_or(count);
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    fn read_utf16_units(&mut self) -> Result<Vec<u16>> {
        let count = self.read_varying_header(2)?;
        let mut units = Vec::with_capacity(count);
        for _ in 0..count {
            units.push(self.read_data::<u16>()?);
        }
        Ok(units)
    }

    fn read_varying_header(&mut self, char_size: usize) -> Result<usize> {
        let _max_count = self.read_size()?;
        let _offset = self.read_size()?;
        let actual_count = self.read_size()?;
        self.check_count(actual_count, char_size)
    }
}

macro_rules! string_wrapper {
    ($(#[$doc:meta])* $name:ident, $write:ident, $read:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl NdrEncode for $name {
            fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
                w.$write(&self.0)
            }

            fn ndr_align() -> usize {
                4
            }
        }

        impl NdrDecode for $name {
            fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
                Ok(Self(r.$read()?))
            }

            fn ndr_align() -> usize {
                4
            }
        }
    };
}

string_wrapper!(
    /// ANSI string type (null-terminated char*)
    ///
    /// Used for [string] annotated char* parameters in MIDL.
    NdrString,
    write_char_nstring,
    read_char_nstring
);

string_wrapper!(
    /// Unicode string type (null-terminated wchar_t*)
    ///
    /// Used for [string] annotated wchar_t* parameters in MIDL.
    /// Encoded as UTF-16 on the wire.
    NdrWString,
    write_utf16_nstring,
    read_utf16_nstring
);

string_wrapper!(
    /// BSTR - COM-style string
    ///
    /// On the wire a BSTR is a terminated UTF-16 conformant varying array,
    /// same as [`NdrWString`].
    BString,
    write_utf16_nstring,
    read_utf16_nstring
);
