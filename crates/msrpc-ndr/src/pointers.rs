//! NDR pointer types
//!
//! NDR supports three pointer semantics:
//!
//! - Reference (`[ref]`): Non-null, data follows inline, no wire representation
//! - Unique (`[unique]`): Nullable, referent ID, no aliasing
//! - Full (`[ptr]`): Nullable, referent ID, aliasing allowed
//!
//! Unique and full pointers write a referent ID in place and defer the body
//! to the writer's queue. On decode the body is not available until the
//! reader's queue is drained, so both hold a [`Referent`]: a shared,
//! once-filled cell. Two decoded pointers carrying the same referent ID hold
//! the same cell.

use std::any::type_name;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::{NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter, Result};

/// First referent ID handed out in a PDU
pub const FIRST_REFERENT_ID: u64 = 0x0002_0000;

/// Distance between consecutive referent IDs
pub const REFERENT_ID_STEP: u64 = 4;

/// Identity of an in-memory referent during one encode pass
///
/// Two pointers with equal keys denote the same referent and share one
/// referent ID on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferentKey {
    addr: usize,
    type_name: &'static str,
}

impl ReferentKey {
    /// Key a referent by its address and type
    pub fn of<T: ?Sized>(value: &T) -> Self {
        Self {
            addr: value as *const T as *const () as usize,
            type_name: type_name::<T>(),
        }
    }
}

/// Shared handle to a pointer's referent
///
/// Built from a value on the encode side. On the decode side it starts out
/// pending and is filled when the deferred body is read; every pointer that
/// carried the same referent ID observes the same value.
pub struct Referent<T>(Arc<OnceLock<T>>);

impl<T> Referent<T> {
    pub fn new(value: T) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(value);
        Self(Arc::new(cell))
    }

    pub(crate) fn pending() -> Self {
        Self(Arc::new(OnceLock::new()))
    }

    /// Fill a pending referent. Returns false if it already had a value.
    pub(crate) fn resolve(&self, value: T) -> bool {
        self.0.set(value).is_ok()
    }

    /// The referent's value, or `None` while its body has not been read
    pub fn get(&self) -> Option<&T> {
        self.0.get()
    }

    /// Mutable access when this handle is the only one
    pub fn get_mut(&mut self) -> Option<&mut T> {
        Arc::get_mut(&mut self.0).and_then(OnceLock::get_mut)
    }

    pub fn is_resolved(&self) -> bool {
        self.0.get().is_some()
    }

    /// Whether two handles denote the same referent
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Referent identity used for aliasing on encode
    pub fn key(&self) -> ReferentKey {
        ReferentKey::of(&*self.0)
    }

    /// Take the value out if no other handle shares it
    pub fn try_into_inner(self) -> std::result::Result<T, Self> {
        match Arc::try_unwrap(self.0) {
            Ok(cell) => cell.into_inner().ok_or_else(Self::pending),
            Err(shared) => Err(Self(shared)),
        }
    }
}

impl<T> Clone for Referent<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> From<T> for Referent<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: PartialEq> PartialEq for Referent<T> {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl<T: fmt::Debug> fmt::Debug for Referent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(value) => f.debug_tuple("Referent").field(value).finish(),
            None => f.write_str("Referent(<pending>)"),
        }
    }
}

/// Trait for NDR pointer types
pub trait NdrPtr {
    type Target;

    /// Check if the pointer is null
    fn is_null(&self) -> bool;

    /// Get the inner value, if any
    fn get(&self) -> Option<&Self::Target>;
}

/// Reference pointer - non-null, data follows inline
///
/// The `[ref]` attribute on a top-level parameter. The pointer itself is
/// not transmitted; the pointee data is always present.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RefPtr<T>(pub T);

impl<T> RefPtr<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for RefPtr<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> std::ops::DerefMut for RefPtr<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T> NdrPtr for RefPtr<T> {
    type Target = T;

    fn is_null(&self) -> bool {
        false
    }

    fn get(&self) -> Option<&T> {
        Some(&self.0)
    }
}

impl<T: NdrEncode> NdrEncode for RefPtr<T> {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        // Reference pointers have no wire representation - just encode the data
        self.0.ndr_encode(w)
    }

    fn ndr_align() -> usize {
        T::ndr_align()
    }
}

impl<T: NdrDecode> NdrDecode for RefPtr<T> {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        Ok(Self(T::ndr_decode(r)?))
    }

    fn ndr_align() -> usize {
        T::ndr_align()
    }
}

macro_rules! nullable_pointer {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name<T>(pub Option<Referent<T>>);

        impl<T> $name<T> {
            pub fn new(value: T) -> Self {
                Self(Some(Referent::new(value)))
            }

            pub fn null() -> Self {
                Self(None)
            }

            pub fn from_option(opt: Option<T>) -> Self {
                Self(opt.map(Referent::new))
            }

            /// Point at an existing (possibly shared) referent
            pub fn from_referent(referent: Referent<T>) -> Self {
                Self(Some(referent))
            }

            pub fn referent(&self) -> Option<&Referent<T>> {
                self.0.as_ref()
            }

            pub fn as_ref(&self) -> Option<&T> {
                self.0.as_ref().and_then(Referent::get)
            }
        }

        impl<T> Default for $name<T> {
            fn default() -> Self {
                Self::null()
            }
        }

        impl<T> From<Option<T>> for $name<T> {
            fn from(opt: Option<T>) -> Self {
                Self::from_option(opt)
            }
        }

        impl<T> NdrPtr for $name<T> {
            type Target = T;

            fn is_null(&self) -> bool {
                self.0.is_none()
            }

            fn get(&self) -> Option<&T> {
                self.as_ref()
            }
        }

        impl<T: NdrDecode + 'static> NdrDecode for $name<T> {
            fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
                Ok(Self(r.read_pointer(T::ndr_decode)?))
            }

            fn ndr_align() -> usize {
                // NDR20 referent ID; 8 under NDR64
                4
            }
        }
    };
}

nullable_pointer!(
    /// Unique pointer - nullable, no aliasing
    ///
    /// The `[unique]` attribute in MIDL. Encoded as a referent ID (0 = null)
    /// in place, with the pointee in the deferred section. Every non-null
    /// occurrence gets its own referent ID.
    UniquePtr
);

nullable_pointer!(
    /// Full pointer - nullable, aliasing allowed
    ///
    /// The `[ptr]` attribute in MIDL. Pointers sharing a [`Referent`] are
    /// written with one referent ID and one body, and decode back into
    /// handles that share a single value.
    FullPtr
);

impl<T: NdrEncode> NdrEncode for UniquePtr<T> {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        match &self.0 {
            None => w.write_null_pointer(),
            Some(referent) => {
                let value = referent.get().ok_or(NdrError::PendingReferent)?;
                w.write_unique_pointer(move |w| value.ndr_encode(w))
            }
        }
    }

    fn ndr_align() -> usize {
        // NDR20 minimum, see `NdrDecode::ndr_align`
        4
    }
}

impl<T: NdrEncode> NdrEncode for FullPtr<T> {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        match &self.0 {
            None => w.write_null_pointer(),
            Some(referent) => {
                let value = referent.get().ok_or(NdrError::PendingReferent)?;
                w.write_pointer(referent.key(), move |w| value.ndr_encode(w))
            }
        }
    }

    fn ndr_align() -> usize {
        4
    }
}
