//!
//! Opaque resource handles.
//!
//! A handle is a non-zero u64 that stands in for a resource across a
//! boundary where native references cannot travel. Zero is reserved to mean
//! "absent", so `Handle` wraps `NonZeroU64` and `Option<Handle>` is the same
//! size as a bare integer.
//!

use std::fmt;
use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(NonZeroU64);

impl Handle {
    /// Rebuild a handle from the bare integer a foreign caller handed back.
    /// Returns `None` for 0.
    pub fn from_raw(raw: u64) -> Option<Handle> {
        NonZeroU64::new(raw).map(Handle)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl From<Handle> for u64 {
    fn from(handle: Handle) -> u64 {
        handle.get()
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
