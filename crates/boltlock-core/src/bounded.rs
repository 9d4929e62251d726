//! Fixed-capacity buffers.
//!
//! Slot records are plain values with a size known at compile time, so user
//! names and credential data are stored inline instead of in heap
//! allocations sized by whatever the bus delivered. Construction checks the
//! length explicitly and fails rather than truncating.

use std::fmt;

use serde::{Serialize, Serializer};

/// Input longer than the buffer's capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityExceeded {
    /// Length of the rejected input
    pub len: usize,
    /// Capacity of the buffer
    pub capacity: usize,
}

/// Up to `N` bytes stored inline.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedBuf<const N: usize> {
    bytes: [u8; N],
    len: usize,
}

impl<const N: usize> FixedBuf<N> {
    /// Capacity in bytes.
    pub const CAPACITY: usize = N;

    /// Empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self { bytes: [0; N], len: 0 }
    }

    /// Copy `data` into a new buffer.
    ///
    /// # Errors
    ///
    /// Returns `CapacityExceeded` if `data` is longer than `N`.
    pub fn from_slice(data: &[u8]) -> Result<Self, CapacityExceeded> {
        if data.len() > N {
            return Err(CapacityExceeded { len: data.len(), capacity: N });
        }

        let mut buf = Self::new();
        buf.bytes[..data.len()].copy_from_slice(data);
        buf.len = data.len();
        Ok(buf)
    }

    /// Stored bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Number of stored bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether no bytes are stored.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<const N: usize> Default for FixedBuf<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for FixedBuf<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Credential data: show the length only.
        write!(f, "FixedBuf<{N}>({} bytes)", self.len)
    }
}

/// UTF-8 text of at most `N` bytes stored inline.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BoundedName<const N: usize>(FixedBuf<N>);

impl<const N: usize> BoundedName<N> {
    /// Capacity in bytes.
    pub const CAPACITY: usize = N;

    /// Copy `name` into a new buffer.
    ///
    /// # Errors
    ///
    /// Returns `CapacityExceeded` if `name` is longer than `N` bytes.
    pub fn new(name: &str) -> Result<Self, CapacityExceeded> {
        FixedBuf::from_slice(name.as_bytes()).map(Self)
    }

    /// Stored text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Only ever filled from a `&str`, so this cannot fail.
        std::str::from_utf8(self.0.as_bytes()).unwrap_or_default()
    }

    /// Length in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the name is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<const N: usize> fmt::Debug for BoundedName<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl<const N: usize> fmt::Display for BoundedName<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<const N: usize> Serialize for BoundedName<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_at_capacity_fits() {
        let name = BoundedName::<5>::new("Alice").unwrap();
        assert_eq!(name.as_str(), "Alice");
        assert_eq!(name.len(), 5);
    }

    #[test]
    fn name_over_capacity_rejected() {
        let err = BoundedName::<4>::new("Alice").unwrap_err();
        assert_eq!(err, CapacityExceeded { len: 5, capacity: 4 });
    }

    #[test]
    fn capacity_counts_bytes_not_chars() {
        // "é" is two bytes in UTF-8
        assert!(BoundedName::<3>::new("éé").is_err());
        assert!(BoundedName::<4>::new("éé").is_ok());
    }

    #[test]
    fn buffer_debug_hides_contents() {
        let buf = FixedBuf::<8>::from_slice(b"1234").unwrap();
        assert_eq!(format!("{buf:?}"), "FixedBuf<8>(4 bytes)");
        assert_eq!(buf.as_bytes(), b"1234");
    }

    #[test]
    fn empty_by_default() {
        let name = BoundedName::<10>::default();
        assert!(name.is_empty());
        assert_eq!(name.as_str(), "");
    }
}
