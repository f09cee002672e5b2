use std::any::type_name;
use std::fmt;
use std::io::{self, Read};

use crate::{Error, Result};

/// Sequential, read-only view over the bytes a [`Serializer`][crate::Serializer] decodes from.
///
/// The source never copies the input: [`read_bytes()`][Self::read_bytes] and
/// [`read_remaining()`][Self::read_remaining] return slices of the original byte sequence,
/// advancing a cursor past them. Reading beyond the end of the input fails with
/// [`Error::Io`] of kind [`io::ErrorKind::UnexpectedEof`] and leaves the cursor where it was.
///
/// # Example
///
/// ```
/// use scratch_serial::ByteSource;
///
/// let mut source = ByteSource::new(b"\x03abcde");
///
/// let len = source.read_u8()?;
/// assert_eq!(source.read_bytes(usize::from(len))?, b"abc");
/// assert_eq!(source.remaining(), 2);
/// assert!(source.read_bytes(3).is_err());
/// # Ok::<(), scratch_serial::Error>(())
/// ```
pub struct ByteSource<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> ByteSource<'a> {
    /// Creates a source positioned at the start of `bytes`.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    /// Offset of the next byte to be read, from the start of the input.
    #[must_use]
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of bytes not yet read.
    #[must_use]
    #[inline]
    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.position)
    }

    /// Whether every byte has been read.
    #[must_use]
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Reads the next `count` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if fewer than `count` bytes remain. Nothing is consumed in that case.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let bytes: &'a [u8] = self.bytes;
        let start = self.position;

        let (chunk, end) = start
            .checked_add(count)
            .and_then(|end| bytes.get(start..end).map(|chunk| (chunk, end)))
            .ok_or_else(|| Error::unexpected_eof(count, self.remaining()))?;

        self.position = end;
        Ok(chunk)
    }

    /// Reads the next byte.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the input is exhausted.
    pub fn read_u8(&mut self) -> Result<u8> {
        let chunk = self.read_bytes(1)?;

        chunk
            .first()
            .copied()
            .ok_or_else(|| Error::unexpected_eof(1, 0))
    }

    /// Reads everything that has not been read yet. Returns an empty slice if the input is
    /// exhausted.
    pub fn read_remaining(&mut self) -> &'a [u8] {
        let rest = self.bytes.get(self.position..).unwrap_or_default();
        self.position = self.bytes.len();
        rest
    }
}

impl Read for ByteSource<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let count = buf.len().min(self.remaining());

        let chunk = self.read_bytes(count).map_err(|e| match e {
            Error::Io(inner) => inner,
            other => io::Error::other(other),
        })?;

        // Both sides are exactly `count` bytes long.
        if let Some(target) = buf.get_mut(..count) {
            target.copy_from_slice(chunk);
        }

        Ok(count)
    }
}

// The input may be large; the cursor is what matters when debugging.
impl fmt::Debug for ByteSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("len", &self.bytes.len())
            .field("position", &self.position)
            .finish()
    }
}
