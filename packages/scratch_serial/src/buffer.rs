use std::any::type_name;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// A fixed-length, reusable byte buffer that serialization can write into.
///
/// Scratch buffers are move-only: whoever holds the value has exclusive access to its contents.
/// A [`ScratchPool`][crate::ScratchPool] owns its idle buffers and hands them out by value, so a
/// buffer can never be written to by two serializations at the same time.
///
/// The default value is an empty buffer, which does not allocate.
///
/// The length of a scratch buffer never changes. Serialization that needs more space than the
/// buffer offers continues in a separate heap allocation (see [`ByteSink`][crate::ByteSink]).
///
/// # Example
///
/// ```
/// use scratch_serial::ScratchBuffer;
///
/// let mut buffer = ScratchBuffer::new(4);
/// buffer.copy_from_slice(b"abcd");
///
/// assert_eq!(buffer.len(), 4);
/// assert_eq!(&buffer[..], b"abcd");
/// ```
#[derive(Default)]
pub struct ScratchBuffer {
    bytes: Box<[u8]>,
}

impl ScratchBuffer {
    /// Allocates a zero-filled buffer of `size` bytes.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size].into_boxed_slice(),
        }
    }

    /// The fixed length of the buffer, in bytes.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the buffer has a length of zero.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The contents of the buffer as a mutable slice.
    #[must_use]
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl Deref for ScratchBuffer {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.bytes
    }
}

impl DerefMut for ScratchBuffer {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.bytes
    }
}

// The contents are leftovers from earlier serializations and are meaningless to a reader.
impl fmt::Debug for ScratchBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
