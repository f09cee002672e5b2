use std::any::type_name;
use std::fmt;
use std::io::{self, Write};

/// Append-only destination for the bytes a [`Serializer`][crate::Serializer] produces.
///
/// A sink may be backed by a caller-provided scratch slice, in which case bytes are written into
/// that slice in place for as long as they fit. The first write that does not fit moves the
/// already-written bytes into a heap allocation and the sink continues there; the scratch slice
/// itself is never resized. A sink without a scratch slice writes to the heap from the start.
///
/// [`into_bytes()`][Self::into_bytes] hands out exactly the bytes that were written, copied out
/// of the scratch slice if they were still there. The result never borrows from the slice, so the
/// slice can be reused as soon as the sink is gone.
///
/// The sink also implements [`Write`], for serializers that are built on top of
/// [`std::io`].
///
/// # Example
///
/// ```
/// use scratch_serial::ByteSink;
///
/// let mut scratch = [0_u8; 4];
/// let mut sink = ByteSink::new(Some(&mut scratch));
///
/// sink.write_bytes(b"abc");
/// assert!(!sink.is_spilled());
///
/// sink.write_bytes(b"def");
/// assert!(sink.is_spilled());
///
/// assert_eq!(sink.into_bytes(), b"abcdef");
/// ```
pub struct ByteSink<'a> {
    storage: Storage<'a>,

    // Whether the sink started out on a scratch slice but has since moved to the heap.
    spilled: bool,
}

enum Storage<'a> {
    Scratch { buffer: &'a mut [u8], len: usize },
    Heap(Vec<u8>),
}

impl<'a> ByteSink<'a> {
    /// Creates a sink that writes into `scratch` while the output fits, or straight to the heap
    /// if no scratch slice is given.
    #[must_use]
    pub fn new(scratch: Option<&'a mut [u8]>) -> Self {
        let storage = scratch.map_or_else(
            || Storage::Heap(Vec::new()),
            |buffer| Storage::Scratch { buffer, len: 0 },
        );

        Self {
            storage,
            spilled: false,
        }
    }

    /// Creates a sink that writes straight to the heap.
    #[must_use]
    pub fn unbacked() -> Self {
        Self::new(None)
    }

    /// Appends `bytes` to the output.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        let heap = match &mut self.storage {
            Storage::Heap(heap) => {
                heap.extend_from_slice(bytes);
                return;
            }
            Storage::Scratch { buffer, len } => {
                let end = len.saturating_add(bytes.len());

                if let Some(target) = buffer.get_mut(*len..end) {
                    target.copy_from_slice(bytes);
                    *len = end;
                    return;
                }

                let written = buffer.get(..*len).unwrap_or_default();

                let mut heap = Vec::with_capacity(spill_capacity(buffer.len(), end));
                heap.extend_from_slice(written);
                heap.extend_from_slice(bytes);
                heap
            }
        };

        self.storage = Storage::Heap(heap);
        self.spilled = true;
    }

    /// Appends a single byte to the output.
    #[inline]
    pub fn write_u8(&mut self, byte: u8) {
        self.write_bytes(&[byte]);
    }

    /// The number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Scratch { len, .. } => *len,
            Storage::Heap(heap) => heap.len(),
        }
    }

    /// Whether nothing has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the output outgrew the scratch slice and was moved to the heap.
    ///
    /// Always `false` for a sink that had no scratch slice to begin with.
    #[must_use]
    #[inline]
    pub fn is_spilled(&self) -> bool {
        self.spilled
    }

    /// The bytes written so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match &self.storage {
            Storage::Scratch { buffer, len } => buffer.get(..*len).unwrap_or_default(),
            Storage::Heap(heap) => heap.as_slice(),
        }
    }

    /// Consumes the sink, returning exactly the bytes that were written.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        match self.storage {
            Storage::Scratch { buffer, len } => buffer.get(..len).unwrap_or_default().to_vec(),
            Storage::Heap(heap) => heap,
        }
    }
}

// Never less than `required`, and at least double the scratch size.
#[cfg_attr(test, mutants::skip)] // Only affects allocation size, never the output.
fn spill_capacity(scratch_len: usize, required: usize) -> usize {
    required.max(scratch_len.saturating_mul(2))
}

impl Write for ByteSink<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf);
        Ok(buf.len())
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.write_bytes(buf);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Debug for ByteSink<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("len", &self.len())
            .field("spilled", &self.spilled)
            .finish_non_exhaustive()
    }
}
