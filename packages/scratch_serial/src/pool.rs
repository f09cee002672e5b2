use std::any::type_name;
use std::fmt;
use std::iter;
use std::mem;
use std::num::NonZero;
use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;
use tracing::debug;

use crate::ScratchBuffer;

/// A bounded, thread-safe set of idle [`ScratchBuffer`]s.
///
/// The pool holds at most [`capacity()`][Self::capacity] idle buffers. Taking a buffer out of
/// the pool never blocks: if no buffer is idle, [`acquire()`][Self::acquire] returns `None` and
/// the caller is expected to get by without one.
///
/// Prefer [`lease()`][Self::lease], which returns the buffer to the pool automatically when the
/// lease is dropped, whichever way the caller leaves the scope.
///
/// # Thread safety
///
/// The pool is thread-safe ([`Send`] + [`Sync`]). The collection of idle buffers is protected by
/// a lock that is held only while a buffer is pushed or popped. The contents of a buffer that has
/// been taken out of the pool are the exclusive responsibility of its holder.
///
/// # Example
///
/// ```
/// use std::num::NonZero;
///
/// use scratch_serial::ScratchPool;
///
/// let pool = ScratchPool::with_buffers(NonZero::new(2).unwrap(), 64);
///
/// {
///     let mut lease = pool.lease().expect("pool starts full");
///     lease[0] = 42;
///     assert_eq!(pool.idle_count(), 1);
/// }
///
/// // The lease has returned its buffer.
/// assert_eq!(pool.idle_count(), 2);
/// ```
pub struct ScratchPool {
    idle: Mutex<Vec<ScratchBuffer>>,
    capacity: NonZero<usize>,
}

impl ScratchPool {
    /// Creates an empty pool that keeps at most `capacity` idle buffers.
    ///
    /// Buffers enter the pool through [`release()`][Self::release].
    #[must_use]
    pub fn new(capacity: NonZero<usize>) -> Self {
        Self {
            idle: Mutex::new(Vec::with_capacity(capacity.get())),
            capacity,
        }
    }

    /// Creates a pool with capacity `count`, filled with `count` zeroed buffers of `size` bytes.
    #[must_use]
    pub fn with_buffers(count: NonZero<usize>, size: usize) -> Self {
        let pool = Self::new(count);

        let buffers = iter::repeat_with(|| ScratchBuffer::new(size))
            .take(count.get());
        pool.idle.lock().extend(buffers);

        debug!(count = count.get(), size, "scratch pool filled");

        pool
    }

    /// The maximum number of idle buffers the pool keeps.
    #[must_use]
    #[inline]
    pub fn capacity(&self) -> NonZero<usize> {
        self.capacity
    }

    /// The number of buffers currently idle in the pool.
    ///
    /// Other threads may change this at any moment, so the value is only a snapshot.
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    /// Takes an idle buffer out of the pool, if there is one.
    ///
    /// The caller owns the buffer until it hands it back via [`release()`][Self::release].
    /// Consider [`lease()`][Self::lease] instead, which cannot forget to do that.
    #[must_use]
    pub fn acquire(&self) -> Option<ScratchBuffer> {
        self.idle.lock().pop()
    }

    /// Returns a buffer to the pool.
    ///
    /// If the pool already holds [`capacity()`][Self::capacity] idle buffers, the buffer is
    /// dropped instead. This is not treated as an error. The pool also accepts buffers that it
    /// did not hand out, of any length, as long as there is room for them.
    pub fn release(&self, buffer: ScratchBuffer) {
        let mut idle = self.idle.lock();

        if idle.len() < self.capacity.get() {
            idle.push(buffer);
            return;
        }

        drop(idle);

        debug!(
            capacity = self.capacity.get(),
            len = buffer.len(),
            "scratch pool is full; dropping released buffer"
        );
    }

    /// Takes an idle buffer out of the pool for the lifetime of the returned lease.
    ///
    /// The buffer goes back to the pool when the lease is dropped, including during unwinding.
    /// Returns `None` if no buffer is idle.
    #[must_use]
    pub fn lease(&self) -> Option<ScratchLease<'_>> {
        self.acquire().map(|buffer| ScratchLease {
            pool: self,
            buffer,
        })
    }
}

impl fmt::Debug for ScratchPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("capacity", &self.capacity)
            .field("idle_count", &self.idle_count())
            .finish_non_exhaustive()
    }
}

/// Exclusive use of a [`ScratchBuffer`] taken from a [`ScratchPool`].
///
/// Dereferences to the buffer. Dropping the lease releases the buffer back to the pool.
pub struct ScratchLease<'p> {
    pool: &'p ScratchPool,
    buffer: ScratchBuffer,
}

impl Deref for ScratchLease<'_> {
    type Target = ScratchBuffer;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl DerefMut for ScratchLease<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

impl Drop for ScratchLease<'_> {
    fn drop(&mut self) {
        // Leaves an empty, unallocated buffer in place of the released one.
        let buffer = mem::take(&mut self.buffer);
        self.pool.release(buffer);
    }
}

impl fmt::Debug for ScratchLease<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("buffer", &self.buffer)
            .finish_non_exhaustive()
    }
}
