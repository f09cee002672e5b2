use std::num::NonZero;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::{
    ByteBufferSerialBuilder, ByteSink, ByteSource, Result, ScratchPool, Serial,
    SerializationContext, Serializer,
};

/// Converts values to byte arrays and back, writing through pooled scratch buffers.
///
/// Serializing a value needs somewhere to put the bytes before their final length is known. If
/// the bridge has a [`ScratchPool`], each call borrows a buffer from it, serializes into that
/// buffer and copies the result out, so repeated calls do not keep allocating and discarding
/// growable buffers. Values that do not fit in a scratch buffer still serialize correctly; the
/// output continues in a heap allocation. When the pool is exhausted or absent, calls serialize
/// without a scratch buffer.
///
/// Deserializing reads straight from the caller's bytes and never touches the pool.
///
/// # Thread safety
///
/// The bridge is thread-safe ([`Send`] + [`Sync`]) and may be shared between any number of
/// threads. Concurrent calls only contend on the pool's lock while taking or returning a buffer.
///
/// # Example
///
/// ```
/// use std::num::NonZero;
///
/// use scratch_serial::{
///     ByteBufferSerial, ByteSink, ByteSource, Result, SerializationContext, Serializer,
/// };
///
/// struct Utf8;
///
/// impl Serializer<String> for Utf8 {
///     fn serialize(
///         &self,
///         _: &SerializationContext,
///         sink: &mut ByteSink<'_>,
///         value: &String,
///     ) -> Result<()> {
///         sink.write_bytes(value.as_bytes());
///         Ok(())
///     }
///
///     fn deserialize(
///         &self,
///         _: &SerializationContext,
///         source: &mut ByteSource<'_>,
///     ) -> Result<String> {
///         Ok(String::from_utf8_lossy(source.read_remaining()).into_owned())
///     }
/// }
///
/// let serial = ByteBufferSerial::with_buffers(NonZero::new(4).unwrap(), 256);
///
/// let bytes = serial.to_bytes(Some(&"hello".to_string()), &Utf8)?;
/// assert_eq!(bytes, b"hello");
///
/// let value = serial.from_bytes(Some(bytes.as_slice()), &Utf8)?;
/// assert_eq!(value.as_deref(), Some("hello"));
/// # Ok::<(), scratch_serial::Error>(())
/// ```
#[derive(Debug)]
pub struct ByteBufferSerial {
    pool: Option<Arc<ScratchPool>>,
    context: SerializationContext,
}

impl ByteBufferSerial {
    /// Creates a bridge without a scratch pool, using [`SerializationContext::ALWAYS_RELEASE`].
    ///
    /// Every serialization allocates its output buffer from scratch. Use
    /// [`with_buffers()`][Self::with_buffers] or [`builder()`][Self::builder] to enable pooling.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a bridge with a pool of `count` scratch buffers of `size` bytes each.
    #[must_use]
    pub fn with_buffers(count: NonZero<usize>, size: usize) -> Self {
        Self::builder().buffers(count, size).build()
    }

    /// Creates a builder for configuring the bridge.
    #[inline]
    pub fn builder() -> ByteBufferSerialBuilder {
        ByteBufferSerialBuilder::new()
    }

    pub(crate) fn new_inner(context: SerializationContext, pool: Option<Arc<ScratchPool>>) -> Self {
        Self { pool, context }
    }

    /// The context passed to every serializer call.
    #[must_use]
    #[inline]
    pub fn context(&self) -> SerializationContext {
        self.context
    }

    /// The scratch pool, if pooling is enabled.
    #[must_use]
    #[inline]
    pub fn pool(&self) -> Option<&Arc<ScratchPool>> {
        self.pool.as_ref()
    }

    /// Serializes `value` into a new byte array, using a pooled scratch buffer if one is idle.
    ///
    /// An absent value produces an empty array without calling the serializer or touching the
    /// pool. A scratch buffer taken from the pool is returned to it before this method returns,
    /// whether the serializer succeeds, fails or panics.
    ///
    /// # Errors
    ///
    /// Returns whatever error the serializer returns, unchanged.
    pub fn to_bytes<T, S>(&self, value: Option<&T>, serializer: &S) -> Result<Vec<u8>>
    where
        S: Serializer<T> + ?Sized,
    {
        let Some(value) = value else {
            trace!("absent value serializes to empty byte array");
            return Ok(Vec::new());
        };

        let Some(pool) = self.pool.as_deref() else {
            return self.encode(value, serializer, None);
        };

        if let Some(mut lease) = pool.lease() {
            return self.encode(value, serializer, Some(lease.as_mut_slice()));
        }

        debug!(
            capacity = pool.capacity().get(),
            "scratch pool exhausted; serializing without scratch buffer"
        );

        self.encode(value, serializer, None)
    }

    /// Serializes `value` into a new byte array, using `scratch` as the scratch buffer instead of
    /// taking one from the pool.
    ///
    /// Output that does not fit in `scratch` continues in a heap allocation. The returned array
    /// never borrows from `scratch`. An absent value produces an empty array without calling the
    /// serializer.
    ///
    /// # Errors
    ///
    /// Returns whatever error the serializer returns, unchanged.
    pub fn to_bytes_with_scratch<T, S>(
        &self,
        value: Option<&T>,
        serializer: &S,
        scratch: Option<&mut [u8]>,
    ) -> Result<Vec<u8>>
    where
        S: Serializer<T> + ?Sized,
    {
        let Some(value) = value else {
            trace!("absent value serializes to empty byte array");
            return Ok(Vec::new());
        };

        self.encode(value, serializer, scratch)
    }

    /// Deserializes a value from `bytes`.
    ///
    /// Absent or empty input produces `None` without calling the serializer.
    ///
    /// # Errors
    ///
    /// Returns whatever error the serializer returns, unchanged. No partially decoded value is
    /// returned on failure.
    pub fn from_bytes<T, S>(&self, bytes: Option<&[u8]>, serializer: &S) -> Result<Option<T>>
    where
        S: Serializer<T> + ?Sized,
    {
        let Some(bytes) = bytes.filter(|bytes| !bytes.is_empty()) else {
            trace!("absent or empty input deserializes to no value");
            return Ok(None);
        };

        let mut source = ByteSource::new(bytes);

        serializer.deserialize(&self.context, &mut source).map(Some)
    }

    fn encode<T, S>(&self, value: &T, serializer: &S, scratch: Option<&mut [u8]>) -> Result<Vec<u8>>
    where
        S: Serializer<T> + ?Sized,
    {
        let mut sink = ByteSink::new(scratch);

        serializer.serialize(&self.context, &mut sink, value)?;

        if sink.is_spilled() {
            trace!(len = sink.len(), "serialized value outgrew scratch buffer");
        }

        Ok(sink.into_bytes())
    }
}

impl Default for ByteBufferSerial {
    fn default() -> Self {
        Self::new()
    }
}

impl Serial for ByteBufferSerial {
    #[inline]
    fn to_bytes<T, S>(&self, value: Option<&T>, serializer: &S) -> Result<Vec<u8>>
    where
        S: Serializer<T> + ?Sized,
    {
        Self::to_bytes(self, value, serializer)
    }

    #[inline]
    fn from_bytes<T, S>(&self, bytes: Option<&[u8]>, serializer: &S) -> Result<Option<T>>
    where
        S: Serializer<T> + ?Sized,
    {
        Self::from_bytes(self, bytes, serializer)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;
    use std::fmt;
    use std::io;
    use std::panic::{self, AssertUnwindSafe};

    use new_zealand::nz;
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::{ContextMode, Error};

    assert_impl_all!(ByteBufferSerial: Send, Sync, fmt::Debug, Default);

    /// Writes `value` copies of the byte `0xA5`; reads back the number of bytes it was given.
    #[derive(Default)]
    struct Filler {
        serialize_calls: Cell<usize>,
        deserialize_calls: Cell<usize>,
        last_context: Cell<Option<SerializationContext>>,
    }

    impl Serializer<usize> for Filler {
        fn serialize(
            &self,
            context: &SerializationContext,
            sink: &mut ByteSink<'_>,
            value: &usize,
        ) -> Result<()> {
            self.serialize_calls
                .set(self.serialize_calls.get().wrapping_add(1));
            self.last_context.set(Some(*context));

            sink.write_bytes(&vec![0xA5; *value]);
            Ok(())
        }

        fn deserialize(
            &self,
            context: &SerializationContext,
            source: &mut ByteSource<'_>,
        ) -> Result<usize> {
            self.deserialize_calls
                .set(self.deserialize_calls.get().wrapping_add(1));
            self.last_context.set(Some(*context));

            Ok(source.read_remaining().len())
        }
    }

    /// Writes a few bytes, then fails.
    struct Broken;

    impl Serializer<u8> for Broken {
        fn serialize(
            &self,
            _context: &SerializationContext,
            sink: &mut ByteSink<'_>,
            _value: &u8,
        ) -> Result<()> {
            sink.write_bytes(b"partial");
            let error = io::Error::new(io::ErrorKind::BrokenPipe, "closed");
            Err(error.into())
        }

        fn deserialize(
            &self,
            _context: &SerializationContext,
            source: &mut ByteSource<'_>,
        ) -> Result<u8> {
            let tag = source.read_u8()?;
            Err(Error::UnknownType {
                type_name: format!("tag {tag}"),
            })
        }
    }

    struct Explosive;

    impl Serializer<u8> for Explosive {
        fn serialize(
            &self,
            _context: &SerializationContext,
            _sink: &mut ByteSink<'_>,
            _value: &u8,
        ) -> Result<()> {
            panic!("intentional panic inside serializer");
        }

        fn deserialize(
            &self,
            _context: &SerializationContext,
            _source: &mut ByteSource<'_>,
        ) -> Result<u8> {
            panic!("intentional panic inside serializer");
        }
    }

    fn idle_count(serial: &ByteBufferSerial) -> usize {
        serial.pool().map_or(0, |pool| pool.idle_count())
    }

    #[test]
    fn new_has_no_pool_and_release_context() {
        let serial = ByteBufferSerial::new();

        assert!(serial.pool().is_none());
        assert_eq!(serial.context(), SerializationContext::ALWAYS_RELEASE);
    }

    #[test]
    fn with_buffers_creates_full_pool() {
        let serial = ByteBufferSerial::with_buffers(nz!(2), 16);

        let pool = serial.pool().unwrap();
        assert_eq!(pool.capacity().get(), 2);
        assert_eq!(pool.idle_count(), 2);
    }

    #[test]
    fn absent_value_skips_serializer() {
        let serial = ByteBufferSerial::with_buffers(nz!(2), 16);
        let filler = Filler::default();

        let bytes = serial.to_bytes(None::<&usize>, &filler).unwrap();

        assert!(bytes.is_empty());
        assert_eq!(filler.serialize_calls.get(), 0);
        assert_eq!(idle_count(&serial), 2);
    }

    #[test]
    fn absent_value_with_scratch_skips_serializer() {
        let serial = ByteBufferSerial::new();
        let filler = Filler::default();
        let mut scratch = [0_u8; 8];

        let bytes = serial
            .to_bytes_with_scratch(None::<&usize>, &filler, Some(&mut scratch))
            .unwrap();

        assert!(bytes.is_empty());
        assert_eq!(filler.serialize_calls.get(), 0);
    }

    #[test]
    fn small_value_fits_pooled_buffer() {
        let serial = ByteBufferSerial::with_buffers(nz!(2), 16);
        let filler = Filler::default();

        let bytes = serial.to_bytes(Some(&10_usize), &filler).unwrap();

        assert_eq!(bytes, vec![0xA5; 10]);
        assert_eq!(idle_count(&serial), 2);
    }

    #[test]
    fn large_value_spills_past_pooled_buffer() {
        let serial = ByteBufferSerial::with_buffers(nz!(2), 16);
        let filler = Filler::default();

        let bytes = serial.to_bytes(Some(&40_usize), &filler).unwrap();

        assert_eq!(bytes, vec![0xA5; 40]);
        assert_eq!(idle_count(&serial), 2);

        // The pooled buffer keeps its fixed size.
        let pool = serial.pool().unwrap();
        assert_eq!(pool.acquire().unwrap().len(), 16);
    }

    #[test]
    fn zero_length_output_is_empty() {
        let serial = ByteBufferSerial::with_buffers(nz!(1), 16);
        let filler = Filler::default();

        let bytes = serial.to_bytes(Some(&0_usize), &filler).unwrap();

        assert!(bytes.is_empty());
        assert_eq!(filler.serialize_calls.get(), 1);
    }

    #[test]
    fn exhausted_pool_falls_back_to_unbacked_sink() {
        let serial = ByteBufferSerial::with_buffers(nz!(1), 16);
        let filler = Filler::default();

        let held = serial.pool().unwrap().lease().unwrap();

        let bytes = serial.to_bytes(Some(&12_usize), &filler).unwrap();

        assert_eq!(bytes.len(), 12);
        assert_eq!(idle_count(&serial), 0);

        drop(held);
        assert_eq!(idle_count(&serial), 1);
    }

    #[test]
    fn no_pool_still_serializes() {
        let serial = ByteBufferSerial::new();
        let filler = Filler::default();

        let bytes = serial.to_bytes(Some(&300_usize), &filler).unwrap();

        assert_eq!(bytes.len(), 300);
    }

    #[test]
    fn explicit_scratch_bypasses_pool() {
        let serial = ByteBufferSerial::with_buffers(nz!(1), 16);
        let filler = Filler::default();
        let mut scratch = [0_u8; 32];

        let bytes = serial
            .to_bytes_with_scratch(Some(&5_usize), &filler, Some(&mut scratch))
            .unwrap();

        assert_eq!(bytes, vec![0xA5; 5]);
        assert_eq!(scratch.get(..5), Some(&[0xA5_u8; 5][..]));

        // The pool buffer was never written to.
        let pool_buffer = serial.pool().unwrap().acquire().unwrap();
        assert!(pool_buffer.iter().all(|b| *b == 0));
    }

    #[test]
    fn explicit_scratch_too_small_still_complete() {
        let serial = ByteBufferSerial::new();
        let filler = Filler::default();
        let mut scratch = [0_u8; 4];

        let bytes = serial
            .to_bytes_with_scratch(Some(&33_usize), &filler, Some(&mut scratch))
            .unwrap();

        assert_eq!(bytes, vec![0xA5; 33]);
    }

    #[test]
    fn explicit_scratch_absent_allocates() {
        let serial = ByteBufferSerial::new();
        let filler = Filler::default();

        let bytes = serial
            .to_bytes_with_scratch(Some(&3_usize), &filler, None)
            .unwrap();

        assert_eq!(bytes, vec![0xA5; 3]);
    }

    #[test]
    fn result_does_not_alias_pooled_buffer() {
        let serial = ByteBufferSerial::with_buffers(nz!(1), 16);
        let filler = Filler::default();

        let first = serial.to_bytes(Some(&8_usize), &filler).unwrap();

        // Overwrite the pooled buffer, as a later serialization would.
        serial.pool().unwrap().lease().unwrap().fill(0);

        assert_eq!(first, vec![0xA5; 8]);
    }

    #[test]
    fn serializer_error_propagates_and_releases() {
        let serial = ByteBufferSerial::with_buffers(nz!(2), 16);

        let error = serial.to_bytes(Some(&1_u8), &Broken).unwrap_err();

        let Error::Io(inner) = &error else {
            panic!("expected an I/O error, got {error:?}");
        };
        assert_eq!(inner.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(idle_count(&serial), 2);
    }

    #[test]
    fn serializer_panic_releases() {
        let serial = ByteBufferSerial::with_buffers(nz!(2), 16);

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            _ = serial.to_bytes(Some(&1_u8), &Explosive);
        }));

        assert!(result.is_err());
        assert_eq!(idle_count(&serial), 2);
    }

    #[test]
    fn absent_bytes_skip_serializer() {
        let serial = ByteBufferSerial::new();
        let filler = Filler::default();

        let value: Option<usize> = serial.from_bytes(None, &filler).unwrap();

        assert!(value.is_none());
        assert_eq!(filler.deserialize_calls.get(), 0);
    }

    #[test]
    fn empty_bytes_skip_serializer() {
        let serial = ByteBufferSerial::new();
        let filler = Filler::default();

        let value: Option<usize> = serial.from_bytes(Some(&[]), &filler).unwrap();

        assert!(value.is_none());
        assert_eq!(filler.deserialize_calls.get(), 0);
    }

    #[test]
    fn from_bytes_does_not_touch_pool() {
        let serial = ByteBufferSerial::with_buffers(nz!(1), 16);
        let filler = Filler::default();

        let _held = serial.pool().unwrap().lease().unwrap();

        let value = serial.from_bytes(Some(&[1, 2, 3]), &filler).unwrap();

        assert_eq!(value, Some(3));
        assert_eq!(filler.deserialize_calls.get(), 1);
    }

    #[test]
    fn deserializer_error_propagates() {
        let serial = ByteBufferSerial::new();

        let error = serial.from_bytes(Some(&[7]), &Broken).unwrap_err();

        let Error::UnknownType { type_name } = &error else {
            panic!("expected an unknown type error, got {error:?}");
        };
        assert_eq!(type_name, "tag 7");
    }

    #[test]
    fn context_reaches_serializer() {
        let serial = ByteBufferSerial::builder()
            .context(SerializationContext::new(ContextMode::Debug))
            .build();
        let filler = Filler::default();

        serial.to_bytes(Some(&1_usize), &filler).unwrap();
        assert_eq!(
            filler.last_context.get(),
            Some(SerializationContext::ALWAYS_DEBUG)
        );

        filler.last_context.set(None);
        serial.from_bytes(Some(&[1]), &filler).unwrap();
        assert_eq!(
            filler.last_context.get(),
            Some(SerializationContext::ALWAYS_DEBUG)
        );
    }

    #[test]
    fn works_through_trait_object_serializer() {
        let serial = ByteBufferSerial::with_buffers(nz!(1), 8);
        let filler = Filler::default();
        let dyn_serializer: &dyn Serializer<usize> = &filler;

        let bytes = serial.to_bytes(Some(&4_usize), dyn_serializer).unwrap();
        let value = serial
            .from_bytes(Some(bytes.as_slice()), dyn_serializer)
            .unwrap();

        assert_eq!(value, Some(4));
    }

    #[test]
    fn works_through_serial_trait() {
        fn round_trip(serial: &impl Serial, serializer: &Filler, value: usize) -> Option<usize> {
            let bytes = serial.to_bytes(Some(&value), serializer).unwrap();
            serial
                .from_bytes(Some(bytes.as_slice()), serializer)
                .unwrap()
        }

        let filler = Filler::default();

        assert_eq!(
            round_trip(&ByteBufferSerial::with_buffers(nz!(1), 8), &filler, 20),
            Some(20)
        );
        assert_eq!(round_trip(&ByteBufferSerial::new(), &filler, 2), Some(2));
    }
}
