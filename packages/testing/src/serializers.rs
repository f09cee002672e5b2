//! Serializers used by tests, benchmarks and examples.
//!
//! None of these define a format worth keeping. They exist to exercise the bridge with outputs
//! of controlled size, with every failure category and with call counting.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};

use scratch_serial::{ByteSink, ByteSource, Error, Result, SerializationContext, Serializer};

/// Writes a `String` as its UTF-8 bytes and reads back the entire input as UTF-8.
#[derive(Clone, Copy, Debug, Default)]
#[expect(
    clippy::exhaustive_structs,
    reason = "stateless serializers are used by name in tests"
)]
pub struct Utf8Serializer;

impl Serializer<String> for Utf8Serializer {
    fn serialize(
        &self,
        _context: &SerializationContext,
        sink: &mut ByteSink<'_>,
        value: &String,
    ) -> Result<()> {
        sink.write_bytes(value.as_bytes());
        Ok(())
    }

    fn deserialize(
        &self,
        _context: &SerializationContext,
        source: &mut ByteSource<'_>,
    ) -> Result<String> {
        let bytes = source.read_remaining().to_vec();

        String::from_utf8(bytes).map_err(|e| Error::InvalidState {
            message: e.to_string(),
        })
    }
}

/// Writes a `Vec<u64>` as a little-endian `u32` element count followed by the elements in
/// little-endian order.
///
/// In debug mode, trailing bytes after the last element are rejected.
#[derive(Clone, Copy, Debug, Default)]
#[expect(
    clippy::exhaustive_structs,
    reason = "stateless serializers are used by name in tests"
)]
pub struct U64ListSerializer;

impl Serializer<Vec<u64>> for U64ListSerializer {
    fn serialize(
        &self,
        _context: &SerializationContext,
        sink: &mut ByteSink<'_>,
        value: &Vec<u64>,
    ) -> Result<()> {
        let count = u32::try_from(value.len())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        sink.write_bytes(&count.to_le_bytes());

        for item in value {
            sink.write_bytes(&item.to_le_bytes());
        }

        Ok(())
    }

    fn deserialize(
        &self,
        context: &SerializationContext,
        source: &mut ByteSource<'_>,
    ) -> Result<Vec<u64>> {
        let count = u32::from_le_bytes(read_array(source)?);
        let count = usize::try_from(count).map_err(|e| Error::InvalidState {
            message: e.to_string(),
        })?;

        let fits = count
            .checked_mul(size_of::<u64>())
            .is_some_and(|needed| needed <= source.remaining());

        if !fits {
            return Err(Error::InvalidState {
                message: format!(
                    "{count} elements declared but only {} bytes remain",
                    source.remaining()
                ),
            });
        }

        let mut items = Vec::with_capacity(count);

        for _ in 0..count {
            items.push(u64::from_le_bytes(read_array(source)?));
        }

        if context.is_debug() && !source.is_exhausted() {
            return Err(Error::InvalidState {
                message: format!("{} trailing bytes after list", source.remaining()),
            });
        }

        Ok(items)
    }
}

/// A value with a one-byte type tag, for exercising [`Error::UnknownType`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Shape {
    /// Tag 1.
    Circle {
        /// Radius of the circle.
        radius: u32,
    },

    /// Tag 2.
    Square {
        /// Length of a side.
        side: u32,
    },
}

/// Writes a [`Shape`] as its tag byte followed by its dimension in little-endian order.
#[derive(Clone, Copy, Debug, Default)]
#[expect(
    clippy::exhaustive_structs,
    reason = "stateless serializers are used by name in tests"
)]
pub struct ShapeSerializer;

impl Serializer<Shape> for ShapeSerializer {
    fn serialize(
        &self,
        _context: &SerializationContext,
        sink: &mut ByteSink<'_>,
        value: &Shape,
    ) -> Result<()> {
        let (tag, dimension) = match *value {
            Shape::Circle { radius } => (1, radius),
            Shape::Square { side } => (2, side),
        };

        sink.write_u8(tag);
        sink.write_bytes(&dimension.to_le_bytes());
        Ok(())
    }

    fn deserialize(
        &self,
        _context: &SerializationContext,
        source: &mut ByteSource<'_>,
    ) -> Result<Shape> {
        let tag = source.read_u8()?;
        let dimension = u32::from_le_bytes(read_array(source)?);

        match tag {
            1 => Ok(Shape::Circle { radius: dimension }),
            2 => Ok(Shape::Square { side: dimension }),
            other => Err(Error::UnknownType {
                type_name: format!("shape tag {other}"),
            }),
        }
    }
}

/// Writes `value` copies of a fill byte; reads back the number of bytes in the input.
///
/// Useful for producing outputs of an exact size.
#[derive(Clone, Copy, Debug)]
pub struct FillSerializer {
    fill: u8,
}

impl FillSerializer {
    /// Creates a serializer that writes `fill` bytes.
    #[must_use]
    pub fn new(fill: u8) -> Self {
        Self { fill }
    }
}

impl Serializer<usize> for FillSerializer {
    fn serialize(
        &self,
        _context: &SerializationContext,
        sink: &mut ByteSink<'_>,
        value: &usize,
    ) -> Result<()> {
        // Written in small chunks to exercise repeated appends across the scratch boundary.
        for chunk in vec![self.fill; *value].chunks(7) {
            sink.write_bytes(chunk);
        }

        Ok(())
    }

    fn deserialize(
        &self,
        _context: &SerializationContext,
        source: &mut ByteSource<'_>,
    ) -> Result<usize> {
        let bytes = source.read_remaining();

        if bytes.iter().any(|b| *b != self.fill) {
            return Err(Error::InvalidState {
                message: format!("expected only {:#04x} bytes", self.fill),
            });
        }

        Ok(bytes.len())
    }
}

/// The kind of error a [`FailingSerializer`] returns.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Failure {
    /// [`Error::Io`] with [`io::ErrorKind::BrokenPipe`].
    Io,

    /// [`Error::UnknownType`].
    UnknownType,

    /// [`Error::InvalidState`].
    InvalidState,
}

/// Writes or reads a few bytes and then fails with the configured [`Failure`].
#[derive(Clone, Copy, Debug)]
pub struct FailingSerializer {
    failure: Failure,
}

impl FailingSerializer {
    /// Creates a serializer that always fails with `failure`.
    #[must_use]
    pub fn new(failure: Failure) -> Self {
        Self { failure }
    }

    fn error(self) -> Error {
        match self.failure {
            Failure::Io => Error::Io(io::Error::new(io::ErrorKind::BrokenPipe, "broken")),
            Failure::UnknownType => Error::UnknownType {
                type_name: "Intentional".to_string(),
            },
            Failure::InvalidState => Error::InvalidState {
                message: "intentional failure".to_string(),
            },
        }
    }
}

impl<T> Serializer<T> for FailingSerializer {
    fn serialize(
        &self,
        _context: &SerializationContext,
        sink: &mut ByteSink<'_>,
        _value: &T,
    ) -> Result<()> {
        sink.write_bytes(b"partial output");
        Err(self.error())
    }

    fn deserialize(
        &self,
        _context: &SerializationContext,
        source: &mut ByteSource<'_>,
    ) -> Result<T> {
        _ = source.read_u8();
        Err(self.error())
    }
}

/// Wraps another serializer and counts how often each method is called.
///
/// The counters are atomic, so one instance can be shared between threads.
#[derive(Debug, Default)]
pub struct CountingSerializer<S> {
    inner: S,
    serialize_calls: AtomicUsize,
    deserialize_calls: AtomicUsize,
}

impl<S> CountingSerializer<S> {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            serialize_calls: AtomicUsize::new(0),
            deserialize_calls: AtomicUsize::new(0),
        }
    }

    /// How many times `serialize()` has been called.
    #[must_use]
    pub fn serialize_calls(&self) -> usize {
        self.serialize_calls.load(Ordering::Relaxed)
    }

    /// How many times `deserialize()` has been called.
    #[must_use]
    pub fn deserialize_calls(&self) -> usize {
        self.deserialize_calls.load(Ordering::Relaxed)
    }
}

impl<T, S> Serializer<T> for CountingSerializer<S>
where
    S: Serializer<T>,
{
    fn serialize(
        &self,
        context: &SerializationContext,
        sink: &mut ByteSink<'_>,
        value: &T,
    ) -> Result<()> {
        self.serialize_calls.fetch_add(1, Ordering::Relaxed);
        self.inner.serialize(context, sink, value)
    }

    fn deserialize(
        &self,
        context: &SerializationContext,
        source: &mut ByteSource<'_>,
    ) -> Result<T> {
        self.deserialize_calls.fetch_add(1, Ordering::Relaxed);
        self.inner.deserialize(context, source)
    }
}

fn read_array<const N: usize>(source: &mut ByteSource<'_>) -> Result<[u8; N]> {
    let bytes = source.read_bytes(N)?;

    bytes.try_into().map_err(|e| Error::InvalidState {
        message: format!("expected {N} bytes: {e}"),
    })
}
