#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Converts typed values to byte arrays and back through pluggable serializers, reusing a pool
//! of scratch buffers to avoid repeated allocation when serializing at high frequency.
//!
//! The crate does not define a wire format. You provide a [`Serializer<T>`] that knows how to
//! write a `T` into a [`ByteSink`] and read it back from a [`ByteSource`]; the
//! [`ByteBufferSerial`] bridge takes care of the buffers around that.
//!
//! # Key features
//!
//! - **Pooled scratch buffers**: Serialization writes into a fixed-size buffer borrowed from a
//!   [`ScratchPool`] and copies the result out, instead of growing a fresh buffer every time.
//! - **Transparent overflow**: Values larger than a scratch buffer continue in a heap
//!   allocation; the scratch buffer itself never changes size.
//! - **Guaranteed return**: A borrowed buffer goes back to the pool whether the serializer
//!   succeeds, fails or panics.
//! - **Optional pooling**: Without a pool, or when all buffers are in use, serialization simply
//!   allocates.
//! - **Absent values short-circuit**: Serializing `None` produces an empty array and
//!   deserializing an empty array produces `None`, without calling the serializer.
//!
//! # Example
//!
//! ```rust
//! use std::num::NonZero;
//!
//! use scratch_serial::{
//!     ByteBufferSerial, ByteSink, ByteSource, Error, Result, SerializationContext, Serializer,
//! };
//!
//! #[derive(Debug, PartialEq)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! struct PointSerializer;
//!
//! impl Serializer<Point> for PointSerializer {
//!     fn serialize(
//!         &self,
//!         _context: &SerializationContext,
//!         sink: &mut ByteSink<'_>,
//!         value: &Point,
//!     ) -> Result<()> {
//!         sink.write_bytes(&value.x.to_le_bytes());
//!         sink.write_bytes(&value.y.to_le_bytes());
//!         Ok(())
//!     }
//!
//!     fn deserialize(
//!         &self,
//!         _context: &SerializationContext,
//!         source: &mut ByteSource<'_>,
//!     ) -> Result<Point> {
//!         let mut read_i32 = || -> Result<i32> {
//!             let bytes = source.read_bytes(4)?;
//!             let bytes = bytes.try_into().map_err(|_| Error::InvalidState {
//!                 message: "short read".to_string(),
//!             })?;
//!             Ok(i32::from_le_bytes(bytes))
//!         };
//!
//!         Ok(Point {
//!             x: read_i32()?,
//!             y: read_i32()?,
//!         })
//!     }
//! }
//!
//! let serial = ByteBufferSerial::with_buffers(NonZero::new(4).unwrap(), 64);
//!
//! let bytes = serial.to_bytes(Some(&Point { x: 1, y: -2 }), &PointSerializer)?;
//! assert_eq!(bytes.len(), 8);
//!
//! let point = serial.from_bytes(Some(bytes.as_slice()), &PointSerializer)?;
//! assert_eq!(point, Some(Point { x: 1, y: -2 }));
//! # Ok::<(), scratch_serial::Error>(())
//! ```

mod bridge;
mod buffer;
mod builder;
mod context;
mod error;
mod pool;
mod serializer;
mod sink;
mod source;

pub use bridge::ByteBufferSerial;
pub use buffer::ScratchBuffer;
pub use builder::ByteBufferSerialBuilder;
pub use context::{ContextMode, SerializationContext};
pub use error::{Error, Result};
pub use pool::{ScratchLease, ScratchPool};
pub use serializer::{Serial, Serializer};
pub use sink::ByteSink;
pub use source::ByteSource;
