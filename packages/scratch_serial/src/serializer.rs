use crate::{ByteSink, ByteSource, Result, SerializationContext};

/// Encodes values of type `T` into a [`ByteSink`] and decodes them back from a [`ByteSource`].
///
/// The wire format is entirely up to the implementation. The two methods are expected to be
/// inverses of each other: whatever `serialize()` writes, `deserialize()` should turn back into
/// an equal value.
///
/// Serializers are passed into each call of the bridge rather than configured on it, so a single
/// [`ByteBufferSerial`][crate::ByteBufferSerial] can serve any number of value types.
///
/// # Example
///
/// ```
/// use scratch_serial::{ByteSink, ByteSource, Result, SerializationContext, Serializer};
///
/// struct BigEndianU32;
///
/// impl Serializer<u32> for BigEndianU32 {
///     fn serialize(
///         &self,
///         _context: &SerializationContext,
///         sink: &mut ByteSink<'_>,
///         value: &u32,
///     ) -> Result<()> {
///         sink.write_bytes(&value.to_be_bytes());
///         Ok(())
///     }
///
///     fn deserialize(
///         &self,
///         _context: &SerializationContext,
///         source: &mut ByteSource<'_>,
///     ) -> Result<u32> {
///         let bytes = source.read_bytes(4)?;
///         Ok(u32::from_be_bytes(bytes.try_into().expect("read_bytes(4) returns 4 bytes")))
///     }
/// }
/// ```
pub trait Serializer<T> {
    /// Writes `value` to `sink`.
    ///
    /// # Errors
    ///
    /// Implementations return [`Error::Io`][crate::Error::Io] if they fail to produce output.
    /// Whatever was written to the sink before the failure is discarded by the caller.
    fn serialize(
        &self,
        context: &SerializationContext,
        sink: &mut ByteSink<'_>,
        value: &T,
    ) -> Result<()>;

    /// Reads a value from `source`.
    ///
    /// # Errors
    ///
    /// Implementations return [`Error::Io`][crate::Error::Io] if the input is truncated or
    /// cannot be read, [`Error::UnknownType`][crate::Error::UnknownType] if the input refers to a
    /// type they cannot reconstruct and [`Error::InvalidState`][crate::Error::InvalidState] if
    /// the input is otherwise malformed.
    fn deserialize(&self, context: &SerializationContext, source: &mut ByteSource<'_>) -> Result<T>;
}

/// Converts values to byte arrays and back with the help of a [`Serializer`].
///
/// This is the surface of [`ByteBufferSerial`][crate::ByteBufferSerial] as a trait, for code that
/// wants to stay independent of how the conversion manages its memory.
pub trait Serial {
    /// Serializes `value` into a new byte array.
    ///
    /// An absent value produces an empty array without calling the serializer.
    ///
    /// # Errors
    ///
    /// Returns whatever error the serializer returns, unchanged.
    fn to_bytes<T, S>(&self, value: Option<&T>, serializer: &S) -> Result<Vec<u8>>
    where
        S: Serializer<T> + ?Sized;

    /// Deserializes a value from `bytes`.
    ///
    /// Absent or empty input produces `None` without calling the serializer.
    ///
    /// # Errors
    ///
    /// Returns whatever error the serializer returns, unchanged.
    #[expect(
        clippy::wrong_self_convention,
        reason = "the bridge's own configuration is needed to read the bytes"
    )]
    fn from_bytes<T, S>(&self, bytes: Option<&[u8]>, serializer: &S) -> Result<Option<T>>
    where
        S: Serializer<T> + ?Sized;
}
