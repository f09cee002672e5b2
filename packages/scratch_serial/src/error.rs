use std::io;
use std::result;

use thiserror::Error;

/// Errors that can occur when converting values to or from bytes.
///
/// The bridge never produces these on its own behalf (apart from [`Error::Io`] when a
/// [`ByteSource`][crate::ByteSource] is read past its end). They originate in the
/// [`Serializer`][crate::Serializer] and are handed back to the caller unchanged.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The underlying byte stream failed, or the input ended before the serializer had read
    /// everything it needed.
    #[error("serialization I/O failure: {0}")]
    Io(#[from] io::Error),

    /// The byte stream refers to a type that the serializer does not know how to reconstruct.
    #[error("unknown type in serialized data: '{type_name}'")]
    UnknownType {
        /// Name or tag of the type, as found in the byte stream.
        type_name: String,
    },

    /// The byte stream is structurally inconsistent with what the serializer expects.
    #[error("invalid serialized data: {message}")]
    InvalidState {
        /// A human-readable description of the problem.
        message: String,
    },
}

impl Error {
    pub(crate) fn unexpected_eof(requested: usize, remaining: usize) -> Self {
        Self::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("requested {requested} bytes but only {remaining} remain"),
        ))
    }
}

/// A specialized `Result` type for serialization operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = result::Result<T, Error>;
