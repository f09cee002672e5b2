//! Demonstrates serializing values through a bridge with a small scratch pool.
//!
//! Shows the pooled path, the fallback when the pool is exhausted, values larger than a scratch
//! buffer and the handling of absent values.

use std::num::NonZero;

use scratch_serial::{
    ByteBufferSerial, ByteSink, ByteSource, Error, Result, SerializationContext, Serializer,
};

/// Writes a string as a little-endian `u16` length prefix followed by its UTF-8 bytes.
struct PrefixedString;

impl Serializer<String> for PrefixedString {
    fn serialize(
        &self,
        _context: &SerializationContext,
        sink: &mut ByteSink<'_>,
        value: &String,
    ) -> Result<()> {
        let len = u16::try_from(value.len()).map_err(|e| Error::InvalidState {
            message: e.to_string(),
        })?;

        sink.write_bytes(&len.to_le_bytes());
        sink.write_bytes(value.as_bytes());
        Ok(())
    }

    fn deserialize(
        &self,
        _context: &SerializationContext,
        source: &mut ByteSource<'_>,
    ) -> Result<String> {
        let &[low, high] = source.read_bytes(2)? else {
            unreachable!("read_bytes(2) returns exactly two bytes");
        };
        let len = u16::from_le_bytes([low, high]);

        let text = source.read_bytes(usize::from(len))?.to_vec();

        String::from_utf8(text).map_err(|e| Error::InvalidState {
            message: e.to_string(),
        })
    }
}

fn main() -> Result<()> {
    println!("=== Scratch Serial Example ===");

    let serial = ByteBufferSerial::with_buffers(NonZero::new(2).unwrap(), 16);
    let pool = serial.pool().expect("bridge was created with a pool");

    println!("Pool: {pool:?}");

    let short = "hello".to_string();
    let bytes = serial.to_bytes(Some(&short), &PrefixedString)?;
    let len = bytes.len();
    println!("{short:?} serialized to {len} bytes: {bytes:02x?}");

    // Larger than the 16-byte scratch buffer; continues on the heap.
    let long = String::from("a value that does not fit in sixteen bytes");
    let bytes = serial.to_bytes(Some(&long), &PrefixedString)?;
    let (text_len, len) = (long.len(), bytes.len());
    println!("{text_len} character string serialized to {len} bytes");

    let input = Some(bytes.as_slice());
    let decoded = serial.from_bytes::<String, _>(input, &PrefixedString)?;
    assert_eq!(decoded.as_ref(), Some(&long));
    println!("Decoded: {decoded:?}");

    // With every buffer taken, the bridge serializes without a scratch buffer.
    let first = pool.acquire();
    let second = pool.acquire();
    println!("Idle buffers while both are held: {}", pool.idle_count());

    let bytes = serial.to_bytes(Some(&short), &PrefixedString)?;
    println!("Serialized {} bytes without a scratch buffer", bytes.len());

    for buffer in [first, second].into_iter().flatten() {
        pool.release(buffer);
    }
    println!("Idle buffers after release: {}", pool.idle_count());

    // Absent values short-circuit in both directions.
    let empty = serial.to_bytes(None::<&String>, &PrefixedString)?;
    assert!(empty.is_empty());

    let input = Some(empty.as_slice());
    let nothing = serial.from_bytes::<String, _>(input, &PrefixedString)?;
    assert_eq!(nothing, None);
    println!("Absent value round trip: {nothing:?}");

    println!("Example completed successfully!");

    Ok(())
}
