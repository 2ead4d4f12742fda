use alloc::{string::String, vec::Vec};

use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, Compress, SerializationError, Validate};

/// Why a hex string could not be turned back into an Arkworks value.
#[derive(Debug, displaydoc::Display)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum DecodeError {
    /// not valid hex: {0}
    Hex(#[cfg_attr(feature = "std", source)] hex::FromHexError),
    /// not a canonical encoding: {0}
    Canonical(#[cfg_attr(feature = "std", source)] SerializationError),
    /// {0} trailing bytes after the encoded value
    TrailingBytes(usize),
}

/// Encode a value with its compressed canonical serialization, as lowercase hex.
pub fn encode<A: CanonicalSerialize>(a: &A) -> Result<String, SerializationError> {
    let mut bytes = Vec::with_capacity(a.compressed_size());
    a.serialize_with_mode(&mut bytes, Compress::Yes)?;
    Ok(hex::encode(bytes))
}

/// Decode a value produced by [`encode`].
///
/// Points are checked to be on the curve and in the right subgroup, and the whole input must be
/// consumed, so every value has exactly one accepted encoding.
pub fn decode<A: CanonicalDeserialize>(s: &str) -> Result<A, DecodeError> {
    let bytes = hex::decode(s.trim()).map_err(DecodeError::Hex)?;
    let mut reader = bytes.as_slice();
    let a = A::deserialize_with_mode(&mut reader, Compress::Yes, Validate::Yes).map_err(DecodeError::Canonical)?;
    if !reader.is_empty() {
        return Err(DecodeError::TrailingBytes(reader.len()));
    }
    Ok(a)
}
