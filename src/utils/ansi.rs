//! ANSI string bridging for the legacy 16-bit dialect.
//!
//! The wire format does not record which code page produced a single-byte
//! string; consumers conventionally apply the platform default. The codec is
//! injected (`EncodingRef`, default Windows-1252) so hosts can match whatever
//! their producer used.

use encoding::{DecoderTrap, EncoderTrap, Encoding, EncodingRef};

/// Encode `s` into single-byte ANSI bytes with a trailing NUL.
///
/// Characters outside the codec's repertoire are substituted, matching what
/// `WideCharToMultiByte` does for producers of this dialect.
pub(crate) fn encode_ansi_z(s: &str, codec: EncodingRef) -> Result<Vec<u8>, ()> {
    let mut bytes = codec.encode(s, EncoderTrap::Replace).map_err(|_| ())?;
    bytes.push(0);
    Ok(bytes)
}

/// Decode an ANSI byte buffer up to the first NUL, if present.
pub(crate) fn decode_ansi_z(bytes: &[u8], codec: EncodingRef) -> Result<String, ()> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    codec.decode(&bytes[..end], DecoderTrap::Replace).map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding::all::WINDOWS_1252;

    #[test]
    fn test_round_trips_latin1() {
        let bytes = encode_ansi_z("Acmé Ltd", WINDOWS_1252).unwrap();
        assert_eq!(*bytes.last().unwrap(), 0);
        assert_eq!(decode_ansi_z(&bytes, WINDOWS_1252).unwrap(), "Acmé Ltd");
    }

    #[test]
    fn test_substitutes_unmappable() {
        let bytes = encode_ansi_z("株", WINDOWS_1252).unwrap();
        assert_eq!(bytes, vec![b'?', 0]);
    }

    #[test]
    fn test_decode_stops_at_nul() {
        assert_eq!(
            decode_ansi_z(b"abc\0junk", WINDOWS_1252).unwrap(),
            "abc"
        );
    }
}
