//! UTF-16LE helpers for wide keys and string values.
//!
//! Values travel as raw little-endian byte buffers that include their NUL
//! terminator; these helpers convert between that form and `String`.

/// Encode `s` as UTF-16LE bytes with a trailing NUL code unit.
pub(crate) fn encode_utf16le_z(s: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(s.len() * 2 + 2);
    for unit in s.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes.extend_from_slice(&[0, 0]);
    bytes
}

/// Decode a UTF-16LE byte buffer up to the first NUL (0x0000), if present.
///
/// Unpaired surrogates become U+FFFD; a dangling odd byte at the end is
/// ignored. Producers emit enough garbage here that a strict decode would
/// reject real-world resources.
pub(crate) fn decode_utf16le_z(bytes: &[u8]) -> String {
    let mut units = Vec::with_capacity(bytes.len() / 2);
    for chunk in bytes.chunks_exact(2) {
        let unit = u16::from_le_bytes([chunk[0], chunk[1]]);
        if unit == 0 {
            break;
        }
        units.push(unit);
    }
    String::from_utf16_lossy(&units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_ascii() {
        let bytes = encode_utf16le_z("CompanyName");
        assert_eq!(bytes.len(), "CompanyName".len() * 2 + 2);
        assert_eq!(decode_utf16le_z(&bytes), "CompanyName");
    }

    #[test]
    fn test_round_trips_non_ascii() {
        let bytes = encode_utf16le_z("Äcmé 株式会社");
        assert_eq!(decode_utf16le_z(&bytes), "Äcmé 株式会社");
    }

    #[test]
    fn test_decode_stops_at_nul() {
        let mut bytes = encode_utf16le_z("abc");
        // Trailing garbage after the terminator, as some producers write.
        bytes.extend_from_slice(&[0x41, 0x00, 0x42, 0x00]);
        assert_eq!(decode_utf16le_z(&bytes), "abc");
    }

    #[test]
    fn test_decode_tolerates_odd_length() {
        assert_eq!(decode_utf16le_z(&[0x41, 0x00, 0x42]), "A");
    }

    #[test]
    fn test_decode_without_terminator() {
        assert_eq!(decode_utf16le_z(&[0x41, 0x00, 0x42, 0x00]), "AB");
    }
}
