//! Translation codes: `(language id, character set)` pairs.
//!
//! On the wire a translation is a packed DWORD in the `Translation` record's
//! value; as a string-table name it is rendered as eight uppercase hex digits,
//! language first.

use std::fmt;

use crate::err::{RecordError, RecordResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translation {
    pub language_id: u16,
    pub charset: u16,
}

impl Translation {
    pub fn new(language_id: u16, charset: u16) -> Translation {
        Translation {
            language_id,
            charset,
        }
    }

    /// Unpack from the wire DWORD: language in the low word, charset high.
    pub fn from_code(code: u32) -> Translation {
        Translation {
            language_id: (code & 0xFFFF) as u16,
            charset: (code >> 16) as u16,
        }
    }

    /// Pack into the wire DWORD.
    pub fn code(self) -> u32 {
        (u32::from(self.charset) << 16) | u32::from(self.language_id)
    }

    /// Parse the 8-hex-digit string-table form, case-insensitively.
    pub fn parse(s: &str) -> RecordResult<Translation> {
        let invalid = || RecordError::InvalidTranslationString { text: s.to_owned() };

        if s.len() != 8 || !s.is_ascii() {
            return Err(invalid());
        }
        let language_id = u16::from_str_radix(&s[..4], 16).map_err(|_| invalid())?;
        let charset = u16::from_str_radix(&s[4..], 16).map_err(|_| invalid())?;
        Ok(Translation {
            language_id,
            charset,
        })
    }
}

impl fmt::Display for Translation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}{:04X}", self.language_id, self.charset)
    }
}
