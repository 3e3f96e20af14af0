use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VersionInfoError>;
pub type RecordResult<T> = std::result::Result<T, RecordError>;

/// Errors raised while reading or writing the variable-length record format.
///
/// These carry offset/field context for diagnostics. At the public model
/// boundary they are wrapped into [`VersionInfoError::Corrupt`].
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Offset {offset}: An I/O error has occurred while trying to read {t}")]
    FailedToRead {
        offset: u64,
        t: &'static str,
        source: io::Error,
    },

    #[error("Offset {offset}: An I/O error has occurred while trying to write {t}")]
    FailedToWrite {
        offset: u64,
        t: &'static str,
        source: io::Error,
    },

    #[error("Offset {offset}: `{value:#x}` is not a valid record value type")]
    InvalidValueType { value: u16, offset: u64 },

    #[error("Offset {offset}: record spans zero bytes, refusing to loop")]
    ZeroLengthRecord { offset: u64 },

    #[error("Record `{name}` serializes to {size} bytes, exceeding the 16-bit length field")]
    OversizedRecord { name: String, size: u64 },

    #[error("Key `{text}` cannot be represented in the {encoding} encoding")]
    UnencodableKey { text: String, encoding: &'static str },

    #[error("Value of `{name}` is not a valid {encoding} string")]
    InvalidStringValue { name: String, encoding: &'static str },

    #[error("`{text}` is not an 8-digit translation string")]
    InvalidTranslationString { text: String },

    #[error("Fixed file info value is {len} bytes, expected {expected}")]
    InvalidFixedFileInfoSize { len: usize, expected: usize },
}

/// The public error surface of the version-information model.
#[derive(Debug, Error)]
pub enum VersionInfoError {
    /// The input stream had zero length when a read was requested.
    #[error("The input stream contains no version information")]
    Empty,

    /// An I/O failure or structural inconsistency in the binary data.
    #[error("Corrupt version information")]
    Corrupt {
        #[from]
        source: RecordError,
    },

    #[error("Index {index} is out of bounds for {t} (count is {count})")]
    IndexOutOfBounds {
        t: &'static str,
        index: usize,
        count: usize,
    },

    #[error("No string named `{name}` in the table")]
    UnknownName { name: String },

    #[error("A string named `{name}` already exists in the table")]
    DuplicateName { name: String },
}
