//! The variable-length record codec underlying VS_VERSIONINFO blobs.
//!
//! A version resource is a tree of self-describing records. Every record
//! carries a 16-bit total length, a 16-bit value length, a NUL-terminated key,
//! an optional value payload and zero or more child records, with each section
//! padded to a DWORD boundary relative to the start of the record.
//!
//! Two framings exist: the legacy 16-bit dialect (single-byte keys, no type
//! word) and the 32-bit dialect (UTF-16 keys, explicit `wType`). A tree is
//! homogeneous in dialect; the dialect tag is threaded into `read_from` /
//! `write_to` rather than stored per node.

use std::io::{self, Read, Seek, SeekFrom, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use encoding::{DecoderTrap, Encoding, EncodingRef};
use log::{trace, warn};

use crate::err::{RecordError, RecordResult};
use crate::utils::ansi;
use crate::utils::utf16;

/// A stream records are read from. Notably, this is implemented
/// for `Cursor<Vec<u8>>` and `File`.
pub trait ReadSeek: Read + Seek {
    fn tell(&mut self) -> io::Result<u64> {
        self.stream_position()
    }

    /// Total stream size, preserving the current position.
    fn stream_size(&mut self) -> io::Result<u64> {
        let position = self.stream_position()?;
        let size = self.seek(SeekFrom::End(0))?;
        self.seek(SeekFrom::Start(position))?;
        Ok(size)
    }
}
impl<T: Read + Seek> ReadSeek for T {}

/// A stream records are written to. The writer back-patches length prefixes,
/// so a plain `Write` sink is not enough.
pub trait WriteSeek: Write + Seek {
    fn tell(&mut self) -> io::Result<u64> {
        self.stream_position()
    }
}
impl<T: Write + Seek> WriteSeek for T {}

/// Record framing: the legacy ANSI 16-bit layout or the wide 32-bit layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Single-byte keys and strings, no `wType` word.
    Ansi,
    /// UTF-16 keys and strings, explicit `wType` word.
    Wide,
}

/// The `wType` discriminator of the 32-bit dialect.
///
/// The 16-bit dialect has no type word on the wire; its records always parse
/// as [`ValueType::Binary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Binary = 0,
    Text = 1,
}

impl ValueType {
    fn from_wire(value: u16, offset: u64) -> RecordResult<ValueType> {
        match value {
            0 => Ok(ValueType::Binary),
            1 => Ok(ValueType::Text),
            _ => Err(RecordError::InvalidValueType { value, offset }),
        }
    }

    fn to_wire(self) -> u16 {
        self as u16
    }
}

/// Zero bytes needed to round `len` up to a DWORD boundary.
#[inline]
pub(crate) const fn pad_to_dword(len: u64) -> u64 {
    (4 - len % 4) % 4
}

/// A single node of the record tree.
///
/// The node exclusively owns its value buffer and its children; children are
/// laid out on the wire in insertion order. `TEXT` values hold the encoded
/// string including its NUL terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub(crate) name: String,
    pub(crate) value_type: ValueType,
    pub(crate) value: Vec<u8>,
    pub(crate) children: Vec<Record>,
}

impl Record {
    /// A valueless, childless record.
    pub fn new(name: impl Into<String>) -> Record {
        Record {
            name: name.into(),
            value_type: ValueType::Binary,
            value: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_value(name: impl Into<String>, value_type: ValueType, value: Vec<u8>) -> Record {
        Record {
            name: name.into(),
            value_type,
            value,
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn children(&self) -> &[Record] {
        &self.children
    }

    /// Key lookup is ASCII-case-insensitive, per the resource compiler's
    /// behavior for the well-known interior names.
    pub(crate) fn find_child(&self, name: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|child| child.name.eq_ignore_ascii_case(name))
    }

    /// Read one record at the stream's current position.
    ///
    /// Returns the record and its outer span (`wLength` rounded up to a DWORD
    /// boundary); the stream is left positioned immediately past that span.
    pub fn read_from<S: ReadSeek>(
        stream: &mut S,
        dialect: Dialect,
        ansi_codec: EncodingRef,
    ) -> RecordResult<(Record, u64)> {
        let start = tell_for(stream, "record start")?;

        let w_length = u64::from(read_u16(stream, "wLength")?);
        let w_value_length = u64::from(read_u16(stream, "wValueLength")?);

        let value_type = match dialect {
            Dialect::Ansi => ValueType::Binary,
            Dialect::Wide => {
                let offset = tell_for(stream, "wType")?;
                ValueType::from_wire(read_u16(stream, "wType")?, offset)?
            }
        };

        let name = read_key(stream, dialect, ansi_codec)?;

        let header_size = tell_for(stream, "header")? - start;
        let header_padded = header_size + pad_to_dword(header_size);
        seek_to(stream, start + header_padded, "header padding")?;

        trace!(
            "record `{}` at offset {}: wLength={}, wValueLength={}, type={:?}",
            name,
            start,
            w_length,
            w_value_length,
            value_type
        );

        // wValueLength counts code units for TEXT records, but broken
        // producers write byte counts or garbage. The tentative byte size is
        // only used to locate children, and TEXT records carry none.
        let declared_value_size = match value_type {
            ValueType::Binary => w_value_length,
            ValueType::Text => w_value_length * 2,
        };

        let value = if w_value_length > 0 {
            match value_type {
                ValueType::Binary => {
                    let mut buf = vec![0_u8; declared_value_size as usize];
                    let offset = tell_for(stream, "value")?;
                    stream.read_exact(&mut buf).map_err(|source| {
                        RecordError::FailedToRead {
                            offset,
                            t: "record value",
                            source,
                        }
                    })?;
                    buf
                }
                ValueType::Text => {
                    let buf = read_utf16_value_z(stream)?;
                    if buf.len() as u64 != declared_value_size {
                        warn!(
                            "record `{}`: declared value size {} does not match scanned size {}",
                            name,
                            declared_value_size,
                            buf.len()
                        );
                    }
                    buf
                }
            }
        } else {
            Vec::new()
        };

        let children_offset = header_padded + declared_value_size + pad_to_dword(declared_value_size);
        let children_size = w_length.saturating_sub(children_offset);

        let mut children = Vec::new();
        // A TEXT record never has children: since its value length cannot be
        // trusted, the child region cannot be located reliably. In the
        // VS_VERSIONINFO schema TEXT appears only in leaf String records.
        if children_size > 0 && value_type != ValueType::Text {
            seek_to(stream, start + children_offset, "child region")?;
            let mut consumed = 0_u64;
            while consumed < children_size {
                let offset = start + children_offset + consumed;
                let (child, span) = Record::read_from(stream, dialect, ansi_codec)?;
                if span == 0 {
                    return Err(RecordError::ZeroLengthRecord { offset });
                }
                consumed += span;
                children.push(child);
            }
        }

        let outer = w_length + pad_to_dword(w_length);
        seek_to(stream, start + outer, "record end")?;

        Ok((
            Record {
                name,
                value_type,
                value,
                children,
            },
            outer,
        ))
    }

    /// Write this record at the stream's current position.
    ///
    /// The length prefix is reserved, the record body is written, then the
    /// prefix is back-patched; the stream is left positioned past the record
    /// and its trailing padding. Returns the outer span written.
    pub fn write_to<S: WriteSeek>(
        &self,
        stream: &mut S,
        dialect: Dialect,
        ansi_codec: EncodingRef,
    ) -> RecordResult<u64> {
        let start = tell_w(stream, "record start")?;

        // Placeholder; patched once the total is known.
        write_u16(stream, 0, "wLength")?;

        let w_value_length = match (dialect, self.value_type) {
            (Dialect::Wide, ValueType::Text) => self.value.len() as u64 / 2,
            _ => self.value.len() as u64,
        };
        let w_value_length =
            u16::try_from(w_value_length).map_err(|_| RecordError::OversizedRecord {
                name: self.name.clone(),
                size: self.value.len() as u64,
            })?;
        write_u16(stream, w_value_length, "wValueLength")?;

        if dialect == Dialect::Wide {
            write_u16(stream, self.value_type.to_wire(), "wType")?;
        }

        write_key(stream, &self.name, dialect, ansi_codec)?;

        let header_size = tell_w(stream, "header")? - start;
        write_padding(stream, pad_to_dword(header_size))?;

        let offset = tell_w(stream, "value")?;
        stream
            .write_all(&self.value)
            .map_err(|source| RecordError::FailedToWrite {
                offset,
                t: "record value",
                source,
            })?;

        let body_size = tell_w(stream, "value padding")? - start;
        let value_padding = pad_to_dword(body_size);
        write_padding(stream, value_padding)?;

        for child in &self.children {
            child.write_to(stream, dialect, ansi_codec)?;
        }

        let end = tell_w(stream, "record end")?;
        let total = end - start;

        // wLength covers header, value, interior padding and children; the
        // only excluded bytes are the record's trailing padding, which is the
        // value padding when there are no children (children always end
        // DWORD-aligned).
        let w_length = if self.children.is_empty() {
            total - value_padding
        } else {
            total
        };
        let w_length = u16::try_from(w_length).map_err(|_| RecordError::OversizedRecord {
            name: self.name.clone(),
            size: w_length,
        })?;

        seek_to_w(stream, start, "wLength patch")?;
        write_u16(stream, w_length, "wLength")?;
        seek_to_w(stream, end, "record end")?;

        trace!(
            "wrote record `{}` at offset {}: wLength={}, outer span {}",
            self.name,
            start,
            w_length,
            total
        );

        Ok(total)
    }
}

fn read_key<S: ReadSeek>(
    stream: &mut S,
    dialect: Dialect,
    ansi_codec: EncodingRef,
) -> RecordResult<String> {
    match dialect {
        Dialect::Ansi => {
            let mut bytes = Vec::new();
            loop {
                let byte = read_u8(stream, "key")?;
                if byte == 0 {
                    break;
                }
                bytes.push(byte);
            }
            // Keys are ASCII by format convention; the codec only matters for
            // out-of-convention producers.
            ansi_codec
                .decode(&bytes, DecoderTrap::Replace)
                .map_err(|_| RecordError::InvalidStringValue {
                    name: String::from_utf8_lossy(&bytes).into_owned(),
                    encoding: ansi_codec.name(),
                })
        }
        Dialect::Wide => {
            let mut units = Vec::new();
            loop {
                let unit = read_u16(stream, "key")?;
                if unit == 0 {
                    break;
                }
                units.push(unit);
            }
            Ok(String::from_utf16_lossy(&units))
        }
    }
}

fn write_key<S: WriteSeek>(
    stream: &mut S,
    name: &str,
    dialect: Dialect,
    ansi_codec: EncodingRef,
) -> RecordResult<()> {
    match dialect {
        Dialect::Ansi => {
            let bytes =
                ansi::encode_ansi_z(name, ansi_codec).map_err(|_| RecordError::UnencodableKey {
                    text: name.to_owned(),
                    encoding: ansi_codec.name(),
                })?;
            let offset = tell_w(stream, "key")?;
            stream
                .write_all(&bytes)
                .map_err(|source| RecordError::FailedToWrite {
                    offset,
                    t: "record key",
                    source,
                })
        }
        Dialect::Wide => {
            let bytes = utf16::encode_utf16le_z(name);
            let offset = tell_w(stream, "key")?;
            stream
                .write_all(&bytes)
                .map_err(|source| RecordError::FailedToWrite {
                    offset,
                    t: "record key",
                    source,
                })
        }
    }
}

/// Scan UTF-16 code units up to and including the first NUL.
///
/// This deliberately ignores the declared value length: producers disagree on
/// whether it counts bytes or code units, and some write garbage past the
/// terminator. Scanning recovers the real string in every observed case.
fn read_utf16_value_z<S: ReadSeek>(stream: &mut S) -> RecordResult<Vec<u8>> {
    let mut bytes = Vec::new();
    loop {
        let unit = read_u16(stream, "text value")?;
        bytes.extend_from_slice(&unit.to_le_bytes());
        if unit == 0 {
            return Ok(bytes);
        }
    }
}

fn tell_for<S: ReadSeek>(stream: &mut S, t: &'static str) -> RecordResult<u64> {
    stream.tell().map_err(|source| RecordError::FailedToRead {
        offset: 0,
        t,
        source,
    })
}

fn tell_w<S: WriteSeek>(stream: &mut S, t: &'static str) -> RecordResult<u64> {
    stream.tell().map_err(|source| RecordError::FailedToWrite {
        offset: 0,
        t,
        source,
    })
}

fn seek_to<S: ReadSeek>(stream: &mut S, offset: u64, t: &'static str) -> RecordResult<()> {
    stream
        .seek(SeekFrom::Start(offset))
        .map(|_| ())
        .map_err(|source| RecordError::FailedToRead { offset, t, source })
}

fn seek_to_w<S: WriteSeek>(stream: &mut S, offset: u64, t: &'static str) -> RecordResult<()> {
    stream
        .seek(SeekFrom::Start(offset))
        .map(|_| ())
        .map_err(|source| RecordError::FailedToWrite { offset, t, source })
}

fn read_u8<S: ReadSeek>(stream: &mut S, t: &'static str) -> RecordResult<u8> {
    let offset = tell_for(stream, t)?;
    stream
        .read_u8()
        .map_err(|source| RecordError::FailedToRead { offset, t, source })
}

fn read_u16<S: ReadSeek>(stream: &mut S, t: &'static str) -> RecordResult<u16> {
    let offset = tell_for(stream, t)?;
    stream
        .read_u16::<LittleEndian>()
        .map_err(|source| RecordError::FailedToRead { offset, t, source })
}

fn write_u16<S: WriteSeek>(stream: &mut S, value: u16, t: &'static str) -> RecordResult<()> {
    let offset = tell_w(stream, t)?;
    stream
        .write_u16::<LittleEndian>(value)
        .map_err(|source| RecordError::FailedToWrite { offset, t, source })
}

fn write_padding<S: WriteSeek>(stream: &mut S, count: u64) -> RecordResult<()> {
    const ZEROS: [u8; 4] = [0; 4];
    let offset = tell_w(stream, "padding")?;
    stream
        .write_all(&ZEROS[..count as usize])
        .map_err(|source| RecordError::FailedToWrite {
            offset,
            t: "padding",
            source,
        })
}
