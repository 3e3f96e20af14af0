//! The semantic overlay interpreting a record tree as version information.
//!
//! The tree shape is canonical: a `VS_VERSION_INFO` root whose value is the
//! fixed file info, a `VarFileInfo/Translation` pair carrying the packed
//! translation DWORDs, and a `StringFileInfo` whose children are string
//! tables named by 8-hex-digit translation strings.

use std::fmt;
use std::io::Cursor;

use encoding::all::WINDOWS_1252;
use encoding::{Encoding, EncodingRef};
use log::debug;

use crate::err::{RecordError, Result, VersionInfoError};
use crate::fixed_info::FixedFileInfo;
use crate::record::{Dialect, ReadSeek, Record, ValueType, WriteSeek};
use crate::translation::Translation;
use crate::utils::ansi;
use crate::utils::utf16;

/// Key of the root record.
pub const ROOT_KEY: &str = "VS_VERSION_INFO";
const VAR_FILE_INFO: &str = "VarFileInfo";
const TRANSLATION: &str = "Translation";
const STRING_FILE_INFO: &str = "StringFileInfo";

/// `set_translation` treats this value in either half as "leave unchanged";
/// `add_translation` treats it as zero.
const NO_CHANGE: u16 = 0xFFFF;

/// An editable version-information resource.
///
/// A model owns one record tree in one dialect. Streams read and written
/// through it are raw VS_VERSIONINFO blobs; container formats (`.res` files,
/// PE sections) are the host's concern.
pub struct VersionInfo {
    dialect: Dialect,
    ansi_codec: EncodingRef,
    root: Record,
}

impl VersionInfo {
    /// An empty model with the canonical interior nodes in place.
    pub fn new(dialect: Dialect) -> VersionInfo {
        let mut info = VersionInfo {
            dialect,
            ansi_codec: WINDOWS_1252,
            root: Record::new(ROOT_KEY),
        };
        info.ensure_shape();
        info
    }

    /// Override the code page used for keys and strings of the 16-bit
    /// dialect. The wire format does not record the producer's code page;
    /// Windows-1252 is the default assumption.
    pub fn with_ansi_codec(mut self, ansi_codec: EncodingRef) -> VersionInfo {
        self.ansi_codec = ansi_codec;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The underlying record tree.
    pub fn root(&self) -> &Record {
        &self.root
    }

    /// Drop all content: no translations, no string tables, a zeroed and
    /// stamped fixed file info.
    pub fn reset(&mut self) {
        self.root = Record::with_value(
            ROOT_KEY,
            ValueType::Binary,
            FixedFileInfo::default().stamped().to_bytes(),
        );
        self.ensure_shape();
    }

    /// Parse a blob from `stream`, replacing this model's tree.
    ///
    /// The previous tree is kept intact if parsing fails partway.
    pub fn read_from_stream<S: ReadSeek>(&mut self, stream: &mut S) -> Result<()> {
        let size = stream
            .stream_size()
            .map_err(|source| RecordError::FailedToRead {
                offset: 0,
                t: "stream size",
                source,
            })?;
        if size == 0 {
            return Err(VersionInfoError::Empty);
        }

        let (root, span) = Record::read_from(stream, self.dialect, self.ansi_codec)?;
        debug!("parsed version information spanning {span} bytes");

        self.root = root;
        self.ensure_shape();
        Ok(())
    }

    /// Serialize the tree at the stream's current position, leaving the
    /// cursor at end-of-stream.
    pub fn write_to_stream<S: WriteSeek>(&self, stream: &mut S) -> Result<()> {
        let span = self.root.write_to(stream, self.dialect, self.ansi_codec)?;
        debug!("wrote version information spanning {span} bytes");
        Ok(())
    }

    /// Parse a model from an in-memory blob.
    pub fn from_bytes(dialect: Dialect, bytes: &[u8]) -> Result<VersionInfo> {
        let mut info = VersionInfo::new(dialect);
        info.read_from_stream(&mut Cursor::new(bytes))?;
        Ok(info)
    }

    /// Serialize the model to an in-memory blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_to_stream(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Recreate the canonical interior nodes, preserving anything present.
    ///
    /// Runs on construction, on `reset` and after every successful read, so
    /// the rest of the model can rely on the shape.
    fn ensure_shape(&mut self) {
        self.root.name = ROOT_KEY.to_owned();

        let var_file_info = child_or_insert(&mut self.root, VAR_FILE_INFO);
        child_or_insert(var_file_info, TRANSLATION);
        child_or_insert(&mut self.root, STRING_FILE_INFO);
    }

    // ---- fixed file info ----

    /// The fixed file info, or a stamped zero record when the root carries no
    /// value.
    pub fn fixed_file_info(&self) -> Result<FixedFileInfo> {
        if self.root.value.is_empty() {
            return Ok(FixedFileInfo::default().stamped());
        }
        Ok(FixedFileInfo::from_bytes(&self.root.value)?)
    }

    /// Store the fixed file info. The signature and structure version are
    /// stamped regardless of what the caller supplied.
    pub fn set_fixed_file_info(&mut self, info: &FixedFileInfo) {
        self.root.value_type = ValueType::Binary;
        self.root.value = info.stamped().to_bytes();
    }

    // ---- translations ----

    fn translation_values(&self) -> &[u8] {
        self.root
            .children
            .iter()
            .find(|child| child.name.eq_ignore_ascii_case(VAR_FILE_INFO))
            .and_then(|vfi| {
                vfi.children
                    .iter()
                    .find(|child| child.name.eq_ignore_ascii_case(TRANSLATION))
            })
            .map(|translation| translation.value.as_slice())
            .unwrap_or(&[])
    }

    fn translation_values_mut(&mut self) -> &mut Vec<u8> {
        let var_file_info = child_or_insert(&mut self.root, VAR_FILE_INFO);
        &mut child_or_insert(var_file_info, TRANSLATION).value
    }

    pub fn translation_count(&self) -> usize {
        self.translation_values().len() / 4
    }

    fn check_translation_index(&self, index: usize) -> Result<()> {
        let count = self.translation_count();
        if index >= count {
            return Err(VersionInfoError::IndexOutOfBounds {
                t: "translations",
                index,
                count,
            });
        }
        Ok(())
    }

    pub fn translation(&self, index: usize) -> Result<Translation> {
        self.check_translation_index(index)?;
        let values = self.translation_values();
        let code = u32::from_le_bytes([
            values[index * 4],
            values[index * 4 + 1],
            values[index * 4 + 2],
            values[index * 4 + 3],
        ]);
        Ok(Translation::from_code(code))
    }

    /// The 8-hex-digit form of translation `index`, e.g. `"080904B0"`.
    pub fn translation_string(&self, index: usize) -> Result<String> {
        Ok(self.translation(index)?.to_string())
    }

    /// Replace translation `index`. A half set to `0xFFFF` keeps its current
    /// value.
    pub fn set_translation(&mut self, index: usize, language_id: u16, charset: u16) -> Result<()> {
        let current = self.translation(index)?;
        let updated = Translation {
            language_id: if language_id == NO_CHANGE {
                current.language_id
            } else {
                language_id
            },
            charset: if charset == NO_CHANGE {
                current.charset
            } else {
                charset
            },
        };

        let values = self.translation_values_mut();
        values[index * 4..index * 4 + 4].copy_from_slice(&updated.code().to_le_bytes());
        Ok(())
    }

    /// Append a translation and return its index. A half set to `0xFFFF` is
    /// stored as zero.
    pub fn add_translation(&mut self, language_id: u16, charset: u16) -> Result<usize> {
        let translation = Translation {
            language_id: if language_id == NO_CHANGE {
                0
            } else {
                language_id
            },
            charset: if charset == NO_CHANGE { 0 } else { charset },
        };

        let values = self.translation_values_mut();
        values.extend_from_slice(&translation.code().to_le_bytes());
        Ok(self.translation_count() - 1)
    }

    /// Remove translation `index`, shifting later entries down.
    pub fn delete_translation(&mut self, index: usize) -> Result<()> {
        self.check_translation_index(index)?;
        self.translation_values_mut().drain(index * 4..index * 4 + 4);
        Ok(())
    }

    pub fn index_of_translation(&self, language_id: u16, charset: u16) -> Option<usize> {
        (0..self.translation_count()).find(|&i| {
            self.translation(i)
                .map(|t| t.language_id == language_id && t.charset == charset)
                .unwrap_or(false)
        })
    }

    // ---- string tables ----

    fn string_file_info(&self) -> Option<&Record> {
        self.root
            .children
            .iter()
            .find(|child| child.name.eq_ignore_ascii_case(STRING_FILE_INFO))
    }

    fn string_file_info_mut(&mut self) -> &mut Record {
        child_or_insert(&mut self.root, STRING_FILE_INFO)
    }

    pub fn string_table_count(&self) -> usize {
        self.string_file_info()
            .map(|sfi| sfi.children.len())
            .unwrap_or(0)
    }

    fn string_table(&self, table: usize) -> Result<&Record> {
        let count = self.string_table_count();
        self.string_file_info()
            .and_then(|sfi| sfi.children.get(table))
            .ok_or(VersionInfoError::IndexOutOfBounds {
                t: "string tables",
                index: table,
                count,
            })
    }

    fn string_table_mut(&mut self, table: usize) -> Result<&mut Record> {
        let count = self.string_table_count();
        self.string_file_info_mut()
            .children
            .get_mut(table)
            .ok_or(VersionInfoError::IndexOutOfBounds {
                t: "string tables",
                index: table,
                count,
            })
    }

    /// The translation-string name of string table `table`.
    pub fn string_table_name(&self, table: usize) -> Result<String> {
        Ok(self.string_table(table)?.name.clone())
    }

    /// The table name parsed back into a translation.
    pub fn string_table_translation(&self, table: usize) -> Result<Translation> {
        Ok(Translation::parse(&self.string_table(table)?.name)?)
    }

    /// Append an empty string table named `name` and return its index.
    pub fn add_string_table(&mut self, name: &str) -> Result<usize> {
        let children = &mut self.string_file_info_mut().children;
        children.push(Record::new(name));
        Ok(children.len() - 1)
    }

    /// Append an empty string table named for `(language_id, charset)`.
    pub fn add_string_table_for(&mut self, language_id: u16, charset: u16) -> Result<usize> {
        self.add_string_table(&Translation::new(language_id, charset).to_string())
    }

    pub fn delete_string_table(&mut self, table: usize) -> Result<()> {
        let count = self.string_table_count();
        let children = &mut self.string_file_info_mut().children;
        if table >= children.len() {
            return Err(VersionInfoError::IndexOutOfBounds {
                t: "string tables",
                index: table,
                count,
            });
        }
        children.remove(table);
        Ok(())
    }

    pub fn index_of_string_table(&self, name: &str) -> Option<usize> {
        self.string_file_info()?
            .children
            .iter()
            .position(|table| table.name.eq_ignore_ascii_case(name))
    }

    pub fn index_of_string_table_for(&self, language_id: u16, charset: u16) -> Option<usize> {
        self.index_of_string_table(&Translation::new(language_id, charset).to_string())
    }

    // ---- strings ----

    pub fn string_count(&self, table: usize) -> Result<usize> {
        Ok(self.string_table(table)?.children.len())
    }

    fn string_entry(&self, table: usize, index: usize) -> Result<&Record> {
        let entries = &self.string_table(table)?.children;
        entries.get(index).ok_or(VersionInfoError::IndexOutOfBounds {
            t: "strings",
            index,
            count: entries.len(),
        })
    }

    fn string_entry_mut(&mut self, table: usize, index: usize) -> Result<&mut Record> {
        let entries = &mut self.string_table_mut(table)?.children;
        let count = entries.len();
        entries.get_mut(index).ok_or(VersionInfoError::IndexOutOfBounds {
            t: "strings",
            index,
            count,
        })
    }

    pub fn string_name(&self, table: usize, index: usize) -> Result<String> {
        Ok(self.string_entry(table, index)?.name.clone())
    }

    pub fn string_value(&self, table: usize, index: usize) -> Result<String> {
        let entry = self.string_entry(table, index)?;
        self.decode_string(entry)
    }

    pub fn string_value_by_name(&self, table: usize, name: &str) -> Result<String> {
        let index = self
            .index_of_string(table, name)?
            .ok_or_else(|| VersionInfoError::UnknownName {
                name: name.to_owned(),
            })?;
        self.string_value(table, index)
    }

    pub fn index_of_string(&self, table: usize, name: &str) -> Result<Option<usize>> {
        Ok(self.string_table(table)?.find_child(name))
    }

    /// Append a string entry. Fails with `DuplicateName` when the table
    /// already holds `name` (case-insensitively).
    pub fn add_string(&mut self, table: usize, name: &str, value: &str) -> Result<usize> {
        if self.index_of_string(table, name)?.is_some() {
            return Err(VersionInfoError::DuplicateName {
                name: name.to_owned(),
            });
        }

        let encoded = self.encode_string(name, value)?;
        let entries = &mut self.string_table_mut(table)?.children;
        entries.push(Record::with_value(name, ValueType::Text, encoded));
        Ok(entries.len() - 1)
    }

    /// Append a string entry, or replace its value if `name` already exists.
    /// Returns the entry's index either way.
    pub fn add_or_update_string(&mut self, table: usize, name: &str, value: &str) -> Result<usize> {
        match self.index_of_string(table, name)? {
            Some(index) => {
                self.set_string_value(table, index, value)?;
                Ok(index)
            }
            None => self.add_string(table, name, value),
        }
    }

    pub fn set_string_value(&mut self, table: usize, index: usize, value: &str) -> Result<()> {
        let name = self.string_name(table, index)?;
        let encoded = self.encode_string(&name, value)?;
        let entry = self.string_entry_mut(table, index)?;
        entry.value_type = ValueType::Text;
        entry.value = encoded;
        Ok(())
    }

    pub fn set_string_value_by_name(&mut self, table: usize, name: &str, value: &str) -> Result<()> {
        let index = self
            .index_of_string(table, name)?
            .ok_or_else(|| VersionInfoError::UnknownName {
                name: name.to_owned(),
            })?;
        self.set_string_value(table, index, value)
    }

    pub fn delete_string(&mut self, table: usize, index: usize) -> Result<()> {
        let entries = &mut self.string_table_mut(table)?.children;
        if index >= entries.len() {
            return Err(VersionInfoError::IndexOutOfBounds {
                t: "strings",
                index,
                count: entries.len(),
            });
        }
        entries.remove(index);
        Ok(())
    }

    pub fn delete_string_by_name(&mut self, table: usize, name: &str) -> Result<()> {
        let index = self
            .index_of_string(table, name)?
            .ok_or_else(|| VersionInfoError::UnknownName {
                name: name.to_owned(),
            })?;
        self.delete_string(table, index)
    }

    // ---- bulk copy ----

    /// Replace this model's content with a copy of `source`'s: fixed file
    /// info, translations and string tables, all in source order.
    ///
    /// `source` may use the other dialect; string payloads are transcoded
    /// through this model's ANSI codec, which is how 16-bit resources are
    /// converted to 32-bit ones and back.
    pub fn assign(&mut self, source: &VersionInfo) -> Result<()> {
        self.reset();
        self.set_fixed_file_info(&source.fixed_file_info()?);

        for index in 0..source.translation_count() {
            let translation = source.translation(index)?;
            self.add_translation(translation.language_id, translation.charset)?;
        }

        for table in 0..source.string_table_count() {
            let target = self.add_string_table(&source.string_table_name(table)?)?;
            for index in 0..source.string_count(table)? {
                let name = source.string_name(table, index)?;
                let value = source.string_value(table, index)?;
                self.add_string(target, &name, &value)?;
            }
        }

        Ok(())
    }

    // ---- encoding ----

    fn decode_string(&self, entry: &Record) -> Result<String> {
        match self.dialect {
            Dialect::Wide => Ok(utf16::decode_utf16le_z(&entry.value)),
            Dialect::Ansi => ansi::decode_ansi_z(&entry.value, self.ansi_codec).map_err(|_| {
                VersionInfoError::from(RecordError::InvalidStringValue {
                    name: entry.name.clone(),
                    encoding: self.ansi_codec.name(),
                })
            }),
        }
    }

    fn encode_string(&self, name: &str, value: &str) -> Result<Vec<u8>> {
        match self.dialect {
            Dialect::Wide => Ok(utf16::encode_utf16le_z(value)),
            Dialect::Ansi => ansi::encode_ansi_z(value, self.ansi_codec).map_err(|_| {
                VersionInfoError::from(RecordError::InvalidStringValue {
                    name: name.to_owned(),
                    encoding: self.ansi_codec.name(),
                })
            }),
        }
    }
}

impl fmt::Debug for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionInfo")
            .field("dialect", &self.dialect)
            .field("ansi_codec", &self.ansi_codec.name())
            .field("root", &self.root)
            .finish()
    }
}

/// Find `name` among `parent`'s children (case-insensitively), inserting an
/// empty record when absent.
fn child_or_insert<'a>(parent: &'a mut Record, name: &str) -> &'a mut Record {
    match parent.find_child(name) {
        Some(index) => &mut parent.children[index],
        None => {
            parent.children.push(Record::new(name));
            parent
                .children
                .last_mut()
                .expect("child was just inserted")
        }
    }
}
