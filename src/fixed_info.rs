//! The fixed file info block stored as the value of the root record.
//!
//! Layout and constants follow `verrsrc.h` / `winver.h`. Only the signature
//! and structure version are semantically enforced; every other field is
//! carried verbatim.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::err::{RecordError, RecordResult};

/// `dwSignature` of every well-formed VS_FIXEDFILEINFO.
pub const FIXED_INFO_SIGNATURE: u32 = 0xFEEF_04BD;

/// `dwStrucVersion` written by all known producers.
pub const FIXED_INFO_STRUC_VERSION: u32 = 0x0001_0000;

/// Serialized size of the structure in bytes.
pub const FIXED_INFO_SIZE: usize = 52;

bitflags! {
    /// `dwFileFlags` attribute bits (`VS_FF_*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FileFlags: u32 {
        const DEBUG = 0x0000_0001;
        const PRERELEASE = 0x0000_0002;
        const PATCHED = 0x0000_0004;
        const PRIVATEBUILD = 0x0000_0008;
        const INFOINFERRED = 0x0000_0010;
        const SPECIALBUILD = 0x0000_0020;
    }
}

/// Mask of all defined `VS_FF_*` bits (`VS_FFI_FILEFLAGSMASK`).
pub const FILE_FLAGS_MASK: u32 = 0x0000_003F;

/// `dwFileOS` values (`VOS_*`).
pub mod file_os {
    pub const UNKNOWN: u32 = 0x0000_0000;
    pub const DOS: u32 = 0x0001_0000;
    pub const OS216: u32 = 0x0002_0000;
    pub const OS232: u32 = 0x0003_0000;
    pub const NT: u32 = 0x0004_0000;
    pub const WINDOWS16: u32 = 0x0000_0001;
    pub const WINDOWS32: u32 = 0x0000_0004;
    pub const DOS_WINDOWS16: u32 = DOS | WINDOWS16;
    pub const DOS_WINDOWS32: u32 = DOS | WINDOWS32;
    pub const NT_WINDOWS32: u32 = NT | WINDOWS32;
}

/// `dwFileType` values (`VFT_*`).
pub mod file_type {
    pub const UNKNOWN: u32 = 0x0000_0000;
    pub const APP: u32 = 0x0000_0001;
    pub const DLL: u32 = 0x0000_0002;
    pub const DRV: u32 = 0x0000_0003;
    pub const FONT: u32 = 0x0000_0004;
    pub const VXD: u32 = 0x0000_0005;
    pub const STATIC_LIB: u32 = 0x0000_0007;
}

/// `dwFileSubtype` values for drivers and fonts (`VFT2_*`).
pub mod file_subtype {
    pub const UNKNOWN: u32 = 0x0000_0000;
    pub const DRV_PRINTER: u32 = 0x0000_0001;
    pub const DRV_KEYBOARD: u32 = 0x0000_0002;
    pub const DRV_LANGUAGE: u32 = 0x0000_0003;
    pub const DRV_DISPLAY: u32 = 0x0000_0004;
    pub const DRV_MOUSE: u32 = 0x0000_0005;
    pub const DRV_NETWORK: u32 = 0x0000_0006;
    pub const DRV_SYSTEM: u32 = 0x0000_0007;
    pub const DRV_INSTALLABLE: u32 = 0x0000_0008;
    pub const DRV_SOUND: u32 = 0x0000_0009;
    pub const FONT_RASTER: u32 = 0x0000_0001;
    pub const FONT_VECTOR: u32 = 0x0000_0002;
    pub const FONT_TRUETYPE: u32 = 0x0000_0003;
}

/// The 52-byte VS_FIXEDFILEINFO structure, all fields little-endian `u32`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedFileInfo {
    pub signature: u32,
    pub struct_version: u32,
    pub file_version_ms: u32,
    pub file_version_ls: u32,
    pub product_version_ms: u32,
    pub product_version_ls: u32,
    pub file_flags_mask: u32,
    pub file_flags: u32,
    pub file_os: u32,
    pub file_type: u32,
    pub file_subtype: u32,
    pub file_date_ms: u32,
    pub file_date_ls: u32,
}

impl FixedFileInfo {
    /// Force the two mandated stamps, leaving every other field as-is.
    pub fn stamped(mut self) -> FixedFileInfo {
        self.signature = FIXED_INFO_SIGNATURE;
        self.struct_version = FIXED_INFO_STRUC_VERSION;
        self
    }

    pub fn file_flags(&self) -> FileFlags {
        FileFlags::from_bits_truncate(self.file_flags)
    }

    /// File version as `(major, minor, patch, build)`.
    pub fn file_version(&self) -> (u16, u16, u16, u16) {
        split_version(self.file_version_ms, self.file_version_ls)
    }

    /// Product version as `(major, minor, patch, build)`.
    pub fn product_version(&self) -> (u16, u16, u16, u16) {
        split_version(self.product_version_ms, self.product_version_ls)
    }

    pub fn from_bytes(buf: &[u8]) -> RecordResult<FixedFileInfo> {
        if buf.len() < FIXED_INFO_SIZE {
            return Err(RecordError::InvalidFixedFileInfoSize {
                len: buf.len(),
                expected: FIXED_INFO_SIZE,
            });
        }

        let mut cursor = Cursor::new(buf);
        let mut next = || {
            cursor
                .read_u32::<LittleEndian>()
                .map_err(|source| RecordError::FailedToRead {
                    offset: 0,
                    t: "fixed file info field",
                    source,
                })
        };

        Ok(FixedFileInfo {
            signature: next()?,
            struct_version: next()?,
            file_version_ms: next()?,
            file_version_ls: next()?,
            product_version_ms: next()?,
            product_version_ls: next()?,
            file_flags_mask: next()?,
            file_flags: next()?,
            file_os: next()?,
            file_type: next()?,
            file_subtype: next()?,
            file_date_ms: next()?,
            file_date_ls: next()?,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(FIXED_INFO_SIZE);
        for field in [
            self.signature,
            self.struct_version,
            self.file_version_ms,
            self.file_version_ls,
            self.product_version_ms,
            self.product_version_ls,
            self.file_flags_mask,
            self.file_flags,
            self.file_os,
            self.file_type,
            self.file_subtype,
            self.file_date_ms,
            self.file_date_ls,
        ] {
            // Writing into a Vec cannot fail.
            let _ = bytes.write_u32::<LittleEndian>(field);
        }
        bytes
    }
}

fn split_version(ms: u32, ls: u32) -> (u16, u16, u16, u16) {
    (
        (ms >> 16) as u16,
        (ms & 0xFFFF) as u16,
        (ls >> 16) as u16,
        (ls & 0xFFFF) as u16,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FixedFileInfo {
        FixedFileInfo {
            file_version_ms: 0x0001_0002,
            file_version_ls: 0x0003_0004,
            product_version_ms: 0x0005_0006,
            product_version_ls: 0x0007_0008,
            file_flags_mask: FILE_FLAGS_MASK,
            file_flags: FileFlags::DEBUG.bits() | FileFlags::PRERELEASE.bits(),
            file_os: file_os::NT_WINDOWS32,
            file_type: file_type::APP,
            ..FixedFileInfo::default()
        }
        .stamped()
    }

    #[test]
    fn test_round_trips_through_bytes() {
        let info = sample();
        let bytes = info.to_bytes();
        assert_eq!(bytes.len(), FIXED_INFO_SIZE);
        assert_eq!(FixedFileInfo::from_bytes(&bytes).unwrap(), info);
    }

    #[test]
    fn test_layout_is_little_endian() {
        let bytes = sample().to_bytes();
        assert_eq!(&bytes[..4], &[0xBD, 0x04, 0xEF, 0xFE]);
        assert_eq!(&bytes[4..8], &[0x00, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn test_stamping_overrides_caller_values() {
        let info = FixedFileInfo {
            signature: 0xDEAD_BEEF,
            struct_version: 42,
            ..FixedFileInfo::default()
        }
        .stamped();
        assert_eq!(info.signature, FIXED_INFO_SIGNATURE);
        assert_eq!(info.struct_version, FIXED_INFO_STRUC_VERSION);
    }

    #[test]
    fn test_rejects_short_value() {
        let err = FixedFileInfo::from_bytes(&[0; 12]).unwrap_err();
        assert!(matches!(
            err,
            RecordError::InvalidFixedFileInfoSize { len: 12, .. }
        ));
    }

    #[test]
    fn test_version_split() {
        let info = sample();
        assert_eq!(info.file_version(), (1, 2, 3, 4));
        assert_eq!(info.product_version(), (5, 6, 7, 8));
    }
}
