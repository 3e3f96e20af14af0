#![deny(unused_must_use)]
#![forbid(unsafe_code)]
// Don't allow dbg! prints in release.
#![cfg_attr(not(debug_assertions), deny(clippy::dbg_macro))]
#[macro_use]
extern crate bitflags;

pub use fixed_info::{
    FileFlags, FixedFileInfo, FILE_FLAGS_MASK, FIXED_INFO_SIGNATURE, FIXED_INFO_SIZE,
    FIXED_INFO_STRUC_VERSION,
};
pub use record::{Dialect, ReadSeek, Record, ValueType, WriteSeek};
pub use translation::Translation;
pub use version_info::{VersionInfo, ROOT_KEY};

pub mod err;
pub mod fixed_info;

mod record;
mod translation;
mod utils;
mod version_info;

// For tests, we only initialize logging once.
#[cfg(test)]
use std::sync::Once;

#[cfg(test)]
static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
#[cfg(test)]
pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .init();
    });
}
