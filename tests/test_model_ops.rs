use fixtures::*;

use pretty_assertions::assert_eq;
use verinfo::err::VersionInfoError;
use verinfo::{Dialect, Translation, VersionInfo, FIXED_INFO_SIGNATURE};

#[test]
fn test_empty_round_trip() {
    ensure_env_logger_initialized();
    let mut info = VersionInfo::new(Dialect::Wide);
    info.reset();

    let bytes = info.to_bytes().unwrap();
    let reparsed = VersionInfo::from_bytes(Dialect::Wide, &bytes).unwrap();

    assert_eq!(reparsed.translation_count(), 0);
    assert_eq!(reparsed.string_table_count(), 0);
    assert_eq!(
        reparsed.fixed_file_info().unwrap().signature,
        FIXED_INFO_SIGNATURE
    );
}

#[test]
fn test_single_translation() {
    ensure_env_logger_initialized();
    let mut info = VersionInfo::new(Dialect::Wide);

    assert_eq!(info.add_translation(0x0809, 0x04B0).unwrap(), 0);
    assert_eq!(info.translation_string(0).unwrap(), "080904B0");
    assert_eq!(info.index_of_translation(0x0809, 0x04B0), Some(0));
    assert_eq!(info.index_of_translation(0x0409, 0x04B0), None);
}

#[test]
fn test_string_table_with_strings_survives_round_trip() {
    ensure_env_logger_initialized();
    let mut info = VersionInfo::new(Dialect::Wide);

    info.add_translation(0x0809, 0x04B0).unwrap();
    let table = info.add_string_table_for(0x0809, 0x04B0).unwrap();
    assert_eq!(table, 0);
    assert_eq!(info.add_string(0, "CompanyName", "Acme Ltd").unwrap(), 0);
    assert_eq!(info.add_string(0, "FileVersion", "1.2.3.4").unwrap(), 1);

    let bytes = info.to_bytes().unwrap();
    let reparsed = VersionInfo::from_bytes(Dialect::Wide, &bytes).unwrap();

    assert_eq!(reparsed.string_table_count(), 1);
    assert_eq!(reparsed.string_table_name(0).unwrap(), "080904B0");
    assert_eq!(reparsed.string_count(0).unwrap(), 2);
    assert_eq!(reparsed.string_name(0, 0).unwrap(), "CompanyName");
    assert_eq!(reparsed.string_value(0, 0).unwrap(), "Acme Ltd");
    assert_eq!(reparsed.string_name(0, 1).unwrap(), "FileVersion");
    assert_eq!(
        reparsed.string_value_by_name(0, "FileVersion").unwrap(),
        "1.2.3.4"
    );
}

#[test]
fn test_delete_translation_shifts_later_entries() {
    ensure_env_logger_initialized();
    let mut info = VersionInfo::new(Dialect::Wide);
    info.add_translation(0x0409, 0x04B0).unwrap();
    info.add_translation(0x0809, 0x04B0).unwrap();
    info.add_translation(0x040C, 0x04E4).unwrap();

    info.delete_translation(1).unwrap();

    assert_eq!(info.translation_count(), 2);
    assert_eq!(info.translation(0).unwrap(), Translation::new(0x0409, 0x04B0));
    assert_eq!(info.translation(1).unwrap(), Translation::new(0x040C, 0x04E4));
}

#[test]
fn test_duplicate_string_name_is_rejected() {
    let mut info = populated_model(Dialect::Wide);
    let err = info.add_string(0, "companyname", "Other").unwrap_err();
    assert!(matches!(err, VersionInfoError::DuplicateName { .. }));

    // The table is unchanged.
    assert_eq!(info.string_count(0).unwrap(), 3);
    assert_eq!(info.string_value(0, 0).unwrap(), "Acme Ltd");
}

#[test]
fn test_unknown_string_name_is_rejected() {
    let mut info = populated_model(Dialect::Wide);

    assert!(matches!(
        info.string_value_by_name(0, "Nope"),
        Err(VersionInfoError::UnknownName { .. })
    ));
    assert!(matches!(
        info.set_string_value_by_name(0, "Nope", "x"),
        Err(VersionInfoError::UnknownName { .. })
    ));
    assert!(matches!(
        info.delete_string_by_name(0, "Nope"),
        Err(VersionInfoError::UnknownName { .. })
    ));
}

#[test]
fn test_lookups_are_case_insensitive() {
    let info = populated_model(Dialect::Wide);

    assert_eq!(info.index_of_string(0, "COMPANYNAME").unwrap(), Some(0));
    assert_eq!(info.index_of_string_table("080904b0"), Some(0));
    assert_eq!(
        info.string_value_by_name(0, "fileversion").unwrap(),
        "1.2.3.4"
    );
}

#[test]
fn test_add_or_update_string() {
    let mut info = populated_model(Dialect::Wide);

    // Updates in place, keeping the index.
    assert_eq!(
        info.add_or_update_string(0, "FileVersion", "9.9.9.9").unwrap(),
        2
    );
    assert_eq!(info.string_value(0, 2).unwrap(), "9.9.9.9");
    assert_eq!(info.string_count(0).unwrap(), 3);

    // Appends when absent.
    assert_eq!(
        info.add_or_update_string(0, "LegalCopyright", "© Acme").unwrap(),
        3
    );
    assert_eq!(info.string_count(0).unwrap(), 4);
}

#[test]
fn test_delete_string_by_index_and_name() {
    let mut info = populated_model(Dialect::Wide);

    info.delete_string(0, 1).unwrap();
    assert_eq!(info.string_count(0).unwrap(), 2);
    assert_eq!(info.string_name(0, 1).unwrap(), "FileVersion");

    info.delete_string_by_name(0, "CompanyName").unwrap();
    assert_eq!(info.string_count(0).unwrap(), 1);
    assert_eq!(info.string_name(0, 0).unwrap(), "FileVersion");
}

#[test]
fn test_delete_string_table() {
    let mut info = populated_model(Dialect::Wide);
    info.add_string_table_for(0x0409, 0x04B0).unwrap();
    assert_eq!(info.string_table_count(), 2);

    info.delete_string_table(0).unwrap();
    assert_eq!(info.string_table_count(), 1);
    assert_eq!(info.string_table_name(0).unwrap(), "040904B0");

    assert!(matches!(
        info.delete_string_table(5),
        Err(VersionInfoError::IndexOutOfBounds { index: 5, .. })
    ));
}

#[test]
fn test_string_table_translation() {
    let info = populated_model(Dialect::Wide);
    assert_eq!(
        info.string_table_translation(0).unwrap(),
        Translation::new(0x0809, 0x04B0)
    );
    assert_eq!(info.index_of_string_table_for(0x0809, 0x04B0), Some(0));
    assert_eq!(info.index_of_string_table_for(0x0409, 0x04B0), None);
}

#[test]
fn test_fixed_file_info_is_stamped_on_set() {
    let mut info = VersionInfo::new(Dialect::Wide);
    let mut ffi = info.fixed_file_info().unwrap();
    ffi.signature = 0x1234_5678;
    ffi.struct_version = 0xFFFF_FFFF;
    ffi.file_version_ms = 0x0002_0001;
    info.set_fixed_file_info(&ffi);

    let stored = info.fixed_file_info().unwrap();
    assert_eq!(stored.signature, FIXED_INFO_SIGNATURE);
    assert_eq!(stored.struct_version, 0x0001_0000);
    assert_eq!(stored.file_version_ms, 0x0002_0001);
}

#[test]
fn test_wire_order_matches_insertion_order() {
    ensure_env_logger_initialized();
    let mut info = VersionInfo::new(Dialect::Wide);
    let table = info.add_string_table_for(0x0409, 0x04B0).unwrap();
    for name in ["Zeta", "Alpha", "Mu", "Beta"] {
        info.add_string(table, name, name).unwrap();
    }

    let bytes = info.to_bytes().unwrap();
    let reparsed = VersionInfo::from_bytes(Dialect::Wide, &bytes).unwrap();

    let names: Vec<String> = (0..reparsed.string_count(0).unwrap())
        .map(|i| reparsed.string_name(0, i).unwrap())
        .collect();
    assert_eq!(names, ["Zeta", "Alpha", "Mu", "Beta"]);
}
