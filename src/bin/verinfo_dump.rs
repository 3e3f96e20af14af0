use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use log::Level;

use verinfo::{Dialect, Record, ValueType, VersionInfo};

struct VerinfoDump {
    input: PathBuf,
    dialect: Dialect,
    show_tree: bool,
    verbosity_level: Option<Level>,
}

impl VerinfoDump {
    fn from_cli_matches(matches: &clap::ArgMatches) -> Self {
        let input = PathBuf::from(
            matches
                .get_one::<String>("INPUT")
                .expect("This is a required argument"),
        );

        let dialect = match matches
            .get_one::<String>("dialect")
            .map(String::as_str)
            .unwrap_or("wide")
        {
            "ansi" => Dialect::Ansi,
            _ => Dialect::Wide,
        };

        let verbosity_level = match matches.get_count("verbose") {
            0 => None,
            1 => Some(Level::Info),
            2 => Some(Level::Debug),
            _ => Some(Level::Trace),
        };

        VerinfoDump {
            input,
            dialect,
            show_tree: matches.get_flag("tree"),
            verbosity_level,
        }
    }

    fn run(&self) -> Result<()> {
        let bytes = fs::read(&self.input)
            .with_context(|| format!("Failed to open file {}", self.input.display()))?;

        let info = VersionInfo::from_bytes(self.dialect, &bytes)
            .with_context(|| format!("Failed to parse {}", self.input.display()))?;

        if self.show_tree {
            print_record(info.root(), 0);
            return Ok(());
        }

        let ffi = info.fixed_file_info()?;
        let (fv_major, fv_minor, fv_patch, fv_build) = ffi.file_version();
        let (pv_major, pv_minor, pv_patch, pv_build) = ffi.product_version();

        println!("Signature:       {:#010X}", ffi.signature);
        println!("Struct version:  {:#010X}", ffi.struct_version);
        println!("File version:    {fv_major}.{fv_minor}.{fv_patch}.{fv_build}");
        println!("Product version: {pv_major}.{pv_minor}.{pv_patch}.{pv_build}");
        println!("File flags:      {:?}", ffi.file_flags());
        println!("File OS:         {:#010X}", ffi.file_os);
        println!("File type:       {:#010X}", ffi.file_type);

        println!("\nTranslations ({}):", info.translation_count());
        for index in 0..info.translation_count() {
            let translation = info.translation(index)?;
            println!(
                "  {} (language {:#06X}, charset {:#06X})",
                translation, translation.language_id, translation.charset
            );
        }

        println!("\nString tables ({}):", info.string_table_count());
        for table in 0..info.string_table_count() {
            println!("  {}:", info.string_table_name(table)?);
            for index in 0..info.string_count(table)? {
                println!(
                    "    {} = {}",
                    info.string_name(table, index)?,
                    info.string_value(table, index)?
                );
            }
        }

        Ok(())
    }
}

fn print_record(record: &Record, depth: usize) {
    let type_tag = match record.value_type() {
        ValueType::Binary => "BINARY",
        ValueType::Text => "TEXT",
    };
    println!(
        "{}`{}` [{}] value: {} bytes, children: {}",
        "  ".repeat(depth),
        record.name(),
        type_tag,
        record.value().len(),
        record.children().len()
    );
    for child in record.children() {
        print_record(child, depth + 1);
    }
}

fn main() {
    let matches = Command::new("verinfo_dump")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Dumps a raw VS_VERSIONINFO blob as text")
        .arg(
            Arg::new("INPUT")
                .required(true)
                .help("Path to a file containing a single raw VS_VERSIONINFO blob"),
        )
        .arg(
            Arg::new("dialect")
                .short('d')
                .long("dialect")
                .value_parser(["wide", "ansi"])
                .default_value("wide")
                .help("Record framing of the input blob"),
        )
        .arg(
            Arg::new("tree")
                .short('t')
                .long("tree")
                .action(ArgAction::SetTrue)
                .help("Print the raw record tree instead of the decoded fields"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help("Log verbosity (-v, -vv, -vvv)"),
        )
        .get_matches();

    let app = VerinfoDump::from_cli_matches(&matches);

    if let Some(level) = app.verbosity_level {
        if let Err(e) = env_logger::Builder::new()
            .filter_level(level.to_level_filter())
            .try_init()
        {
            eprintln!("Failed to initialize logging: {e:?}");
        }
    }

    if let Err(e) = app.run() {
        eprintln!("{e:?}");
        std::process::exit(1);
    }
}
