use std::path::PathBuf;

use clap::{Parser, ValueEnum, ValueHint};
use csv_parquet_core::{ConversionOptions, Delimiter, EmptyFieldPolicy, TextEncoding};
use log::LevelFilter;
use parquet::basic::{Compression, ZstdLevel};

#[derive(Parser, Debug)]
#[command(
    name = "csv-parquet",
    version,
    about = "Convert delimited text into Parquet using a declared schema",
    after_help = r#"SCHEMA
  message <name> { (required|optional) <type> <field> = <n>; ... }
  types: binary int32 int64 float double boolean

  Without --schema the first input line is the schema declaration.

EXAMPLES
  $ csv-parquet people.csv people.parquet --schema people.schema
  $ csv-parquet data.tsv data.parquet --delimiter '\t' --compression zstd"#
)]
pub struct Cli {
    /// Delimited input file, or `-` for stdin
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Parquet file to create; written only if every line converts
    #[arg(value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// File holding the schema declaration on its first line
    #[arg(long, short = 's', value_hint = ValueHint::FilePath)]
    pub schema: Option<PathBuf>,

    /// Literal field separator (`\t` for tab)
    #[arg(long, short = 'd', default_value = ",")]
    pub delimiter: Delimiter,

    /// Text encoding for binary column bytes
    #[arg(long, default_value = "utf-8")]
    pub encoding: TextEncoding,

    #[arg(long, value_enum, default_value = "snappy")]
    pub compression: CompressionArg,

    /// Records per Arrow batch; sized from sampled row widths when unset
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub batch_size: Option<u32>,

    /// Fail on an empty token for a required field instead of treating it as absent
    #[arg(long)]
    pub reject_empty_required: bool,

    /// Log level; falls back to CSV_PARQUET_LOG_LEVEL, then `warn`
    #[arg(long, value_parser = parse_level)]
    pub log_level: Option<LevelFilter>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum CompressionArg {
    Uncompressed,
    Snappy,
    Lz4,
    Zstd,
}

impl From<CompressionArg> for Compression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::Uncompressed => Compression::UNCOMPRESSED,
            CompressionArg::Snappy => Compression::SNAPPY,
            CompressionArg::Lz4 => Compression::LZ4_RAW,
            CompressionArg::Zstd => Compression::ZSTD(ZstdLevel::default()),
        }
    }
}

impl Cli {
    pub fn conversion_options(&self) -> ConversionOptions {
        let policy = if self.reject_empty_required {
            EmptyFieldPolicy::RejectRequired
        } else {
            EmptyFieldPolicy::Absent
        };
        ConversionOptions::new()
            .with_delimiter(self.delimiter.clone())
            .with_encoding(self.encoding)
            .with_empty_field_policy(policy)
    }

    pub fn reads_stdin(&self) -> bool {
        self.input.as_os_str() == "-"
    }
}

fn parse_level(s: &str) -> Result<LevelFilter, String> {
    s.parse::<LevelFilter>()
        .map_err(|_| format!("invalid log level '{}': use off, error, warn, info, debug or trace", s))
}
