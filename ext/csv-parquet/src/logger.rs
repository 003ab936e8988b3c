//! Logger initialization
//!
//! Diagnostics go to stderr through `env_logger`. The level is taken from
//! `--log-level`, then the `CSV_PARQUET_LOG_LEVEL` environment variable, and
//! defaults to `warn`.

use std::io::Write;

use log::LevelFilter;

pub const LOG_LEVEL_ENV: &str = "CSV_PARQUET_LOG_LEVEL";

/// Resolve the effective level; an unparsable environment value means `warn`
pub fn resolve_level(cli_level: Option<LevelFilter>, env_value: Option<&str>) -> LevelFilter {
    cli_level.unwrap_or_else(|| {
        env_value
            .and_then(|v| v.trim().parse::<LevelFilter>().ok())
            .unwrap_or(LevelFilter::Warn)
    })
}

pub fn init_logger(cli_level: Option<LevelFilter>) -> Result<(), log::SetLoggerError> {
    let env_value = std::env::var(LOG_LEVEL_ENV).ok();
    let level = resolve_level(cli_level, env_value.as_deref());

    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Warn);
    builder.filter_module("csv_parquet", level);
    builder.filter_module("csv_parquet_core", level);
    builder.format(|buf, record| {
        writeln!(
            buf,
            "[{} {}] {}",
            record.level(),
            record.target(),
            record.args()
        )
    });

    // try_init so repeated initialization in one process is not a panic
    builder.try_init()
}
