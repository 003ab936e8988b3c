mod cli;
mod logger;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use csv_parquet_core::{ConversionError, Converter, ParquetSinkBuilder, RecordCount};
use log::{debug, info};
use tempfile::NamedTempFile;

use crate::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = logger::init_logger(cli.log_level) {
        eprintln!("warning: logger not initialized: {}", err);
    }

    match convert(&cli) {
        Ok(count) => {
            info!("wrote {} records to {}", count, cli.output.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn report(err: &anyhow::Error) {
    match err.downcast_ref::<ConversionError>() {
        Some(conversion) => eprintln!("error[{}] {}", conversion.kind(), conversion),
        None => eprintln!("error: {:#}", err),
    }
}

fn open_input(cli: &Cli) -> Result<Box<dyn BufRead>> {
    if cli.reads_stdin() {
        return Ok(Box::new(BufReader::new(io::stdin().lock())));
    }
    let file = File::open(&cli.input)
        .with_context(|| format!("failed to open input {}", cli.input.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

fn read_schema(path: &Path) -> Result<String> {
    let file =
        File::open(path).with_context(|| format!("failed to open schema {}", path.display()))?;
    let mut line = String::new();
    BufReader::new(file)
        .read_line(&mut line)
        .with_context(|| format!("failed to read schema {}", path.display()))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Temporary file next to the output so the final rename stays on one filesystem
fn temp_output(output: &Path) -> Result<NamedTempFile> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))
}

fn convert(cli: &Cli) -> Result<RecordCount> {
    let schema = cli.schema.as_deref().map(read_schema).transpose()?;
    let input = open_input(cli)?;
    let mut tmp = temp_output(&cli.output)?;
    debug!("staging output in {}", tmp.path().display());

    let mut builder = ParquetSinkBuilder::new().with_compression(cli.compression.into());
    if let Some(size) = cli.batch_size {
        builder = builder.with_batch_size(size as usize);
    }

    let count = {
        let mut sink = builder.build(tmp.as_file_mut());
        let converter = Converter::new(cli.conversion_options());
        let lines = input.lines();
        match &schema {
            Some(schema) => converter.run(schema, lines, &mut sink)?,
            None => converter.run_with_inline_schema(lines, &mut sink)?,
        }
    };

    tmp.as_file()
        .sync_all()
        .context("failed to sync output")?;
    tmp.persist(&cli.output)
        .with_context(|| format!("failed to move output to {}", cli.output.display()))?;
    Ok(count)
}
