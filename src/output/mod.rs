//! Output formatting module.
//!
//! Provides formatters for plain text, JSON, and CSV output of
//! classification results and history.

mod csv_format;
mod json_format;
mod plain;

pub use csv_format::write_csv;
pub use json_format::{print_json, write_json};
pub use plain::{
    print_classification, print_envelope, print_error, print_history, print_stats, print_success,
    write_plain,
};

use crate::cli::OutputFormat;
use crate::error::CliResult;
use crate::storage::AttemptRecord;
use std::io::Write;

/// Write history records in the requested format.
pub fn write_history<W: Write>(
    records: &[AttemptRecord],
    format: OutputFormat,
    out: W,
) -> CliResult<()> {
    match format {
        OutputFormat::Plain => write_plain(records, out)?,
        OutputFormat::Json => write_json(records, out)?,
        OutputFormat::Csv => write_csv(records, out)?,
    }
    Ok(())
}
