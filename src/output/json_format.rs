//! JSON output formatting.

use serde::Serialize;
use std::io::{self, Write};

/// Print a value as pretty JSON to stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    write_json(value, stdout.lock())
}

/// Write a value as pretty JSON followed by a newline.
pub fn write_json<T: Serialize + ?Sized, W: Write>(value: &T, mut out: W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut out, value).map_err(io::Error::other)?;
    writeln!(out)
}
