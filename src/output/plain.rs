//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use crate::classifier::Classification;
use crate::server::{ApiEnvelope, ClassificationData};
use crate::storage::{AttemptRecord, HistoryStats};
use console::{style, Style};
use std::io::{self, Write};

const RULE: &str = "───────────────────────────────────────────────────────────────";

/// Print the outcome of a local classification.
pub fn print_classification(file: &str, result: &Classification) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    write_verdict(
        &mut out,
        file,
        result.is_ambulance(),
        &format!("{:.2}%", result.prediction.confidence_percent()),
    )?;
    writeln!(
        out,
        "  {} {:.1} ms",
        style("Time:      ").bold(),
        result.processing_time_ms
    )?;
    writeln!(out)
}

/// Print a server response.
pub fn print_envelope(file: &str, envelope: &ApiEnvelope<ClassificationData>) -> io::Result<()> {
    match (&envelope.data, envelope.success) {
        (Some(data), true) => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            write_verdict(&mut out, file, data.is_ambulance, &data.confidence_percent)?;
            writeln!(out)
        }
        _ => {
            print_error(&format!("{} ({})", envelope.message, envelope.status));
            Ok(())
        }
    }
}

fn write_verdict<W: Write>(
    out: &mut W,
    file: &str,
    is_ambulance: bool,
    confidence: &str,
) -> io::Result<()> {
    let verdict = if is_ambulance {
        style("AMBULANCE").red().bold()
    } else {
        style("TRAFFIC NOISE").green().bold()
    };

    writeln!(out)?;
    writeln!(out, "  {} {}", style("File:      ").bold(), file)?;
    writeln!(out, "  {} {}", style("Result:    ").bold(), verdict)?;
    writeln!(out, "  {} {}", style("Confidence:").bold(), confidence)
}

/// Print history records, most recent first.
pub fn print_history(records: &[AttemptRecord], detailed: bool) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if records.is_empty() {
        writeln!(out, "  {}", style("No classification history.").dim())?;
        return Ok(());
    }

    if detailed {
        for record in records {
            write_record_details(&mut out, record)?;
        }
        return Ok(());
    }

    writeln!(out, "  {}", style(RULE).dim())?;
    writeln!(
        out,
        "  {:>5}  {:<19}  {:<24}  {:<14}  {}",
        style("ID").bold(),
        style("TIME").bold(),
        style("FILE").bold(),
        style("RESULT").bold(),
        style("CONF").bold()
    )?;
    writeln!(out, "  {}", style(RULE).dim())?;

    for record in records {
        let (result, result_style, confidence) = match &record.classification {
            Some(c) if c.is_ambulance => (
                "ambulance",
                Style::new().red().bold(),
                format!("{:.2}%", c.confidence_percent),
            ),
            Some(c) => (
                "traffic_noise",
                Style::new().green(),
                format!("{:.2}%", c.confidence_percent),
            ),
            None => ("error", Style::new().yellow(), String::new()),
        };

        writeln!(
            out,
            "  {:>5}  {:<19}  {:<24}  {:<14}  {}",
            record.id,
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            truncate_string(&record.file.name, 24),
            result_style.apply_to(result),
            confidence
        )?;
    }

    writeln!(out, "  {}", style(RULE).dim())?;
    Ok(())
}

fn write_record_details<W: Write>(out: &mut W, record: &AttemptRecord) -> io::Result<()> {
    writeln!(out, "{}", style(format!("#{}", record.id)).cyan().bold())?;
    writeln!(out, "  {} {}", style("Time:      ").bold(), record.timestamp.to_rfc3339())?;
    writeln!(
        out,
        "  {} {} ({} bytes, {})",
        style("File:      ").bold(),
        record.file.name,
        record.file.size.bytes,
        record.file.format
    )?;
    writeln!(
        out,
        "  {} {} {}",
        style("Requester: ").bold(),
        record.requester.ip_address,
        style(record.requester.user_agent.as_deref().unwrap_or("-")).dim()
    )?;

    if let Some(c) = &record.classification {
        writeln!(
            out,
            "  {} {} ({:.2}%)",
            style("Result:    ").bold(),
            c.result,
            c.confidence_percent
        )?;
    }
    if let Some(e) = &record.error {
        writeln!(out, "  {} {}", style("Error:     ").bold(), style(&e.message).red())?;
    }
    if let Some(ms) = record.processing_time_ms {
        writeln!(out, "  {} {:.1} ms", style("Time taken:").bold(), ms)?;
    }
    writeln!(out)
}

/// Print history statistics.
pub fn print_stats(stats: &HistoryStats) {
    println!(
        "{} {} attempts: {} succeeded, {} failed",
        style("ℹ").blue().bold(),
        style(stats.total).bold(),
        style(stats.succeeded).green(),
        style(stats.failed).red()
    );
    println!(
        "  {} ambulance, {} traffic noise",
        style(stats.ambulance).bold(),
        style(stats.traffic_noise).bold()
    );
    if let (Some(oldest), Some(newest)) = (stats.oldest, stats.newest) {
        println!(
            "  {}",
            style(format!(
                "from {} to {}",
                oldest.format("%Y-%m-%d %H:%M"),
                newest.format("%Y-%m-%d %H:%M")
            ))
            .dim()
        );
    }
}

/// Write history records as an unstyled report.
pub fn write_plain<W: Write>(records: &[AttemptRecord], mut out: W) -> io::Result<()> {
    writeln!(out, "Classification History")?;
    writeln!(out, "{}", "=".repeat(60))?;
    writeln!(out)?;

    for record in records {
        writeln!(out, "{}", record.summary())?;
        writeln!(
            out,
            "    at {} from {}",
            record.timestamp.to_rfc3339(),
            record.requester.ip_address
        )?;
    }

    writeln!(out)?;
    writeln!(out, "{} record(s)", records.len())
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Truncate a string to a maximum number of characters, adding an ellipsis.
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
