//! CSV output formatting.

use crate::storage::AttemptRecord;
use std::io::Write;

const HEADER: [&str; 12] = [
    "id",
    "timestamp",
    "success",
    "file_name",
    "file_bytes",
    "format",
    "ip_address",
    "user_agent",
    "result",
    "confidence_percent",
    "processing_time_ms",
    "error",
];

/// Write history records as CSV, one row per attempt.
pub fn write_csv<W: Write>(records: &[AttemptRecord], out: W) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(HEADER)?;

    for record in records {
        let classification = record.classification.as_ref();
        wtr.write_record([
            record.id.to_string(),
            record.timestamp.to_rfc3339(),
            record.success.to_string(),
            record.file.name.clone(),
            record.file.size.bytes.to_string(),
            record.file.format.clone(),
            record.requester.ip_address.clone(),
            record.requester.user_agent.clone().unwrap_or_default(),
            classification.map_or(String::new(), |c| c.result.slug().to_string()),
            classification.map_or(String::new(), |c| format!("{:.2}", c.confidence_percent)),
            record
                .processing_time_ms
                .map_or(String::new(), |ms| format!("{:.2}", ms)),
            record
                .error
                .as_ref()
                .map_or(String::new(), |e| e.message.clone()),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<AttemptRecord> {
        serde_json::from_str(
            r#"[
              { "id": 1, "timestamp": "2024-05-01T10:00:00+02:00", "success": true,
                "file": { "name": "true.wav", "size": { "bytes": 2048, "kilobytes": 2.0, "megabytes": 0.0 }, "format": ".wav" },
                "requester": { "ip_address": "127.0.0.1", "user_agent": null },
                "classification": { "result": "ambulance", "is_ambulance": true, "confidence": 0.9731, "confidence_percent": 97.31 },
                "processing_time_ms": 41.5 },
              { "id": 2, "timestamp": "2024-05-01T10:01:00+02:00", "success": false,
                "file": { "name": "notes, v2.txt", "size": { "bytes": 5, "kilobytes": 0.0, "megabytes": 0.0 }, "format": ".txt" },
                "requester": { "ip_address": "127.0.0.1", "user_agent": "curl/8.0" },
                "error": { "message": "Invalid file type" } }
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_csv_rows() {
        let mut buf = Vec::new();
        write_csv(&sample(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,timestamp,success,file_name"));
        assert!(lines[1].contains(",true.wav,2048,.wav,127.0.0.1,,ambulance,97.31,41.50,"));
        // Fields containing commas are quoted
        assert!(lines[2].contains("\"notes, v2.txt\""));
        assert!(lines[2].ends_with(",,,,Invalid file type"));
    }
}
