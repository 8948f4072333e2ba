//! JSON-based classification history.
//!
//! Every classification attempt, successful or not, is appended to a
//! single JSON array on disk. Writers are serialized and each write
//! replaces the file atomically, so concurrent requests never lose
//! entries or leave a truncated file behind. Writes run on the blocking
//! thread pool.

use crate::error::{StorageError, StorageResult};
use crate::types::{percent, widen, AudioFormat, FileSize, Label};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// A persisted classification attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Sequential identifier, starting at 1.
    pub id: u64,
    /// When the attempt was logged.
    pub timestamp: DateTime<Local>,
    /// Whether a classification was produced.
    pub success: bool,
    /// The uploaded file.
    pub file: FileInfo,
    /// Who sent it.
    pub requester: RequesterInfo,
    /// Present on successful attempts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<ClassificationInfo>,
    /// Present on failed attempts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    /// End-to-end processing time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub size: SizeInfo,
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeInfo {
    pub bytes: u64,
    pub kilobytes: f64,
    pub megabytes: f64,
}

impl From<FileSize> for SizeInfo {
    fn from(size: FileSize) -> Self {
        Self {
            bytes: size.bytes(),
            kilobytes: size.kilobytes(),
            megabytes: size.megabytes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequesterInfo {
    pub ip_address: String,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationInfo {
    pub result: Label,
    pub is_ambulance: bool,
    pub confidence: f64,
    pub confidence_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
}

/// Everything known about an attempt before it gets an id.
#[derive(Debug, Clone)]
pub struct AttemptInfo {
    pub file_name: String,
    pub file_size: FileSize,
    /// Extension as sent, even when it was rejected.
    pub audio_format: String,
    pub client_ip: String,
    pub user_agent: Option<String>,
    pub outcome: Result<(Label, f32), String>,
    pub processing_time_ms: Option<f64>,
}

impl AttemptInfo {
    /// Best-effort extension of a file name, for logging rejected uploads.
    pub fn format_of(file_name: &str) -> String {
        AudioFormat::from_filename(file_name)
            .map(|fmt| fmt.to_string())
            .unwrap_or_default()
    }
}

impl AttemptRecord {
    fn from_info(id: u64, info: AttemptInfo) -> Self {
        let (success, classification, error) = match info.outcome {
            Ok((label, confidence)) => (
                true,
                Some(ClassificationInfo {
                    result: label,
                    is_ambulance: label.is_ambulance(),
                    confidence: widen(confidence),
                    confidence_percent: percent(confidence),
                }),
                None,
            ),
            Err(message) if message.is_empty() => (false, None, None),
            Err(message) => (false, None, Some(ErrorInfo { message })),
        };

        Self {
            id,
            timestamp: Local::now(),
            success,
            file: FileInfo {
                name: info.file_name,
                size: info.file_size.into(),
                format: info.audio_format,
            },
            requester: RequesterInfo {
                ip_address: info.client_ip,
                user_agent: info.user_agent,
            },
            classification,
            error,
            processing_time_ms: info.processing_time_ms,
        }
    }

    /// Get a short summary of the attempt.
    pub fn summary(&self) -> String {
        match (&self.classification, &self.error) {
            (Some(c), _) => format!(
                "#{} {} -> {} ({:.2}%)",
                self.id, self.file.name, c.result.slug(), c.confidence_percent
            ),
            (None, Some(e)) => format!("#{} {} -> error: {}", self.id, self.file.name, e.message),
            (None, None) => format!("#{} {} -> failed", self.id, self.file.name),
        }
    }
}

/// JSON file-based history storage.
pub struct HistoryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl HistoryStore {
    /// Create a store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an attempt and return its id.
    pub async fn log_attempt(&self, info: AttemptInfo) -> StorageResult<u64> {
        self.update(move |path| {
            let mut history = read_records(path);
            let id = history.last().map_or(1, |last| last.id + 1);
            history.push(AttemptRecord::from_info(id, info));
            write_records(path, &history)?;
            Ok(id)
        })
        .await
    }

    /// All records, oldest first.
    ///
    /// A missing or unreadable file reads as an empty history.
    pub fn list(&self) -> Vec<AttemptRecord> {
        read_records(&self.path)
    }

    /// The last `count` records, most recent first.
    pub fn list_recent(&self, count: usize) -> Vec<AttemptRecord> {
        let mut records = self.list();
        records.reverse();
        records.truncate(count);
        records
    }

    /// Remove every record.
    pub async fn clear(&self) -> StorageResult<usize> {
        self.update(|path| {
            let removed = read_records(path).len();
            write_records(path, &[])?;
            Ok(removed)
        })
        .await
    }

    /// Delete records older than a given duration.
    pub async fn prune(&self, max_age: chrono::Duration) -> StorageResult<usize> {
        self.update(move |path| {
            let cutoff = Local::now() - max_age;
            let mut history = read_records(path);
            let before = history.len();
            history.retain(|record| record.timestamp >= cutoff);

            let removed = before - history.len();
            if removed > 0 {
                write_records(path, &history)?;
            }
            Ok(removed)
        })
        .await
    }

    /// Get history statistics.
    pub fn stats(&self) -> HistoryStats {
        let records = self.list();
        let count_label = |label: Label| {
            records
                .iter()
                .filter(|r| r.classification.as_ref().is_some_and(|c| c.result == label))
                .count()
        };

        HistoryStats {
            total: records.len(),
            succeeded: records.iter().filter(|r| r.success).count(),
            failed: records.iter().filter(|r| !r.success).count(),
            ambulance: count_label(Label::Ambulance),
            traffic_noise: count_label(Label::TrafficNoise),
            oldest: records.first().map(|r| r.timestamp),
            newest: records.last().map(|r| r.timestamp),
        }
    }

    /// Run a read-modify-write of the file on the blocking pool, one at a time.
    async fn update<T, F>(&self, op: F) -> StorageResult<T>
    where
        F: FnOnce(&Path) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let _guard = self.write_lock.lock().await;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || op(&path))
            .await
            .map_err(|e| StorageError::SaveFailed(e.to_string()))?
    }
}

fn read_records(path: &Path) -> Vec<AttemptRecord> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            tracing::warn!("Error reading history file {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<AttemptRecord>>(&content) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(
                "History file {} is not a valid record array, starting fresh: {}",
                path.display(),
                e
            );
            Vec::new()
        }
    }
}

fn write_records(path: &Path, records: &[AttemptRecord]) -> StorageResult<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| StorageError::DirectoryError(e.to_string()))?;

    let content = serde_json::to_string_pretty(records)?;

    // Write next to the target, then rename over it
    let mut tmp = tempfile::NamedTempFile::new_in(&dir)
        .map_err(|e| StorageError::SaveFailed(e.to_string()))?;
    tmp.write_all(content.as_bytes())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| StorageError::SaveFailed(e.to_string()))?;
    tmp.persist(path)
        .map_err(|e| StorageError::SaveFailed(e.error.to_string()))?;

    Ok(())
}

/// History statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStats {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub ambulance: usize,
    pub traffic_noise: usize,
    pub oldest: Option<DateTime<Local>>,
    pub newest: Option<DateTime<Local>>,
}
