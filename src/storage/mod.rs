//! Classification history persistence.
//!
//! Provides a JSON-based log of every classification attempt.

mod history;

pub use history::{
    AttemptInfo, AttemptRecord, ClassificationInfo, ErrorInfo, FileInfo, HistoryStats,
    HistoryStore, RequesterInfo, SizeInfo,
};
