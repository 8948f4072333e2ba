//! Configuration management for Sirene.
//!
//! Provides XDG-compliant configuration storage and the service settings.

mod settings;

pub use settings::{AppSettings, FeatureParams, Paths};
