//! Core type definitions using newtype patterns for type safety.
//!
//! These types keep labels, formats and sizes from being passed around
//! as bare integers and strings.

mod audio_format;
mod label;

pub use audio_format::{percent, widen, AudioFormat, FileSize, FormatError};
pub use label::Label;
