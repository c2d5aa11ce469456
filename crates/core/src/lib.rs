//! Core library for splitting, correcting and merging SRT subtitle files.

pub mod chunk;
pub mod correct;
pub mod diff;
pub mod merge;
pub mod srt;
