//! # Media Metadata Common Library
//!
//! Format readers, summarizers and CSV exporters shared by the mediameta
//! services:
//! - Generic object normalization to JSON
//! - AVB mob summaries (via an external bin dumper)
//! - MXF / ffprobe stream summaries with human-readable units
//! - CMX 3600 EDL event tables
//! - ALE conversion, batch conversion and merging
//! - Configuration loading

pub mod ale;
pub mod avb;
pub mod batch;
pub mod config;
pub mod edl;
pub mod error;
pub mod mob_id;
pub mod normalize;
pub mod probe;
pub mod table;
pub mod text;
pub mod tool;
pub mod units;

pub use error::{Error, Result};
pub use mob_id::MobId;
pub use normalize::{normalize, Normalizer, ParsedValue};
pub use table::ExportTable;
