//! MXF inspection through ffprobe and the stream summary built from it
//!
//! The container itself is never parsed here. ffprobe is run with
//! `-show_format -show_streams` and its JSON report is projected into a
//! summary plus one bucket per stream kind.

use std::ffi::OsStr;
use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::tool::ExternalTool;
use crate::units::{format_aspect_ratio, format_bitrate, format_duration, format_size};
use crate::Result;

/// Container tags passed straight through into the summary
pub const SUMMARY_TAGS: [&str; 5] = [
    "company_name",
    "product_name",
    "product_version",
    "product_uid",
    "project_name",
];

/// Source of probe reports
#[async_trait]
pub trait MediaProber: Send + Sync {
    /// Probe a media file and return the raw JSON report
    async fn probe(&self, path: &Path) -> Result<Value>;
}

/// ffprobe-backed prober
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    tool: ExternalTool,
}

impl FfprobeProber {
    pub fn new(tool: ExternalTool) -> Self {
        Self { tool }
    }

    pub fn tool(&self) -> &ExternalTool {
        &self.tool
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    async fn probe(&self, path: &Path) -> Result<Value> {
        let stdout = self
            .tool
            .run([
                OsStr::new("-v"),
                OsStr::new("quiet"),
                OsStr::new("-print_format"),
                OsStr::new("json"),
                OsStr::new("-show_format"),
                OsStr::new("-show_streams"),
                path.as_os_str(),
            ])
            .await?;

        let report: Value = serde_json::from_slice(&stdout)?;
        info!(file = %path.display(), "ffprobe report received");
        Ok(report)
    }
}

/// Stream bucket selected by `codec_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
    Other,
}

impl StreamKind {
    pub fn classify(stream: &Value) -> Self {
        match stream.get("codec_type").and_then(Value::as_str) {
            Some("video") => StreamKind::Video,
            Some("audio") => StreamKind::Audio,
            _ => StreamKind::Other,
        }
    }
}

/// Summary of one probe report
#[derive(Debug, Clone, Serialize)]
pub struct ProbeSummary {
    pub summary: Map<String, Value>,
    pub video_streams: Vec<Value>,
    pub audio_streams: Vec<Value>,
    pub other_streams: Vec<Value>,
    pub raw_data: Value,
}

impl ProbeSummary {
    pub fn stream_count(&self) -> usize {
        self.video_streams.len() + self.audio_streams.len() + self.other_streams.len()
    }
}

fn opt_string(value: Option<String>) -> Value {
    value.map(Value::String).unwrap_or(Value::Null)
}

fn field(block: &Value, key: &str) -> Value {
    block.get(key).cloned().unwrap_or(Value::Null)
}

/// Final path component of ffprobe's `filename`
fn basename(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
}

/// Build the summary view of an ffprobe report
pub fn summarize(report: Value) -> ProbeSummary {
    let empty = Value::Object(Map::new());
    let format = report.get("format").unwrap_or(&empty);

    let mut summary = Map::new();
    summary.insert(
        "File Name".into(),
        format
            .get("filename")
            .and_then(Value::as_str)
            .map(|f| Value::String(basename(f).to_string()))
            .unwrap_or(Value::Null),
    );
    summary.insert("Format".into(), field(format, "format_long_name"));
    summary.insert("Duration".into(), opt_string(format_duration(format.get("duration"))));
    summary.insert("File Size".into(), opt_string(format_size(format.get("size"))));
    summary.insert(
        "Overall Bit Rate".into(),
        opt_string(format_bitrate(format.get("bit_rate"))),
    );
    summary.insert("Stream Count".into(), field(format, "nb_streams"));

    if let Some(tags) = format.get("tags").and_then(Value::as_object) {
        for tag in SUMMARY_TAGS {
            if let Some(value) = tags.get(tag) {
                summary.insert(tag.to_string(), value.clone());
            }
        }
    }

    let mut video_streams = Vec::new();
    let mut audio_streams = Vec::new();
    let mut other_streams = Vec::new();

    let streams = report
        .get("streams")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    for stream in streams {
        match StreamKind::classify(stream) {
            StreamKind::Video => video_streams.push(video_entry(stream)),
            StreamKind::Audio => audio_streams.push(audio_entry(stream)),
            StreamKind::Other => other_streams.push(other_entry(stream)),
        }
    }

    ProbeSummary {
        summary,
        video_streams,
        audio_streams,
        other_streams,
        raw_data: report,
    }
}

fn video_entry(stream: &Value) -> Value {
    let resolution = match (stream.get("width"), stream.get("height")) {
        (Some(w), Some(h)) if !w.is_null() && !h.is_null() => {
            Value::String(format!("{}x{}", scalar_text(w), scalar_text(h)))
        }
        _ => Value::Null,
    };

    let mut entry = Map::new();
    entry.insert("Stream Index".into(), field(stream, "index"));
    entry.insert("Codec".into(), field(stream, "codec_long_name"));
    entry.insert("Resolution".into(), resolution);
    entry.insert(
        "Aspect Ratio".into(),
        opt_string(format_aspect_ratio(
            stream.get("display_aspect_ratio").and_then(Value::as_str),
        )),
    );
    entry.insert("Frame Rate".into(), field(stream, "avg_frame_rate"));
    entry.insert("Bit Rate".into(), opt_string(format_bitrate(stream.get("bit_rate"))));
    entry.insert("Pixel Format".into(), field(stream, "pix_fmt"));
    entry.insert("details".into(), stream.clone());
    Value::Object(entry)
}

fn audio_entry(stream: &Value) -> Value {
    let channels = match stream.get("channels").filter(|c| !c.is_null()) {
        Some(count) => {
            let count = scalar_text(count);
            match stream.get("channel_layout").and_then(Value::as_str) {
                Some(layout) => Value::String(format!("{} ({})", count, layout)),
                None => Value::String(count),
            }
        }
        None => Value::Null,
    };

    let mut entry = Map::new();
    entry.insert("Stream Index".into(), field(stream, "index"));
    entry.insert("Codec".into(), field(stream, "codec_long_name"));
    entry.insert("Sample Rate".into(), field(stream, "sample_rate"));
    entry.insert("Channels".into(), channels);
    entry.insert("Bit Rate".into(), opt_string(format_bitrate(stream.get("bit_rate"))));
    entry.insert("details".into(), stream.clone());
    Value::Object(entry)
}

fn other_entry(stream: &Value) -> Value {
    let mut entry = Map::new();
    entry.insert("Stream Index".into(), field(stream, "index"));
    entry.insert("Codec".into(), field(stream, "codec_long_name"));
    entry.insert("Type".into(), field(stream, "codec_type"));
    entry.insert("details".into(), stream.clone());
    Value::Object(entry)
}

/// Scalar rendered without JSON string quotes
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
