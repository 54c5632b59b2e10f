//! Human-readable units for probe summaries
//!
//! All formatters are total: missing or non-numeric input yields `None`
//! rather than an error, so summaries simply omit what the probe did not
//! report.

use serde_json::Value;

/// Binary size tiers (bytes)
const KIB: f64 = 1024.0;
const MIB: f64 = KIB * 1024.0;
const GIB: f64 = MIB * 1024.0;

/// Decimal bitrate tiers (bits per second)
const KBPS: f64 = 1000.0;
const MBPS: f64 = KBPS * 1000.0;

/// Read a non-negative integer from a JSON number or a string of digits.
///
/// ffprobe reports sizes and bitrates as strings (`"bit_rate": "1411200"`),
/// some tools as numbers; both are accepted. Fractions, signs and
/// whitespace are rejected.
fn as_whole_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_u64().map(|v| v as f64),
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            s.parse::<f64>().ok()
        }
        _ => None,
    }
}

/// Format a byte count as B / KB / MB / GB.
///
/// # Examples
///
/// ```
/// use mm_common::units::format_size;
/// use serde_json::json;
///
/// assert_eq!(format_size(Some(&json!("1023"))).as_deref(), Some("1023 B"));
/// assert_eq!(format_size(Some(&json!(1536))).as_deref(), Some("1.50 KB"));
/// assert_eq!(format_size(Some(&json!("abc"))), None);
/// ```
pub fn format_size(value: Option<&Value>) -> Option<String> {
    let size = as_whole_number(value)?;

    let formatted = if size < KIB {
        format!("{} B", size as u64)
    } else if size < MIB {
        format!("{:.2} KB", size / KIB)
    } else if size < GIB {
        format!("{:.2} MB", size / MIB)
    } else {
        format!("{:.2} GB", size / GIB)
    };
    Some(formatted)
}

/// Format a bitrate as bps / kbps / Mbps.
///
/// # Examples
///
/// ```
/// use mm_common::units::format_bitrate;
/// use serde_json::json;
///
/// assert_eq!(format_bitrate(Some(&json!("999"))).as_deref(), Some("999 bps"));
/// assert_eq!(format_bitrate(Some(&json!("1411200"))).as_deref(), Some("1.41 Mbps"));
/// ```
pub fn format_bitrate(value: Option<&Value>) -> Option<String> {
    let bitrate = as_whole_number(value)?;

    let formatted = if bitrate < KBPS {
        format!("{} bps", bitrate as u64)
    } else if bitrate < MBPS {
        format!("{:.2} kbps", bitrate / KBPS)
    } else {
        format!("{:.2} Mbps", bitrate / MBPS)
    };
    Some(formatted)
}

/// Format a duration in seconds with two decimals (`"12.35 s"`).
pub fn format_duration(value: Option<&Value>) -> Option<String> {
    let seconds = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if !seconds.is_finite() {
        return None;
    }
    Some(format!("{:.2} s", seconds))
}

/// Normalize a `W:H` display aspect ratio to `R:1` with three decimals.
///
/// Input that is not of the `W:H` form, or that has a zero height, is
/// returned unchanged. Missing input and ffprobe's `"N/A"` yield `None`.
///
/// # Examples
///
/// ```
/// use mm_common::units::format_aspect_ratio;
///
/// assert_eq!(format_aspect_ratio(Some("256:135")).as_deref(), Some("1.896:1"));
/// assert_eq!(format_aspect_ratio(Some("0:0")).as_deref(), Some("0:0"));
/// assert_eq!(format_aspect_ratio(Some("N/A")), None);
/// ```
pub fn format_aspect_ratio(ratio: Option<&str>) -> Option<String> {
    let ratio = ratio?;
    if ratio.is_empty() || ratio == "N/A" {
        return None;
    }

    let parsed = ratio.split_once(':').and_then(|(w, h)| {
        let w = w.trim().parse::<f64>().ok()?;
        let h = h.trim().parse::<f64>().ok()?;
        Some((w, h))
    });

    match parsed {
        Some((w, h)) if h != 0.0 && w.is_finite() && h.is_finite() => {
            Some(format!("{:.3}:1", w / h))
        }
        _ => Some(ratio.to_string()),
    }
}
