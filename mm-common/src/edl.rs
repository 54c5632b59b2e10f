//! CMX 3600 edit decision lists
//!
//! Reads the event list of a CMX 3600 EDL and exports it as a nine-column
//! table. Event lines look like:
//!
//! ```text
//! 001  A001C002 V     C        01:00:00:00 01:00:05:00 00:00:00:00 00:00:05:00
//! 002  A001C003 V     D    024 01:00:10:00 01:00:15:00 00:00:05:00 00:00:10:00
//! * FROM CLIP NAME: A001C003_Shot_02
//! ```
//!
//! Comment lines (`*`) and motion lines (`M2`) belong to the event above them.

use serde::Serialize;
use tracing::debug;

use crate::table::ExportTable;
use crate::text::{decode_text, normalize_line_endings};
use crate::{Error, Result};

/// Comment prefix carrying the source clip name
pub const CLIP_NAME_MARKER: &str = "* FROM CLIP NAME:";

/// Header of the event export
pub const EVENT_CSV_HEADER: [&str; 9] = [
    "Event",
    "Reel",
    "Track",
    "Trn",
    "Src TC In",
    "Src TC Out",
    "Rec TC In",
    "Rec TC Out",
    "Clip Name",
];

/// Non-cut transition of an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    /// Transition code as written in the EDL (`D`, `W001`, `K`, ...)
    pub kind: String,
    /// Duration in frames, when given
    pub duration: Option<u32>,
}

/// One event line plus the comments attached to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdlEvent {
    pub number: String,
    pub reel: String,
    pub track: String,
    pub transition: Option<Transition>,
    pub src_in: String,
    pub src_out: String,
    pub rec_in: String,
    pub rec_out: String,
    pub comments: Vec<String>,
}

impl EdlEvent {
    /// Clip name from the first `* FROM CLIP NAME:` comment
    pub fn clip_name(&self) -> Option<String> {
        self.comments
            .iter()
            .find(|c| c.starts_with(CLIP_NAME_MARKER))
            .and_then(|c| c.split_once(':'))
            .map(|(_, rest)| rest.trim().to_string())
    }

    /// Transition column value, `C` for a cut
    pub fn transition_code(&self) -> &str {
        self.transition
            .as_ref()
            .map(|t| t.kind.as_str())
            .unwrap_or("C")
    }
}

/// Parsed EDL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EdlDocument {
    pub title: Option<String>,
    /// `FCM:` value (`DROP FRAME` / `NON-DROP FRAME`)
    pub frame_code_mode: Option<String>,
    pub events: Vec<EdlEvent>,
}

impl EdlDocument {
    /// Parse EDL bytes (UTF-8, Latin-1 fallback, CR-only line endings accepted)
    pub fn parse_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes = normalize_line_endings(bytes);
        Self::parse(&decode_text(&bytes))
    }

    /// Parse EDL text
    pub fn parse(input: &str) -> Result<Self> {
        let mut doc = EdlDocument::default();

        for (line_idx, raw_line) in input.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(rest) = line.strip_prefix("TITLE:") {
                doc.title = Some(rest.trim().to_string());
                continue;
            }

            if let Some(rest) = line.strip_prefix("FCM:") {
                doc.frame_code_mode = Some(rest.trim().to_string());
                continue;
            }

            if line.starts_with('*') || line.starts_with("M2") {
                if let Some(event) = doc.events.last_mut() {
                    event.comments.push(line.to_string());
                }
                continue;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.first().map_or(true, |t| t.parse::<u32>().is_err()) {
                debug!(line = line_idx + 1, "Skipping unrecognized EDL line");
                continue;
            }

            doc.events.push(parse_event(&tokens, line_idx + 1)?);
        }

        Ok(doc)
    }

    /// Event table with one row per event
    pub fn event_table(&self) -> ExportTable {
        let mut table = ExportTable::new(EVENT_CSV_HEADER);
        for event in &self.events {
            table.push_row(vec![
                Some(event.number.clone()),
                Some(event.reel.clone()),
                Some(event.track.clone()),
                Some(event.transition_code().to_string()),
                Some(event.src_in.clone()),
                Some(event.src_out.clone()),
                Some(event.rec_in.clone()),
                Some(event.rec_out.clone()),
                event.clip_name(),
            ]);
        }
        table
    }
}

/// Parse `NNN REEL TRACK TRN [DUR] SRC_IN SRC_OUT REC_IN REC_OUT`
fn parse_event(tokens: &[&str], line: usize) -> Result<EdlEvent> {
    let (transition, timecodes) = match tokens.len() {
        8 => (parse_transition(tokens[3], None, line)?, &tokens[4..8]),
        9 => (parse_transition(tokens[3], Some(tokens[4]), line)?, &tokens[5..9]),
        n => {
            return Err(Error::Parse(format!(
                "line {}: expected 8 or 9 fields in event, found {}",
                line, n
            )))
        }
    };

    for tc in timecodes {
        if !is_timecode(tc) {
            return Err(Error::Parse(format!(
                "line {}: invalid timecode '{}'",
                line, tc
            )));
        }
    }

    Ok(EdlEvent {
        number: tokens[0].to_string(),
        reel: tokens[1].to_string(),
        track: tokens[2].to_string(),
        transition,
        src_in: timecodes[0].to_string(),
        src_out: timecodes[1].to_string(),
        rec_in: timecodes[2].to_string(),
        rec_out: timecodes[3].to_string(),
        comments: Vec::new(),
    })
}

fn parse_transition(code: &str, duration: Option<&str>, line: usize) -> Result<Option<Transition>> {
    let duration = duration
        .map(|d| {
            d.parse::<u32>().map_err(|_| {
                Error::Parse(format!("line {}: invalid transition duration '{}'", line, d))
            })
        })
        .transpose()?;

    if code == "C" && duration.map_or(true, |d| d == 0) {
        return Ok(None);
    }

    Ok(Some(Transition {
        kind: code.to_string(),
        duration,
    }))
}

/// `HH:MM:SS:FF`, with `;` or `.` allowed before the frame field
fn is_timecode(tc: &str) -> bool {
    let bytes = tc.as_bytes();
    if bytes.len() != 11 {
        return false;
    }
    bytes.iter().enumerate().all(|(i, b)| match i {
        2 | 5 => *b == b':',
        8 => matches!(b, b':' | b';' | b'.'),
        _ => b.is_ascii_digit(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "TITLE: Reel 1 Conform\r\n\
FCM: NON-DROP FRAME\r\n\
\r\n\
001  A001C002 V     C        01:00:00:00 01:00:05:00 00:00:00:00 00:00:05:00\r\n\
* FROM CLIP NAME: Shot_01\r\n\
* SOURCE FILE: A001C002.mov\r\n\
\r\n\
002  A001C003 V     D    024 01:00:10:00 01:00:15:00 00:00:05:00 00:00:10:00\r\n\
M2   A001C003       048.0                01:00:10:00\r\n\
* COMMENT: no clip marker here\r\n\
* FROM CLIP NAME:   Shot_02  \r\n\
003  AX       A     C        00:00:00:00 00:00:02:12 00:00:10:00 00:00:12:12\r\n";

    #[test]
    fn test_parse_header_and_events() {
        let doc = EdlDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.title.as_deref(), Some("Reel 1 Conform"));
        assert_eq!(doc.frame_code_mode.as_deref(), Some("NON-DROP FRAME"));
        assert_eq!(doc.events.len(), 3);

        let second = &doc.events[1];
        assert_eq!(second.number, "002");
        assert_eq!(second.reel, "A001C003");
        assert_eq!(
            second.transition,
            Some(Transition {
                kind: "D".into(),
                duration: Some(24)
            })
        );
        assert_eq!(second.src_in, "01:00:10:00");
        assert_eq!(second.rec_out, "00:00:10:00");
        assert_eq!(second.comments.len(), 3);
    }

    #[test]
    fn test_clip_name_extraction() {
        let doc = EdlDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.events[0].clip_name().as_deref(), Some("Shot_01"));
        assert_eq!(doc.events[1].clip_name().as_deref(), Some("Shot_02"));
        assert_eq!(doc.events[2].clip_name(), None);
    }

    #[test]
    fn test_clip_marker_is_case_sensitive() {
        let event = EdlEvent {
            number: "001".into(),
            reel: "AX".into(),
            track: "V".into(),
            transition: None,
            src_in: "00:00:00:00".into(),
            src_out: "00:00:01:00".into(),
            rec_in: "00:00:00:00".into(),
            rec_out: "00:00:01:00".into(),
            comments: vec!["* from clip name: lower".into()],
        };
        assert_eq!(event.clip_name(), None);
    }

    #[test]
    fn test_event_table() {
        let doc = EdlDocument::parse(SAMPLE).unwrap();
        let table = doc.event_table();

        assert_eq!(table.header, EVENT_CSV_HEADER.to_vec());
        assert_eq!(table.row_count(), 3);

        let csv = table.to_csv();
        let lines: Vec<&str> = csv.split("\r\n").collect();
        assert_eq!(
            lines[0],
            "Event,Reel,Track,Trn,Src TC In,Src TC Out,Rec TC In,Rec TC Out,Clip Name"
        );
        assert_eq!(
            lines[1],
            "001,A001C002,V,C,01:00:00:00,01:00:05:00,00:00:00:00,00:00:05:00,Shot_01"
        );
        assert_eq!(
            lines[2],
            "002,A001C003,V,D,01:00:10:00,01:00:15:00,00:00:05:00,00:00:10:00,Shot_02"
        );
        assert_eq!(
            lines[3],
            "003,AX,A,C,00:00:00:00,00:00:02:12,00:00:10:00,00:00:12:12,"
        );
    }

    #[test]
    fn test_wipe_with_code() {
        let doc = EdlDocument::parse(
            "001  BL V W001 030 00:00:00:00 00:00:01:00 00:00:00:00 00:00:01:00\n",
        )
        .unwrap();
        assert_eq!(doc.events[0].transition_code(), "W001");
    }

    #[test]
    fn test_drop_frame_timecodes() {
        let doc = EdlDocument::parse(
            "001  AX V C 00:59:59;28 01:00:00;02 00:00:00;00 00:00:00;04\n",
        )
        .unwrap();
        assert_eq!(doc.events[0].src_in, "00:59:59;28");
    }

    #[test]
    fn test_invalid_timecode_is_error() {
        let err = EdlDocument::parse("001  AX V C 00:00:00 00:00:01:00 00:00:00:00 00:00:01:00\n")
            .unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_short_event_line_is_error() {
        assert!(EdlDocument::parse("001  AX V C 00:00:00:00\n").is_err());
    }

    #[test]
    fn test_latin1_comment() {
        let mut bytes = b"001  AX V C 00:00:00:00 00:00:01:00 00:00:00:00 00:00:01:00\n".to_vec();
        bytes.extend_from_slice(b"* FROM CLIP NAME: Caf\xe9\n");
        let doc = EdlDocument::parse_bytes(&bytes).unwrap();
        assert_eq!(doc.events[0].clip_name().as_deref(), Some("Café"));
    }

    #[test]
    fn test_comments_before_first_event_ignored() {
        let doc = EdlDocument::parse(
            "* FROM CLIP NAME: orphan\n001  AX V C 00:00:00:00 00:00:01:00 00:00:00:00 00:00:01:00\n",
        )
        .unwrap();
        assert_eq!(doc.events[0].clip_name(), None);
    }

    #[test]
    fn test_cr_only_line_endings() {
        let bytes = SAMPLE.replace("\r\n", "\r");
        let doc = EdlDocument::parse_bytes(bytes.as_bytes()).unwrap();
        assert_eq!(doc.title.as_deref(), Some("Reel 1 Conform"));
        assert_eq!(doc.events.len(), 3);
        assert_eq!(doc.events[1].clip_name().as_deref(), Some("Shot_02"));
    }
}
