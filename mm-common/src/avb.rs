//! AVB bin summaries
//!
//! Bins are opened by an external dumper (see [`crate::tool::AVB_DUMP`])
//! invoked as `avb-dump <path>`. No Rust reader exists for the AVB format, so
//! the dumper is supplied by the deployment, typically a short Python script
//! around the pyavb library: `avb.open(path)`, then walk `f.content.mobs`
//! and print each mob's `name`, `mob_id` and property data. Without it the
//! AVB endpoints answer `TOOL_MISSING` with the install hint.
//!
//! The dumper prints the bin's mobs as tagged JSON:
//!
//! ```json
//! {"mobs": [{"name": "A001C002", "mob_id": "urn:smpte:umid:...", "properties": { ... }}]}
//! ```
//!
//! Inside `properties`, objects carrying a `$`-prefixed tag describe typed
//! nodes:
//!
//! | Tag | Decoded as |
//! |---|---|
//! | `{"$bytes": "00ff"}` | byte buffer |
//! | `{"$mob_id": "urn:smpte:umid:..."}` | mob ID |
//! | `{"$class": "...", "property_data": {...}}` | object with a property bag |
//! | `{"$class": "Track", "media_kind": ..., "length": ..., "index": ..., "component": ...}` | track |
//! | `{"$class": "...", "uuid": "..."}` | identified object |
//! | `{"$class": "..."}` | opaque object |
//!
//! Any other JSON is decoded structurally.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::mob_id::MobId;
use crate::normalize::{Normalizer, ParsedObject, ParsedValue, TrackView};
use crate::table::ExportTable;
use crate::tool::ExternalTool;
use crate::{Error, Result};

/// CSV header of the mob export
pub const MOB_CSV_HEADER: [&str; 2] = ["Name", "Mob ID"];

/// One mob of a bin
#[derive(Debug, Clone)]
pub struct Mob {
    pub name: Option<String>,
    pub mob_id: MobId,
    pub properties: ParsedValue,
}

/// Parsed bin content
#[derive(Debug, Clone, Default)]
pub struct AvbDocument {
    pub mobs: Vec<Mob>,
}

impl AvbDocument {
    /// Whole document as a parsed tree, used for `raw_data`
    pub fn to_parsed(&self) -> ParsedValue {
        ParsedValue::Map(vec![(
            "mobs".into(),
            ParsedValue::Seq(self.mobs.iter().map(Mob::to_parsed).collect()),
        )])
    }
}

impl Mob {
    fn to_parsed(&self) -> ParsedValue {
        ParsedValue::Map(vec![
            (
                "name".into(),
                self.name
                    .as_deref()
                    .map(ParsedValue::from)
                    .unwrap_or(ParsedValue::Null),
            ),
            ("mob_id".into(), ParsedValue::MobId(self.mob_id)),
            ("properties".into(), self.properties.clone()),
        ])
    }
}

/// Source of parsed bins
#[async_trait]
pub trait BinReader: Send + Sync {
    async fn read_bin(&self, path: &Path) -> Result<AvbDocument>;
}

/// Bin reader backed by the external dumper executable
#[derive(Debug, Clone)]
pub struct ExternalBinReader {
    tool: ExternalTool,
}

impl ExternalBinReader {
    pub fn new(tool: ExternalTool) -> Self {
        Self { tool }
    }
}

#[async_trait]
impl BinReader for ExternalBinReader {
    async fn read_bin(&self, path: &Path) -> Result<AvbDocument> {
        let stdout = self.tool.run([path.as_os_str()]).await?;
        let dump: Value = serde_json::from_slice(&stdout)?;
        let document = decode_document(&dump)?;
        info!(file = %path.display(), mobs = document.mobs.len(), "Bin dump decoded");
        Ok(document)
    }
}

/// Decode the dumper's JSON document
pub fn decode_document(dump: &Value) -> Result<AvbDocument> {
    let mobs = dump
        .get("mobs")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Parse("bin dump has no 'mobs' list".into()))?;

    let mobs = mobs
        .iter()
        .enumerate()
        .map(|(i, mob)| decode_mob(mob).map_err(|e| Error::Parse(format!("mob {}: {}", i, e))))
        .collect::<Result<Vec<_>>>()?;

    Ok(AvbDocument { mobs })
}

fn decode_mob(mob: &Value) -> Result<Mob> {
    let name = match mob.get("name") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    };

    let mob_id: MobId = match mob.get("mob_id") {
        Some(Value::String(s)) => s.parse()?,
        Some(Value::Object(tagged)) => match tagged.get("$mob_id").and_then(Value::as_str) {
            Some(s) => s.parse()?,
            None => return Err(Error::Parse("mob_id object lacks '$mob_id'".into())),
        },
        _ => return Err(Error::Parse("missing mob_id".into())),
    };

    let properties = match mob.get("properties") {
        Some(value) => decode_tagged(value)?,
        None => ParsedValue::Null,
    };

    Ok(Mob {
        name,
        mob_id,
        properties,
    })
}

/// Decode one tagged JSON value into a parsed tree
pub fn decode_tagged(value: &Value) -> Result<ParsedValue> {
    match value {
        Value::Array(items) => Ok(ParsedValue::Seq(
            items.iter().map(decode_tagged).collect::<Result<_>>()?,
        )),
        Value::Object(map) => decode_object(map),
        scalar => Ok(ParsedValue::from(scalar.clone())),
    }
}

fn decode_object(map: &Map<String, Value>) -> Result<ParsedValue> {
    if let Some(hex_text) = map.get("$bytes").and_then(Value::as_str) {
        let bytes = hex::decode(hex_text)
            .map_err(|e| Error::Parse(format!("invalid $bytes value: {}", e)))?;
        return Ok(ParsedValue::Bytes(bytes));
    }

    if let Some(id) = map.get("$mob_id").and_then(Value::as_str) {
        return Ok(ParsedValue::MobId(id.parse()?));
    }

    if let Some(class) = map.get("$class").and_then(Value::as_str) {
        return Ok(ParsedValue::Object(Arc::new(DumpedObject::decode(class, map)?)));
    }

    let entries = map
        .iter()
        .map(|(k, v)| Ok((k.clone(), decode_tagged(v)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(ParsedValue::Map(entries))
}

#[derive(Debug)]
struct DumpedTrack {
    media_kind: Option<String>,
    length: Option<i64>,
    index: Option<i64>,
    component: ParsedValue,
}

/// Typed node from the dumper
#[derive(Debug)]
struct DumpedObject {
    class: String,
    property_data: Option<ParsedValue>,
    track: Option<DumpedTrack>,
    uuid: Option<String>,
}

impl DumpedObject {
    fn decode(class: &str, map: &Map<String, Value>) -> Result<Self> {
        let property_data = map.get("property_data").map(decode_tagged).transpose()?;

        let track = if map.contains_key("media_kind") || map.contains_key("component") {
            Some(DumpedTrack {
                media_kind: map.get("media_kind").and_then(Value::as_str).map(str::to_string),
                length: map.get("length").and_then(Value::as_i64),
                index: map.get("index").and_then(Value::as_i64),
                component: map
                    .get("component")
                    .map(decode_tagged)
                    .transpose()?
                    .unwrap_or(ParsedValue::Null),
            })
        } else {
            None
        };

        let uuid = match map.get("uuid") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        };

        Ok(Self {
            class: class.to_string(),
            property_data,
            track,
            uuid,
        })
    }
}

impl ParsedObject for DumpedObject {
    fn class_name(&self) -> &str {
        &self.class
    }

    fn property_bag(&self) -> Option<&ParsedValue> {
        self.property_data.as_ref()
    }

    fn as_track(&self) -> Option<TrackView<'_>> {
        self.track.as_ref().map(|t| TrackView {
            media_kind: t.media_kind.as_deref(),
            length: t.length,
            index: t.index,
            component: &t.component,
        })
    }

    fn uuid(&self) -> Option<String> {
        self.uuid.clone()
    }
}

/// JSON view of a bin
#[derive(Debug, Clone, Serialize)]
pub struct AvbSummary {
    pub summary: Map<String, Value>,
    pub mobs: Vec<Value>,
    pub raw_data: Value,
}

/// Build the JSON view: summary, one entry per mob, normalized document
pub fn summarize(file_name: &str, document: &AvbDocument, normalizer: &Normalizer) -> AvbSummary {
    let mut summary = Map::new();
    summary.insert("File Name".into(), Value::String(file_name.to_string()));
    summary.insert("Mob Count".into(), Value::from(document.mobs.len()));

    let mobs = document
        .mobs
        .iter()
        .map(|mob| {
            let mut entry = Map::new();
            entry.insert(
                "Name".into(),
                mob.name.clone().map(Value::String).unwrap_or(Value::Null),
            );
            entry.insert("Mob ID".into(), Value::String(mob.mob_id.to_string()));
            entry.insert("details".into(), normalizer.normalize(&mob.properties));
            Value::Object(entry)
        })
        .collect();

    AvbSummary {
        summary,
        mobs,
        raw_data: normalizer.normalize(&document.to_parsed()),
    }
}

/// Name / Mob ID table, one row per mob in bin order
pub fn mob_table(document: &AvbDocument) -> ExportTable {
    let mut table = ExportTable::new(MOB_CSV_HEADER);
    for mob in &document.mobs {
        table.push_row(vec![mob.name.clone(), Some(mob.mob_id.to_string())]);
    }
    table
}
