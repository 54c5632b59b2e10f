//! Generic object normalizer
//!
//! Converts the object graphs handed over by format readers into plain JSON
//! trees. Readers describe their output as [`ParsedValue`]; typed nodes that
//! are not simple data sit behind the [`ParsedObject`] capability trait.
//!
//! Dispatch order is fixed and must not be rearranged, since objects can
//! expose several capabilities at once:
//!
//! 1. mapping
//! 2. sequence
//! 3. byte buffer (lowercase hex)
//! 4. mob ID (canonical URN)
//! 5. object with a property bag (the bag is normalized, the rest dropped)
//! 6. track-like object (fixed-shape mapping)
//! 7. object with a uuid (its string form)
//! 8. anything else unchanged

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::warn;

use crate::mob_id::MobId;

/// Default nesting limit before a subtree is cut off
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Value produced by a format reader, prior to normalization
#[derive(Debug, Clone)]
pub enum ParsedValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Bytes(Vec<u8>),
    /// Ordered key/value pairs
    Map(Vec<(String, ParsedValue)>),
    Seq(Vec<ParsedValue>),
    MobId(MobId),
    /// Opaque typed node
    Object(Arc<dyn ParsedObject>),
}

/// Capabilities an opaque parsed object may expose
///
/// Every method except `class_name` defaults to "not supported".
pub trait ParsedObject: fmt::Debug + Send + Sync {
    /// Type name reported in track projections and as the last-resort rendering
    fn class_name(&self) -> &str;

    /// Generic property bag of the object
    fn property_bag(&self) -> Option<&ParsedValue> {
        None
    }

    /// Track projection, for media track nodes
    fn as_track(&self) -> Option<TrackView<'_>> {
        None
    }

    /// Stable unique identifier of the object
    fn uuid(&self) -> Option<String> {
        None
    }
}

/// Borrowed view of a track-like object
#[derive(Debug, Clone, Copy)]
pub struct TrackView<'a> {
    pub media_kind: Option<&'a str>,
    pub length: Option<i64>,
    pub index: Option<i64>,
    pub component: &'a ParsedValue,
}

/// Normalizer with a configurable nesting limit
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    max_depth: usize,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subtrees nested deeper than `max_depth` normalize to `null`
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Convert a parsed value into a JSON-safe tree
    pub fn normalize(&self, value: &ParsedValue) -> Value {
        self.walk(value, 0)
    }

    fn walk(&self, value: &ParsedValue, depth: usize) -> Value {
        if depth > self.max_depth {
            warn!(
                max_depth = self.max_depth,
                "Parsed object graph exceeds nesting limit, subtree dropped"
            );
            return Value::Null;
        }

        match value {
            ParsedValue::Map(entries) => {
                let mut map = Map::with_capacity(entries.len());
                for (key, v) in entries {
                    map.insert(key.clone(), self.walk(v, depth + 1));
                }
                Value::Object(map)
            }
            ParsedValue::Seq(items) => {
                Value::Array(items.iter().map(|v| self.walk(v, depth + 1)).collect())
            }
            ParsedValue::Bytes(bytes) => Value::String(hex::encode(bytes)),
            ParsedValue::MobId(id) => Value::String(id.to_string()),
            ParsedValue::Object(obj) => self.walk_object(obj.as_ref(), depth),
            ParsedValue::Null => Value::Null,
            ParsedValue::Bool(b) => Value::Bool(*b),
            ParsedValue::Number(n) => Value::Number(n.clone()),
            ParsedValue::String(s) => Value::String(s.clone()),
        }
    }

    fn walk_object(&self, obj: &dyn ParsedObject, depth: usize) -> Value {
        if let Some(bag) = obj.property_bag() {
            return self.walk(bag, depth + 1);
        }

        if let Some(track) = obj.as_track() {
            let mut map = Map::new();
            map.insert("class".into(), Value::String(obj.class_name().to_string()));
            map.insert(
                "media_kind".into(),
                track
                    .media_kind
                    .map(|k| Value::String(k.to_string()))
                    .unwrap_or(Value::Null),
            );
            map.insert("length".into(), track.length.map(Value::from).unwrap_or(Value::Null));
            map.insert("index".into(), track.index.map(Value::from).unwrap_or(Value::Null));
            map.insert("component".into(), self.walk(track.component, depth + 1));
            return Value::Object(map);
        }

        if let Some(uuid) = obj.uuid() {
            return Value::String(uuid);
        }

        Value::String(obj.class_name().to_string())
    }
}

/// Normalize with the default nesting limit
pub fn normalize(value: &ParsedValue) -> Value {
    Normalizer::default().normalize(value)
}

impl From<Value> for ParsedValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ParsedValue::Null,
            Value::Bool(b) => ParsedValue::Bool(b),
            Value::Number(n) => ParsedValue::Number(n),
            Value::String(s) => ParsedValue::String(s),
            Value::Array(items) => ParsedValue::Seq(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                ParsedValue::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<&str> for ParsedValue {
    fn from(s: &str) -> Self {
        ParsedValue::String(s.to_string())
    }
}

impl From<i64> for ParsedValue {
    fn from(n: i64) -> Self {
        ParsedValue::Number(n.into())
    }
}
