//! Tagged value tree held by a [`StateContainer`](crate::StateContainer).

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use trellis_config::log_state_debug;

use crate::error::{PathError, PathErrorKind};
use crate::path::KeyPath;

type Step<T> = std::result::Result<T, PathErrorKind>;

/// Leaf value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Scalar {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    pub fn kind(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "bool",
            Scalar::Int(_) => "int",
            Scalar::Float(_) => "float",
            Scalar::Str(_) => "string",
        }
    }

    /// Floating point view used when writing into a float slot.
    pub fn to_float(&self) -> Option<f64> {
        match self {
            Scalar::Null => None,
            Scalar::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Str(s) => s.trim().parse().ok(),
        }
    }
}

/// Fixed set of named fields. Paths can read and overwrite fields but never
/// add or remove them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field declaration.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.get_mut(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_fields(self) -> IndexMap<String, Value> {
        self.fields
    }

    fn overlay_entries(&mut self, entries: IndexMap<String, Value>) {
        for (name, incoming) in entries {
            match self.fields.get_mut(&name) {
                Some(slot) => slot.overlay(incoming),
                None => log_state_debug!("Ignoring unknown record field", field = name.as_str()),
            }
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A node of the state tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Record(Record),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
    Scalar(Scalar),
}

impl Default for Value {
    fn default() -> Self {
        Value::Scalar(Scalar::Null)
    }
}

impl Value {
    pub fn null() -> Self {
        Value::Scalar(Scalar::Null)
    }

    /// Map from `(key, value)` pairs, preserving order.
    pub fn map<K: Into<String>, V: Into<Value>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Record(_) => "record",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Scalar(s) => s.kind(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Scalar(Scalar::Null))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Scalar(Scalar::Float(f)) => Some(*f),
            Value::Scalar(Scalar::Int(i)) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Scalar(Scalar::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(Scalar::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    fn is_record(&self) -> bool {
        matches!(self, Value::Record(_))
    }

    fn is_float(&self) -> bool {
        matches!(self, Value::Scalar(Scalar::Float(_)))
    }

    /// One step down the tree.
    pub fn child(&self, segment: &str) -> Step<&Value> {
        match self {
            Value::List(items) => Ok(&items[list_index(segment, items.len())?]),
            Value::Map(entries) => entries
                .get(segment)
                .ok_or_else(|| PathErrorKind::MissingKey(segment.to_string())),
            Value::Record(record) => record
                .field(segment)
                .ok_or_else(|| PathErrorKind::MissingKey(segment.to_string())),
            Value::Scalar(s) => Err(PathErrorKind::NotAContainer(s.kind())),
        }
    }

    pub fn child_mut(&mut self, segment: &str) -> Step<&mut Value> {
        match self {
            Value::List(items) => {
                let index = list_index(segment, items.len())?;
                Ok(&mut items[index])
            }
            Value::Map(entries) => entries
                .get_mut(segment)
                .ok_or_else(|| PathErrorKind::MissingKey(segment.to_string())),
            Value::Record(record) => record
                .field_mut(segment)
                .ok_or_else(|| PathErrorKind::MissingKey(segment.to_string())),
            Value::Scalar(s) => Err(PathErrorKind::NotAContainer(s.kind())),
        }
    }

    pub fn resolve(&self, path: &KeyPath) -> Result<&Value, PathError> {
        let mut node = self;
        for segment in path.segments() {
            node = node
                .child(segment)
                .map_err(|kind| PathError::new(path.as_str(), kind))?;
        }
        Ok(node)
    }

    pub fn resolve_mut(&mut self, path: &KeyPath) -> Result<&mut Value, PathError> {
        let mut node = self;
        for segment in path.segments() {
            node = node
                .child_mut(segment)
                .map_err(|kind| PathError::new(path.as_str(), kind))?;
        }
        Ok(node)
    }

    /// Write `value` into the slot at `path`.
    ///
    /// The slot must already exist: a missing map key or record field is
    /// `MissingKey`, the same as for `get`. Float slots stay floats. The empty
    /// path replaces the root.
    pub fn assign(&mut self, path: &KeyPath, value: Value) -> Result<(), PathError> {
        let err = |kind| PathError::new(path.as_str(), kind);

        let Some((parents, last)) = path.split_last() else {
            return self.store(value).map_err(err);
        };

        let mut node = self;
        for segment in parents {
            node = node.child_mut(segment).map_err(err)?;
        }

        let slot = node.child_mut(last).map_err(err)?;
        slot.store(value).map_err(err)
    }

    /// Append to the list at `path`.
    pub fn push_at(&mut self, path: &KeyPath, value: Value) -> Result<(), PathError> {
        match self.resolve_mut(path)? {
            Value::List(items) => {
                items.push(value);
                Ok(())
            }
            other => Err(PathError::new(
                path.as_str(),
                PathErrorKind::NotAList(other.kind()),
            )),
        }
    }

    /// Replace `list[index]`, or append when `index` equals the length.
    pub fn put_at(&mut self, path: &KeyPath, index: usize, value: Value) -> Result<(), PathError> {
        match self.resolve_mut(path)? {
            Value::List(items) if index < items.len() => {
                items[index] = value;
                Ok(())
            }
            Value::List(items) if index == items.len() => {
                items.push(value);
                Ok(())
            }
            Value::List(items) => Err(PathError::new(
                path.as_str(),
                PathErrorKind::IndexOutOfRange {
                    index: index as i64,
                    len: items.len(),
                },
            )),
            other => Err(PathError::new(
                path.as_str(),
                PathErrorKind::NotAList(other.kind()),
            )),
        }
    }

    /// Remove the list element or map entry at `path` and return it.
    pub fn remove_at(&mut self, path: &KeyPath) -> Result<Value, PathError> {
        let err = |kind| PathError::new(path.as_str(), kind);
        let (parents, last) = path.split_last().ok_or_else(|| err(PathErrorKind::Root))?;

        let mut node = self;
        for segment in parents {
            node = node.child_mut(segment).map_err(err)?;
        }

        match node {
            Value::List(items) => {
                let index = list_index(last, items.len()).map_err(err)?;
                Ok(items.remove(index))
            }
            Value::Map(entries) => entries
                .shift_remove(last)
                .ok_or_else(|| err(PathErrorKind::MissingKey(last.to_string()))),
            Value::Record(_) => Err(err(PathErrorKind::FixedRecord)),
            Value::Scalar(s) => Err(err(PathErrorKind::NotAContainer(s.kind()))),
        }
    }

    /// Overwrite this slot, keeping float slots floating point.
    fn store(&mut self, value: Value) -> Step<()> {
        if self.is_float() {
            let coerced = match &value {
                Value::Scalar(s) => s.to_float(),
                _ => None,
            };
            return match coerced {
                Some(f) => {
                    *self = Value::Scalar(Scalar::Float(f));
                    Ok(())
                }
                None => Err(PathErrorKind::Coercion(value.kind())),
            };
        }
        *self = value;
        Ok(())
    }

    /// Lay a loaded document over this tree.
    ///
    /// Records keep their own field set and take matching entries from an
    /// incoming map or record; float slots take anything convertible to a
    /// float (or null). Everything else is replaced.
    pub fn overlay(&mut self, incoming: Value) {
        match incoming {
            Value::Map(entries) if self.is_record() => {
                if let Value::Record(record) = self {
                    record.overlay_entries(entries);
                }
            }
            Value::Record(other) if self.is_record() => {
                if let Value::Record(record) = self {
                    record.overlay_entries(other.into_fields());
                }
            }
            Value::Scalar(scalar) if self.is_float() => match scalar.to_float() {
                Some(f) => *self = Value::Scalar(Scalar::Float(f)),
                None if scalar == Scalar::Null => *self = Value::null(),
                None => log_state_debug!("Keeping float slot", incoming = scalar.kind()),
            },
            other => *self = other,
        }
    }
}

fn list_index(segment: &str, len: usize) -> Step<usize> {
    let raw: i64 = segment
        .trim()
        .parse()
        .map_err(|_| PathErrorKind::NotAnIndex(segment.to_string()))?;
    let resolved = if raw < 0 { raw + len as i64 } else { raw };
    if resolved < 0 || resolved >= len as i64 {
        return Err(PathErrorKind::IndexOutOfRange { index: raw, len });
    }
    Ok(resolved as usize)
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Scalar(Scalar::Float(f))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Scalar(Scalar::Int(i))
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Scalar(Scalar::Int(i.into()))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Scalar(Scalar::Int(i.into()))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(Scalar::Bool(b))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(Scalar::Str(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(Scalar::Str(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(entries: IndexMap<String, Value>) -> Self {
        Value::Map(entries)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::null(),
            Json::Bool(b) => b.into(),
            Json::Number(n) => match n.as_i64() {
                Some(i) => i.into(),
                None => n.as_f64().map(Value::from).unwrap_or_default(),
            },
            Json::String(s) => s.into(),
            Json::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Json::Object(entries) => Value::map(entries.into_iter().map(|(k, v)| (k, Value::from(v)))),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Null => serializer.serialize_unit(),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Int(i) => serializer.serialize_i64(*i),
            Scalar::Float(f) => serializer.serialize_f64(*f),
            Scalar::Str(s) => serializer.serialize_str(s),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Record(record) => serializer.collect_map(record.fields()),
            Value::Map(entries) => serializer.collect_map(entries),
            Value::List(items) => serializer.collect_seq(items),
            Value::Scalar(s) => s.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}
