use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Capabilities an opaque template value may expose.
///
/// The canonicalizer probes these in a fixed order: [`serialize`],
/// then [`qualified_name`], then [`describe`].
///
/// [`serialize`]: TemplateObject::serialize
/// [`qualified_name`]: TemplateObject::qualified_name
/// [`describe`]: TemplateObject::describe
pub trait TemplateObject: fmt::Debug + Send + Sync {
    /// Value-specific serialized form, if the value provides one.
    fn serialize(&self) -> Option<String> {
        None
    }

    /// Fully qualified name when the value is callable; `None` otherwise.
    fn qualified_name(&self, _include_module: bool) -> Option<String> {
        None
    }

    /// Generic string conversion.
    fn describe(&self) -> String;
}

/// Reference to a callable, identified by its module and qualified name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallableRef {
    /// Dotted module path (e.g. `tasks.transforms`).
    pub module: Option<String>,
    /// Qualified name within the module (e.g. `Loader.run`).
    pub name: String,
}

impl CallableRef {
    /// Creates a callable reference.
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: Some(module.into()),
            name: name.into(),
        }
    }

    /// Creates a callable reference without a module.
    pub fn unqualified(name: impl Into<String>) -> Self {
        Self {
            module: None,
            name: name.into(),
        }
    }
}

impl TemplateObject for CallableRef {
    fn qualified_name(&self, include_module: bool) -> Option<String> {
        match (&self.module, include_module) {
            (Some(module), true) => Some(format!("{}.{}", module, self.name)),
            _ => Some(self.name.clone()),
        }
    }

    fn describe(&self) -> String {
        format!("<function {}>", self.name)
    }
}

/// Arbitrary runtime value handed to the canonicalizer.
#[derive(Debug, Clone)]
pub enum TemplateValue {
    /// Absent value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Finite JSON number.
    Number(Number),
    /// Raw float; NaN and infinities are not JSON-safe.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Ordered, variable-length sequence.
    Sequence(Vec<TemplateValue>),
    /// Fixed-arity ordered sequence; rendered as a sequence.
    Tuple(Vec<TemplateValue>),
    /// String-keyed mapping in insertion order.
    Mapping(TemplateMap),
    /// Opaque value probed through [`TemplateObject`].
    Object(Arc<dyn TemplateObject>),
}

impl TemplateValue {
    /// Wraps an opaque object.
    pub fn object(object: impl TemplateObject + 'static) -> Self {
        TemplateValue::Object(Arc::new(object))
    }

    /// Builds a mapping from key/value pairs, keeping their order. A repeated
    /// key keeps its first position and takes the last value.
    pub fn mapping<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, TemplateValue)>,
    {
        TemplateValue::Mapping(entries.into_iter().collect())
    }

    /// Whether the value counts as empty: null, false, zero, or an empty
    /// string, sequence, tuple or mapping.
    pub fn is_falsy(&self) -> bool {
        match self {
            TemplateValue::Null => true,
            TemplateValue::Bool(b) => !b,
            TemplateValue::Number(n) => n.as_f64() == Some(0.0),
            TemplateValue::Float(f) => *f == 0.0,
            TemplateValue::String(s) => s.is_empty(),
            TemplateValue::Sequence(items) | TemplateValue::Tuple(items) => items.is_empty(),
            TemplateValue::Mapping(map) => map.is_empty(),
            TemplateValue::Object(_) => false,
        }
    }

    /// Whether the value is a tuple.
    pub fn is_tuple(&self) -> bool {
        matches!(self, TemplateValue::Tuple(_))
    }

    /// Recursively replaces every tuple with a sequence.
    pub fn tuples_to_sequences(self) -> Self {
        match self {
            TemplateValue::Tuple(items) | TemplateValue::Sequence(items) => TemplateValue::Sequence(
                items
                    .into_iter()
                    .map(TemplateValue::tuples_to_sequences)
                    .collect(),
            ),
            TemplateValue::Mapping(map) => {
                TemplateValue::Mapping(map.map_values(TemplateValue::tuples_to_sequences))
            }
            other => other,
        }
    }

    /// Recursively sorts mapping keys, including mappings nested in
    /// sequences and tuples.
    pub fn sort_keys(self) -> Self {
        match self {
            TemplateValue::Mapping(map) => {
                TemplateValue::Mapping(map.map_values(TemplateValue::sort_keys).sorted())
            }
            TemplateValue::Sequence(items) => {
                TemplateValue::Sequence(items.into_iter().map(TemplateValue::sort_keys).collect())
            }
            TemplateValue::Tuple(items) => {
                TemplateValue::Tuple(items.into_iter().map(TemplateValue::sort_keys).collect())
            }
            other => other,
        }
    }

    /// Converts to a JSON value, or `None` if anything inside is not JSON-safe
    /// (opaque objects, NaN and infinities).
    ///
    /// Tuples become arrays. Mapping order is preserved.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            TemplateValue::Null => Some(Value::Null),
            TemplateValue::Bool(b) => Some(Value::Bool(*b)),
            TemplateValue::Number(n) => Some(Value::Number(n.clone())),
            TemplateValue::Float(f) => Number::from_f64(*f).map(Value::Number),
            TemplateValue::String(s) => Some(Value::String(s.clone())),
            TemplateValue::Sequence(items) | TemplateValue::Tuple(items) => items
                .iter()
                .map(TemplateValue::to_json)
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            TemplateValue::Mapping(entries) => {
                let mut map = Map::with_capacity(entries.len());
                for (key, value) in entries.iter() {
                    map.insert(key.to_string(), value.to_json()?);
                }
                Some(Value::Object(map))
            }
            TemplateValue::Object(_) => None,
        }
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateValue::String(s) => f.write_str(&quote_json(s)),
            other => fmt::Display::fmt(other, f),
        }
    }
}

/// Renders the value for display. Strings render raw at the top level and
/// JSON-quoted when nested; mapping keys are emitted in sorted order so the
/// text is independent of insertion order.
impl fmt::Display for TemplateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateValue::Null => f.write_str("null"),
            TemplateValue::Bool(b) => write!(f, "{}", b),
            TemplateValue::Number(n) => write!(f, "{}", n),
            TemplateValue::Float(v) if v.is_nan() => f.write_str("NaN"),
            TemplateValue::Float(v) if v.is_infinite() => {
                f.write_str(if *v > 0.0 { "Infinity" } else { "-Infinity" })
            }
            TemplateValue::Float(v) => write!(f, "{:?}", v),
            TemplateValue::String(s) => f.write_str(s),
            TemplateValue::Sequence(items) | TemplateValue::Tuple(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    item.fmt_nested(f)?;
                }
                f.write_str("]")
            }
            TemplateValue::Mapping(map) => {
                let mut sorted: Vec<(&str, &TemplateValue)> = map.iter().collect();
                sorted.sort_by(|a, b| a.0.cmp(b.0));
                f.write_str("{")?;
                for (idx, (key, value)) in sorted.into_iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: ", quote_json(key))?;
                    value.fmt_nested(f)?;
                }
                f.write_str("}")
            }
            TemplateValue::Object(object) => f.write_str(&describe_object(object.as_ref())),
        }
    }
}

/// String-keyed mapping that keeps insertion order.
///
/// Keys are unique: inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default)]
pub struct TemplateMap {
    entries: Vec<(String, TemplateValue)>,
    index: HashMap<String, usize>,
}

impl TemplateMap {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the one it replaced.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: TemplateValue,
    ) -> Option<TemplateValue> {
        let key = key.into();
        match self.index.get(&key) {
            Some(&idx) => Some(std::mem::replace(&mut self.entries[idx].1, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&TemplateValue> {
        self.index.get(key).map(|&idx| &self.entries[idx].1)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the mapping has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TemplateValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn map_values(mut self, f: impl Fn(TemplateValue) -> TemplateValue) -> Self {
        self.entries = self.entries.into_iter().map(|(k, v)| (k, f(v))).collect();
        self
    }

    fn sorted(mut self) -> Self {
        self.entries.sort_by(|a, b| a.0.cmp(&b.0));
        for (idx, (key, _)) in self.entries.iter().enumerate() {
            self.index.insert(key.clone(), idx);
        }
        self
    }
}

impl<K: Into<String>> FromIterator<(K, TemplateValue)> for TemplateMap {
    fn from_iter<I: IntoIterator<Item = (K, TemplateValue)>>(iter: I) -> Self {
        let mut map = TemplateMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for TemplateMap {
    type Item = (String, TemplateValue);
    type IntoIter = std::vec::IntoIter<(String, TemplateValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Runs the capability probe on an opaque object: value-specific
/// serialization, then callable naming, then the generic description.
pub(crate) fn describe_object(object: &dyn TemplateObject) -> String {
    object
        .serialize()
        .or_else(|| {
            object
                .qualified_name(true)
                .map(|name| format!("<callable {}>", name))
        })
        .unwrap_or_else(|| object.describe())
}

fn quote_json(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

impl From<Value> for TemplateValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => TemplateValue::Null,
            Value::Bool(b) => TemplateValue::Bool(b),
            Value::Number(n) => TemplateValue::Number(n),
            Value::String(s) => TemplateValue::String(s),
            Value::Array(items) => {
                TemplateValue::Sequence(items.into_iter().map(TemplateValue::from).collect())
            }
            Value::Object(map) => TemplateValue::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, TemplateValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for TemplateValue {
    fn from(value: &str) -> Self {
        TemplateValue::String(value.to_string())
    }
}

impl From<String> for TemplateValue {
    fn from(value: String) -> Self {
        TemplateValue::String(value)
    }
}

impl From<bool> for TemplateValue {
    fn from(value: bool) -> Self {
        TemplateValue::Bool(value)
    }
}

impl From<i64> for TemplateValue {
    fn from(value: i64) -> Self {
        TemplateValue::Number(Number::from(value))
    }
}

impl From<f64> for TemplateValue {
    fn from(value: f64) -> Self {
        TemplateValue::Float(value)
    }
}

impl<T: Into<TemplateValue>> From<Vec<T>> for TemplateValue {
    fn from(items: Vec<T>) -> Self {
        TemplateValue::Sequence(items.into_iter().map(Into::into).collect())
    }
}
