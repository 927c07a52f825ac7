//! Option values and the ordered parameter store.
//!
//! Every option sent to the service lives in a [`ParameterStore`]. The store
//! keeps insertion order so that generated query strings are stable, but two
//! stores with the same entries compare equal regardless of order.

use bytes::Bytes;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::borrow::Cow;
use std::fmt;

/// A single option value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Raw content that is not valid UTF-8 (e.g. a legacy-encoded HTML file).
    Bytes(Bytes),
}

impl ParamValue {
    /// The value as it appears in a query string or form body, before
    /// URL-encoding. Booleans are rendered as `1` / `0`.
    pub fn as_form_bytes(&self) -> Cow<'_, [u8]> {
        match self {
            ParamValue::Text(s) => Cow::Borrowed(s.as_bytes()),
            ParamValue::Bytes(b) => Cow::Borrowed(b.as_ref()),
            ParamValue::Int(i) => Cow::Owned(i.to_string().into_bytes()),
            ParamValue::Float(f) => Cow::Owned(f.to_string().into_bytes()),
            ParamValue::Bool(true) => Cow::Borrowed(b"1"),
            ParamValue::Bool(false) => Cow::Borrowed(b"0"),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.as_form_bytes()))
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParamValue::Text(s) => serializer.serialize_str(s),
            ParamValue::Int(i) => serializer.serialize_i64(*i),
            ParamValue::Float(f) => serializer.serialize_f64(*f),
            ParamValue::Bool(b) => serializer.serialize_bool(*b),
            ParamValue::Bytes(b) => serializer.serialize_str(&String::from_utf8_lossy(b)),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl From<&String> for ParamValue {
    fn from(v: &String) -> Self {
        ParamValue::Text(v.clone())
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v.into())
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        ParamValue::Int(v.into())
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<Bytes> for ParamValue {
    fn from(v: Bytes) -> Self {
        ParamValue::Bytes(v)
    }
}

impl From<Vec<u8>> for ParamValue {
    /// UTF-8 content becomes [`ParamValue::Text`]; anything else stays raw.
    fn from(v: Vec<u8>) -> Self {
        match String::from_utf8(v) {
            Ok(s) => ParamValue::Text(s),
            Err(e) => ParamValue::Bytes(Bytes::from(e.into_bytes())),
        }
    }
}

/// Ordered mapping from option name to value.
///
/// `set` on an existing key overwrites the value in place, so the key keeps
/// its original position. There is no way to remove one key;
/// [`merge`](Self::merge) with `replace = true` is the only way to drop
/// entries.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    entries: Vec<(String, ParamValue)>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Combine `partial` into the store.
    ///
    /// With `replace = false` values from `partial` win on collision and all
    /// other existing keys are kept. With `replace = true` the store ends up
    /// holding exactly `partial`.
    pub fn merge<I, K, V>(&mut self, partial: I, replace: bool)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParamValue>,
    {
        if replace {
            self.entries.clear();
        }
        for (k, v) in partial {
            self.set(k, v);
        }
    }

    /// A copy of the full mapping.
    pub fn snapshot(&self) -> ParameterStore {
        self.clone()
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl PartialEq for ParameterStore {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V> FromIterator<(K, V)> for ParameterStore
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = ParameterStore::new();
        store.merge(iter, false);
        store
    }
}

impl IntoIterator for ParameterStore {
    type Item = (String, ParamValue);
    type IntoIter = std::vec::IntoIter<(String, ParamValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for ParameterStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_overwrites_in_place() {
        let mut store = ParameterStore::new();
        store.set("a", 1);
        store.set("b", "two");
        store.set("a", 3);
        assert_eq!(store.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(store.get("a"), Some(&ParamValue::Int(3)));
    }

    #[test]
    fn merge_without_replace_keeps_existing_keys() {
        let mut store = ParameterStore::new();
        store.merge([("a", 1)], false);
        store.merge([("a", 2), ("b", 3)], false);
        assert_eq!(store, ParameterStore::from_iter([("a", 2), ("b", 3)]));

        store.merge([("c", 4)], true);
        assert_eq!(store, ParameterStore::from_iter([("c", 4)]));
    }

    #[test]
    fn equality_ignores_order() {
        let left = ParameterStore::from_iter([("x", true), ("y", false)]);
        let right = ParameterStore::from_iter([("y", false), ("x", true)]);
        assert_eq!(left, right);
        assert_ne!(left, ParameterStore::from_iter([("x", true)]));
    }

    #[test]
    fn form_rendering() {
        assert_eq!(&*ParamValue::Bool(true).as_form_bytes(), b"1");
        assert_eq!(&*ParamValue::Bool(false).as_form_bytes(), b"0");
        assert_eq!(ParamValue::Int(42).to_string(), "42");
        assert_eq!(ParamValue::Float(1.5).to_string(), "1.5");
    }

    #[test]
    fn non_utf8_bytes_stay_raw() {
        let v = ParamValue::from(vec![0x3c, 0x68, 0xe9]);
        assert!(matches!(v, ParamValue::Bytes(_)));
        let v = ParamValue::from(b"<h1>".to_vec());
        assert_eq!(v, ParamValue::Text("<h1>".into()));
    }

    #[test]
    fn serializes_as_json_object() {
        let store = ParameterStore::from_iter([
            ("grayscale", ParamValue::Bool(true)),
            ("creator", ParamValue::from("someone")),
        ]);
        let json = serde_json::to_value(&store).unwrap();
        assert_eq!(json, serde_json::json!({"grayscale": true, "creator": "someone"}));
    }
}
