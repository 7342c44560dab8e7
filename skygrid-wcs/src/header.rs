//! Header keyword protocol.
//!
//! [`KeywordProvider`] abstracts over any FITS-like keyword source so
//! WCS decoding does not care where a header came from. [`KeywordMap`]
//! is the concrete insertion-ordered implementation used both for
//! tests and for re-emitting headers.

use std::collections::HashMap;

use crate::error::{WcsError, WcsResult};

/// A typed header value.
#[derive(Debug, Clone, PartialEq)]
pub enum KeywordValue {
    Float(f64),
    Int(i64),
    String(String),
}

/// Read access to header keywords.
///
/// Lookups are by exact keyword name. Numeric getters coerce between
/// integer and float values, as FITS writers are inconsistent about
/// which they emit.
pub trait KeywordProvider {
    fn value(&self, keyword: &str) -> Option<KeywordValue>;

    fn get_float(&self, keyword: &str) -> Option<f64> {
        match self.value(keyword)? {
            KeywordValue::Float(f) => Some(f),
            KeywordValue::Int(i) => Some(i as f64),
            KeywordValue::String(s) => s.trim().parse().ok(),
        }
    }

    fn get_int(&self, keyword: &str) -> Option<i64> {
        match self.value(keyword)? {
            KeywordValue::Int(i) => Some(i),
            KeywordValue::Float(f) => Some(f as i64),
            KeywordValue::String(s) => s.trim().parse().ok(),
        }
    }

    fn get_string(&self, keyword: &str) -> Option<String> {
        match self.value(keyword)? {
            KeywordValue::String(s) => Some(s),
            KeywordValue::Float(f) => Some(f.to_string()),
            KeywordValue::Int(i) => Some(i.to_string()),
        }
    }

    fn contains(&self, keyword: &str) -> bool {
        self.value(keyword).is_some()
    }

    fn require_float(&self, keyword: &str) -> WcsResult<f64> {
        self.get_float(keyword)
            .ok_or_else(|| WcsError::missing_keyword(keyword))
    }

    fn require_string(&self, keyword: &str) -> WcsResult<String> {
        self.get_string(keyword)
            .ok_or_else(|| WcsError::missing_keyword(keyword))
    }
}

/// Insertion-ordered keyword store.
#[derive(Debug, Clone, Default)]
pub struct KeywordMap {
    values: HashMap<String, KeywordValue>,
    order: Vec<String>,
}

impl KeywordMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, keyword: impl Into<String>, value: KeywordValue) {
        let keyword = keyword.into();
        if !self.values.contains_key(&keyword) {
            self.order.push(keyword.clone());
        }
        self.values.insert(keyword, value);
    }

    pub fn set_float(&mut self, keyword: impl Into<String>, value: f64) {
        self.set(keyword, KeywordValue::Float(value));
    }

    pub fn set_int(&mut self, keyword: impl Into<String>, value: i64) {
        self.set(keyword, KeywordValue::Int(value));
    }

    pub fn set_string(&mut self, keyword: impl Into<String>, value: impl Into<String>) {
        self.set(keyword, KeywordValue::String(value.into()));
    }

    pub fn remove(&mut self, keyword: &str) -> Option<KeywordValue> {
        let removed = self.values.remove(keyword);
        if removed.is_some() {
            self.order.retain(|k| k != keyword);
        }
        removed
    }

    /// Copies every entry of `other` into `self`, preserving `other`'s
    /// order for new keywords and overwriting existing ones in place.
    pub fn merge(&mut self, other: &KeywordMap) {
        for (k, v) in other.iter() {
            self.set(k.to_owned(), v.clone());
        }
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &KeywordValue)> {
        self.order
            .iter()
            .filter_map(|k| self.values.get(k).map(|v| (k.as_str(), v)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl KeywordProvider for KeywordMap {
    fn value(&self, keyword: &str) -> Option<KeywordValue> {
        self.values.get(keyword).cloned()
    }
}
