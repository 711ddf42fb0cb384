use crate::models::ParamValue;
use std::collections::BTreeMap;

/// A named table of field overrides.
///
/// Entries are kept sorted by key so the order values were inserted in never
/// influences resolution or formatting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideLayer {
    name: String,
    entries: BTreeMap<String, ParamValue>,
}

impl OverrideLayer {
    /// Creates an empty layer. The name shows up in error messages.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Creates a layer from an existing table.
    pub fn from_entries(name: impl Into<String>, entries: BTreeMap<String, ParamValue>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets `key`, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Copies every entry of `other` into this layer, overwriting on conflict.
    pub fn extend_from(&mut self, other: &OverrideLayer) {
        self.entries
            .extend(other.entries.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    /// Layer name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Value for `key`, if this layer sets it.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the layer sets nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
