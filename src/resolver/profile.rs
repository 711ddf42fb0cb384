use super::OverrideLayer;
use crate::models::field;
use crate::models::{FieldKind, ParamValue};
use std::collections::BTreeMap;

/// A named template of defaults shared by a family of keycaps.
///
/// Besides values for common fields, a profile may declare passthrough fields.
/// Those are handed to OpenSCAD as-is and are the only extra keys any layer
/// may set for keycaps using the profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileTemplate {
    name: String,
    values: OverrideLayer,
    passthrough: BTreeMap<String, FieldKind>,
    name_prefix: Option<String>,
}

impl ProfileTemplate {
    /// Creates an empty profile.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            values: OverrideLayer::new(layer_name(&name)),
            name,
            passthrough: BTreeMap::new(),
            name_prefix: None,
        }
    }

    /// Creates a profile that starts from everything `base` sets and declares.
    pub fn derive(name: impl Into<String>, base: &ProfileTemplate) -> Self {
        let name = name.into();
        let mut values = base.values.clone();
        values.rename(layer_name(&name));
        Self {
            name,
            values,
            passthrough: base.passthrough.clone(),
            name_prefix: base.name_prefix.clone(),
        }
    }

    /// Sets a default value.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.values.insert(key, value);
        self
    }

    /// Declares a passthrough field.
    pub fn declare(mut self, key: impl Into<String>, kind: FieldKind) -> Self {
        self.passthrough.insert(key.into(), kind);
        self
    }

    /// Prefix applied to the names of keycaps using this profile.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    /// Profile name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Values this profile provides.
    pub fn values(&self) -> &OverrideLayer {
        &self.values
    }

    /// Declared passthrough fields.
    pub fn passthrough(&self) -> &BTreeMap<String, FieldKind> {
        &self.passthrough
    }

    /// Name prefix, if any.
    pub fn name_prefix(&self) -> Option<&str> {
        self.name_prefix.as_deref()
    }

    /// Kind of `key` if it is a common field or declared by this profile.
    pub fn recognizes(&self, key: &str) -> Option<FieldKind> {
        field::field(key)
            .map(|f| f.kind)
            .or_else(|| self.passthrough.get(key).copied())
    }

    /// Returns true if `key` is a declared passthrough field.
    pub fn is_passthrough(&self, key: &str) -> bool {
        !field::is_common_field(key) && self.passthrough.contains_key(key)
    }
}

fn layer_name(profile: &str) -> String {
    format!("profile '{profile}'")
}
