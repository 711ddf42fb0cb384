//! Keycap catalog: the profiles and keycaps keyplay knows how to render.
//!
//! The built-in set can be extended from the configuration file with extra
//! global defaults, profiles and keycaps.

pub mod builtin;

use crate::config::Config;
use crate::models::{FieldKind, KeycapSpec, ParamValue};
use crate::resolver::{self, ConfigurationError, OverrideLayer, ProfileTemplate};
use std::collections::BTreeMap;
use tracing::debug;

/// A keycap the catalog can resolve: its name, profile and instance overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct KeycapEntry {
    name: String,
    profile: String,
    overrides: OverrideLayer,
}

impl KeycapEntry {
    /// Creates an entry with no overrides beyond its name.
    pub fn new(name: impl Into<String>, profile: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            profile: profile.into(),
            overrides: OverrideLayer::new("instance"),
        }
    }

    /// Adds an instance override.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.overrides.insert(key, value);
        self
    }

    /// Name as declared, before any profile prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Profile name.
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Instance layer, including the `name` field.
    pub fn instance_layer(&self) -> OverrideLayer {
        let mut layer = self.overrides.clone();
        layer.insert("name", self.name.as_str());
        layer
    }
}

/// Profiles, keycaps and the global defaults layer.
#[derive(Debug, Clone)]
pub struct Catalog {
    global: OverrideLayer,
    profiles: BTreeMap<String, ProfileTemplate>,
    keycaps: Vec<KeycapEntry>,
}

impl Catalog {
    /// The built-in riskeycap keyboard.
    pub fn builtin() -> Self {
        Self {
            global: builtin::global_defaults(),
            profiles: builtin::profiles()
                .into_iter()
                .map(|p| (p.name().to_string(), p))
                .collect(),
            keycaps: builtin::keycaps(),
        }
    }

    /// The built-in set extended by a loaded configuration.
    ///
    /// Configured defaults override built-in defaults in the global layer.
    /// A configured keycap whose name matches an existing one replaces it.
    pub fn with_config(config: &Config) -> Result<Self, ConfigurationError> {
        let mut catalog = Self::builtin();
        catalog.global = config.global_defaults();

        let mut pending: Vec<_> = config.profiles.iter().collect();
        while !pending.is_empty() {
            let before = pending.len();
            let mut deferred = Vec::new();
            for (name, profile) in pending {
                let base = match profile.base.as_deref() {
                    None => None,
                    Some(base) => match catalog.profiles.get(base) {
                        Some(found) => Some(found),
                        None => {
                            deferred.push((name, profile));
                            continue;
                        }
                    },
                };

                let mut template = match base {
                    Some(base) => ProfileTemplate::derive(name.as_str(), base),
                    None => ProfileTemplate::new(name.as_str()),
                };
                if let Some(prefix) = &profile.prefix {
                    template = template.with_prefix(prefix.as_str());
                }
                for key in &profile.passthrough {
                    template = template.declare(key.as_str(), FieldKind::Any);
                }
                for (key, value) in &profile.values {
                    template = template.set(key.as_str(), value.clone());
                }
                debug!("Registered profile '{}' from config", name);
                catalog.profiles.insert(name.clone(), template);
            }

            if deferred.len() == before {
                let (_, profile) = deferred[0];
                let base = profile.base.clone().unwrap_or_default();
                return Err(ConfigurationError::UnknownProfile(base));
            }
            pending = deferred;
        }

        for keycap in &config.keycaps {
            if !catalog.profiles.contains_key(&keycap.profile) {
                return Err(ConfigurationError::UnknownProfile(keycap.profile.clone()));
            }
            let entry = KeycapEntry {
                name: keycap.name.clone(),
                profile: keycap.profile.clone(),
                overrides: OverrideLayer::from_entries("instance", keycap.overrides.clone()),
            };
            let existing = catalog.keycaps.iter().position(|e| {
                e.name.eq_ignore_ascii_case(&entry.name) && e.profile == entry.profile
            });
            match existing {
                Some(idx) => catalog.keycaps[idx] = entry,
                None => catalog.keycaps.push(entry),
            }
        }

        Ok(catalog)
    }

    /// Global defaults layer.
    pub fn global(&self) -> &OverrideLayer {
        &self.global
    }

    /// Looks up a profile by exact name.
    pub fn profile(&self, name: &str) -> Result<&ProfileTemplate, ConfigurationError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownProfile(name.to_string()))
    }

    /// All profiles in name order.
    pub fn profiles(&self) -> impl Iterator<Item = &ProfileTemplate> {
        self.profiles.values()
    }

    /// All keycaps in catalog order.
    pub fn keycaps(&self) -> &[KeycapEntry] {
        &self.keycaps
    }

    /// Name a keycap renders under, with its profile prefix applied.
    pub fn display_name(&self, entry: &KeycapEntry) -> String {
        match self
            .profiles
            .get(&entry.profile)
            .and_then(ProfileTemplate::name_prefix)
        {
            Some(prefix) if !entry.name.starts_with(prefix) => format!("{prefix}{}", entry.name),
            _ => entry.name.clone(),
        }
    }

    /// Display names of every keycap, in catalog order.
    pub fn names(&self) -> Vec<String> {
        self.keycaps.iter().map(|e| self.display_name(e)).collect()
    }

    /// Finds a keycap by display name, ignoring ASCII case.
    ///
    /// Falls back to the declared name, so `Tab` finds `1.5U_Tab`.
    pub fn find(&self, name: &str) -> Option<&KeycapEntry> {
        self.keycaps
            .iter()
            .find(|e| self.display_name(e).eq_ignore_ascii_case(name))
            .or_else(|| self.keycaps.iter().find(|e| e.name.eq_ignore_ascii_case(name)))
    }

    /// Resolves a keycap by name.
    pub fn resolve(&self, name: &str) -> Result<KeycapSpec, ConfigurationError> {
        let entry = self
            .find(name)
            .ok_or_else(|| ConfigurationError::UnknownKeycap(name.to_string()))?;
        self.resolve_entry(entry, None)
    }

    /// Resolves an entry, optionally with extra instance overrides on top.
    pub fn resolve_entry(
        &self,
        entry: &KeycapEntry,
        extra: Option<&OverrideLayer>,
    ) -> Result<KeycapSpec, ConfigurationError> {
        let profile = self.profile(&entry.profile)?;
        let mut instance = entry.instance_layer();
        if let Some(extra) = extra {
            instance.extend_from(extra);
        }
        resolver::resolve(&self.global, profile, &instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KeycapConfig, ProfileConfig};
    use crate::models::RenderPart;

    #[test]
    fn test_every_builtin_keycap_resolves() {
        let catalog = Catalog::builtin();
        for entry in catalog.keycaps() {
            let spec = catalog.resolve_entry(entry, None);
            assert!(spec.is_ok(), "{}: {:?}", entry.name(), spec.err());
        }
    }

    #[test]
    fn test_display_names_are_unique() {
        let mut names = Catalog::builtin().names();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.find("a").unwrap().name(), "A");
        assert_eq!(catalog.find("1u_BLANK").unwrap().name(), "1U_blank");
        assert_eq!(catalog.find("1.5u_tab").unwrap().name(), "Tab");
        assert_eq!(catalog.find("tab").unwrap().name(), "Tab");
        assert!(catalog.find("nope").is_none());
    }

    #[test]
    fn test_resolve_applies_size_prefix() {
        let catalog = Catalog::builtin();
        let spec = catalog.resolve("Tab").unwrap();
        assert_eq!(spec.name(), "1.5U_Tab");
        assert_eq!(spec.profile(), "riskeycap_1.5U");
    }

    #[test]
    fn test_resolve_unknown() {
        assert_eq!(
            Catalog::builtin().resolve("Hyper"),
            Err(ConfigurationError::UnknownKeycap("Hyper".to_string()))
        );
    }

    #[test]
    fn test_homing_dots_are_passthrough() {
        let spec = Catalog::builtin().resolve("J").unwrap();
        assert!(spec.passthrough().contains_key("homing_dot_length"));
        assert!(spec.passthrough().contains_key("stem_locations"));

        let spec = Catalog::builtin().resolve("K").unwrap();
        assert!(!spec.passthrough().contains_key("homing_dot_length"));
    }

    #[test]
    fn test_extra_overrides_win() {
        let catalog = Catalog::builtin();
        let entry = catalog.find("A").unwrap();
        let extra = OverrideLayer::new("planner").with("render", vec!["keycap"]);
        let spec = catalog.resolve_entry(entry, Some(&extra)).unwrap();
        assert_eq!(spec.render(), [RenderPart::Keycap]);
    }

    #[test]
    fn test_with_config() {
        let mut config = Config::default();
        config
            .defaults
            .insert("key_height".to_string(), ParamValue::Int(9));

        let mut tall_values = BTreeMap::new();
        tall_values.insert("wall_thickness".to_string(), ParamValue::Float(1.5));
        tall_values.insert("logo_depth".to_string(), ParamValue::Float(0.6));
        config.profiles.insert(
            "tall_child".to_string(),
            ProfileConfig {
                base: Some("tall".to_string()),
                prefix: None,
                passthrough: vec!["logo_depth".to_string()],
                values: tall_values,
            },
        );
        config.profiles.insert(
            "tall".to_string(),
            ProfileConfig {
                base: Some("riskeycap".to_string()),
                prefix: Some("T_".to_string()),
                passthrough: Vec::new(),
                values: BTreeMap::new(),
            },
        );

        let mut overrides = BTreeMap::new();
        overrides.insert("legends".to_string(), ParamValue::from(vec!["*"]));
        config.keycaps.push(KeycapConfig {
            name: "Logo".to_string(),
            profile: "tall_child".to_string(),
            overrides,
        });

        let catalog = Catalog::with_config(&config).unwrap();
        let spec = catalog.resolve("logo").unwrap();
        assert_eq!(spec.name(), "T_Logo");
        assert_eq!(spec.dimensions().2, 9.0);
        assert_eq!(spec.wall_thickness(), 1.5);
        assert_eq!(spec.key_rotation(), [0.0, 110.1, -90.0]);
        assert_eq!(spec.passthrough().get("logo_depth"), Some(&ParamValue::Float(0.6)));
    }

    #[test]
    fn test_with_config_unknown_base() {
        let mut config = Config::default();
        config.profiles.insert(
            "orphan".to_string(),
            ProfileConfig {
                base: Some("missing".to_string()),
                prefix: None,
                passthrough: Vec::new(),
                values: BTreeMap::new(),
            },
        );
        assert_eq!(
            Catalog::with_config(&config).err(),
            Some(ConfigurationError::UnknownProfile("missing".to_string()))
        );
    }
}
