//! Layered parameter resolution.
//!
//! Three override layers are merged with strict precedence, highest first:
//! instance overrides, then the profile template, then global defaults. The
//! winning values are type-checked against the field registry and turned into
//! an immutable [`KeycapSpec`].

mod error;
mod layer;
mod profile;

pub use error::ConfigurationError;
pub use layer::OverrideLayer;
pub use profile::ProfileTemplate;

use crate::models::{FieldKind, KeycapSpec, Legend, ParamValue, RenderPart, FIELDS};
use std::collections::BTreeMap;

/// Resolves one keycap from its three override layers.
///
/// # Errors
///
/// Fails on the first unrecognized key, ill-typed winning value, missing
/// required field, or malformed legend table.
pub fn resolve(
    global: &OverrideLayer,
    profile: &ProfileTemplate,
    instance: &OverrideLayer,
) -> Result<KeycapSpec, ConfigurationError> {
    let layers = [global, profile.values(), instance];

    for layer in layers {
        for (key, _) in layer.iter() {
            if profile.recognizes(key).is_none() {
                return Err(ConfigurationError::unknown_field(layer.name(), key));
            }
        }
    }

    // Lowest precedence first, so later inserts win.
    let mut merged: BTreeMap<&str, Winner<'_>> = BTreeMap::new();
    for layer in layers {
        for (key, value) in layer.iter() {
            merged.insert(
                key,
                Winner {
                    value,
                    layer: layer.name(),
                },
            );
        }
    }

    for (key, winner) in &merged {
        let kind = profile
            .recognizes(key)
            .ok_or_else(|| ConfigurationError::unknown_field(winner.layer, key))?;
        if !kind.accepts(winner.value) {
            return Err(ConfigurationError::invalid(
                key,
                winner.layer,
                kind,
                describe(winner.value),
            ));
        }
    }

    if let Some(missing) = FIELDS
        .iter()
        .find(|f| f.required && !merged.contains_key(f.name))
    {
        return Err(ConfigurationError::MissingField {
            field: missing.name.to_string(),
        });
    }

    let fields = Merged(merged);
    let name = resolve_name(&fields, profile)?;
    let legends = resolve_legends(&fields)?;
    let render = resolve_render(&fields)?;

    let passthrough = fields
        .0
        .iter()
        .filter(|(key, _)| profile.is_passthrough(key))
        .map(|(key, winner)| ((*key).to_string(), winner.value.clone()))
        .collect();

    Ok(KeycapSpec {
        name,
        profile: profile.name().to_string(),
        key_profile: fields.text("key_profile")?,
        key_length: fields.number("key_length")?,
        key_width: fields.number("key_width")?,
        key_height: fields.number("key_height")?,
        key_rotation: fields.vec3("key_rotation")?,
        key_translation: fields.vec3("key_translation")?,
        wall_thickness: fields.number("wall_thickness")?,
        uniform_wall_thickness: fields.flag("uniform_wall_thickness")?,
        dish_thickness: fields.number("dish_thickness")?,
        dish_depth: fields.optional("dish_depth", ParamValue::as_f64),
        dish_corner_fn: fields.optional("dish_corner_fn", ParamValue::as_i64),
        polygon_layers: fields.optional("polygon_layers", ParamValue::as_i64),
        corner_radius: fields.optional("corner_radius", ParamValue::as_f64),
        stem_type: fields.text("stem_type")?,
        stem_top_thickness: fields.optional("stem_top_thickness", ParamValue::as_f64),
        stem_inside_tolerance: fields.optional("stem_inside_tolerance", ParamValue::as_f64),
        render,
        legends,
        separate_legends: fields
            .optional("separate_legends", ParamValue::as_bool)
            .unwrap_or(false),
        passthrough,
    })
}

#[derive(Clone, Copy)]
struct Winner<'a> {
    value: &'a ParamValue,
    layer: &'a str,
}

/// Winning values after the merge, already type-checked.
struct Merged<'a>(BTreeMap<&'a str, Winner<'a>>);

impl<'a> Merged<'a> {
    fn winner(&self, key: &str) -> Result<Winner<'a>, ConfigurationError> {
        self.0
            .get(key)
            .copied()
            .ok_or_else(|| ConfigurationError::MissingField {
                field: key.to_string(),
            })
    }

    fn extract<T>(
        &self,
        key: &str,
        kind: FieldKind,
        get: impl Fn(&'a ParamValue) -> Option<T>,
    ) -> Result<T, ConfigurationError> {
        let winner = self.winner(key)?;
        get(winner.value).ok_or_else(|| {
            ConfigurationError::invalid(key, winner.layer, kind, describe(winner.value))
        })
    }

    fn text(&self, key: &str) -> Result<String, ConfigurationError> {
        self.extract(key, FieldKind::Text, |v| v.as_str().map(str::to_string))
    }

    fn number(&self, key: &str) -> Result<f64, ConfigurationError> {
        self.extract(key, FieldKind::Number, ParamValue::as_f64)
    }

    fn flag(&self, key: &str) -> Result<bool, ConfigurationError> {
        self.extract(key, FieldKind::Bool, ParamValue::as_bool)
    }

    fn vec3(&self, key: &str) -> Result<[f64; 3], ConfigurationError> {
        self.extract(key, FieldKind::Vec3, to_vec3)
    }

    fn list(&self, key: &str) -> Result<(&'a [ParamValue], &'a str), ConfigurationError> {
        let winner = self.winner(key)?;
        let items = winner.value.as_list().ok_or_else(|| {
            ConfigurationError::invalid(key, winner.layer, "list", describe(winner.value))
        })?;
        Ok((items, winner.layer))
    }

    fn optional<T>(&self, key: &str, get: impl Fn(&ParamValue) -> Option<T>) -> Option<T> {
        self.0.get(key).and_then(|winner| get(winner.value))
    }
}

fn to_vec3(value: &ParamValue) -> Option<[f64; 3]> {
    match value.as_list()? {
        [x, y, z] => Some([x.as_f64()?, y.as_f64()?, z.as_f64()?]),
        _ => None,
    }
}

fn describe(value: &ParamValue) -> String {
    match value.as_f64() {
        Some(n) if !n.is_finite() => "non-finite number".to_string(),
        _ => format!("{} {}", value.type_name(), value.to_scad()),
    }
}

fn resolve_name(
    fields: &Merged<'_>,
    profile: &ProfileTemplate,
) -> Result<String, ConfigurationError> {
    let winner = fields.winner("name")?;
    let name = fields.text("name")?;
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(ConfigurationError::invalid(
            "name",
            winner.layer,
            "a non-empty file name",
            describe(winner.value),
        ));
    }

    Ok(match profile.name_prefix() {
        Some(prefix) if !name.starts_with(prefix) => format!("{prefix}{name}"),
        _ => name,
    })
}

fn resolve_render(fields: &Merged<'_>) -> Result<Vec<RenderPart>, ConfigurationError> {
    let (items, layer) = fields.list("render")?;
    if items.is_empty() {
        return Err(ConfigurationError::invalid(
            "render",
            layer,
            "at least one part",
            "empty list",
        ));
    }

    items
        .iter()
        .map(|item| {
            item.as_str()
                .and_then(|s| s.parse::<RenderPart>().ok())
                .ok_or_else(|| {
                    ConfigurationError::invalid(
                        "render",
                        layer,
                        "one of keycap, stem, legends",
                        describe(item),
                    )
                })
        })
        .collect()
}

/// Builds one [`Legend`] per entry of `legends`.
///
/// Each parallel attribute list is fitted to the legend count: extra entries
/// are dropped and a short list repeats its last entry.
fn resolve_legends(fields: &Merged<'_>) -> Result<Vec<Legend>, ConfigurationError> {
    let (texts, layer) = fields.list("legends")?;
    let count = texts.len();

    let fonts = fitted(fields, "legend_fonts", count, |v| v.as_str().map(str::to_string))?;
    let sizes = fitted(fields, "legend_font_sizes", count, ParamValue::as_f64)?;
    let trans = fitted(fields, "legend_trans", count, to_vec3)?;
    let rotation = fitted(fields, "legend_rotation", count, to_vec3)?;
    let scale = fitted(fields, "legend_scale", count, to_vec3)?;

    texts
        .iter()
        .enumerate()
        .map(|(idx, text)| {
            let text = text.as_str().ok_or_else(|| {
                ConfigurationError::invalid("legends", layer, "string", describe(text))
            })?;
            Ok(Legend {
                text: text.to_string(),
                font: fonts[idx].clone(),
                font_size: sizes[idx],
                trans: trans[idx],
                rotation: rotation[idx],
                scale: scale[idx],
            })
        })
        .collect()
}

fn fitted<T: Clone>(
    fields: &Merged<'_>,
    key: &str,
    count: usize,
    get: impl Fn(&ParamValue) -> Option<T>,
) -> Result<Vec<T>, ConfigurationError> {
    let (items, layer) = fields.list(key)?;
    if count == 0 {
        return Ok(Vec::new());
    }

    let Some(last) = items.last() else {
        return Err(ConfigurationError::invalid(
            key,
            layer,
            format!("{count} entries (one per legend)"),
            "empty list",
        ));
    };

    items
        .iter()
        .chain(std::iter::repeat(last))
        .take(count)
        .map(|item| {
            get(item).ok_or_else(|| {
                ConfigurationError::invalid(key, layer, "legend attribute", describe(item))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global() -> OverrideLayer {
        OverrideLayer::new("global")
            .with("key_profile", "riskeycap")
            .with("key_length", 18.25)
            .with("key_width", 18.25)
            .with("key_height", 8)
            .with("key_rotation", [0.0, 110.1, -90.0])
            .with("key_translation", [0.0, 0.0, 0.0])
            .with("wall_thickness", 1.125)
            .with("uniform_wall_thickness", true)
            .with("dish_thickness", 1.0)
            .with("stem_type", "box_cherry")
            .with("render", vec!["keycap", "stem"])
            .with("legends", vec![""])
            .with("legend_fonts", vec!["Gotham Rounded:style=Bold"])
            .with("legend_font_sizes", vec![4.5])
            .with("legend_trans", ParamValue::List(vec![ParamValue::from([0.0, 0.0, 0.0])]))
            .with("legend_rotation", ParamValue::List(vec![ParamValue::from([0.0, 0.0, 0.0])]))
            .with("legend_scale", ParamValue::List(vec![ParamValue::from([1.0, 1.0, 1.0])]))
    }

    fn instance(name: &str) -> OverrideLayer {
        OverrideLayer::new("instance").with("name", name)
    }

    #[test]
    fn test_resolve_minimal() {
        let spec = resolve(&global(), &ProfileTemplate::new("plain"), &instance("A")).unwrap();
        assert_eq!(spec.name(), "A");
        assert_eq!(spec.profile(), "plain");
        assert_eq!(spec.key_profile(), "riskeycap");
        assert_eq!(spec.dimensions(), (18.25, 18.25, 8.0));
        assert_eq!(spec.render(), [RenderPart::Keycap, RenderPart::Stem]);
        assert_eq!(spec.legends().len(), 1);
        assert!(!spec.has_legend());
        assert!(!spec.separate_legends());
    }

    #[test]
    fn test_precedence_instance_over_profile_over_global() {
        let profile = ProfileTemplate::new("tall").set("key_height", 9).set("wall_thickness", 1.5);
        let inst = instance("A").with("key_height", 10.5);

        let spec = resolve(&global(), &profile, &inst).unwrap();
        assert_eq!(spec.dimensions().2, 10.5);
        assert_eq!(spec.wall_thickness(), 1.5);
        assert_eq!(spec.stem_type(), "box_cherry");
    }

    #[test]
    fn test_unknown_key_fails_in_any_layer() {
        let typo = resolve(
            &global(),
            &ProfileTemplate::new("p"),
            &instance("A").with("key_hieght", 9),
        );
        assert_eq!(
            typo,
            Err(ConfigurationError::UnknownField {
                layer: "instance".to_string(),
                key: "key_hieght".to_string(),
            })
        );

        let in_profile = resolve(
            &global(),
            &ProfileTemplate::new("p").set("homing_dot_length", 3),
            &instance("A"),
        );
        assert!(matches!(
            in_profile,
            Err(ConfigurationError::UnknownField { ref layer, .. }) if layer == "profile 'p'"
        ));
    }

    #[test]
    fn test_declared_passthrough_is_accepted() {
        let profile = ProfileTemplate::new("homing")
            .declare("homing_dot_length", FieldKind::Number)
            .set("homing_dot_length", 3);
        let spec = resolve(&global(), &profile, &instance("F")).unwrap();
        assert_eq!(spec.passthrough().get("homing_dot_length"), Some(&ParamValue::Int(3)));
    }

    #[test]
    fn test_missing_required_field() {
        let mut layer = OverrideLayer::new("global");
        for (key, value) in global().iter() {
            if key != "stem_type" {
                layer.insert(key, value.clone());
            }
        }
        let result = resolve(&layer, &ProfileTemplate::new("p"), &instance("A"));
        assert_eq!(
            result,
            Err(ConfigurationError::MissingField {
                field: "stem_type".to_string()
            })
        );
    }

    #[test]
    fn test_ill_typed_value() {
        let result = resolve(
            &global(),
            &ProfileTemplate::new("p"),
            &instance("A").with("key_height", "tall"),
        );
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidValue { ref field, .. }) if field == "key_height"
        ));

        let nan = resolve(
            &global(),
            &ProfileTemplate::new("p"),
            &instance("A").with("key_height", f64::NAN),
        );
        assert!(matches!(nan, Err(ConfigurationError::InvalidValue { ref found, .. }) if found == "non-finite number"));
    }

    #[test]
    fn test_only_winning_value_is_type_checked() {
        let profile = ProfileTemplate::new("p").set("key_height", "tall");
        let spec = resolve(&global(), &profile, &instance("A").with("key_height", 9)).unwrap();
        assert_eq!(spec.dimensions().2, 9.0);
    }

    #[test]
    fn test_legend_lists_are_fitted() {
        let inst = instance("Q")
            .with("legends", vec!["Q", "1", "!"])
            .with("legend_font_sizes", vec![4.5, 3.0, 3.0, 2.0]);

        let spec = resolve(&global(), &ProfileTemplate::new("p"), &inst).unwrap();
        let legends = spec.legends();
        assert_eq!(legends.len(), 3);
        assert_eq!(legends[2].text, "!");
        assert_eq!(legends[1].font_size, 3.0);
        assert_eq!(legends[2].font, "Gotham Rounded:style=Bold");
        assert_eq!(legends[2].scale, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_empty_attribute_list_with_legends_fails() {
        let inst = instance("Q")
            .with("legends", vec!["Q"])
            .with("legend_fonts", ParamValue::List(Vec::new()));
        let result = resolve(&global(), &ProfileTemplate::new("p"), &inst);
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidValue { ref field, .. }) if field == "legend_fonts"
        ));

        let none = instance("blank")
            .with("legends", ParamValue::List(Vec::new()))
            .with("legend_fonts", ParamValue::List(Vec::new()));
        let spec = resolve(&global(), &ProfileTemplate::new("p"), &none).unwrap();
        assert!(spec.legends().is_empty());
    }

    #[test]
    fn test_render_parts_are_validated() {
        let bad = instance("A").with("render", vec!["keycap", "stems"]);
        assert!(resolve(&global(), &ProfileTemplate::new("p"), &bad).is_err());

        let empty = instance("A").with("render", ParamValue::List(Vec::new()));
        assert!(resolve(&global(), &ProfileTemplate::new("p"), &empty).is_err());
    }

    #[test]
    fn test_name_prefix_is_not_doubled() {
        let profile = ProfileTemplate::new("1.25U").with_prefix("1.25U_");
        let spec = resolve(&global(), &profile, &instance("Alt")).unwrap();
        assert_eq!(spec.name(), "1.25U_Alt");

        let spec = resolve(&global(), &profile, &instance("1.25U_Alt")).unwrap();
        assert_eq!(spec.name(), "1.25U_Alt");
    }

    #[test]
    fn test_name_must_be_a_file_name() {
        for bad in ["", "a/b", "..", "a\\b"] {
            let result = resolve(&global(), &ProfileTemplate::new("p"), &instance(bad));
            assert!(
                matches!(result, Err(ConfigurationError::InvalidValue { ref field, .. }) if field == "name"),
                "{bad:?} should be rejected"
            );
        }
    }
}
