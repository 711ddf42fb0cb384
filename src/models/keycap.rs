//! The finalized keycap specification and its render targets.

use super::field::{scad_name, FIELDS};
use super::ParamValue;
use crate::resolver::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A geometry part the OpenSCAD source can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderPart {
    /// Keycap body
    Keycap,
    /// Switch stem
    Stem,
    /// Legend geometry only
    Legends,
}

impl RenderPart {
    /// Name used in the `RENDER` list.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Keycap => "keycap",
            Self::Stem => "stem",
            Self::Legends => "legends",
        }
    }
}

impl fmt::Display for RenderPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderPart {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keycap" => Ok(Self::Keycap),
            "stem" => Ok(Self::Stem),
            "legends" => Ok(Self::Legends),
            other => Err(format!("unknown render part '{other}'")),
        }
    }
}

/// Which artifact a build job produces for a keycap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderTarget {
    /// The keycap body, rendering the spec's own part list
    Keycap,
    /// The stem on its own
    Stem,
    /// Legends on their own, for separate-material printing
    Legends,
    /// Every part as a separately colored object through ColorSCAD
    Multimaterial,
}

impl RenderTarget {
    /// Suffix appended to the keycap name in the output file name.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Keycap | Self::Multimaterial => "",
            Self::Stem => "_stem",
            Self::Legends => "_legends",
        }
    }

    /// Lowercase name, as shown in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Keycap => "keycap",
            Self::Stem => "stem",
            Self::Legends => "legends",
            Self::Multimaterial => "multimaterial",
        }
    }
}

impl fmt::Display for RenderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One legend printed on a keycap with its placement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    /// Legend text; may be empty to keep a slot unused
    pub text: String,
    /// Font name in fontconfig syntax, e.g. `Gotham Rounded:style=Bold`
    pub font: String,
    /// Font size
    pub font_size: f64,
    /// Translation from the keycap's top centre
    pub trans: [f64; 3],
    /// Rotation in degrees
    pub rotation: [f64; 3],
    /// Scale per axis
    pub scale: [f64; 3],
}

/// Finalized, immutable parameter set for one keycap.
///
/// Built only by the resolver; every field is read through an accessor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeycapSpec {
    pub(crate) name: String,
    pub(crate) profile: String,
    pub(crate) key_profile: String,
    pub(crate) key_length: f64,
    pub(crate) key_width: f64,
    pub(crate) key_height: f64,
    pub(crate) key_rotation: [f64; 3],
    pub(crate) key_translation: [f64; 3],
    pub(crate) wall_thickness: f64,
    pub(crate) uniform_wall_thickness: bool,
    pub(crate) dish_thickness: f64,
    pub(crate) dish_depth: Option<f64>,
    pub(crate) dish_corner_fn: Option<i64>,
    pub(crate) polygon_layers: Option<i64>,
    pub(crate) corner_radius: Option<f64>,
    pub(crate) stem_type: String,
    pub(crate) stem_top_thickness: Option<f64>,
    pub(crate) stem_inside_tolerance: Option<f64>,
    pub(crate) render: Vec<RenderPart>,
    pub(crate) legends: Vec<Legend>,
    pub(crate) separate_legends: bool,
    pub(crate) passthrough: BTreeMap<String, ParamValue>,
}

impl KeycapSpec {
    /// Keycap name, used for output file names.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the profile template this keycap was resolved from.
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// OpenSCAD key profile, e.g. `riskeycap` or `dsa`.
    pub fn key_profile(&self) -> &str {
        &self.key_profile
    }

    /// Length, width and height in millimetres.
    pub fn dimensions(&self) -> (f64, f64, f64) {
        (self.key_length, self.key_width, self.key_height)
    }

    /// Print orientation rotation.
    pub fn key_rotation(&self) -> [f64; 3] {
        self.key_rotation
    }

    /// Print orientation translation.
    pub fn key_translation(&self) -> [f64; 3] {
        self.key_translation
    }

    /// Wall thickness in millimetres.
    pub fn wall_thickness(&self) -> f64 {
        self.wall_thickness
    }

    /// Stem type, e.g. `box_cherry`.
    pub fn stem_type(&self) -> &str {
        &self.stem_type
    }

    /// Parts rendered by the body target.
    pub fn render(&self) -> &[RenderPart] {
        &self.render
    }

    /// Legends, one per slot.
    pub fn legends(&self) -> &[Legend] {
        &self.legends
    }

    /// Whether the profile asks for legends as a separate artifact.
    pub fn separate_legends(&self) -> bool {
        self.separate_legends
    }

    /// Profile-specific passthrough values.
    pub fn passthrough(&self) -> &BTreeMap<String, ParamValue> {
        &self.passthrough
    }

    /// Returns true when at least one legend slot has text.
    pub fn has_legend(&self) -> bool {
        self.legends.iter().any(|legend| !legend.text.is_empty())
    }

    /// Checks the requirements a render target places on this spec.
    pub fn require_target(&self, target: RenderTarget) -> Result<(), ConfigurationError> {
        if target == RenderTarget::Legends && !self.has_legend() {
            return Err(ConfigurationError::UnsupportedTarget {
                keycap: self.name.clone(),
                target,
                reason: "keycap has no legend text".to_string(),
            });
        }
        Ok(())
    }

    /// Parts emitted for a given target.
    pub fn parts_for(&self, target: RenderTarget) -> Vec<RenderPart> {
        match target {
            RenderTarget::Keycap => self.render.clone(),
            RenderTarget::Stem => vec![RenderPart::Stem],
            RenderTarget::Legends => vec![RenderPart::Legends],
            RenderTarget::Multimaterial => {
                let mut parts = self.render.clone();
                if self.has_legend() && !parts.contains(&RenderPart::Legends) {
                    parts.push(RenderPart::Legends);
                }
                parts
            }
        }
    }

    /// OpenSCAD definitions for `target` in a fixed order.
    ///
    /// Common fields come first in registry order, then passthrough fields
    /// sorted by name. Unset optional fields are left out so the geometry
    /// source keeps its own default.
    pub fn scad_definitions(&self, target: RenderTarget) -> Vec<(String, ParamValue)> {
        let mut defs: Vec<(String, ParamValue)> = FIELDS
            .iter()
            .filter(|field| field.emitted)
            .filter_map(|field| {
                self.common_value(field.name, target)
                    .map(|value| (scad_name(field.name), value))
            })
            .collect();

        if target == RenderTarget::Legends {
            defs.push(("VISUALIZE_LEGENDS".to_string(), ParamValue::Bool(false)));
        }

        defs.extend(
            self.passthrough
                .iter()
                .map(|(name, value)| (scad_name(name), value.clone())),
        );
        defs
    }

    fn common_value(&self, field: &str, target: RenderTarget) -> Option<ParamValue> {
        let value = match field {
            "name" => ParamValue::from(self.name.as_str()),
            "render" => ParamValue::List(
                self.parts_for(target)
                    .into_iter()
                    .map(|part| ParamValue::from(part.as_str()))
                    .collect(),
            ),
            "key_profile" => ParamValue::from(self.key_profile.as_str()),
            "key_length" => ParamValue::Float(self.key_length),
            "key_width" => ParamValue::Float(self.key_width),
            "key_height" => ParamValue::Float(self.key_height),
            "key_rotation" => ParamValue::from(self.key_rotation),
            "key_translation" => ParamValue::from(self.key_translation),
            "wall_thickness" => ParamValue::Float(self.wall_thickness),
            "uniform_wall_thickness" => ParamValue::Bool(self.uniform_wall_thickness),
            "dish_thickness" => ParamValue::Float(self.dish_thickness),
            "dish_depth" => ParamValue::Float(self.dish_depth?),
            "dish_corner_fn" => ParamValue::Int(self.dish_corner_fn?),
            "polygon_layers" => ParamValue::Int(self.polygon_layers?),
            "corner_radius" => ParamValue::Float(self.corner_radius?),
            "stem_type" => ParamValue::from(self.stem_type.as_str()),
            "stem_top_thickness" => ParamValue::Float(self.stem_top_thickness?),
            "stem_inside_tolerance" => ParamValue::Float(self.stem_inside_tolerance?),
            "legends" => self.legend_list(|l| ParamValue::from(l.text.as_str())),
            "legend_fonts" => self.legend_list(|l| ParamValue::from(l.font.as_str())),
            "legend_font_sizes" => self.legend_list(|l| ParamValue::Float(l.font_size)),
            "legend_trans" => self.legend_list(|l| ParamValue::from(l.trans)),
            "legend_rotation" => self.legend_list(|l| ParamValue::from(l.rotation)),
            "legend_scale" => self.legend_list(|l| ParamValue::from(l.scale)),
            "separate_legends" => ParamValue::Bool(self.separate_legends),
            _ => return None,
        };
        Some(value)
    }

    fn legend_list(&self, f: impl Fn(&Legend) -> ParamValue) -> ParamValue {
        ParamValue::List(self.legends.iter().map(f).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn spec(name: &str) -> KeycapSpec {
        Catalog::builtin().resolve(name).unwrap()
    }

    #[test]
    fn test_render_target_suffix() {
        assert_eq!(RenderTarget::Keycap.suffix(), "");
        assert_eq!(RenderTarget::Stem.suffix(), "_stem");
        assert_eq!(RenderTarget::Legends.suffix(), "_legends");
        assert_eq!(RenderTarget::Multimaterial.suffix(), "");
        assert_eq!(RenderTarget::Multimaterial.to_string(), "multimaterial");
    }

    #[test]
    fn test_render_part_parse() {
        assert_eq!("stem".parse::<RenderPart>().unwrap(), RenderPart::Stem);
        assert!("stems".parse::<RenderPart>().is_err());
    }

    #[test]
    fn test_parts_for_targets() {
        let a = spec("A");
        assert_eq!(a.parts_for(RenderTarget::Keycap), vec![RenderPart::Keycap, RenderPart::Stem]);
        assert_eq!(a.parts_for(RenderTarget::Stem), vec![RenderPart::Stem]);
        assert_eq!(a.parts_for(RenderTarget::Legends), vec![RenderPart::Legends]);
        assert_eq!(
            a.parts_for(RenderTarget::Multimaterial),
            vec![RenderPart::Keycap, RenderPart::Stem, RenderPart::Legends]
        );
    }

    #[test]
    fn test_blank_keycap_rejects_legends_target() {
        let blank = spec("1U_blank");
        assert!(!blank.has_legend());
        assert!(blank.require_target(RenderTarget::Keycap).is_ok());
        assert!(matches!(
            blank.require_target(RenderTarget::Legends),
            Err(ConfigurationError::UnsupportedTarget { .. })
        ));
    }

    #[test]
    fn test_scad_definitions_order() {
        let a = spec("A");
        let names: Vec<String> = a
            .scad_definitions(RenderTarget::Keycap)
            .into_iter()
            .map(|(name, _)| name)
            .collect();

        assert_eq!(names[0], "RENDER");
        assert_eq!(names[1], "KEY_PROFILE");
        assert!(!names.contains(&"NAME".to_string()));
        assert!(!names.contains(&"SEPARATE_LEGENDS".to_string()));
        assert!(!names.contains(&"VISUALIZE_LEGENDS".to_string()));

        let legends = names.iter().position(|n| n == "LEGENDS").unwrap();
        let scale = names.iter().position(|n| n == "LEGEND_SCALE").unwrap();
        assert!(legends < scale);
    }

    #[test]
    fn test_legends_target_disables_visualization() {
        let defs = spec("A").scad_definitions(RenderTarget::Legends);
        let render = defs.iter().find(|(n, _)| n == "RENDER").unwrap();
        assert_eq!(render.1.to_scad(), "[\"legends\"]");
        assert!(defs
            .iter()
            .any(|(n, v)| n == "VISUALIZE_LEGENDS" && *v == ParamValue::Bool(false)));
    }

    #[test]
    fn test_passthrough_emitted_last_in_name_order() {
        let f = spec("F");
        let defs = f.scad_definitions(RenderTarget::Keycap);
        let tail: Vec<&str> = defs[defs.len() - f.passthrough().len()..]
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        let expected: Vec<String> = f.passthrough().keys().map(|k| scad_name(k)).collect();
        assert_eq!(tail, expected);
        assert!(tail.contains(&"HOMING_DOT_LENGTH"));
    }
}
