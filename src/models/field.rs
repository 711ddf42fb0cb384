//! Registry of recognized keycap parameters.
//!
//! Every key in an override layer must name one of these fields, or a
//! passthrough field declared by the keycap's profile.

use super::ParamValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Expected shape of a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// `true` / `false`
    Bool,
    /// Whole number
    Int,
    /// Integer or float
    Number,
    /// String
    Text,
    /// Three numbers, e.g. a rotation
    Vec3,
    /// List of strings
    TextList,
    /// List of numbers
    NumberList,
    /// List of three-number vectors
    Vec3List,
    /// Anything; used for profile passthrough fields declared without a kind
    Any,
}

impl FieldKind {
    /// Checks whether `value` has this shape.
    #[must_use]
    pub fn accepts(self, value: &ParamValue) -> bool {
        match self {
            Self::Bool => value.as_bool().is_some(),
            Self::Int => value.as_i64().is_some(),
            Self::Number => is_finite_number(value),
            Self::Text => value.as_str().is_some(),
            Self::Vec3 => is_vec3(value),
            Self::TextList => value
                .as_list()
                .is_some_and(|items| items.iter().all(|item| item.as_str().is_some())),
            Self::NumberList => value
                .as_list()
                .is_some_and(|items| items.iter().all(is_finite_number)),
            Self::Vec3List => value
                .as_list()
                .is_some_and(|items| items.iter().all(is_vec3)),
            Self::Any => true,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "boolean",
            Self::Int => "integer",
            Self::Number => "number",
            Self::Text => "string",
            Self::Vec3 => "[x, y, z]",
            Self::TextList => "list of strings",
            Self::NumberList => "list of numbers",
            Self::Vec3List => "list of [x, y, z]",
            Self::Any => "any value",
        };
        f.write_str(name)
    }
}

fn is_finite_number(value: &ParamValue) -> bool {
    value.as_f64().is_some_and(f64::is_finite)
}

fn is_vec3(value: &ParamValue) -> bool {
    value
        .as_list()
        .is_some_and(|items| items.len() == 3 && items.iter().all(is_finite_number))
}

/// A recognized keycap parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Field name as written in override layers (snake_case)
    pub name: &'static str,
    /// Expected value shape
    pub kind: FieldKind,
    /// Whether resolution fails when no layer provides the field
    pub required: bool,
    /// Whether the field is handed to OpenSCAD as a `-D` definition
    pub emitted: bool,
}

const fn required(name: &'static str, kind: FieldKind) -> Field {
    Field {
        name,
        kind,
        required: true,
        emitted: true,
    }
}

const fn optional(name: &'static str, kind: FieldKind) -> Field {
    Field {
        name,
        kind,
        required: false,
        emitted: true,
    }
}

impl Field {
    /// Marks a field as consumed by keyplay itself rather than OpenSCAD.
    const fn internal(self) -> Self {
        Self {
            emitted: false,
            ..self
        }
    }
}

/// The common field set shared by every profile, in command-line order.
pub const FIELDS: &[Field] = &[
    required("name", FieldKind::Text).internal(),
    required("render", FieldKind::TextList),
    required("key_profile", FieldKind::Text),
    required("key_length", FieldKind::Number),
    required("key_width", FieldKind::Number),
    required("key_height", FieldKind::Number),
    required("key_rotation", FieldKind::Vec3),
    required("key_translation", FieldKind::Vec3),
    required("wall_thickness", FieldKind::Number),
    required("uniform_wall_thickness", FieldKind::Bool),
    required("dish_thickness", FieldKind::Number),
    optional("dish_depth", FieldKind::Number),
    optional("dish_corner_fn", FieldKind::Int),
    optional("polygon_layers", FieldKind::Int),
    optional("corner_radius", FieldKind::Number),
    required("stem_type", FieldKind::Text),
    optional("stem_top_thickness", FieldKind::Number),
    optional("stem_inside_tolerance", FieldKind::Number),
    required("legends", FieldKind::TextList),
    required("legend_fonts", FieldKind::TextList),
    required("legend_font_sizes", FieldKind::NumberList),
    required("legend_trans", FieldKind::Vec3List),
    required("legend_rotation", FieldKind::Vec3List),
    required("legend_scale", FieldKind::Vec3List),
    optional("separate_legends", FieldKind::Bool).internal(),
];

/// Looks up a common field by name.
#[must_use]
pub fn field(name: &str) -> Option<&'static Field> {
    FIELDS.iter().find(|f| f.name == name)
}

/// Returns true if `name` is part of the common field set.
#[must_use]
pub fn is_common_field(name: &str) -> bool {
    field(name).is_some()
}

/// Converts a field name into the OpenSCAD variable it sets.
///
/// `key_height` becomes `KEY_HEIGHT`.
#[must_use]
pub fn scad_name(field: &str) -> String {
    field.to_ascii_uppercase()
}
