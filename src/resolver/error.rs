use crate::models::RenderTarget;

/// Error raised while turning override layers into a keycap spec.
///
/// These errors are scoped to a single keycap: planning records them and
/// moves on to the next name.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// A layer names a field that is neither common nor declared by the profile.
    #[error("unknown field '{key}' in {layer} layer")]
    UnknownField {
        /// Layer the key came from
        layer: String,
        /// The unrecognized key
        key: String,
    },

    /// A field needed for rendering has no value in any layer.
    #[error("missing required field '{field}'")]
    MissingField {
        /// Name of the missing field
        field: String,
    },

    /// A value does not match the kind its field expects.
    #[error("invalid value for '{field}' in {layer} layer: expected {expected}, found {found}")]
    InvalidValue {
        /// Field whose value was rejected
        field: String,
        /// Layer the value came from
        layer: String,
        /// Kind the field accepts
        expected: String,
        /// What was supplied instead
        found: String,
    },

    /// No profile template has this name.
    #[error("unknown profile '{0}'")]
    UnknownProfile(String),

    /// No keycap in the catalog has this name.
    #[error("unknown keycap '{0}'")]
    UnknownKeycap(String),

    /// The keycap cannot be rendered for this target.
    #[error("cannot render {target} for '{keycap}': {reason}")]
    UnsupportedTarget {
        /// Keycap name
        keycap: String,
        /// Target that was requested
        target: RenderTarget,
        /// Why the target is not available
        reason: String,
    },
}

impl ConfigurationError {
    pub(crate) fn unknown_field(layer: &str, key: &str) -> Self {
        Self::UnknownField {
            layer: layer.to_string(),
            key: key.to_string(),
        }
    }

    pub(crate) fn invalid(
        field: &str,
        layer: &str,
        expected: impl ToString,
        found: impl ToString,
    ) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            layer: layer.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}
