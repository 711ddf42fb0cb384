//! Property tests for layered resolution and command formatting.

use keyplay::catalog::builtin::global_defaults;
use keyplay::models::{ParamValue, RenderTarget};
use keyplay::render::{CommandBuilder, Toolchain};
use keyplay::resolver::{resolve, ConfigurationError, OverrideLayer, ProfileTemplate};
use proptest::prelude::*;
use std::path::Path;

const NUMERIC_FIELDS: [&str; 4] = ["key_height", "wall_thickness", "key_length", "key_width"];

fn instance(name: &str) -> OverrideLayer {
    OverrideLayer::new("instance").with("name", name)
}

proptest! {
    #[test]
    fn highest_layer_wins(
        values in proptest::collection::vec(
            (proptest::option::of(0.5f64..30.0), proptest::option::of(0.5f64..30.0), 0.5f64..30.0),
            NUMERIC_FIELDS.len(),
        ),
        order in Just((0..NUMERIC_FIELDS.len()).collect::<Vec<_>>()).prop_shuffle(),
    ) {
        let mut global = global_defaults();
        let mut profile = ProfileTemplate::new("generated");
        let mut inst = instance("Gen");

        for &idx in &order {
            let field = NUMERIC_FIELDS[idx];
            let (instance_value, profile_value, global_value) = values[idx];
            global.insert(field, global_value);
            if let Some(v) = profile_value {
                profile = profile.set(field, v);
            }
            if let Some(v) = instance_value {
                inst.insert(field, v);
            }
        }

        let spec = resolve(&global, &profile, &inst).unwrap();
        let (length, width, height) = spec.dimensions();
        let resolved = [height, spec.wall_thickness(), length, width];

        for (idx, field) in NUMERIC_FIELDS.iter().enumerate() {
            let (instance_value, profile_value, global_value) = values[idx];
            let expected = instance_value.or(profile_value).unwrap_or(global_value);
            prop_assert_eq!(resolved[idx], expected, "field {}", field);
        }
    }

    #[test]
    fn unknown_key_always_fails(
        suffix in "[a-z]{1,12}",
        layer in 0usize..3,
    ) {
        let key = format!("zz_{suffix}");
        let mut global = global_defaults();
        let mut profile = ProfileTemplate::new("generated");
        let mut inst = instance("Gen");
        match layer {
            0 => global.insert(key.as_str(), 1.0),
            1 => profile = profile.set(key.as_str(), 1.0),
            _ => inst.insert(key.as_str(), 1.0),
        }

        let result = resolve(&global, &profile, &inst);
        let is_unknown_field = matches!(
            &result,
            Err(ConfigurationError::UnknownField { key: found, .. }) if *found == key
        );
        prop_assert!(is_unknown_field, "{:?}", result);
    }

    #[test]
    fn command_formatting_is_deterministic(
        height in 1.0f64..20.0,
        legend in "[A-Za-z0-9 '\"]{0,8}",
    ) {
        let profile = ProfileTemplate::new("generated");
        let inst = instance("Gen")
            .with("key_height", height)
            .with("legends", vec![legend.as_str()]);
        let builder = CommandBuilder::new(Toolchain::default());

        let first = resolve(&global_defaults(), &profile, &inst).unwrap();
        let second = resolve(&global_defaults(), &profile, &inst).unwrap();
        let a = builder.build(&first, RenderTarget::Keycap, Path::new("Gen.stl")).unwrap();
        let b = builder.build(&second, RenderTarget::Keycap, Path::new("Gen.stl")).unwrap();

        prop_assert_eq!(a.args(), b.args());
        prop_assert_eq!(a.command_line(), b.command_line());
        let expected = format!("KEY_HEIGHT={}", ParamValue::Float(height).to_scad());
        prop_assert!(a.args().contains(&expected));
    }
}
