//! Built-in profiles and keycaps for a full riskeycap keyboard.

use super::KeycapEntry;
use crate::constants::unit_length;
use crate::models::{FieldKind, ParamValue};
use crate::resolver::{OverrideLayer, ProfileTemplate};

const GOTHAM: &str = "Gotham Rounded:style=Bold";
const ARIAL_BLACK: &str = "Arial Black:style=Regular";

/// Spacing of a Cherry plate-mounted stabilizer from the centre stem.
const STAB_OFFSET: f64 = 11.938;

/// Unit sizes that get their own profile: label, length in units, stabilizer offset.
const SIZES: &[(&str, f64, Option<f64>)] = &[
    ("1.25U", 1.25, None),
    ("1.5U", 1.5, None),
    ("1.75U", 1.75, None),
    ("2U", 2.0, Some(STAB_OFFSET)),
    ("2.25U", 2.25, Some(STAB_OFFSET)),
    ("2.5U", 2.5, Some(STAB_OFFSET)),
    ("2.75U", 2.75, Some(STAB_OFFSET)),
    ("6.25U", 6.25, Some(50.0)),
    ("7U", 7.0, Some(57.15)),
];

fn vec3s(items: &[[f64; 3]]) -> ParamValue {
    ParamValue::List(items.iter().copied().map(ParamValue::from).collect())
}

/// Lowest-precedence layer used when the configuration adds nothing.
pub fn global_defaults() -> OverrideLayer {
    let one_unit = unit_length(1.0);
    OverrideLayer::new("global")
        .with("key_profile", "riskeycap")
        .with("key_length", one_unit)
        .with("key_width", one_unit)
        .with("key_height", 8)
        .with("key_rotation", [0.0, 0.0, 0.0])
        .with("key_translation", [0.0, 0.0, 0.0])
        .with("wall_thickness", 1.125)
        .with("uniform_wall_thickness", true)
        .with("dish_thickness", 1.0)
        .with("stem_type", "box_cherry")
        .with("render", vec!["keycap", "stem"])
        .with("legends", vec![""])
        .with("legend_fonts", vec![GOTHAM])
        .with("legend_font_sizes", vec![4.5])
        .with("legend_trans", vec3s(&[[0.0, 0.0, 0.0]]))
        .with("legend_rotation", vec3s(&[[0.0, 0.0, 0.0]]))
        .with("legend_scale", vec3s(&[[1.0, 1.0, 1.0]]))
}

/// Every built-in profile, parents before children.
pub fn profiles() -> Vec<ProfileTemplate> {
    let base = ProfileTemplate::new("riskeycap")
        .set("key_profile", "riskeycap")
        .set("key_rotation", [0.0, 110.1, -90.0])
        .set("wall_thickness", 0.45 * 2.25)
        .set("uniform_wall_thickness", true)
        .set("dish_thickness", 1.0)
        .set("dish_corner_fn", 40)
        .set("polygon_layers", 4)
        .set("stem_type", "box_cherry")
        .set("render", vec!["keycap", "stem"])
        .set("stem_locations", vec3s(&[[0.0, 0.0, 0.0]]))
        .declare("stem_locations", FieldKind::Vec3List)
        .declare("homing_dot_length", FieldKind::Number)
        .declare("homing_dot_width", FieldKind::Number)
        .declare("homing_dot_x", FieldKind::Number)
        .declare("homing_dot_y", FieldKind::Number)
        .declare("homing_dot_z", FieldKind::Number);

    // Main legend top-left, shifted legend top-right, front legend on the face.
    let alphas = ProfileTemplate::derive("riskeycap_alphas", &base)
        .set("legend_fonts", vec![GOTHAM, GOTHAM, ARIAL_BLACK])
        .set("legend_font_sizes", vec![4.5, 3.5, 2.2])
        .set(
            "legend_trans",
            vec3s(&[[-3.0, -2.6, 2.0], [3.5, 3.0, 1.0], [0.15, -3.0, 2.0]]),
        )
        .set(
            "legend_rotation",
            vec3s(&[[0.0, -20.0, 0.0], [0.0, -20.0, 0.0], [68.0, 0.0, 0.0]]),
        );

    let numbers = ProfileTemplate::derive("riskeycap_numbers", &alphas)
        .set("legend_font_sizes", vec![4.0, 4.0, 2.2])
        .set(
            "legend_trans",
            vec3s(&[[-3.0, -2.6, 2.0], [3.5, -2.6, 2.0], [0.15, -3.0, 2.0]]),
        );

    let mods = ProfileTemplate::derive("riskeycap_mods", &base)
        .set("legend_font_sizes", vec![4.0])
        .set("legend_trans", vec3s(&[[0.0, -1.0, 2.0]]))
        .set("legend_rotation", vec3s(&[[0.0, -20.0, 0.0]]));

    let mut sized = Vec::with_capacity(SIZES.len() + 1);
    for &(label, units, stab) in SIZES {
        let stems = match stab {
            Some(x) => vec3s(&[[-x, 0.0, 0.0], [0.0, 0.0, 0.0], [x, 0.0, 0.0]]),
            None => vec3s(&[[0.0, 0.0, 0.0]]),
        };
        sized.push(
            ProfileTemplate::derive(format!("riskeycap_{label}"), &mods)
                .set("key_length", unit_length(units))
                .set("stem_locations", stems)
                .with_prefix(format!("{label}_")),
        );
    }

    sized.push(
        ProfileTemplate::derive("riskeycap_2UV", &mods)
            .set("key_width", unit_length(2.0))
            .set(
                "stem_locations",
                vec3s(&[[0.0, STAB_OFFSET, 0.0], [0.0, 0.0, 0.0], [0.0, -STAB_OFFSET, 0.0]]),
            )
            .with_prefix("2UV_"),
    );

    let mut all = vec![base, alphas, numbers, mods];
    all.append(&mut sized);
    all
}

/// The built-in keyboard: letters, numbers, modifiers and a blank.
pub fn keycaps() -> Vec<KeycapEntry> {
    let mut caps = Vec::new();

    for letter in 'A'..='Z' {
        let mut entry = KeycapEntry::new(letter.to_string(), "riskeycap_alphas")
            .with("legends", vec![letter.to_string()]);
        if matches!(letter, 'F' | 'J') {
            entry = entry
                .with("homing_dot_length", 3.0)
                .with("homing_dot_width", 1.0)
                .with("homing_dot_x", 0)
                .with("homing_dot_y", -3.5)
                .with("homing_dot_z", -0.45);
        }
        caps.push(entry);
    }

    let shifted = ["!", "@", "#", "$", "%", "^", "&", "*", "(", ")"];
    for (digit, symbol) in ('1'..='9').chain(['0']).zip(shifted) {
        caps.push(
            KeycapEntry::new(digit.to_string(), "riskeycap_numbers")
                .with("legends", vec![digit.to_string(), symbol.to_string()]),
        );
    }

    let punctuation = [
        ("Minus", "-", "_"),
        ("Equal", "=", "+"),
        ("LBracket", "[", "{"),
        ("RBracket", "]", "}"),
        ("Semicolon", ";", ":"),
        ("Quote", "'", "\""),
        ("Comma", ",", "<"),
        ("Period", ".", ">"),
        ("Slash", "/", "?"),
        ("Backslash", "\\", "|"),
        ("Grave", "`", "~"),
    ];
    for (name, main, shift) in punctuation {
        caps.push(
            KeycapEntry::new(name, "riskeycap_numbers").with("legends", vec![main, shift]),
        );
    }

    caps.push(KeycapEntry::new("1U_blank", "riskeycap"));
    caps.push(KeycapEntry::new("Esc", "riskeycap_mods").with("legends", vec!["Esc"]));

    let mods = [
        ("Tab", "1.5U", "Tab"),
        ("Backspace", "2U", "Bksp"),
        ("CapsLock", "1.75U", "Caps"),
        ("Enter", "2.25U", "Enter"),
        ("LShift", "2.25U", "Shift"),
        ("RShift", "2.75U", "Shift"),
        ("LCtrl", "1.25U", "Ctrl"),
        ("LSuper", "1.25U", "Super"),
        ("LAlt", "1.25U", "Alt"),
        ("RAlt", "1.25U", "Alt"),
        ("Fn", "1.25U", "Fn"),
        ("RCtrl", "1.25U", "Ctrl"),
        ("NumpadPlus", "2UV", "+"),
        ("NumpadEnter", "2UV", "Enter"),
    ];
    for (name, size, legend) in mods {
        caps.push(
            KeycapEntry::new(name, format!("riskeycap_{size}")).with("legends", vec![legend]),
        );
    }

    caps.push(KeycapEntry::new("Space", "riskeycap_6.25U"));
    caps.push(KeycapEntry::new("Space", "riskeycap_7U"));

    caps
}
