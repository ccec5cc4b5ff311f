//! The canonical climate vocabulary and its translation to the unit's
//! native keys and tokens.
//!
//! Everything here is a closed enumeration resolved through exhaustive
//! `match` tables, so both directions of every mapping are checked at
//! compile time. The tables themselves never change for the lifetime of
//! the process.

use strum::VariantArray as _;

/// A climate property in the hub's vendor-neutral vocabulary.
///
/// Each attribute corresponds to exactly one key in the unit's
/// `key=value` control/sensor responses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[derive(strum::Display, strum::EnumString, strum::IntoStaticStr, strum::VariantArray)]
#[strum(serialize_all = "snake_case")]
pub enum Attribute {
    CurrentTemperature,
    OutsideTemperature,
    TargetTemperature,
    HvacMode,
    FanMode,
    SwingMode,
    PresetMode,
}

impl Attribute {
    /// The unit's native key for this attribute.
    pub const fn device_key(self) -> &'static str {
        match self {
            Attribute::CurrentTemperature => "htemp",
            Attribute::OutsideTemperature => "otemp",
            Attribute::TargetTemperature => "stemp",
            Attribute::HvacMode => "mode",
            Attribute::FanMode => "f_rate",
            Attribute::SwingMode => "f_dir",
            Attribute::PresetMode => "en_hol",
        }
    }

    pub fn from_device_key(key: &str) -> Option<Self> {
        Self::VARIANTS.iter().copied().find(|a| a.device_key() == key)
    }

    pub const fn kind(self) -> AttributeKind {
        match self {
            Attribute::CurrentTemperature
            | Attribute::OutsideTemperature
            | Attribute::TargetTemperature => AttributeKind::Temperature,
            Attribute::HvacMode => AttributeKind::Mode,
            Attribute::FanMode | Attribute::SwingMode => AttributeKind::OptionList,
            Attribute::PresetMode => AttributeKind::Toggle,
        }
    }

    /// Whether the attribute can be written at all. The measured
    /// temperatures are reported by the unit and cannot be set.
    pub const fn settable(self) -> bool {
        !matches!(
            self,
            Attribute::CurrentTemperature | Attribute::OutsideTemperature
        )
    }
}

/// How an attribute's raw value is normalized and displayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[derive(strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum AttributeKind {
    Temperature,
    Mode,
    OptionList,
    Toggle,
}

/// The hub's operating modes, mapped one-to-one onto the unit's mode
/// tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[derive(strum::Display, strum::EnumString, strum::IntoStaticStr, strum::VariantArray)]
#[strum(serialize_all = "snake_case")]
pub enum HvacMode {
    Off,
    Heat,
    Cool,
    HeatCool,
    Dry,
    FanOnly,
}

impl HvacMode {
    /// The unit's token for this mode. The mapping is bijective.
    pub const fn device_token(self) -> &'static str {
        match self {
            HvacMode::Off => "off",
            HvacMode::Heat => "hot",
            HvacMode::Cool => "cool",
            HvacMode::HeatCool => "auto",
            HvacMode::Dry => "dry",
            HvacMode::FanOnly => "fan",
        }
    }

    pub fn from_device_token(token: &str) -> Option<Self> {
        Self::VARIANTS.iter().copied().find(|m| m.device_token() == token)
    }

    /// Decode a mode from the device library's decoded representation.
    ///
    /// The unit reports internal sub-states such as `auto-1` or
    /// `auto-7`; everything outside `a..z` is dropped before the table
    /// lookup, so those decode like plain `auto`.
    pub fn from_representation(human: &str) -> Option<Self> {
        let token: String = human.chars().filter(|c| c.is_ascii_lowercase()).collect();
        Self::from_device_token(&token)
    }
}

/// The away-preset concept layered over the unit's binary holiday flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[derive(strum::Display, strum::EnumString, strum::IntoStaticStr, strum::VariantArray)]
#[strum(serialize_all = "snake_case")]
pub enum Preset {
    None,
    Away,
}

impl Preset {
    pub const fn holiday_token(self) -> &'static str {
        match self {
            Preset::None => "off",
            Preset::Away => "on",
        }
    }

    /// Anything the unit reports other than the `on` token reads as no
    /// preset; there are no further holiday states to distinguish.
    pub fn from_holiday_representation(human: &str) -> Self {
        if human == Preset::Away.holiday_token() { Preset::Away } else { Preset::None }
    }
}

/// Optional climate features a particular unit supports.
///
/// Derived once from the device client's flags when the adapter is
/// constructed and immutable afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const TARGET_TEMPERATURE: Self = Self(1 << 0);
    pub const PRESET: Self = Self(1 << 1);
    pub const FAN: Self = Self(1 << 2);
    pub const SWING: Self = Self(1 << 3);

    pub const fn contains(self, feature: Self) -> bool {
        self.0 & feature.0 == feature.0
    }

    pub const fn with(self, feature: Self) -> Self {
        Self(self.0 | feature.0)
    }
}

impl std::fmt::Display for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(if self.contains(Self::TARGET_TEMPERATURE) { "T" } else { "-" })?;
        f.write_str(if self.contains(Self::PRESET) { "P" } else { "-" })?;
        f.write_str(if self.contains(Self::FAN) { "F" } else { "-" })?;
        f.write_str(if self.contains(Self::SWING) { "S" } else { "-" })?;
        Ok(())
    }
}

/// Title-case a decoded token for display, matching the casing used in
/// the adapter's option lists: a letter is uppercased exactly when the
/// preceding character is not a letter, so `vertical` becomes
/// `Vertical` and `3d` becomes `3D`.
pub fn title_case(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut prev_is_letter = false;
    for ch in token.chars() {
        if ch.is_alphabetic() {
            if prev_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(ch);
            prev_is_letter = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use strum::VariantArray as _;

    use super::*;

    #[test]
    fn hvac_mode_tokens_round_trip() {
        for &mode in HvacMode::VARIANTS {
            assert_eq!(HvacMode::from_device_token(mode.device_token()), Some(mode));
        }
    }

    #[test]
    fn hvac_mode_representation_strips_substates() {
        assert_eq!(HvacMode::from_representation("auto"), Some(HvacMode::HeatCool));
        assert_eq!(HvacMode::from_representation("auto-1"), Some(HvacMode::HeatCool));
        assert_eq!(HvacMode::from_representation("auto-7"), Some(HvacMode::HeatCool));
        assert_eq!(HvacMode::from_representation("hot"), Some(HvacMode::Heat));
        assert_eq!(HvacMode::from_representation("powerful"), None);
    }

    #[test]
    fn attribute_keys_round_trip() {
        for &attribute in Attribute::VARIANTS {
            assert_eq!(Attribute::from_device_key(attribute.device_key()), Some(attribute));
        }
        assert_eq!(Attribute::from_device_key("shum"), None);
    }

    #[test]
    fn preset_defaults_to_none() {
        assert_eq!(Preset::from_holiday_representation("on"), Preset::Away);
        assert_eq!(Preset::from_holiday_representation("off"), Preset::None);
        assert_eq!(Preset::from_holiday_representation("1"), Preset::None);
        assert_eq!(Preset::from_holiday_representation(""), Preset::None);
    }

    #[test]
    fn title_casing_matches_option_lists() {
        assert_eq!(title_case("vertical"), "Vertical");
        assert_eq!(title_case("3d"), "3D");
        assert_eq!(title_case("midhigh"), "Midhigh");
        assert_eq!(title_case("OFF"), "Off");
    }

    #[test]
    fn capability_flags() {
        let set = Capabilities::TARGET_TEMPERATURE.with(Capabilities::SWING);
        assert!(set.contains(Capabilities::TARGET_TEMPERATURE));
        assert!(set.contains(Capabilities::SWING));
        assert!(!set.contains(Capabilities::FAN));
        assert_eq!(set.to_string(), "T--S");
    }
}
