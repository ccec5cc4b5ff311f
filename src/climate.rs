//! The climate adapter: presents a unit in the hub's canonical
//! vocabulary over whatever [`DeviceClient`] it is handed.
//!
//! Reads come from the client's cached values and are normalized here;
//! writes are translated into one combined raw batch per call. The
//! adapter never schedules polling, never retries and holds no state
//! beyond the capability set and option lists captured at
//! construction.

use std::collections::BTreeMap;

use strum::VariantArray as _;

use crate::attributes::{Attribute, Capabilities, HvacMode, Preset, title_case};
use crate::device::DeviceClient;

pub const TEMPERATURE_UNIT: &str = "°C";
pub const TARGET_TEMPERATURE_STEP: f64 = 1.0;

/// A raw attribute value normalized into the hub vocabulary.
///
/// `None` from the read path means "currently unknown" and must render
/// as unavailable on the hub side, never as an error.
#[derive(Clone, Debug, PartialEq)]
pub enum Reading {
    Temperature(f64),
    Text(String),
    Mode(HvacMode),
    Preset(Preset),
}

impl Reading {
    pub fn temperature(self) -> Option<f64> {
        if let Reading::Temperature(v) = self { Some(v) } else { None }
    }

    pub fn text(self) -> Option<String> {
        if let Reading::Text(v) = self { Some(v) } else { None }
    }

    pub fn mode(self) -> Option<HvacMode> {
        if let Reading::Mode(v) = self { Some(v) } else { None }
    }

    pub fn preset(self) -> Option<Preset> {
        if let Reading::Preset(v) = self { Some(v) } else { None }
    }
}

impl std::fmt::Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reading::Temperature(v) => write!(f, "{v}"),
            Reading::Text(v) => f.write_str(v),
            Reading::Mode(v) => write!(f, "{v}"),
            Reading::Preset(v) => write!(f, "{v}"),
        }
    }
}

impl serde::Serialize for Reading {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Reading::Temperature(v) => serializer.serialize_f64(*v),
            Reading::Text(v) => serializer.serialize_str(v),
            Reading::Mode(v) => serializer.serialize_str(<&'static str>::from(*v)),
            Reading::Preset(v) => serializer.serialize_str(<&'static str>::from(*v)),
        }
    }
}

/// A partial settings request. Absent fields are left untouched on the
/// unit; present ones are validated independently, so one bad value
/// never blocks the rest of the batch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Settings {
    pub target_temperature: Option<f64>,
    pub hvac_mode: Option<HvacMode>,
    pub fan_mode: Option<String>,
    pub swing_mode: Option<String>,
}

#[derive(thiserror::Error, Debug)]
enum EncodeError {
    #[error("`{value}` is not one of the supported {attribute} options")]
    InvalidOption { attribute: &'static str, value: String },
    #[error("target temperature {0} cannot be encoded for the unit")]
    InvalidTemperature(f64),
}

pub struct Climate<D> {
    device: D,
    capabilities: Capabilities,
    fan_modes: Vec<String>,
    swing_modes: Vec<String>,
}

impl<D: DeviceClient> Climate<D> {
    /// Capability flags and option lists are captured here, once; a
    /// unit whose reported support changes afterwards is not observed.
    pub fn new(device: D) -> Self {
        let mut capabilities = Capabilities::TARGET_TEMPERATURE;
        if device.supports_away() {
            capabilities = capabilities.with(Capabilities::PRESET);
        }
        if device.supports_fan_rate() {
            capabilities = capabilities.with(Capabilities::FAN);
        }
        if device.supports_swing() {
            capabilities = capabilities.with(Capabilities::SWING);
        }
        let fan_modes = device.fan_rate_options();
        let swing_modes = device.swing_options().iter().map(|t| title_case(t)).collect();
        Self { device, capabilities, fan_modes, swing_modes }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Read one attribute from the client's cache and normalize it.
    pub fn get(&self, attribute: Attribute) -> Option<Reading> {
        let key = attribute.device_key();
        match attribute {
            Attribute::CurrentTemperature
            | Attribute::OutsideTemperature
            | Attribute::TargetTemperature => {
                let Some(raw) = self.device.cached(key) else {
                    tracing::error!(%attribute, key, "no cached value for attribute");
                    return None;
                };
                parse_temperature(&raw).map(Reading::Temperature)
            }
            Attribute::FanMode | Attribute::SwingMode => {
                let Some(repr) = self.device.represent(key) else {
                    tracing::error!(%attribute, key, "no representation for attribute");
                    return None;
                };
                Some(Reading::Text(title_case(&repr.human)))
            }
            Attribute::HvacMode => {
                let Some(repr) = self.device.represent(key) else {
                    tracing::error!(%attribute, key, "no representation for attribute");
                    return None;
                };
                HvacMode::from_representation(&repr.human).map(Reading::Mode)
            }
            Attribute::PresetMode => {
                let preset = match self.device.represent(key) {
                    Some(repr) => Preset::from_holiday_representation(&repr.human),
                    None => Preset::None,
                };
                Some(Reading::Preset(preset))
            }
        }
    }

    /// Translate the requested settings and push them in one combined
    /// write. Values that fail validation are logged and dropped from
    /// the batch; nothing is sent when the batch ends up empty.
    pub async fn apply(&self, settings: Settings) -> Result<(), D::Error> {
        let mut batch = BTreeMap::new();
        if let Some(value) = settings.target_temperature {
            match encode_temperature(value) {
                Ok(encoded) => {
                    batch.insert(Attribute::TargetTemperature.device_key(), encoded);
                }
                Err(err) => tracing::error!(%err, "dropping target temperature from batch"),
            }
        }
        if let Some(value) = &settings.fan_mode {
            match encode_option(Attribute::FanMode, value, &self.fan_modes) {
                Ok(encoded) => {
                    batch.insert(Attribute::FanMode.device_key(), encoded);
                }
                Err(err) => tracing::error!(%err, "dropping fan mode from batch"),
            }
        }
        if let Some(value) = &settings.swing_mode {
            match encode_option(Attribute::SwingMode, value, &self.swing_modes) {
                Ok(encoded) => {
                    batch.insert(Attribute::SwingMode.device_key(), encoded);
                }
                Err(err) => tracing::error!(%err, "dropping swing mode from batch"),
            }
        }
        if let Some(mode) = settings.hvac_mode {
            // The canonical enum is closed, so this direction of the
            // mode table cannot fail.
            batch.insert(Attribute::HvacMode.device_key(), mode.device_token().to_string());
        }
        if batch.is_empty() {
            return Ok(());
        }
        self.device.write(batch).await
    }

    /// The holiday flag has its own call on the wire; it does not go
    /// through the settings batch.
    pub async fn set_preset(&self, preset: Preset) -> Result<(), D::Error> {
        self.device.set_holiday(preset == Preset::Away).await
    }

    /// An empty settings write is how the unit is told to resume.
    pub async fn turn_on(&self) -> Result<(), D::Error> {
        self.device.write(BTreeMap::new()).await
    }

    pub async fn turn_off(&self) -> Result<(), D::Error> {
        self.apply(Settings { hvac_mode: Some(HvacMode::Off), ..Settings::default() }).await
    }

    pub async fn refresh(&self) -> Result<(), D::Error> {
        self.device.refresh().await
    }

    pub fn name(&self) -> String {
        self.device.name()
    }

    pub fn unique_id(&self) -> String {
        self.device.hardware_address()
    }

    pub fn device_descriptor(&self) -> String {
        self.device.device_descriptor()
    }

    pub const fn temperature_unit(&self) -> &'static str {
        TEMPERATURE_UNIT
    }

    pub const fn target_temperature_step(&self) -> f64 {
        TARGET_TEMPERATURE_STEP
    }

    pub const fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn hvac_modes(&self) -> &'static [HvacMode] {
        HvacMode::VARIANTS
    }

    pub fn fan_modes(&self) -> &[String] {
        if self.capabilities.contains(Capabilities::FAN) { &self.fan_modes } else { &[] }
    }

    pub fn swing_modes(&self) -> &[String] {
        if self.capabilities.contains(Capabilities::SWING) { &self.swing_modes } else { &[] }
    }

    pub fn preset_modes(&self) -> &'static [Preset] {
        if self.capabilities.contains(Capabilities::PRESET) { Preset::VARIANTS } else { &[] }
    }

    pub fn current_temperature(&self) -> Option<f64> {
        self.get(Attribute::CurrentTemperature).and_then(Reading::temperature)
    }

    pub fn outside_temperature(&self) -> Option<f64> {
        self.get(Attribute::OutsideTemperature).and_then(Reading::temperature)
    }

    pub fn target_temperature(&self) -> Option<f64> {
        self.get(Attribute::TargetTemperature).and_then(Reading::temperature)
    }

    pub fn hvac_mode(&self) -> Option<HvacMode> {
        self.get(Attribute::HvacMode).and_then(Reading::mode)
    }

    pub fn fan_mode(&self) -> Option<String> {
        self.get(Attribute::FanMode).and_then(Reading::text)
    }

    pub fn swing_mode(&self) -> Option<String> {
        self.get(Attribute::SwingMode).and_then(Reading::text)
    }

    pub fn preset_mode(&self) -> Preset {
        match self.get(Attribute::PresetMode) {
            Some(Reading::Preset(preset)) => preset,
            _ => Preset::None,
        }
    }
}

/// The unit reports `-` or `--` while a reading is unavailable; that
/// is expected transient state, not an error. Any other non-numeric
/// value reads as unknown as well.
fn parse_temperature(raw: &str) -> Option<f64> {
    if raw == "-" || raw == "--" {
        return None;
    }
    raw.trim().parse().ok()
}

fn encode_temperature(value: f64) -> Result<String, EncodeError> {
    if !value.is_finite() {
        return Err(EncodeError::InvalidTemperature(value));
    }
    // The unit takes whole degrees; fractions are truncated.
    Ok(format!("{}", value as i64))
}

fn encode_option(
    attribute: Attribute,
    value: &str,
    allowed: &[String],
) -> Result<String, EncodeError> {
    if allowed.iter().any(|option| option.eq_ignore_ascii_case(value)) {
        Ok(value.to_ascii_lowercase())
    } else {
        Err(EncodeError::InvalidOption { attribute: attribute.into(), value: value.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::device::Representation;
    use crate::snapshot::{Snapshot, SnapshotDevice};

    const BASIC: &str = "ret=OK,type=aircon,reg=eu,ver=1_2_54,name=%48%61%6c%6c,mac=FCDBB3B18A9D";
    const CONTROL: &str = "ret=OK,pow=1,mode=3,stemp=24.0,shum=0,f_rate=A,f_dir=3,en_hol=0";
    const SENSOR: &str = "ret=OK,htemp=22.5,otemp=-,err=0";

    fn climate_from(lines: &[&str]) -> Climate<SnapshotDevice> {
        let body = lines.join("\n");
        Climate::new(SnapshotDevice::new(Snapshot::parse(&body).unwrap()))
    }

    fn climate() -> Climate<SnapshotDevice> {
        climate_from(&[BASIC, CONTROL, SENSOR])
    }

    #[test]
    fn unavailable_readings_are_unknown_not_errors() {
        let climate = climate();
        assert_eq!(climate.outside_temperature(), None);
        assert_eq!(climate.current_temperature(), Some(22.5));
        assert_eq!(climate.target_temperature(), Some(24.0));
    }

    #[test]
    fn garbage_temperature_reads_unknown() {
        let climate = climate_from(&[BASIC, "pow=1,mode=3,stemp=warm"]);
        assert_eq!(climate.target_temperature(), None);
    }

    #[test]
    fn hvac_mode_decodes_through_the_power_flag() {
        assert_eq!(climate().hvac_mode(), Some(HvacMode::Cool));
        let off = climate_from(&[BASIC, "pow=0,mode=3,stemp=24.0"]);
        assert_eq!(off.hvac_mode(), Some(HvacMode::Off));
    }

    #[test]
    fn hvac_mode_substates_decode_as_heat_cool() {
        for raw in ["0", "1", "7"] {
            let climate = climate_from(&[BASIC, &format!("pow=1,mode={raw},stemp=24.0")]);
            assert_eq!(climate.hvac_mode(), Some(HvacMode::HeatCool));
        }
    }

    #[test]
    fn enumerated_readings_are_title_cased() {
        let climate = climate();
        assert_eq!(climate.fan_mode().as_deref(), Some("Auto"));
        assert_eq!(climate.swing_mode().as_deref(), Some("3D"));
        assert!(climate.swing_modes().contains(&"3D".to_string()));
    }

    #[test]
    fn preset_reads_away_only_for_the_on_token() {
        assert_eq!(climate().preset_mode(), Preset::None);
        let away = climate_from(&[BASIC, "pow=1,mode=3,stemp=24.0,en_hol=1"]);
        assert_eq!(away.preset_mode(), Preset::Away);
        // No holiday key at all still reads as the none preset.
        let bare = climate_from(&[BASIC, "pow=1,mode=3,stemp=24.0"]);
        assert_eq!(bare.preset_mode(), Preset::None);
    }

    #[tokio::test]
    async fn apply_batches_all_valid_settings_into_one_write() {
        let climate = climate();
        climate
            .apply(Settings {
                target_temperature: Some(22.7),
                hvac_mode: Some(HvacMode::Cool),
                fan_mode: Some("Auto".to_string()),
                swing_mode: Some("3D".to_string()),
            })
            .await
            .unwrap();
        let journal = climate.device().journal();
        assert_eq!(journal.writes.len(), 1);
        let batch = &journal.writes[0];
        assert_eq!(batch.get("stemp").map(String::as_str), Some("22"));
        assert_eq!(batch.get("mode").map(String::as_str), Some("cool"));
        assert_eq!(batch.get("f_rate").map(String::as_str), Some("auto"));
        assert_eq!(batch.get("f_dir").map(String::as_str), Some("3d"));
    }

    #[tokio::test]
    async fn invalid_option_is_dropped_without_blocking_the_batch() {
        let climate = climate();
        climate
            .apply(Settings {
                hvac_mode: Some(HvacMode::Cool),
                fan_mode: Some("Quiet".to_string()),
                ..Settings::default()
            })
            .await
            .unwrap();
        let journal = climate.device().journal();
        assert_eq!(journal.writes.len(), 1);
        let batch = &journal.writes[0];
        assert_eq!(batch.get("mode").map(String::as_str), Some("cool"));
        assert!(!batch.contains_key("f_rate"));
    }

    #[tokio::test]
    async fn nothing_valid_means_no_write() {
        let climate = climate();
        climate
            .apply(Settings { fan_mode: Some("Quiet".to_string()), ..Settings::default() })
            .await
            .unwrap();
        climate.apply(Settings::default()).await.unwrap();
        assert!(climate.device().journal().writes.is_empty());
    }

    #[tokio::test]
    async fn preset_path_issues_one_holiday_call_each() {
        let climate = climate();
        climate.set_preset(Preset::Away).await.unwrap();
        climate.set_preset(Preset::Away).await.unwrap();
        climate.set_preset(Preset::None).await.unwrap();
        assert_eq!(climate.device().journal().holiday_calls, vec![true, true, false]);
        assert!(climate.device().journal().writes.is_empty());
    }

    #[tokio::test]
    async fn turn_on_and_off() {
        let climate = climate();
        climate.turn_on().await.unwrap();
        climate.turn_off().await.unwrap();
        let journal = climate.device().journal();
        assert_eq!(journal.writes.len(), 2);
        assert!(journal.writes[0].is_empty());
        assert_eq!(journal.writes[1].get("mode").map(String::as_str), Some("off"));
    }

    #[tokio::test]
    async fn refresh_delegates_to_the_client() {
        let climate = climate();
        climate.refresh().await.unwrap();
        assert_eq!(climate.device().journal().refreshes, 1);
    }

    #[test]
    fn identity_and_fixed_accessors() {
        let climate = climate();
        assert_eq!(climate.name(), "Hall");
        assert_eq!(climate.unique_id(), "FCDBB3B18A9D");
        assert_eq!(climate.device_descriptor(), "aircon 1_2_54");
        assert_eq!(climate.temperature_unit(), "°C");
        assert_eq!(climate.target_temperature_step(), 1.0);
        assert_eq!(climate.hvac_modes().len(), 6);
    }

    #[test]
    fn option_lists_are_gated_by_capabilities() {
        let bare = climate_from(&[BASIC, "pow=1,mode=3,stemp=24.0"]);
        assert!(bare.fan_modes().is_empty());
        assert!(bare.swing_modes().is_empty());
        assert!(bare.preset_modes().is_empty());
        let full = climate();
        assert!(!full.fan_modes().is_empty());
        assert_eq!(full.preset_modes(), &[Preset::None, Preset::Away]);
    }

    /// Client whose support flags can be flipped after construction.
    #[derive(Clone, Default)]
    struct FlippableDevice {
        supported: Arc<Mutex<bool>>,
    }

    impl crate::device::DeviceClient for FlippableDevice {
        type Error = std::convert::Infallible;

        fn cached(&self, _: &str) -> Option<String> {
            None
        }

        fn represent(&self, _: &str) -> Option<Representation> {
            None
        }

        async fn write(&self, _: BTreeMap<&'static str, String>) -> Result<(), Self::Error> {
            Ok(())
        }

        async fn set_holiday(&self, _: bool) -> Result<(), Self::Error> {
            Ok(())
        }

        async fn refresh(&self) -> Result<(), Self::Error> {
            Ok(())
        }

        fn supports_away(&self) -> bool {
            *self.supported.lock().unwrap()
        }

        fn supports_fan_rate(&self) -> bool {
            *self.supported.lock().unwrap()
        }

        fn supports_swing(&self) -> bool {
            *self.supported.lock().unwrap()
        }

        fn fan_rate_options(&self) -> Vec<String> {
            if *self.supported.lock().unwrap() { vec!["Auto".to_string()] } else { Vec::new() }
        }

        fn swing_options(&self) -> Vec<String> {
            if *self.supported.lock().unwrap() { vec!["off".to_string()] } else { Vec::new() }
        }

        fn name(&self) -> String {
            "flippable".to_string()
        }

        fn hardware_address(&self) -> String {
            String::new()
        }

        fn device_descriptor(&self) -> String {
            String::new()
        }
    }

    #[test]
    fn capabilities_are_captured_at_construction() {
        let device = FlippableDevice { supported: Arc::new(Mutex::new(true)) };
        let flag = Arc::clone(&device.supported);
        let climate = Climate::new(device);
        *flag.lock().unwrap() = false;
        assert!(climate.capabilities().contains(Capabilities::PRESET));
        assert!(climate.capabilities().contains(Capabilities::FAN));
        assert_eq!(climate.fan_modes(), &["Auto".to_string()]);
        assert_eq!(climate.preset_modes(), &[Preset::None, Preset::Away]);
    }
}
