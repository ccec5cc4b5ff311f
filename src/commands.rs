pub mod attributes {
    use strum::VariantArray as _;

    use crate::attributes::{Attribute, HvacMode, Preset};

    /// List the canonical climate attributes and how they translate to
    /// the unit's native keys and tokens.
    #[derive(clap::Parser)]
    pub struct Args {
        /// Only show attributes whose name or device key contains this
        /// string.
        filter: Option<String>,
        #[clap(flatten)]
        output: crate::output::Args,
    }

    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        #[error("could not produce the attribute listing")]
        Output(#[source] crate::output::Error),
    }

    #[derive(serde::Serialize)]
    pub struct TokenPair {
        pub canonical: &'static str,
        pub device: &'static str,
    }

    #[derive(serde::Serialize)]
    pub struct AttributeSchema {
        pub attribute: &'static str,
        pub device_key: &'static str,
        pub kind: &'static str,
        pub settable: bool,
        pub tokens: Vec<TokenPair>,
    }

    impl AttributeSchema {
        pub fn new(attribute: Attribute) -> Self {
            Self {
                attribute: attribute.into(),
                device_key: attribute.device_key(),
                kind: attribute.kind().into(),
                settable: attribute.settable(),
                tokens: token_pairs(attribute),
            }
        }

        fn is_match(&self, pattern: &str) -> bool {
            let pattern = pattern.to_ascii_lowercase();
            self.attribute.contains(&pattern) || self.device_key.contains(&pattern)
        }
    }

    /// The fan and swing token lists vary per unit and are captured
    /// from the device client at adapter construction, so only the
    /// fixed mode and preset tables are listed here.
    fn token_pairs(attribute: Attribute) -> Vec<TokenPair> {
        match attribute {
            Attribute::HvacMode => HvacMode::VARIANTS
                .iter()
                .map(|&mode| TokenPair { canonical: mode.into(), device: mode.device_token() })
                .collect(),
            Attribute::PresetMode => Preset::VARIANTS
                .iter()
                .map(|&preset| {
                    TokenPair { canonical: preset.into(), device: preset.holiday_token() }
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn run(args: Args) -> Result<(), Error> {
        let mut output = args.output.into_output().map_err(Error::Output)?;
        output
            .headers(vec!["Attribute", "Device key", "Kind", "Settable", "Tokens"])
            .map_err(Error::Output)?;
        for &attribute in Attribute::VARIANTS {
            let schema = AttributeSchema::new(attribute);
            if let Some(pattern) = &args.filter {
                if !schema.is_match(pattern) {
                    continue;
                }
            }
            output
                .result(
                    || {
                        let tokens = schema
                            .tokens
                            .iter()
                            .map(|pair| format!("{}={}", pair.canonical, pair.device))
                            .collect::<Vec<_>>()
                            .join(" ");
                        vec![
                            schema.attribute.to_string(),
                            schema.device_key.to_string(),
                            schema.kind.to_string(),
                            schema.settable.to_string(),
                            tokens,
                        ]
                    },
                    || &schema,
                )
                .map_err(Error::Output)?;
        }
        output.commit().map_err(Error::Output)
    }
}

pub mod state {
    use std::path::PathBuf;

    use strum::VariantArray as _;

    use crate::attributes::Attribute;
    use crate::climate::{Climate, Reading};
    use crate::device::DeviceClient;
    use crate::snapshot::{Snapshot, SnapshotDevice};

    /// Decode a saved device response dump into the canonical climate
    /// state.
    ///
    /// The dump is the raw text of the unit's basic/control/sensor
    /// responses, one response per line.
    #[derive(clap::Parser)]
    pub struct Args {
        /// Read the dump from this file instead of standard input.
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,
        #[clap(flatten)]
        output: crate::output::Args,
    }

    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        #[error("could not read the dump at {1:?}")]
        ReadFile(#[source] std::io::Error, PathBuf),
        #[error("could not read the dump from standard input")]
        ReadStdin(#[source] std::io::Error),
        #[error("could not parse the dump")]
        Parse(#[source] crate::snapshot::ParseError),
        #[error("could not produce the state listing")]
        Output(#[source] crate::output::Error),
    }

    #[derive(serde::Serialize)]
    struct StateRecord<'a> {
        attribute: &'static str,
        device_key: &'static str,
        raw: Option<String>,
        value: Option<&'a Reading>,
    }

    pub(super) fn read_dump(input: &Option<PathBuf>) -> Result<String, Error> {
        match input {
            Some(path) => {
                std::fs::read_to_string(path).map_err(|e| Error::ReadFile(e, path.clone()))
            }
            None => std::io::read_to_string(std::io::stdin()).map_err(Error::ReadStdin),
        }
    }

    pub fn run(args: Args) -> Result<(), Error> {
        let dump = read_dump(&args.input)?;
        let snapshot = Snapshot::parse(&dump).map_err(Error::Parse)?;
        let climate = Climate::new(SnapshotDevice::new(snapshot));
        let mut output = args.output.into_output().map_err(Error::Output)?;
        output
            .headers(vec!["Attribute", "Device key", "Raw", "Value"])
            .map_err(Error::Output)?;
        for &attribute in Attribute::VARIANTS {
            let raw = climate.device().cached(attribute.device_key());
            let reading = climate.get(attribute);
            output
                .result(
                    || {
                        vec![
                            attribute.to_string(),
                            attribute.device_key().to_string(),
                            raw.clone().unwrap_or_default(),
                            reading
                                .as_ref()
                                .map_or_else(|| "unknown".to_string(), Reading::to_string),
                        ]
                    },
                    || StateRecord {
                        attribute: attribute.into(),
                        device_key: attribute.device_key(),
                        raw: raw.clone(),
                        value: reading.as_ref(),
                    },
                )
                .map_err(Error::Output)?;
        }
        output.commit().map_err(Error::Output)
    }
}

pub mod plan {
    use std::path::PathBuf;

    use crate::attributes::{HvacMode, Preset};
    use crate::climate::{Climate, Settings};
    use crate::snapshot::{Snapshot, SnapshotDevice};

    /// Dry-run the write path against a saved device response dump:
    /// print the raw calls that would be issued for the requested
    /// settings, without talking to anything.
    #[derive(clap::Parser)]
    pub struct Args {
        /// Read the dump from this file instead of standard input.
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,
        /// Canonical operating mode to request (e.g. `cool`,
        /// `heat_cool`, `off`).
        #[arg(long, value_parser = parse_hvac_mode)]
        hvac_mode: Option<HvacMode>,
        /// Fan speed name to request, validated against the unit's
        /// option list.
        #[arg(long)]
        fan_mode: Option<String>,
        /// Swing position to request, validated against the unit's
        /// option list.
        #[arg(long)]
        swing_mode: Option<String>,
        /// Target temperature in degrees Celsius.
        #[arg(long)]
        temperature: Option<f64>,
        /// Preset to request through the dedicated holiday call
        /// (`away` or `none`).
        #[arg(long, value_parser = parse_preset)]
        preset: Option<Preset>,
        #[clap(flatten)]
        output: crate::output::Args,
    }

    fn parse_hvac_mode(value: &str) -> Result<HvacMode, strum::ParseError> {
        value.parse()
    }

    fn parse_preset(value: &str) -> Result<Preset, strum::ParseError> {
        value.parse()
    }

    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        #[error(transparent)]
        ReadDump(super::state::Error),
        #[error("could not parse the dump")]
        Parse(#[source] crate::snapshot::ParseError),
        #[error("could not start the async runtime")]
        BuildRuntime(#[source] std::io::Error),
        #[error("could not produce the call listing")]
        Output(#[source] crate::output::Error),
    }

    #[derive(serde::Serialize)]
    struct CallRecord {
        call: &'static str,
        key: Option<&'static str>,
        value: String,
    }

    pub fn run(args: Args) -> Result<(), Error> {
        let dump = super::state::read_dump(&args.input).map_err(Error::ReadDump)?;
        let snapshot = Snapshot::parse(&dump).map_err(Error::Parse)?;
        let climate = Climate::new(SnapshotDevice::new(snapshot));
        let settings = Settings {
            target_temperature: args.temperature,
            hvac_mode: args.hvac_mode,
            fan_mode: args.fan_mode.clone(),
            swing_mode: args.swing_mode.clone(),
        };
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(Error::BuildRuntime)?;
        runtime
            .block_on(async {
                climate.apply(settings).await?;
                if let Some(preset) = args.preset {
                    climate.set_preset(preset).await?;
                }
                Ok(())
            })
            .unwrap_or_else(|e: std::convert::Infallible| match e {});

        let mut output = args.output.into_output().map_err(Error::Output)?;
        output.headers(vec!["Call", "Key", "Value"]).map_err(Error::Output)?;
        let journal = climate.device().journal();
        for batch in &journal.writes {
            if batch.is_empty() {
                output
                    .result(
                        || vec!["write".to_string(), String::new(), "(empty batch)".to_string()],
                        || CallRecord { call: "write", key: None, value: String::new() },
                    )
                    .map_err(Error::Output)?;
                continue;
            }
            for (&key, value) in batch {
                output
                    .result(
                        || vec!["write".to_string(), key.to_string(), value.clone()],
                        || CallRecord { call: "write", key: Some(key), value: value.clone() },
                    )
                    .map_err(Error::Output)?;
            }
        }
        for &enabled in &journal.holiday_calls {
            let token = if enabled { "on" } else { "off" };
            output
                .result(
                    || vec!["set_holiday".to_string(), String::new(), token.to_string()],
                    || CallRecord { call: "set_holiday", key: None, value: token.to_string() },
                )
                .map_err(Error::Output)?;
        }
        drop(journal);
        output.commit().map_err(Error::Output)
    }
}
