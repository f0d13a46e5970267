use std::path::Path;

use json::JsonValue;
use tracing::info;

use crate::error::MicroFeError;

const KNOWN_KEYS: [&str; 4] = [
    "applied_strain",
    "critical_volume_fraction",
    "critical_strain",
    "cdf_tolerance",
];

/// Loading and failure criterion parameters shared by both tools
#[derive(Debug, Clone, PartialEq)]
pub struct StudyParameters {
    /// Applied compressive strain, negative in compression
    pub applied_strain: f64,
    /// Fraction of the most strained tissue that must exceed the critical strain
    pub critical_volume_fraction: f64,
    /// Critical effective strain of the failure criterion
    pub critical_strain: f64,
    /// Acceptance window when matching the empirical CDF
    pub cdf_tolerance: f64,
}

impl Default for StudyParameters {
    fn default() -> Self {
        // Pistoia's criterion: 2% of the tissue above 7000 µε
        StudyParameters {
            applied_strain: -0.01,
            critical_volume_fraction: 0.02,
            critical_strain: 0.007,
            cdf_tolerance: 0.00005,
        }
    }
}

fn read_number(config: &JsonValue, key: &str, target: &mut f64) -> Result<(), MicroFeError> {
    if !config.has_key(key) {
        return Ok(());
    }
    match config[key].as_f64() {
        Some(v) => {
            *target = v;
            Ok(())
        }
        None => Err(MicroFeError::InputParse(format!(
            "Config field {key} must be a number"
        ))),
    }
}

/// Parses study parameters from a json document, falling back to the defaults
/// for absent keys
pub fn parse(contents: &str) -> Result<StudyParameters, MicroFeError> {
    let config = match json::parse(contents) {
        Ok(c) => c,
        Err(err) => {
            return Err(MicroFeError::InputParse(format!(
                "Error in config json: {err}"
            )))
        }
    };

    if !config.is_object() {
        return Err(MicroFeError::InputParse(
            "Config json must be an object".to_owned(),
        ));
    }
    for (key, _) in config.entries() {
        if !KNOWN_KEYS.contains(&key) {
            return Err(MicroFeError::InputParse(format!(
                "Unknown config field {key}"
            )));
        }
    }

    let mut params = StudyParameters::default();
    read_number(&config, "applied_strain", &mut params.applied_strain)?;
    read_number(
        &config,
        "critical_volume_fraction",
        &mut params.critical_volume_fraction,
    )?;
    read_number(&config, "critical_strain", &mut params.critical_strain)?;
    read_number(&config, "cdf_tolerance", &mut params.cdf_tolerance)?;

    if params.applied_strain == 0. {
        return Err(MicroFeError::InputParse(
            "applied_strain must be non-zero".to_owned(),
        ));
    }
    if !(params.critical_volume_fraction > 0. && params.critical_volume_fraction < 1.) {
        return Err(MicroFeError::InputParse(format!(
            "critical_volume_fraction must be between 0 and 1, got {}",
            params.critical_volume_fraction
        )));
    }
    if params.critical_strain <= 0. {
        return Err(MicroFeError::InputParse(
            "critical_strain must be positive".to_owned(),
        ));
    }
    if params.cdf_tolerance <= 0. {
        return Err(MicroFeError::InputParse(
            "cdf_tolerance must be positive".to_owned(),
        ));
    }

    Ok(params)
}

/// Loads study parameters, or the defaults when no config file is given
///
/// # Arguments
/// * `config_file` - Optional path to a json config file
pub fn load(config_file: Option<&Path>) -> Result<StudyParameters, MicroFeError> {
    let path = match config_file {
        Some(p) => p,
        None => return Ok(StudyParameters::default()),
    };

    let contents = std::fs::read_to_string(path).map_err(|err| MicroFeError::io(path, err))?;
    let params = parse(&contents)?;

    info!(
        applied_strain = params.applied_strain,
        critical_volume_fraction = params.critical_volume_fraction,
        critical_strain = params.critical_strain,
        "loaded study parameters from {}",
        path.display()
    );

    Ok(params)
}
