use crate::config::{Config, Value};
use crate::error::{ConfigError, GlpsError, MachineError};
use log::{debug, info};

/// Name of the log channel used while building machines from parsed
/// configurations. Consumers attach their own sink with `log::set_logger`
/// and filter on this target.
pub const LOGGER_NAME: &str = "glps.machine";

/// Returns the machine-construction log channel name.
pub fn logger_name() -> &'static str {
    LOGGER_NAME
}

/// Sets the process-wide severity threshold gating log emission.
///
/// Idempotent; takes effect for all log calls issued after it returns.
/// The threshold is read-only during parsing and machine construction.
pub fn set_log_threshold(level: log::LevelFilter) {
    log::set_max_level(level);
}

/// Required properties per physical element type.
///
/// The generic scope-resolution contract only knows which keys must be
/// present after the merge; what the simulation backends do with them is
/// their business. Bending elements need a bend angle.
fn required_properties(etype: &str) -> &'static [&'static str] {
    match etype {
        "sbend" | "rbend" => &["phi"],
        _ => &[],
    }
}

/// Scope resolution over a parsed configuration.
///
/// A `Machine` computes each element instance's effective configuration:
/// the globals accumulated strictly before the `elements` entry of the
/// supplied config, overlaid with the instance's own properties (which
/// always win). Entries appearing after `elements` stay visible in the
/// top-level config but never reach any element — pair order is the
/// contract, which is why [`Config`] preserves it.
#[derive(Debug)]
pub struct Machine {
    config: Config,
    elements: Vec<Config>,
}

impl Machine {
    pub fn new(config: Config) -> Result<Self, GlpsError> {
        info!(target: LOGGER_NAME, "constructing machine");

        let mut scope = Config::new();
        let mut instances: Option<&[Config]> = None;
        for (key, value) in config.iter() {
            if key == "elements" {
                match value {
                    Value::Config(list) => instances = Some(list),
                    other => {
                        return Err(ConfigError::ElementShape {
                            found: other.type_name(),
                        }
                        .into())
                    }
                }
                // Snapshot point: globals defined past here are invisible
                // to elements.
                break;
            }
            scope.insert(key.clone(), value.clone());
        }
        let instances = instances.ok_or(ConfigError::MissingElements)?;

        let mut elements = Vec::with_capacity(instances.len());
        for (index, instance) in instances.iter().enumerate() {
            let name = instance
                .get("name")
                .and_then(Value::as_text)
                .ok_or(ConfigError::IncompleteElement { index, key: "name" })?
                .to_string();
            let etype = instance
                .get("type")
                .and_then(Value::as_text)
                .ok_or(ConfigError::IncompleteElement { index, key: "type" })?
                .to_string();

            let mut merged = scope.clone();
            for (key, value) in instance.iter() {
                merged.insert(key.clone(), value.clone());
            }
            merged.sort_keys();

            for &property in required_properties(&etype) {
                if merged.get(property).is_none() {
                    return Err(MachineError::MissingParameter {
                        element: name,
                        property: property.to_string(),
                    }
                    .into());
                }
            }
            debug!(
                target: LOGGER_NAME,
                "resolved element {index} '{name}' ({etype}): {} properties",
                merged.len()
            );
            elements.push(merged);
        }

        debug!(
            target: LOGGER_NAME,
            "complete constructing machine: {} elements",
            elements.len()
        );
        Ok(Machine { config, elements })
    }

    /// The configuration the machine was built from.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The effective, merged configuration of element `index`.
    pub fn conf(&self, index: usize) -> Option<&Config> {
        self.elements.get(index)
    }

    /// Number of element instances.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
