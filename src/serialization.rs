use crate::config::{Config, Value};
use crate::error::{ConfigError, GlpsError};
use crate::machine::LOGGER_NAME;
use log::debug;
use serde::ser::{Serialize, SerializeMap, Serializer};

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Scalar(x) => serializer.serialize_f64(*x),
            Value::Vector(v) => v.serialize(serializer),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Config(list) => list.serialize(serializer),
        }
    }
}

impl Serialize for Config {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Config {
    /// Serializes the configuration into a pretty-printed JSON string.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self)
    }

    /// Serializes the configuration into a YAML string.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self)
    }
}

/// Renders an element list as canonical GLPS source text.
///
/// Each element prints as `name: type;` or `name: type, key = val, ...;`
/// with property keys alphabetically sorted after the fixed `name: type`
/// head, in the order the elements are supplied. A synthetic
/// `default: LINE = (...);` referencing every element in order and a
/// closing `USE: default;` make the output a complete, re-parseable
/// lattice. Property values with no GLPS literal form (nested configs)
/// are skipped.
pub fn print_elements(elements: &[Config]) -> Result<String, GlpsError> {
    let mut out = String::new();
    let mut names: Vec<&str> = Vec::new();

    for (index, element) in elements.iter().enumerate() {
        let name = element
            .get("name")
            .and_then(Value::as_text)
            .ok_or(ConfigError::IncompleteElement { index, key: "name" })?;
        let etype = element
            .get("type")
            .and_then(Value::as_text)
            .ok_or(ConfigError::IncompleteElement { index, key: "type" })?;

        out.push_str(name);
        out.push_str(": ");
        out.push_str(etype);

        let mut properties: Vec<(&str, &Value)> = element
            .iter()
            .filter(|(k, _)| k != "name" && k != "type")
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        properties.sort_by_key(|(k, _)| *k);

        for (key, value) in properties {
            if matches!(value, Value::Config(_)) {
                debug!(
                    target: LOGGER_NAME,
                    "skipping nested config property '{key}' of element '{name}'"
                );
                continue;
            }
            out.push_str(", ");
            out.push_str(key);
            out.push_str(" = ");
            out.push_str(&value.to_string());
        }
        out.push_str(";\n");
        names.push(name);
    }

    out.push_str("default: LINE = (");
    out.push_str(&names.join(", "));
    out.push_str(");\nUSE: default;\n");
    Ok(out)
}

/// Renders the `elements` entry of a parsed configuration as canonical
/// GLPS source text. See [`print_elements`].
pub fn print_config(config: &Config) -> Result<String, GlpsError> {
    match config.get("elements") {
        Some(Value::Config(list)) => print_elements(list),
        Some(other) => Err(ConfigError::ElementShape {
            found: other.type_name(),
        }
        .into()),
        None => Err(ConfigError::MissingElements.into()),
    }
}
