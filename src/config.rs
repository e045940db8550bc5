use std::fmt;

/// A single GLPS value.
///
/// GLPS is dynamically typed: an assignment or element property holds a
/// scalar, a vector of scalars, quoted text, or a nested configuration list
/// produced by `parse("...")`. There is no implicit coercion between these;
/// every operation that needs a particular variant checks for it and fails
/// with a type error otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A floating-point number. All GLPS arithmetic is done in `f64`.
    Scalar(f64),
    /// A homogeneous vector of scalars, e.g. `[1, 2, 3]`.
    Vector(Vec<f64>),
    /// Quoted text, e.g. `"some text"`.
    Text(String),
    /// A list of nested configurations, as produced by `parse("file")`
    /// and by the synthetic `elements` entry of a parsed lattice.
    Config(Vec<Config>),
}

impl Value {
    /// Returns a human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::Vector(_) => "vector",
            Value::Text(_) => "text",
            Value::Config(_) => "config",
        }
    }

    /// Extracts the scalar, if this value is one.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(x) => Some(*x),
            _ => None,
        }
    }

    /// Extracts the text content, if this value is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the nested configuration list, if present.
    pub fn as_configs(&self) -> Option<&[Config]> {
        match self {
            Value::Config(list) => Some(list),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Scalar(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Vector(v)
    }
}

/// An ordered key → [`Value`] mapping.
///
/// Pair order is significant: the parser emits configs with alphabetically
/// sorted keys (the canonical form), while [`Machine`](crate::machine::Machine)
/// consumes configs whose pair order reflects definition order, so that
/// entries appearing after `elements` stay invisible to element scopes.
/// Keys are unique; inserting an existing key replaces the value in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pairs: Vec<(String, Value)>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Looks up a value by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Inserts a pair, replacing the value in place if the key exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.pairs.push((key, value)),
        }
    }

    /// Sorts the pairs alphabetically by key (the canonical ordering).
    pub fn sort_keys(&mut self) {
        self.pairs.sort_by(|(a, _), (b, _)| a.cmp(b));
    }

    /// Iterates the pairs in their current order.
    pub fn iter(&self) -> impl Iterator<Item = &(String, Value)> {
        self.pairs.iter()
    }

    /// Iterates the keys in their current order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(k, _)| k.as_str())
    }
}

impl FromIterator<(String, Value)> for Config {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut config = Config::new();
        for (k, v) in iter {
            config.insert(k, v);
        }
        config
    }
}

impl<'a> IntoIterator for &'a Config {
    type Item = &'a (String, Value);
    type IntoIter = std::slice::Iter<'a, (String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(x) => write!(f, "{x}"),
            Value::Vector(v) => {
                write!(f, "[")?;
                for (i, x) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{x}")?;
                }
                write!(f, "]")
            }
            Value::Text(s) => write!(f, "\"{s}\""),
            Value::Config(list) => write!(f, "<{} nested configs>", list.len()),
        }
    }
}
