//! Rule dump input model.
//!
//! A rule dump is the JSON image of what each FormRequest's `rules()` returns:
//!
//! ```text
//! {
//!   "App\\Http\\Requests\\StoreUser": {
//!     "name": "required|string",
//!     "tags": ["nullable", "array"],
//!     "tags.*": ["string", {"rule": "Illuminate\\Validation\\Rules\\In"}]
//!   },
//!   "App\\Http\\Requests\\Ping": null
//! }
//! ```
//!
//! Path order is significant (it becomes annotation order), and a path may
//! legitimately appear twice in the text, so [`RuleSet`] keeps raw entries.
pub mod types;

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde_json::Value;

use crate::diagnostics::Conflict;
use crate::error::{Error, Result};

pub use types::{LeafType, resolve};

/// Segment meaning "every index of the array".
pub const WILDCARD: &str = "*";

/// Separator of the `"required|string"` shorthand.
pub const RULE_SEPARATOR: char = '|';

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleToken {
    /// `"max:255"`, `"nullable"`, ...
    Rule(String),
    /// A validator object or closure; carries its JSON text for logging only.
    Opaque(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleValue {
    Delimited(String),
    List(Vec<RuleToken>),
    Invalid { found: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpec {
    pub path: String,
    pub value: RuleValue,
}

/// Ordered rule entries of one class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    entries: Vec<RuleSpec>,
}

pub enum RuleLookup<'a> {
    /// The class is absent from the dump.
    Missing,
    /// The class exists but exposes no `rules()`.
    NoCapability,
    Rules(&'a RuleSet),
}

#[derive(Debug, Default)]
pub struct RuleDump {
    classes: IndexMap<String, Option<RuleSet>>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl RuleToken {
    fn from_json(value: Value) -> Self {
        match value {
            Value::String(rule) => RuleToken::Rule(rule),
            other => RuleToken::Opaque(other.to_string()),
        }
    }

    pub fn as_rule(&self) -> Option<&str> {
        match self {
            RuleToken::Rule(rule) => Some(rule),
            RuleToken::Opaque(_) => None,
        }
    }
}

impl RuleValue {
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::String(text) => RuleValue::Delimited(text),
            Value::Array(items) => RuleValue::List(items.into_iter().map(RuleToken::from_json).collect()),
            other => RuleValue::Invalid { found: json_kind(&other).to_string() },
        }
    }

    /// Normalize to a token sequence.
    pub fn tokens(&self) -> std::result::Result<Vec<RuleToken>, Conflict> {
        match self {
            RuleValue::Delimited(text) => Ok(text
                .split(RULE_SEPARATOR)
                .map(|rule| RuleToken::Rule(rule.to_string()))
                .collect()),
            RuleValue::List(tokens) => Ok(tokens.clone()),
            RuleValue::Invalid { found } => Err(Conflict::MalformedRules { found: found.clone() }),
        }
    }
}

impl From<&str> for RuleValue {
    fn from(text: &str) -> Self {
        RuleValue::Delimited(text.to_string())
    }
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: impl Into<String>, value: impl Into<RuleValue>) {
        self.entries.push(RuleSpec { path: path.into(), value: value.into() });
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuleSpec> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P: Into<String>, V: Into<RuleValue>> FromIterator<(P, V)> for RuleSet {
    fn from_iter<I: IntoIterator<Item = (P, V)>>(iter: I) -> Self {
        let mut set = RuleSet::new();
        for (path, value) in iter {
            set.push(path, value);
        }
        set
    }
}

impl<'de> Deserialize<'de> for RuleSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct RuleSetVisitor;

        impl<'de> Visitor<'de> for RuleSetVisitor {
            type Value = RuleSet;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping field paths to rules")
            }

            // Entries are collected as-is so repeated keys survive.
            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<RuleSet, A::Error> {
                let mut set = RuleSet::new();
                while let Some((path, value)) = map.next_entry::<String, Value>()? {
                    set.entries.push(RuleSpec { path, value: RuleValue::from_json(value) });
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(RuleSetVisitor)
    }
}

impl RuleDump {
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
        Self::parse(path, &source)
    }

    /// `origin` only labels errors.
    pub fn parse(origin: &Path, source: &str) -> Result<Self> {
        let raw: IndexMap<String, Option<RuleSet>> = crate::path_de::from_str_with_path(origin, source)?;
        let classes = raw
            .into_iter()
            .map(|(class, rules)| (normalize_class_name(&class).to_string(), rules))
            .collect();
        Ok(Self { classes })
    }

    pub fn lookup(&self, class: &str) -> RuleLookup<'_> {
        match self.classes.get(normalize_class_name(class)) {
            None => RuleLookup::Missing,
            Some(None) => RuleLookup::NoCapability,
            Some(Some(rules)) => RuleLookup::Rules(rules),
        }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn normalize_class_name(class: &str) -> &str {
    class.trim_start_matches('\\')
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
