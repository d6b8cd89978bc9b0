//! Pass parameters and their declarative schema.
//!
//! Every pass reads its options out of a [`Params`] map in `configure` and
//! advertises them in `collect_param_descrs`. Missing options fall back to the
//! declared default, which for all budgets is the "no limit" sentinel
//! [`u64::MAX`].

use crate::error::{OxizError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the step budget option.
pub const MAX_STEPS: &str = "max_steps";
/// Name of the memory budget option (bytes).
pub const MAX_MEMORY: &str = "max_memory";
/// Name of the term-ite inflation bound.
pub const MAX_INFLATION: &str = "max_inflation";

/// A parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamValue {
    /// Unsigned integer.
    Uint(u64),
    /// Flag.
    Bool(bool),
}

/// Kind of a declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Unsigned integer.
    Uint,
    /// Flag.
    Bool,
}

impl ParamKind {
    fn expected(self) -> &'static str {
        match self {
            ParamKind::Uint => "unsigned integer",
            ParamKind::Bool => "bool",
        }
    }

    fn matches(self, value: ParamValue) -> bool {
        matches!(
            (self, value),
            (ParamKind::Uint, ParamValue::Uint(_)) | (ParamKind::Bool, ParamValue::Bool(_))
        )
    }
}

/// Name to value map handed to `configure`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    values: BTreeMap<String, ParamValue>,
}

impl Params {
    /// Empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an unsigned option.
    pub fn set_uint(&mut self, name: &str, value: u64) -> &mut Self {
        self.values.insert(name.to_string(), ParamValue::Uint(value));
        self
    }

    /// Set a flag.
    pub fn set_bool(&mut self, name: &str, value: bool) -> &mut Self {
        self.values.insert(name.to_string(), ParamValue::Bool(value));
        self
    }

    /// Parse `text` according to the kind `descrs` declares for `name`.
    pub fn set_str(&mut self, descrs: &ParamDescrs, name: &str, text: &str) -> Result<()> {
        let descr = descrs
            .get(name)
            .ok_or_else(|| OxizError::UnknownParameter(name.to_string()))?;
        let text = text.trim();
        let value = match descr.kind {
            ParamKind::Uint => text
                .parse::<u64>()
                .map(ParamValue::Uint)
                .map_err(|_| OxizError::invalid_parameter(name, text, descr.kind.expected()))?,
            ParamKind::Bool => match text {
                "true" => ParamValue::Bool(true),
                "false" => ParamValue::Bool(false),
                _ => return Err(OxizError::invalid_parameter(name, text, descr.kind.expected())),
            },
        };
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Unsigned option, or `default` when absent or of another kind.
    #[must_use]
    pub fn get_uint(&self, name: &str, default: u64) -> u64 {
        match self.values.get(name) {
            Some(ParamValue::Uint(v)) => *v,
            _ => default,
        }
    }

    /// Flag, or `default` when absent or of another kind.
    #[must_use]
    pub fn get_bool(&self, name: &str, default: bool) -> bool {
        match self.values.get(name) {
            Some(ParamValue::Bool(v)) => *v,
            _ => default,
        }
    }

    /// Raw lookup.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.values.get(name).copied()
    }

    /// Iterate in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of options set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// No option set?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDescr {
    /// Option name.
    pub name: String,
    /// Value kind.
    pub kind: ParamKind,
    /// Value used when the option is not set.
    pub default: ParamValue,
    /// One-line description.
    pub description: String,
}

/// Declarative parameter schema.
#[derive(Debug, Clone, Default)]
pub struct ParamDescrs {
    descrs: BTreeMap<String, ParamDescr>,
}

impl ParamDescrs {
    /// Empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an option. Redeclaring a name keeps the first declaration.
    pub fn insert(&mut self, name: &str, kind: ParamKind, default: ParamValue, description: &str) {
        debug_assert!(kind.matches(default), "default of '{name}' has the wrong kind");
        self.descrs
            .entry(name.to_string())
            .or_insert_with(|| ParamDescr {
                name: name.to_string(),
                kind,
                default,
                description: description.to_string(),
            });
    }

    /// Declare `max_steps`.
    pub fn insert_max_steps(&mut self) {
        self.insert(
            MAX_STEPS,
            ParamKind::Uint,
            ParamValue::Uint(u64::MAX),
            "maximum number of rewrite steps per formula",
        );
    }

    /// Declare `max_memory`.
    pub fn insert_max_memory(&mut self) {
        self.insert(
            MAX_MEMORY,
            ParamKind::Uint,
            ParamValue::Uint(u64::MAX),
            "maximum resident memory in bytes",
        );
    }

    /// Declare `max_inflation`.
    pub fn insert_max_inflation(&mut self) {
        self.insert(
            MAX_INFLATION,
            ParamKind::Uint,
            ParamValue::Uint(u64::MAX),
            "bound on term duplication, as a multiple of the formula size",
        );
    }

    /// Look up a declaration.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamDescr> {
        self.descrs.get(name)
    }

    /// Iterate in name order.
    pub fn iter(&self) -> impl Iterator<Item = &ParamDescr> {
        self.descrs.values()
    }

    /// Number of declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descrs.len()
    }

    /// No declaration?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descrs.is_empty()
    }

    /// Check that every option in `params` is declared with a matching kind.
    pub fn validate(&self, params: &Params) -> Result<()> {
        for (name, value) in params.iter() {
            let descr = self
                .get(name)
                .ok_or_else(|| OxizError::UnknownParameter(name.to_string()))?;
            if !descr.kind.matches(value) {
                let shown = match value {
                    ParamValue::Uint(v) => v.to_string(),
                    ParamValue::Bool(b) => b.to_string(),
                };
                return Err(OxizError::invalid_parameter(name, shown, descr.kind.expected()));
            }
        }
        Ok(())
    }
}
