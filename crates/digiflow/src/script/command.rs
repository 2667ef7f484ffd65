//! Automation script parsing.
//!
//! A script is a single line of space-delimited `key:value` tokens.
//! Values containing spaces are wrapped in double quotes, which may
//! enclose the whole token or just the value. The parsed result is an
//! immutable value object handed to the action handlers.

use std::collections::BTreeMap;

use super::ScriptError;

/// A parsed script invocation.
#[derive(Debug, Clone)]
pub struct ScriptCommand {
    action: String,
    params: BTreeMap<String, String>,
    malformed: Vec<String>,
}

impl ScriptCommand {
    /// Parses a script line. Tokens without a `:` separator are
    /// collected as malformed rather than failing the parse; a missing
    /// `action` parameter fails it.
    pub fn parse(script: &str) -> Result<Self, ScriptError> {
        let mut params = BTreeMap::new();
        let mut malformed = Vec::new();

        for token in tokenize(script) {
            match token.split_once(':') {
                Some((key, value)) if !key.is_empty() => {
                    params.insert(key.to_string(), value.to_string());
                }
                _ => malformed.push(token),
            }
        }

        let action = params
            .remove("action")
            .filter(|a| !a.is_empty())
            .ok_or(ScriptError::MissingAction)?;

        Ok(Self {
            action,
            params,
            malformed,
        })
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    /// Looks up an optional parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Looks up a required parameter. Missing or empty values are
    /// rejected.
    pub fn require(&self, name: &str) -> Result<&str, ScriptError> {
        match self.param(name) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(ScriptError::MissingParameter(name.to_string())),
        }
    }

    /// A required parameter that must parse as an integer.
    pub fn require_i64(&self, name: &str) -> Result<i64, ScriptError> {
        let raw = self.require(name)?;
        raw.parse().map_err(|_| ScriptError::InvalidParameter {
            name: name.to_string(),
            reason: format!("'{}' is not a number", raw),
        })
    }

    /// An optional boolean parameter. Only the literals "true" and
    /// "false" are accepted.
    pub fn bool_param(&self, name: &str, default: bool) -> Result<bool, ScriptError> {
        match self.param(name) {
            None => Ok(default),
            Some("true") => Ok(true),
            Some("false") => Ok(false),
            Some(other) => Err(ScriptError::InvalidParameter {
                name: name.to_string(),
                reason: format!("'{}' is not true or false", other),
            }),
        }
    }

    /// Tokens that were not `key:value` shaped.
    pub fn malformed_tokens(&self) -> &[String] {
        &self.malformed
    }
}

/// Splits a script line on whitespace, treating double-quoted spans as
/// literal. Quote characters themselves are dropped.
fn tokenize(script: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in script.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
