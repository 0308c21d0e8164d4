//! Declarative validation over untyped document trees.
//!
//! A walk applies a set of composable rules to a `serde_json::Value` tree:
//! type requirements, per-key rules over mappings, per-element actions over
//! arrays, and sink-appending extraction. The walk stops at the first
//! rejection anywhere in the tree; extracted data is deposited through
//! caller-supplied sinks as the walk proceeds.
//!
//! Every primitive is generic over the caller's error type `E` with
//! `E: From<WalkError>`, so errors raised inside actions (for example a
//! grammar error while transforming an element) propagate unconverted.

use serde_json::{Map, Value};
use thiserror::Error;

/// Rejection produced when a document node fails a validation rule.
///
/// Carries the human-readable message authored at the rule site.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct WalkError {
    message: String,
}

impl WalkError {
    /// Reject the current node with the given message
    pub fn reject(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message authored at the rule that rejected
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Require the node to be a mapping, yielding its entries
pub fn require_object<'v, E: From<WalkError>>(
    value: &'v Value,
    message: &str,
) -> Result<&'v Map<String, Value>, E> {
    value
        .as_object()
        .ok_or_else(|| WalkError::reject(message).into())
}

/// Require the node to be an array, yielding its elements
pub fn require_array<'v, E: From<WalkError>>(
    value: &'v Value,
    message: &str,
) -> Result<&'v [Value], E> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| WalkError::reject(message).into())
}

/// Require the node to be a string, yielding its text
pub fn require_str<'v, E: From<WalkError>>(value: &'v Value, message: &str) -> Result<&'v str, E> {
    value
        .as_str()
        .ok_or_else(|| WalkError::reject(message).into())
}

/// Apply `action` to every element in document order, stopping at the
/// first rejection
pub fn for_each<E>(
    items: &[Value],
    mut action: impl FnMut(&Value) -> Result<(), E>,
) -> Result<(), E> {
    for item in items {
        action(item)?;
    }
    Ok(())
}

/// Build a rule that appends `transform(value)` to `sink`
pub fn put_into<'a, T, E>(
    sink: &'a mut Vec<T>,
    mut transform: impl FnMut(&Value) -> Result<T, E> + 'a,
) -> impl FnMut(&Value) -> Result<(), E> + 'a {
    move |value| {
        let item = transform(value)?;
        sink.push(item);
        Ok(())
    }
}

type Rule<'a, E> = Box<dyn FnMut(&Value) -> Result<(), E> + 'a>;

struct KeyRule<'a, E> {
    key: &'static str,
    missing: Option<String>,
    rule: Rule<'a, E>,
}

/// Declarative rule set over the keys of a mapping node.
///
/// Rules apply in declaration order. Keys with no rule are ignored, so
/// unrecognized manifest keys never reject.
pub struct Mapping<'a, E> {
    reject: String,
    rules: Vec<KeyRule<'a, E>>,
}

impl<'a, E: From<WalkError>> Mapping<'a, E> {
    /// Create a rule set, rejecting non-mapping nodes with `reject_message`
    pub fn new(reject_message: impl Into<String>) -> Self {
        Self {
            reject: reject_message.into(),
            rules: Vec::new(),
        }
    }

    /// Apply `rule` to the value under `key` when present; an absent key
    /// is a no-op
    pub fn if_key(
        mut self,
        key: &'static str,
        rule: impl FnMut(&Value) -> Result<(), E> + 'a,
    ) -> Self {
        self.rules.push(KeyRule {
            key,
            missing: None,
            rule: Box::new(rule),
        });
        self
    }

    /// Like `if_key`, but an absent key fails the whole walk with
    /// `missing_message`
    pub fn required_key(
        mut self,
        key: &'static str,
        missing_message: impl Into<String>,
        rule: impl FnMut(&Value) -> Result<(), E> + 'a,
    ) -> Self {
        self.rules.push(KeyRule {
            key,
            missing: Some(missing_message.into()),
            rule: Box::new(rule),
        });
        self
    }

    /// Walk `value`, applying the key rules in declaration order and
    /// stopping at the first rejection
    pub fn walk(mut self, value: &Value) -> Result<(), E> {
        let map = require_object::<E>(value, &self.reject)?;
        for entry in &mut self.rules {
            match map.get(entry.key) {
                Some(node) => (entry.rule)(node)?,
                None => {
                    if let Some(message) = &entry.missing {
                        return Err(WalkError::reject(message.clone()).into());
                    }
                }
            }
        }
        Ok(())
    }
}
