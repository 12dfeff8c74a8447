// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Layer parameter dictionaries.
//!
//! Layers are configured from integer-keyed scalar parameters. A
//! [`ParamDict`] can be built programmatically or parsed from a JSON object
//! whose keys are the numeric parameter ids:
//!
//! ```json
//! { "0": 2, "1": 1, "2": 0.5 }
//! ```
//!
//! Missing keys fall back to the caller-supplied default, so layers never
//! fail on absent parameters.

use crate::LayerError;
use std::collections::HashMap;

/// A single scalar parameter value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    /// An integer parameter (flags, enum codes, counts).
    Int(i32),
    /// A float parameter.
    Float(f32),
}

/// Integer-keyed scalar parameters for one layer.
#[derive(Debug, Clone, Default)]
pub struct ParamDict {
    entries: HashMap<i32, ParamValue>,
}

impl ParamDict {
    /// Creates an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an integer parameter.
    pub fn set_int(&mut self, key: i32, value: i32) {
        self.entries.insert(key, ParamValue::Int(value));
    }

    /// Sets a float parameter.
    pub fn set_float(&mut self, key: i32, value: f32) {
        self.entries.insert(key, ParamValue::Float(value));
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: i32) -> bool {
        self.entries.contains_key(&key)
    }

    /// Fetches an integer parameter, falling back to `default` when the
    /// key is absent. A float entry is truncated.
    pub fn get_int(&self, key: i32, default: i32) -> i32 {
        match self.entries.get(&key) {
            Some(ParamValue::Int(v)) => *v,
            Some(ParamValue::Float(f)) => *f as i32,
            None => default,
        }
    }

    /// Fetches a float parameter, falling back to `default` when the key
    /// is absent. An integer entry is widened.
    pub fn get_float(&self, key: i32, default: f32) -> f32 {
        match self.entries.get(&key) {
            Some(ParamValue::Float(f)) => *f,
            Some(ParamValue::Int(v)) => *v as f32,
            None => default,
        }
    }

    /// Parses a dictionary from a JSON object with numeric-string keys.
    ///
    /// Integral JSON numbers become [`ParamValue::Int`]; anything with a
    /// fractional part becomes [`ParamValue::Float`].
    ///
    /// # Errors
    /// Returns [`LayerError::ParamParse`] for malformed JSON, non-numeric
    /// keys, or non-numeric values.
    pub fn from_json(json: &str) -> Result<Self, LayerError> {
        let raw: HashMap<String, serde_json::Value> = serde_json::from_str(json)
            .map_err(|e| LayerError::ParamParse(format!("invalid JSON: {e}")))?;

        let mut dict = Self::new();
        for (key, value) in raw {
            let id: i32 = key.parse().map_err(|_| {
                LayerError::ParamParse(format!("non-numeric parameter key '{key}'"))
            })?;
            match value {
                serde_json::Value::Number(n) => {
                    if let Some(v) = n.as_i64() {
                        dict.set_int(id, v as i32);
                    } else if let Some(f) = n.as_f64() {
                        dict.set_float(id, f as f32);
                    } else {
                        return Err(LayerError::ParamParse(format!(
                            "unrepresentable number for key {id}: {n}"
                        )));
                    }
                }
                other => {
                    return Err(LayerError::ParamParse(format!(
                        "parameter {id} must be a number, got {other}"
                    )));
                }
            }
        }
        Ok(dict)
    }
}
