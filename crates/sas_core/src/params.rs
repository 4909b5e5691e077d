//! Parameter schemas owned by summarization backends.
//!
//! A backend declares the keys it accepts, their kinds and defaults in a
//! [`ConfigSchema`]. [`ConfigSchema::resolve`] turns a caller-supplied
//! parameter map into [`ResolvedParams`], rejecting unknown keys, wrong
//! value types and out-of-range numbers instead of substituting defaults.

use std::collections::BTreeMap;
use std::fmt;

use crate::types::{ParamValue, SummarizationMethod};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    /// Finite float greater than zero.
    PositiveFloat,
    /// Float in (0, 1].
    Ratio,
    /// Integer greater than zero.
    PositiveInt,
    /// Any finite float.
    Float,
    Bool,
    /// One of a fixed set of strings.
    Choice(&'static [&'static str]),
}

impl ParamKind {
    /// Checks `value` against this kind, widening integers where a float is
    /// expected.
    fn check(&self, value: &ParamValue) -> std::result::Result<ParamValue, String> {
        match self {
            ParamKind::PositiveFloat | ParamKind::Ratio | ParamKind::Float => {
                let x = value
                    .as_f64()
                    .ok_or_else(|| format!("expected a number, got {}", value.type_name()))?;
                if !x.is_finite() {
                    return Err(format!("expected a finite number, got {}", x));
                }
                match self {
                    ParamKind::PositiveFloat if x <= 0.0 => Err(format!("must be positive, got {}", x)),
                    ParamKind::Ratio if x <= 0.0 || x > 1.0 => {
                        Err(format!("must be in (0, 1], got {}", x))
                    }
                    _ => Ok(ParamValue::Float(x)),
                }
            }
            ParamKind::PositiveInt => match value {
                ParamValue::Int(i) if *i > 0 => Ok(ParamValue::Int(*i)),
                ParamValue::Int(i) => Err(format!("must be a positive integer, got {}", i)),
                other => Err(format!("expected an integer, got {}", other.type_name())),
            },
            ParamKind::Bool => match value {
                ParamValue::Bool(b) => Ok(ParamValue::Bool(*b)),
                other => Err(format!("expected a bool, got {}", other.type_name())),
            },
            ParamKind::Choice(options) => match value {
                ParamValue::Text(s) if options.contains(&s.as_str()) => Ok(value.clone()),
                ParamValue::Text(s) => Err(format!("'{}' is not one of {}", s, options.join(", "))),
                other => Err(format!("expected a string, got {}", other.type_name())),
            },
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::PositiveFloat => f.write_str("float > 0"),
            ParamKind::Ratio => f.write_str("float in (0, 1]"),
            ParamKind::PositiveInt => f.write_str("integer > 0"),
            ParamKind::Float => f.write_str("float"),
            ParamKind::Bool => f.write_str("bool"),
            ParamKind::Choice(options) => write!(f, "one of {}", options.join("|")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub default: ParamValue,
}

/// Cross-parameter rule checked after every key is individually valid.
pub type Constraint = fn(&ResolvedParams) -> std::result::Result<(), String>;

#[derive(Clone)]
pub struct ConfigSchema {
    method: SummarizationMethod,
    specs: Vec<ParamSpec>,
    constraints: Vec<Constraint>,
}

impl fmt::Debug for ConfigSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigSchema")
            .field("method", &self.method)
            .field("specs", &self.specs)
            .field("constraints", &self.constraints.len())
            .finish()
    }
}

impl ConfigSchema {
    pub fn new(method: SummarizationMethod) -> Self {
        Self {
            method,
            specs: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn param(mut self, name: &'static str, kind: ParamKind, default: impl Into<ParamValue>) -> Self {
        self.specs.push(ParamSpec {
            name,
            kind,
            default: default.into(),
        });
        self
    }

    pub fn constraint(mut self, rule: Constraint) -> Self {
        self.constraints.push(rule);
        self
    }

    pub fn method(&self) -> SummarizationMethod {
        self.method
    }

    pub fn specs(&self) -> &[ParamSpec] {
        &self.specs
    }

    fn spec(&self, name: &str) -> Option<&ParamSpec> {
        self.specs.iter().find(|spec| spec.name == name)
    }

    /// Validates `params` and fills in defaults for missing keys.
    pub fn resolve(&self, params: &BTreeMap<String, ParamValue>) -> Result<ResolvedParams> {
        let mut values = BTreeMap::new();
        for (key, value) in params {
            let spec = self.spec(key).ok_or_else(|| {
                let known: Vec<_> = self.specs.iter().map(|s| s.name).collect();
                Error::invalid_config(
                    self.method,
                    format!("unknown parameter '{}' (accepted: {})", key, known.join(", ")),
                )
            })?;
            let value = spec
                .kind
                .check(value)
                .map_err(|reason| Error::invalid_config(self.method, format!("'{}' {}", key, reason)))?;
            values.insert(key.clone(), value);
        }
        for spec in &self.specs {
            values
                .entry(spec.name.to_string())
                .or_insert_with(|| spec.default.clone());
        }
        let resolved = ResolvedParams {
            method: self.method,
            values,
        };
        for rule in &self.constraints {
            rule(&resolved).map_err(|reason| Error::invalid_config(self.method, reason))?;
        }
        Ok(resolved)
    }

    /// The validated parameters that differ from their defaults, in key
    /// order.
    pub fn non_default(&self, params: &BTreeMap<String, ParamValue>) -> Result<Vec<(String, ParamValue)>> {
        let resolved = self.resolve(params)?;
        Ok(resolved
            .values
            .into_iter()
            .filter(|(key, value)| {
                self.spec(key)
                    .map(|spec| !same_value(&spec.default, value))
                    .unwrap_or(true)
            })
            .collect())
    }
}

fn same_value(a: &ParamValue, b: &ParamValue) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Parameters validated against a [`ConfigSchema`], with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParams {
    method: SummarizationMethod,
    values: BTreeMap<String, ParamValue>,
}

impl ResolvedParams {
    fn get(&self, name: &str) -> Result<&ParamValue> {
        self.values
            .get(name)
            .ok_or_else(|| Error::invalid_config(self.method, format!("missing parameter '{}'", name)))
    }

    fn mismatch(&self, name: &str, expected: &str) -> Error {
        Error::invalid_config(self.method, format!("'{}' is not {}", name, expected))
    }

    pub fn f64(&self, name: &str) -> Result<f64> {
        self.get(name)?.as_f64().ok_or_else(|| self.mismatch(name, "a number"))
    }

    pub fn usize(&self, name: &str) -> Result<usize> {
        match self.get(name)? {
            ParamValue::Int(i) => usize::try_from(*i).map_err(|_| self.mismatch(name, "a non-negative integer")),
            _ => Err(self.mismatch(name, "an integer")),
        }
    }

    pub fn bool(&self, name: &str) -> Result<bool> {
        match self.get(name)? {
            ParamValue::Bool(b) => Ok(*b),
            _ => Err(self.mismatch(name, "a bool")),
        }
    }

    pub fn str(&self, name: &str) -> Result<&str> {
        match self.get(name)? {
            ParamValue::Text(s) => Ok(s),
            _ => Err(self.mismatch(name, "a string")),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENGINES: &[&str] = &["davinci", "ada"];

    fn schema() -> ConfigSchema {
        ConfigSchema::new(SummarizationMethod::Gpt3)
            .param("ratio", ParamKind::Ratio, 0.2)
            .param("beams", ParamKind::PositiveInt, 4)
            .param("penalty", ParamKind::Float, 0.1)
            .param("sample", ParamKind::Bool, false)
            .param("engine", ParamKind::Choice(ENGINES), "davinci")
            .constraint(|p| match (p.bool("sample"), p.usize("beams")) {
                (Ok(true), Ok(beams)) if beams > 1 => Err("sampling needs a single beam".to_string()),
                _ => Ok(()),
            })
    }

    fn params(items: &[(&str, ParamValue)]) -> BTreeMap<String, ParamValue> {
        items.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_defaults_fill_missing_keys() {
        let resolved = schema().resolve(&BTreeMap::new()).unwrap();
        assert_eq!(resolved.f64("ratio").unwrap(), 0.2);
        assert_eq!(resolved.usize("beams").unwrap(), 4);
        assert!(!resolved.bool("sample").unwrap());
        assert_eq!(resolved.str("engine").unwrap(), "davinci");
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = schema().resolve(&params(&[("ratoi", ParamValue::Float(0.1))])).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { method: SummarizationMethod::Gpt3, .. }));
        assert!(err.to_string().contains("ratoi"));
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        let s = schema();
        for bad in [
            params(&[("ratio", ParamValue::Float(0.0))]),
            params(&[("ratio", ParamValue::Float(1.5))]),
            params(&[("ratio", ParamValue::Float(f64::NAN))]),
            params(&[("beams", ParamValue::Int(0))]),
            params(&[("beams", ParamValue::Float(2.5))]),
            params(&[("sample", ParamValue::from("yes"))]),
            params(&[("engine", ParamValue::from("gpt-9"))]),
            params(&[("penalty", ParamValue::Bool(true))]),
        ] {
            assert!(
                matches!(s.resolve(&bad), Err(Error::ConfigValidation { .. })),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_constraints_run_after_defaults() {
        let s = schema();
        assert!(s.resolve(&params(&[("sample", ParamValue::Bool(true)), ("beams", ParamValue::Int(1))])).is_ok());
        let err = s.resolve(&params(&[("sample", ParamValue::Bool(true))])).unwrap_err();
        assert!(err.to_string().contains("single beam"));
    }

    #[test]
    fn test_integers_widen_to_floats() {
        let resolved = schema().resolve(&params(&[("ratio", ParamValue::Int(1)), ("penalty", ParamValue::Int(-2))])).unwrap();
        assert_eq!(resolved.f64("ratio").unwrap(), 1.0);
        assert_eq!(resolved.f64("penalty").unwrap(), -2.0);
    }

    #[test]
    fn test_non_default_drops_defaults() {
        let s = schema();
        let non_default = s
            .non_default(&params(&[("ratio", ParamValue::Float(0.2)), ("beams", ParamValue::Int(6)), ("engine", ParamValue::from("ada"))]))
            .unwrap();
        assert_eq!(
            non_default,
            vec![
                ("beams".to_string(), ParamValue::Int(6)),
                ("engine".to_string(), ParamValue::Text("ada".to_string())),
            ]
        );
    }
}
