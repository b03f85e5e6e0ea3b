//! Validation and merging of arguments supplied by a loaded target config.
//!
//! A target config may only set arguments the base target lists under
//! `dynamicArgs`. Arguments are checked leaf by leaf, each leaf identified by
//! its path (`env`, `resources.replicas`, `hosts[0]`). A declared name admits
//! the path itself and every path nested below it.

use regex::Regex;
use serde_json::{Map, Value};

use crate::core::TargetError;
use crate::project::DynamicArg;

/// Visit every leaf of `args` with its path.
///
/// Empty mappings and sequences count as leaves.
pub fn for_each_leaf<F>(args: &Map<String, Value>, mut f: F) -> Result<(), TargetError>
where
    F: FnMut(&str, &Value) -> Result<(), TargetError>,
{
    fn walk<F>(path: &str, value: &Value, f: &mut F) -> Result<(), TargetError>
    where
        F: FnMut(&str, &Value) -> Result<(), TargetError>,
    {
        match value {
            Value::Object(map) if !map.is_empty() => {
                for (key, child) in map {
                    walk(&format!("{path}.{key}"), child, f)?;
                }
                Ok(())
            }
            Value::Array(items) if !items.is_empty() => {
                for (i, child) in items.iter().enumerate() {
                    walk(&format!("{path}[{i}]"), child, f)?;
                }
                Ok(())
            }
            _ => f(path, value),
        }
    }

    for (key, value) in args {
        walk(key, value, &mut f)?;
    }
    Ok(())
}

/// String form of a leaf used for pattern checks.
#[must_use]
pub fn leaf_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Whether `declared` admits the leaf at `path`.
fn admits(declared: &str, path: &str) -> bool {
    path.strip_prefix(declared)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.') || rest.starts_with('['))
}

/// Checks loaded arguments against a target's `dynamicArgs`.
#[derive(Debug)]
pub struct DynamicArgValidator {
    target: String,
    allowed: Vec<(String, Option<Regex>)>,
}

impl DynamicArgValidator {
    /// Compile the declarations of `target_name`.
    pub fn new(target_name: &str, dynamic_args: &[DynamicArg]) -> Result<Self, TargetError> {
        let allowed = dynamic_args
            .iter()
            .map(|arg| {
                let pattern = arg
                    .pattern
                    .as_deref()
                    .map(|p| {
                        Regex::new(&format!("^(?:{p})$")).map_err(|e| TargetError::PatternError {
                            pattern: p.to_string(),
                            reason: e.to_string(),
                        })
                    })
                    .transpose()?;
                Ok((arg.name.clone(), pattern))
            })
            .collect::<Result<_, TargetError>>()?;

        Ok(Self {
            target: target_name.to_string(),
            allowed,
        })
    }

    /// Check one leaf.
    pub fn check(&self, path: &str, value: &Value) -> Result<(), TargetError> {
        let mut declared = self.allowed.iter().filter(|(name, _)| admits(name, path)).peekable();
        if declared.peek().is_none() {
            return Err(TargetError::ValidationError {
                target: self.target.clone(),
                path: path.to_string(),
                reason: "not declared in dynamicArgs".to_string(),
            });
        }

        let s = leaf_to_string(value);
        for (name, pattern) in declared {
            if let Some(re) = pattern
                && !re.is_match(&s)
            {
                return Err(TargetError::ValidationError {
                    target: self.target.clone(),
                    path: path.to_string(),
                    reason: format!("value '{s}' does not match pattern '{}' of '{name}'", re.as_str()),
                });
            }
        }
        Ok(())
    }

    /// Check every leaf of `args`, stopping at the first rejected one.
    pub fn check_all(&self, args: &Map<String, Value>) -> Result<(), TargetError> {
        for_each_leaf(args, |path, value| self.check(path, value))
    }
}

/// Merge `overlay` into `base`.
///
/// Nested mappings merge key by key, anything else in `overlay` replaces the
/// value in `base`.
pub fn deep_merge(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => deep_merge(existing, incoming),
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    fn declared(names: &[&str]) -> Vec<DynamicArg> {
        names
            .iter()
            .map(|n| DynamicArg {
                name: (*n).to_string(),
                pattern: None,
            })
            .collect()
    }

    #[test]
    fn test_leaf_paths() {
        let args = map(json!({"a": {"b": 1, "c": [true, {"d": "x"}]}, "e": {}, "f": null}));
        let mut paths = Vec::new();
        for_each_leaf(&args, |p, _| {
            paths.push(p.to_string());
            Ok(())
        })
        .unwrap();
        paths.sort();
        assert_eq!(paths, vec!["a.b", "a.c[0]", "a.c[1].d", "e", "f"]);
    }

    #[test]
    fn test_undeclared_arg_rejected() {
        let validator = DynamicArgValidator::new("prod", &declared(&["env"])).unwrap();
        let err = validator.check_all(&map(json!({"foo": "bar"}))).unwrap_err();
        match err {
            TargetError::ValidationError {
                target,
                path,
                ..
            } => {
                assert_eq!(target, "prod");
                assert_eq!(path, "foo");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_declared_name_admits_nested_paths() {
        let validator = DynamicArgValidator::new("t", &declared(&["resources", "hosts"])).unwrap();
        validator.check_all(&map(json!({"resources": {"cpu": "1", "mem": {"limit": "2G"}}}))).unwrap();
        validator.check_all(&map(json!({"hosts": ["a", "b"]}))).unwrap();
        assert!(validator.check_all(&map(json!({"resourcesx": 1}))).is_err());
    }

    #[test]
    fn test_nested_declaration_does_not_admit_parent_siblings() {
        let validator = DynamicArgValidator::new("t", &declared(&["a.b"])).unwrap();
        validator.check_all(&map(json!({"a": {"b": 1}}))).unwrap();
        let err = validator.check_all(&map(json!({"a": {"b": 1, "c": 2}}))).unwrap_err();
        assert!(matches!(err, TargetError::ValidationError { ref path, .. } if path == "a.c"));
    }

    #[test]
    fn test_pattern_checked_against_string_form() {
        let args = vec![DynamicArg {
            name: "replicas".to_string(),
            pattern: Some("[0-9]+".to_string()),
        }];
        let validator = DynamicArgValidator::new("t", &args).unwrap();
        validator.check_all(&map(json!({"replicas": 3}))).unwrap();
        validator.check_all(&map(json!({"replicas": "12"}))).unwrap();
        assert!(validator.check_all(&map(json!({"replicas": "3x"}))).is_err());
    }

    #[test]
    fn test_invalid_arg_pattern() {
        let args = vec![DynamicArg {
            name: "x".to_string(),
            pattern: Some("(".to_string()),
        }];
        assert!(matches!(
            DynamicArgValidator::new("t", &args),
            Err(TargetError::PatternError { .. })
        ));
    }

    #[test]
    fn test_deep_merge() {
        let mut base = map(json!({"env": "dev", "res": {"cpu": "1", "mem": "1G"}, "list": [1, 2]}));
        deep_merge(&mut base, map(json!({"env": "prod", "res": {"cpu": "2"}, "list": [3], "new": true})));
        assert_eq!(
            Value::Object(base),
            json!({"env": "prod", "res": {"cpu": "2", "mem": "1G"}, "list": [3], "new": true})
        );
    }
}
