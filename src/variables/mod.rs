//! `{{name}}` substitution from a template's `variables` map.
//!
//! Substitution runs over every string value of components, commands,
//! projects and starter projects. Identifiers and the `attributes` bag are
//! left alone. References to
//! variables the template does not define are left untouched and reported in
//! [`VariableWarnings`]; they never fail resolution.

use crate::core::{FlattenError, Result};
use crate::models::TemplateSpec;
use regex::{Captures, Regex};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::OnceLock;

static VARIABLE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn variable_pattern() -> &'static Regex {
    VARIABLE_PATTERN
        .get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.-]+)\s*\}\}").expect("variable pattern is valid"))
}

/// Fields of an element that are never substituted besides its identifier.
const UNSUBSTITUTED_FIELDS: &[&str] = &["attributes"];

/// Undefined variables per element kind, keyed by element name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableWarnings {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub components: BTreeMap<String, BTreeSet<String>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub commands: BTreeMap<String, BTreeSet<String>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub projects: BTreeMap<String, BTreeSet<String>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub starter_projects: BTreeMap<String, BTreeSet<String>>,
}

impl VariableWarnings {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
            && self.commands.is_empty()
            && self.projects.is_empty()
            && self.starter_projects.is_empty()
    }
}

impl fmt::Display for VariableWarnings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups = [
            ("component", &self.components),
            ("command", &self.commands),
            ("project", &self.projects),
            ("starter project", &self.starter_projects),
        ];
        let mut first = true;
        for (kind, elements) in groups {
            for (element, names) in elements {
                if !first {
                    writeln!(f)?;
                }
                first = false;
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                write!(f, "{kind} {element} references undefined variables: {}", names.join(", "))?;
            }
        }
        Ok(())
    }
}

/// Replace variable references in `spec`, returning warnings for undefined ones.
pub fn substitute_variables(spec: &mut TemplateSpec) -> Result<Option<VariableWarnings>> {
    let substituter = Substituter {
        pattern: variable_pattern(),
        variables: &spec.variables,
    };

    let mut warnings = VariableWarnings::default();
    let components = substituter.apply_all(&spec.components, "name", &mut warnings.components)?;
    let commands = substituter.apply_all(&spec.commands, "id", &mut warnings.commands)?;
    let projects = substituter.apply_all(&spec.projects, "name", &mut warnings.projects)?;
    let starter_projects = substituter.apply_all(&spec.starter_projects, "name", &mut warnings.starter_projects)?;

    spec.components = components;
    spec.commands = commands;
    spec.projects = projects;
    spec.starter_projects = starter_projects;

    Ok(if warnings.is_empty() { None } else { Some(warnings) })
}

struct Substituter<'a> {
    pattern: &'a Regex,
    variables: &'a BTreeMap<String, String>,
}

impl Substituter<'_> {
    fn apply_all<T>(
        &self,
        elements: &[T],
        key_field: &str,
        warnings: &mut BTreeMap<String, BTreeSet<String>>,
    ) -> Result<Vec<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        elements
            .iter()
            .map(|element| {
                let mut value = serde_json::to_value(element).map_err(variable_error)?;
                let mut undefined = BTreeSet::new();
                let key = value.get(key_field).and_then(Value::as_str).unwrap_or_default().to_string();

                if let Value::Object(map) = &mut value {
                    for (field, field_value) in map.iter_mut() {
                        if field != key_field && !UNSUBSTITUTED_FIELDS.contains(&field.as_str()) {
                            self.substitute(field_value, &mut undefined);
                        }
                    }
                }
                if !undefined.is_empty() {
                    warnings.entry(key).or_default().extend(undefined);
                }
                serde_json::from_value(value).map_err(variable_error)
            })
            .collect()
    }

    fn substitute(&self, value: &mut Value, undefined: &mut BTreeSet<String>) {
        match value {
            Value::String(s) if s.contains("{{") => {
                let replaced = self.pattern.replace_all(s, |caps: &Captures<'_>| {
                    let name = &caps[1];
                    match self.variables.get(name) {
                        Some(v) => v.clone(),
                        None => {
                            undefined.insert(name.to_string());
                            caps[0].to_string()
                        }
                    }
                });
                *s = replaced.into_owned();
            }
            Value::Array(items) => items.iter_mut().for_each(|i| self.substitute(i, undefined)),
            Value::Object(map) => map.values_mut().for_each(|v| self.substitute(v, undefined)),
            _ => {}
        }
    }
}

fn variable_error(e: serde_json::Error) -> FlattenError {
    FlattenError::Parse {
        what: "template after variable substitution".to_string(),
        reason: e.to_string(),
    }
}
