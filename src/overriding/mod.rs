//! Generic merge and override primitives over template specs
//!
//! Two operations combine templates without knowing anything about plugins,
//! parents or contributions:
//!
//! - [`override_spec`] patches existing elements of one spec with partial
//!   elements (plugin overrides, parent overrides, container contributions)
//! - [`merge_specs`] concatenates the elements of several specs, refusing to
//!   silently duplicate an identifier
//!
//! # Override semantics
//!
//! Every override entry names the element it patches (`name`, or `id` for
//! commands). The patch is a JSON deep merge ([`patch::patch_value`]): objects
//! merge recursively, `null` deletes a key, lists of named objects merge by
//! name, everything else replaces. Naming a different union kind (for example
//! `volume` on a container) swaps the kind. Several entries may target the
//! same element; they apply in order. An entry matching no element is an
//! error.
//!
//! # Merge semantics
//!
//! Sources combine in the order parent, plugins, main. Components, commands,
//! projects, starter projects and dependent projects are concatenated;
//! variables and attributes merge as maps where later sources win; events are
//! concatenated.

pub mod patch;

use crate::core::{FlattenError, Result};
use crate::models::{Events, TemplateSpec};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

pub use patch::patch_value;

/// Keys selecting a component kind.
const COMPONENT_KINDS: [&str; 7] = ["container", "volume", "plugin", "kubernetes", "openshift", "image", "custom"];

/// Keys selecting a command kind.
const COMMAND_KINDS: [&str; 4] = ["exec", "apply", "composite", "custom"];

/// Override entries grouped by element kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides<'a> {
    pub components: &'a [Value],
    pub commands: &'a [Value],
    pub projects: &'a [Value],
    pub starter_projects: &'a [Value],
}

impl Overrides<'_> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
            && self.commands.is_empty()
            && self.projects.is_empty()
            && self.starter_projects.is_empty()
    }
}

/// Apply `overrides` to a copy of `spec`.
pub fn override_spec(spec: &TemplateSpec, overrides: &Overrides<'_>) -> Result<TemplateSpec> {
    let mut result = spec.clone();
    if overrides.is_empty() {
        return Ok(result);
    }

    result.components = override_list(&spec.components, overrides.components, "Components", "name", &COMPONENT_KINDS)?;
    result.commands = override_list(&spec.commands, overrides.commands, "Commands", "id", &COMMAND_KINDS)?;
    result.projects = override_list(&spec.projects, overrides.projects, "Projects", "name", &[])?;
    result.starter_projects =
        override_list(&spec.starter_projects, overrides.starter_projects, "StarterProjects", "name", &[])?;

    Ok(result)
}

fn override_list<T>(
    elements: &[T],
    entries: &[Value],
    kind: &str,
    key_field: &str,
    union_keys: &[&str],
) -> Result<Vec<T>>
where
    T: Serialize + DeserializeOwned + Clone,
{
    if entries.is_empty() {
        return Ok(elements.to_vec());
    }

    let override_error = |reason: String| FlattenError::Override {
        reason,
    };

    let mut values: Vec<Value> = elements
        .iter()
        .map(serde_json::to_value)
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| override_error(format!("failed to encode {kind}: {e}")))?;

    let mut unmatched = Vec::new();
    for entry in entries {
        let Some(key) = entry.get(key_field).and_then(Value::as_str) else {
            return Err(override_error(format!("{kind} override entry is missing '{key_field}'")));
        };
        let Some(target) = values.iter_mut().find(|v| v.get(key_field).and_then(Value::as_str) == Some(key)) else {
            unmatched.push(key.to_string());
            continue;
        };

        if let (Some(target_map), Some(entry_map)) = (target.as_object_mut(), entry.as_object()) {
            let new_kind = union_keys.iter().find(|k| entry_map.get(**k).is_some_and(|v| !v.is_null()));
            if let Some(new_kind) = new_kind {
                for old_kind in union_keys.iter().filter(|k| *k != new_kind) {
                    target_map.remove(*old_kind);
                }
            }
        }
        debug!("Overriding {} '{}'", kind.to_lowercase(), key);
        patch_value(target, entry);
    }

    if !unmatched.is_empty() {
        return Err(override_error(format!(
            "Some {kind} do not override any existing element: {}",
            unmatched.join(", ")
        )));
    }

    values
        .into_iter()
        .map(serde_json::from_value)
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| override_error(format!("overridden {kind} are invalid: {e}")))
}

/// A template taking part in a merge, with a label used in conflict messages.
#[derive(Debug, Clone, Copy)]
pub struct MergeSource<'a> {
    pub label: &'a str,
    pub spec: &'a TemplateSpec,
}

/// Merge `main` with its resolved `parent` and `plugins`.
///
/// The result has no parent. Any identifier defined by two sources is a
/// [`FlattenError::MergeConflict`].
pub fn merge_specs(
    main: &TemplateSpec,
    parent: Option<&TemplateSpec>,
    plugins: &[MergeSource<'_>],
) -> Result<TemplateSpec> {
    let mut sources: Vec<MergeSource<'_>> = Vec::with_capacity(plugins.len() + 2);
    if let Some(parent) = parent {
        sources.push(MergeSource {
            label: "parent",
            spec: parent,
        });
    }
    sources.extend_from_slice(plugins);
    sources.push(MergeSource {
        label: "main",
        spec: main,
    });

    let mut merged = TemplateSpec::default();
    let mut components = KeyTracker::new("component");
    let mut commands = KeyTracker::new("command");
    let mut projects = KeyTracker::new("project");
    let mut starter_projects = KeyTracker::new("starter project");
    let mut dependent_projects = KeyTracker::new("dependent project");
    let mut events = Events::default();

    for source in &sources {
        let spec = source.spec;
        for c in &spec.components {
            components.track(&c.name, source.label)?;
            merged.components.push(c.clone());
        }
        for c in &spec.commands {
            commands.track(&c.id, source.label)?;
            merged.commands.push(c.clone());
        }
        for p in &spec.projects {
            projects.track(&p.name, source.label)?;
            merged.projects.push(p.clone());
        }
        for p in &spec.starter_projects {
            starter_projects.track(&p.name, source.label)?;
            merged.starter_projects.push(p.clone());
        }
        for p in &spec.dependent_projects {
            dependent_projects.track(&p.name, source.label)?;
            merged.dependent_projects.push(p.clone());
        }
        for (name, value) in &spec.variables {
            merged.variables.insert(name.clone(), value.clone());
        }
        merged.attributes.extend_from(&spec.attributes);
        if let Some(source_events) = &spec.events {
            events.append(source_events);
        }
    }

    if !events.is_empty() {
        merged.events = Some(events);
    }

    Ok(merged)
}

/// Remembers which source first defined each identifier of one element kind.
struct KeyTracker<'a> {
    kind: &'static str,
    seen: HashMap<String, &'a str>,
}

impl<'a> KeyTracker<'a> {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            seen: HashMap::new(),
        }
    }

    fn track(&mut self, key: &str, source: &'a str) -> Result<()> {
        match self.seen.get(key) {
            Some(first) => Err(FlattenError::merge_conflict(format!(
                "{} '{key}' is defined in both {first} and {source}",
                self.kind
            ))),
            None => {
                self.seen.insert(key.to_string(), source);
                Ok(())
            }
        }
    }
}
