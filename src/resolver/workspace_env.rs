//! Workspace-wide environment variables.
//!
//! A component may carry `controller.devfile.io/workspace-env`, a list of
//! `{name, value}` pairs that every container of the workspace should see.
//! Definitions are collected across all components; the same name with two
//! different values is a conflict.

use crate::constants::{PLUGIN_SOURCE_ATTRIBUTE, WORKSPACE_ENV_ATTRIBUTE};
use crate::core::{FlattenError, Result};
use crate::models::{Component, EnvVar, TemplateSpec};
use std::collections::BTreeMap;

/// Append the collected workspace environment to every container, sorted by name.
///
/// Entries a container already carries with the same value are not repeated,
/// so resolving an already resolved spec leaves it unchanged.
pub fn resolve_workspace_env(spec: &mut TemplateSpec) -> Result<()> {
    let workspace_env = collect_workspace_env(spec)?;
    if workspace_env.is_empty() {
        return Ok(());
    }

    for component in &mut spec.components {
        if let Some(container) = component.container_mut() {
            for var in &workspace_env {
                if !container.env.contains(var) {
                    container.env.push(var.clone());
                }
            }
        }
    }
    Ok(())
}

fn collect_workspace_env(spec: &TemplateSpec) -> Result<Vec<EnvVar>> {
    // name -> (value, defining component)
    let mut env: BTreeMap<String, (String, String)> = BTreeMap::new();

    for component in &spec.components {
        let Some(vars) = component.attributes.get_into::<Vec<EnvVar>>(WORKSPACE_ENV_ATTRIBUTE, &component.name)? else {
            continue;
        };
        let source = source_of(component);

        for var in vars {
            if let Some((existing, defined_by)) = env.get(&var.name) {
                if *existing != var.value {
                    return Err(FlattenError::merge_conflict(format!(
                        "conflicting definition of environment variable {} in components '{defined_by}' and '{source}'",
                        var.name
                    )));
                }
                continue;
            }
            env.insert(var.name, (var.value, source.clone()));
        }
    }

    Ok(env.into_iter().map(|(name, (value, _))| EnvVar::new(name, value)).collect())
}

/// Provenance of a component, falling back to its own name.
fn source_of(component: &Component) -> String {
    match component.attributes.get(PLUGIN_SOURCE_ATTRIBUTE) {
        Some(serde_json::Value::String(source)) => source.clone(),
        _ => component.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(yaml: &str) -> TemplateSpec {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_env_is_added_to_every_container() {
        let mut s = spec(
            r#"
components:
  - name: tools
    container:
      image: t
      env: [{name: OWN, value: "1"}]
  - name: editor
    attributes:
      controller.devfile.io/imported-by: che-code
      controller.devfile.io/workspace-env:
        - {name: ZED, value: z}
        - {name: EDITOR, value: code}
    container: {image: e}
  - name: data
    volume: {}
"#,
        );
        resolve_workspace_env(&mut s).unwrap();

        let tools: Vec<_> = s.components[0].container().unwrap().env.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(tools, vec!["OWN", "EDITOR", "ZED"]);
        assert_eq!(s.components[1].container().unwrap().env.len(), 2);
    }

    #[test]
    fn test_conflicting_values() {
        let mut s = spec(
            r#"
components:
  - name: a
    attributes:
      controller.devfile.io/imported-by: plugin-a
      controller.devfile.io/workspace-env: [{name: X, value: "1"}]
    container: {image: a}
  - name: b
    attributes:
      controller.devfile.io/workspace-env: [{name: X, value: "2"}]
    container: {image: b}
"#,
        );
        let err = resolve_workspace_env(&mut s).unwrap_err();
        assert_eq!(
            err.to_string(),
            "conflicting definition of environment variable X in components 'plugin-a' and 'b'"
        );
    }

    #[test]
    fn test_identical_values_are_fine() {
        let mut s = spec(
            r#"
components:
  - name: a
    attributes:
      controller.devfile.io/workspace-env: [{name: X, value: "1"}]
    container: {image: a}
  - name: b
    attributes:
      controller.devfile.io/workspace-env: [{name: X, value: "1"}]
    container: {image: b}
"#,
        );
        resolve_workspace_env(&mut s).unwrap();
        assert_eq!(s.components[0].container().unwrap().env, vec![EnvVar::new("X", "1")]);
    }

    #[test]
    fn test_second_pass_adds_nothing() {
        let mut s = spec(
            r#"
components:
  - name: a
    attributes:
      controller.devfile.io/workspace-env: [{name: X, value: "1"}]
    container: {image: a}
"#,
        );
        resolve_workspace_env(&mut s).unwrap();
        let once = s.clone();
        resolve_workspace_env(&mut s).unwrap();
        assert_eq!(s, once);
    }

    #[test]
    fn test_malformed_attribute() {
        let mut s = spec(
            r#"
components:
  - name: a
    attributes:
      controller.devfile.io/workspace-env: "X=1"
    container: {image: a}
"#,
        );
        let err = resolve_workspace_env(&mut s).unwrap_err();
        assert!(matches!(err, FlattenError::InvalidAttribute { .. }));
    }
}
