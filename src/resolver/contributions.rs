//! Container contributions: plugin containers merged into a workspace container.
//!
//! A container component carrying `controller.devfile.io/container-contribution: true`
//! is not deployed on its own. Its env, volume mounts, endpoints and other
//! fields are merged into a *target* container instead:
//!
//! 1. the container marked `controller.devfile.io/merge-contribution: true`, or
//! 2. without such a marker, the first container that was not imported by a
//!    plugin (containers inherited from the parent qualify)
//!
//! The target's image is never replaced. Memory and cpu are summed rather
//! than overridden, but only for limits and requests the target (after
//! defaults) already declares. The target records where its contributions
//! came from in `controller.devfile.io/merged-contributions`.

use crate::constants::{
    CONTAINER_CONTRIBUTION_ATTRIBUTE, MERGE_CONTRIBUTION_ATTRIBUTE, MERGED_CONTRIBUTIONS_ATTRIBUTE,
    PARENT_SOURCE_NAME, PLUGIN_SOURCE_ATTRIBUTE,
};
use crate::core::{FlattenError, Result};
use crate::models::{CommandKind, Component, TemplateSpec};
use crate::overriding::{Overrides, override_spec};
use crate::utils::ResourceRequirements;
use tracing::{debug, info};

/// Whether `spec` has at least one contribution and a container to merge it into.
pub fn needs_container_contribution_merge(spec: &TemplateSpec) -> Result<bool> {
    let mut has_contribution = false;
    let mut has_implicit_target = false;

    for component in spec.components.iter().filter(|c| c.container().is_some()) {
        if is_contribution(component)? {
            has_contribution = true;
        } else if is_implicit_target_candidate(component)? {
            has_implicit_target = true;
        }
    }

    let has_target = explicit_merge_target(spec)?.is_some() || has_implicit_target;
    Ok(has_contribution && has_target)
}

/// Merge every contribution of `spec` into its target container.
///
/// `default_resources` fill in limits and requests the target does not
/// declare before contribution resources are added.
pub fn merge_container_contributions(spec: &mut TemplateSpec, default_resources: &ResourceRequirements) -> Result<()> {
    let mut contributions = Vec::new();
    for component in spec.components.iter().filter(|c| c.container().is_some()) {
        if is_contribution(component)? {
            contributions.push(component.clone());
        }
    }

    let target_index = find_merge_target(spec)?;
    let target_name = spec.components[target_index].name.clone();
    info!(
        "Merging {} container contribution(s) into component '{}'",
        contributions.len(),
        target_name
    );
    let merged = merge_contributions_into(&spec.components[target_index], &contributions, default_resources)?;

    let components = std::mem::take(&mut spec.components);
    let mut merged = Some(merged);
    for (index, component) in components.into_iter().enumerate() {
        if index == target_index {
            spec.components.extend(merged.take());
        } else if !contributions.iter().any(|c| c.name == component.name && c.kind == component.kind) {
            spec.components.push(component);
        }
    }

    for command in &mut spec.commands {
        match &mut command.kind {
            CommandKind::Exec(exec) => {
                if contributions.iter().any(|c| c.name == exec.component) {
                    debug!("Redirecting command '{}' to component '{}'", command.id, target_name);
                    exec.component = target_name.clone();
                }
            }
            CommandKind::Apply(apply) => {
                if let Some(contribution) = contributions.iter().find(|c| c.name == apply.component) {
                    return Err(FlattenError::merge_conflict(format!(
                        "apply command {} uses container contribution {} as component",
                        command.id, contribution.name
                    )));
                }
            }
            CommandKind::Composite(_) | CommandKind::Custom(_) => {}
        }
    }

    Ok(())
}

fn is_contribution(component: &Component) -> Result<bool> {
    component.attributes.get_bool(CONTAINER_CONTRIBUTION_ATTRIBUTE, &component.name)
}

/// Not imported, or imported from the parent.
fn is_implicit_target_candidate(component: &Component) -> Result<bool> {
    Ok(match component.attributes.get_string(PLUGIN_SOURCE_ATTRIBUTE, &component.name)? {
        None => true,
        Some(source) => source == PARENT_SOURCE_NAME,
    })
}

/// Index of the single non-contribution container marked as merge target.
///
/// More than one marked container is a conflict.
fn explicit_merge_target(spec: &TemplateSpec) -> Result<Option<usize>> {
    let mut found = None;
    for (index, component) in spec.components.iter().enumerate() {
        if component.container().is_none() || is_contribution(component)? {
            continue;
        }
        if !component.attributes.get_bool(MERGE_CONTRIBUTION_ATTRIBUTE, &component.name)? {
            continue;
        }
        if found.is_some() {
            return Err(FlattenError::merge_conflict(format!(
                "multiple components have the {MERGE_CONTRIBUTION_ATTRIBUTE} attribute set to true"
            )));
        }
        found = Some(index);
    }
    Ok(found)
}

/// Index of the component contributions are merged into.
fn find_merge_target(spec: &TemplateSpec) -> Result<usize> {
    if let Some(index) = explicit_merge_target(spec)? {
        debug!("Using explicit merge target '{}'", spec.components[index].name);
        return Ok(index);
    }

    for (index, component) in spec.components.iter().enumerate().filter(|(_, c)| c.container().is_some()) {
        if is_contribution(component)? {
            continue;
        }
        if is_implicit_target_candidate(component)? {
            debug!("Using first workspace container '{}' as merge target", component.name);
            return Ok(index);
        }
    }

    Err(FlattenError::merge_conflict("couldn't find any merge candidates for container contributions"))
}

fn merge_contributions_into(
    target: &Component,
    contributions: &[Component],
    default_resources: &ResourceRequirements,
) -> Result<Component> {
    let Some(target_container) = target.container() else {
        return Err(FlattenError::merge_conflict(format!(
            "attempting to merge container contributions into non-container component {}",
            target.name
        )));
    };

    let mut total = ResourceRequirements::from_container(target_container)?;
    total.apply_defaults(default_resources);

    let mut patches = Vec::with_capacity(contributions.len());
    let mut merged_from = Vec::with_capacity(contributions.len());
    for contribution in contributions {
        let Some(container) = contribution.container() else {
            return Err(FlattenError::merge_conflict(format!(
                "attempting to merge container contribution from non-container component {}",
                contribution.name
            )));
        };
        total.add(&ResourceRequirements::from_container(container)?);

        let source = contribution
            .attributes
            .get_string(PLUGIN_SOURCE_ATTRIBUTE, &contribution.name)?
            .unwrap_or_else(|| contribution.name.clone());
        merged_from.push(source);

        let mut patch = contribution.clone();
        patch.name = target.name.clone();
        patch.attributes.remove(PLUGIN_SOURCE_ATTRIBUTE);
        if let Some(c) = patch.container_mut() {
            c.image = None;
            c.memory_limit = None;
            c.memory_request = None;
            c.cpu_limit = None;
            c.cpu_request = None;
        }
        patches.push(serde_json::to_value(&patch).map_err(|e| FlattenError::Override {
            reason: format!("failed to encode container contribution {}: {e}", contribution.name),
        })?);
    }

    let single = TemplateSpec {
        components: vec![target.clone()],
        ..Default::default()
    };
    let overridden = override_spec(
        &single,
        &Overrides {
            components: &patches,
            ..Default::default()
        },
    )?;

    let mut merged = overridden.components.into_iter().find(|c| c.name == target.name).ok_or_else(|| {
        FlattenError::merge_conflict(format!("merged component {} is missing after override", target.name))
    })?;

    if let Some(container) = merged.container_mut() {
        total.apply_to_container(container);
    }
    merged.attributes.put_string(MERGED_CONTRIBUTIONS_ATTRIBUTE, merged_from.join(","));
    merged.attributes.remove(MERGE_CONTRIBUTION_ATTRIBUTE);
    merged.attributes.remove(CONTAINER_CONTRIBUTION_ATTRIBUTE);

    Ok(merged)
}
