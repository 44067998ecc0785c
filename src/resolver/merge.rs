//! Element merger: volume deduplication, then the generic merge.
//!
//! Plugins commonly declare the volumes they mount, and several plugins (or
//! the workspace itself) may declare the same one. Before the generic merge,
//! which refuses duplicate names, volumes sharing a name are folded into the
//! first declaration:
//!
//! - the merged volume is persistent if any later declaration sets
//!   `ephemeral: false` explicitly
//! - the merged size is the larger of the two (missing sizes count as `0`)
//!
//! Two volumes with the same name inside the main template are a conflict.

use crate::core::{FlattenError, Result};
use crate::models::{ComponentKind, TemplateSpec, VolumeComponent};
use crate::overriding::{MergeSource, merge_specs};
use crate::utils::Quantity;
use std::collections::HashMap;
use tracing::debug;

/// A resolved plugin fragment with the name of the component that imported it.
#[derive(Debug, Clone)]
pub struct PluginFragment {
    pub label: String,
    pub spec: TemplateSpec,
}

/// Merge `main` with its resolved parent and plugins.
pub fn merge_elements(
    mut main: TemplateSpec,
    mut parent: Option<TemplateSpec>,
    mut plugins: Vec<PluginFragment>,
) -> Result<TemplateSpec> {
    merge_volume_components(&mut main, parent.as_mut(), &mut plugins)?;

    let sources: Vec<MergeSource<'_>> = plugins
        .iter()
        .map(|p| MergeSource {
            label: &p.label,
            spec: &p.spec,
        })
        .collect();
    merge_specs(&main, parent.as_ref(), &sources)
}

/// Location of the first declaration of a volume: fragment index and component index.
type VolumeSlot = (usize, usize);

fn merge_volume_components(
    main: &mut TemplateSpec,
    parent: Option<&mut TemplateSpec>,
    plugins: &mut [PluginFragment],
) -> Result<()> {
    let mut fragments: Vec<&mut TemplateSpec> = vec![main];
    fragments.extend(parent);
    fragments.extend(plugins.iter_mut().map(|p| &mut p.spec));

    let mut volumes: HashMap<String, VolumeSlot> = HashMap::new();
    for (index, component) in fragments[0].components.iter().enumerate() {
        if !matches!(component.kind, ComponentKind::Volume(_)) {
            continue;
        }
        if volumes.insert(component.name.clone(), (0, index)).is_some() {
            return Err(FlattenError::merge_conflict(format!(
                "duplicate volume found in devfile: {}",
                component.name
            )));
        }
    }

    for fragment_index in 1..fragments.len() {
        let components = std::mem::take(&mut fragments[fragment_index].components);
        let mut kept = Vec::with_capacity(components.len());

        for component in components {
            let slot = match &component.kind {
                ComponentKind::Volume(_) => volumes.get(&component.name).copied(),
                _ => {
                    kept.push(component);
                    continue;
                }
            };

            match slot {
                Some((owner, slot)) => {
                    debug!("Merging duplicate volume '{}'", component.name);
                    let existing = if owner == fragment_index {
                        kept.get_mut(slot)
                    } else {
                        fragments[owner].components.get_mut(slot)
                    };
                    if let (Some(ComponentKind::Volume(into)), ComponentKind::Volume(from)) =
                        (existing.map(|c| &mut c.kind), &component.kind)
                    {
                        merge_volume(into, from)?;
                    }
                }
                None => {
                    volumes.insert(component.name.clone(), (fragment_index, kept.len()));
                    kept.push(component);
                }
            }
        }
        fragments[fragment_index].components = kept;
    }

    Ok(())
}

/// Fold `from` into `into`.
fn merge_volume(into: &mut VolumeComponent, from: &VolumeComponent) -> Result<()> {
    if from.ephemeral == Some(false) {
        into.ephemeral = Some(false);
    }

    let size_of = |v: &VolumeComponent| -> Result<Quantity> {
        match v.size.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(size) => Quantity::parse(size),
            None => Ok(Quantity::zero()),
        }
    };
    if size_of(from)? > size_of(into)? {
        into.size = from.size.clone();
    }
    Ok(())
}
