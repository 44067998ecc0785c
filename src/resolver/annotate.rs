//! Provenance attributes on imported elements.

use crate::constants::PLUGIN_SOURCE_ATTRIBUTE;
use crate::models::TemplateSpec;

/// Mark every component, command and project of `spec` as imported by `source`.
///
/// Existing provenance is overwritten, so nested plugins end up attributed to
/// the outermost importer.
pub fn add_source_attributes(spec: &mut TemplateSpec, source: &str) {
    for component in &mut spec.components {
        component.attributes.put_string(PLUGIN_SOURCE_ATTRIBUTE, source);
    }
    for command in &mut spec.commands {
        command.attributes.put_string(PLUGIN_SOURCE_ATTRIBUTE, source);
    }
    for project in spec.projects.iter_mut().chain(&mut spec.starter_projects).chain(&mut spec.dependent_projects) {
        project.attributes.put_string(PLUGIN_SOURCE_ATTRIBUTE, source);
    }
}
