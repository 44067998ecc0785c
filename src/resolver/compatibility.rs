//! Editor compatibility across every imported plugin.
//!
//! Templates may declare the editor they provide (`devworkspace.devfile.io/editor-name`)
//! or the editor they require (`devworkspace.devfile.io/editor-compatibility`).
//! A workspace is valid when at most one editor is provided, by exactly one
//! component, and every requirement names that editor.

use super::context_tree::ResolutionContextTree;
use crate::constants::{EDITOR_COMPATIBILITY_LABEL, EDITOR_NAME_LABEL};
use crate::core::{FlattenError, Result};
use std::collections::BTreeMap;

/// Check the editor labels collected in `tree`.
pub fn check_plugins_compatibility(tree: &ResolutionContextTree) -> Result<()> {
    let mut editors: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut required: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for node in tree.plugins() {
        if let Some(editor) = node.labels.get(EDITOR_NAME_LABEL).filter(|e| !e.is_empty()) {
            editors.entry(editor.as_str()).or_default().push(node.component_name.as_str());
        }
        if let Some(editor) = node.labels.get(EDITOR_COMPATIBILITY_LABEL).filter(|e| !e.is_empty()) {
            required.entry(editor.as_str()).or_default().push(node.component_name.as_str());
        }
    }

    let incompatible = |reason: String| FlattenError::Compatibility {
        reason,
    };

    if editors.is_empty() {
        if required.is_empty() {
            return Ok(());
        }
        let messages: Vec<String> = required
            .iter()
            .map(|(editor, components)| format!("Component(s) [{}] depend on editor {editor}", components.join(", ")))
            .collect();
        return Err(incompatible(format!(
            "invalid plugins defined in devworkspace: no editor defined in workspace but {}",
            messages.join(". ")
        )));
    }

    if editors.len() > 1 {
        let messages: Vec<String> = editors
            .iter()
            .map(|(editor, components)| {
                format!("Component {} defines editor {editor}", components.join(", "))
            })
            .collect();
        return Err(incompatible(format!("devworkspace defines multiple editors: {}", messages.join(", "))));
    }

    let Some((editor, components)) = editors.into_iter().next() else {
        return Ok(());
    };
    if components.len() > 1 {
        return Err(incompatible(format!(
            "multiple components define the same editor: [{}]",
            components.join(", ")
        )));
    }
    let editor_component = components.first().copied().unwrap_or_default();

    for (required_editor, plugins) in &required {
        if *required_editor != editor {
            return Err(incompatible(format!(
                "devworkspace uses editor {editor} (defined in component {editor_component}) but plugins [{}] depend on editor {required_editor}",
                plugins.join(", ")
            )));
        }
    }

    Ok(())
}
