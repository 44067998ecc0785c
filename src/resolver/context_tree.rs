//! Resolution context tree: which plugin imported which.
//!
//! The tree records every plugin expanded during one resolution, rooted at
//! the workspace itself. It serves two purposes:
//!
//! - cycle detection, by comparing a newly added node's import reference
//!   against every ancestor's ([`ResolutionContextTree::check_cycle`])
//! - editor compatibility, by exposing the labels of every imported template
//!   (see `compatibility`)
//!
//! Nodes live in a `petgraph` arena with edges from importer to imported, so
//! walking upward is a lookup of the single incoming edge. Node indices grow
//! in creation order, which keeps traversal order deterministic.

use crate::constants::ROOT_NODE_NAME;
use crate::core::{FlattenError, Result};
use crate::models::ImportReference;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::BTreeMap;
use tracing::debug;

/// One expanded import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextNode {
    /// Name of the plugin component (or contribution) that imported the template
    pub component_name: String,
    /// `None` only for the root
    pub import_reference: Option<ImportReference>,
    /// Labels of the imported template
    pub labels: BTreeMap<String, String>,
}

/// Arena of [`ContextNode`]s with importer -> imported edges.
#[derive(Debug, Clone)]
pub struct ResolutionContextTree {
    graph: DiGraph<ContextNode, ()>,
    root: NodeIndex,
}

impl ResolutionContextTree {
    /// Create a tree holding only the workspace root.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = DiGraph::new();
        let root = graph.add_node(ContextNode {
            component_name: ROOT_NODE_NAME.to_string(),
            import_reference: None,
            labels: BTreeMap::new(),
        });
        Self {
            graph,
            root,
        }
    }

    #[must_use]
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// Add a plugin imported by `parent` and return its node.
    pub fn add_plugin(
        &mut self,
        parent: NodeIndex,
        component_name: impl Into<String>,
        import_reference: ImportReference,
        labels: BTreeMap<String, String>,
    ) -> NodeIndex {
        let node = self.graph.add_node(ContextNode {
            component_name: component_name.into(),
            import_reference: Some(import_reference),
            labels,
        });
        self.graph.add_edge(parent, node, ());
        node
    }

    #[must_use]
    pub fn node(&self, index: NodeIndex) -> Option<&ContextNode> {
        self.graph.node_weight(index)
    }

    /// The importer of `index`, `None` for the root.
    #[must_use]
    pub fn parent_of(&self, index: NodeIndex) -> Option<NodeIndex> {
        self.graph.neighbors_directed(index, Direction::Incoming).next()
    }

    /// Children of `index` in the order they were added.
    #[must_use]
    pub fn children_of(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self.graph.neighbors_directed(index, Direction::Outgoing).collect();
        children.sort();
        children
    }

    /// Every node except the root, in creation order.
    pub fn plugins(&self) -> impl Iterator<Item = &ContextNode> {
        self.graph.node_indices().filter(|i| *i != self.root).filter_map(|i| self.graph.node_weight(i))
    }

    /// Number of imported plugins.
    #[must_use]
    pub fn plugin_count(&self) -> usize {
        self.graph.node_count() - 1
    }

    /// Fail with [`FlattenError::Cycle`] if the reference of `index` also
    /// appears on one of its ancestors.
    pub fn check_cycle(&self, index: NodeIndex) -> Result<()> {
        let Some(reference) = self.node(index).and_then(|n| n.import_reference.as_ref()) else {
            return Ok(());
        };

        let mut current = self.parent_of(index);
        while let Some(ancestor) = current {
            if self.node(ancestor).and_then(|n| n.import_reference.as_ref()) == Some(reference) {
                let chain = self.format_chain(index);
                debug!("Import cycle detected: {}", chain);
                return Err(FlattenError::Cycle {
                    chain,
                });
            }
            current = self.parent_of(ancestor);
        }
        Ok(())
    }

    /// Component names from the root down to `index`, joined with ` -> `.
    #[must_use]
    pub fn format_chain(&self, index: NodeIndex) -> String {
        let mut names = Vec::new();
        let mut current = Some(index);
        while let Some(node) = current {
            if let Some(weight) = self.node(node) {
                names.push(weight.component_name.as_str());
            }
            current = self.parent_of(node);
        }
        names.reverse();
        names.join(" -> ")
    }

    /// Render the tree with box-drawing connectors, one import per line.
    #[must_use]
    pub fn to_tree_string(&self) -> String {
        let mut result = format!("{ROOT_NODE_NAME}\n");
        let children = self.children_of(self.root);
        for (i, child) in children.iter().enumerate() {
            self.build_tree_string(*child, &mut result, "", i == children.len() - 1);
        }
        result
    }

    fn build_tree_string(&self, index: NodeIndex, result: &mut String, prefix: &str, is_last: bool) {
        let connector = if is_last {
            "└── "
        } else {
            "├── "
        };
        if let Some(node) = self.node(index) {
            match &node.import_reference {
                Some(reference) => {
                    result.push_str(&format!("{prefix}{connector}{} ({reference})\n", node.component_name));
                }
                None => result.push_str(&format!("{prefix}{connector}{}\n", node.component_name)),
            }
        }

        let child_prefix = if is_last {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };
        let children = self.children_of(index);
        for (i, child) in children.iter().enumerate() {
            self.build_tree_string(*child, result, &child_prefix, i == children.len() - 1);
        }
    }
}

impl Default for ResolutionContextTree {
    fn default() -> Self {
        Self::new()
    }
}
