//! Data model for DevWorkspace templates
//!
//! These types mirror the wire format of the `workspace.devfile.io/v1alpha2`
//! API closely enough to round-trip documents through serde, while giving the
//! resolver typed access to the fields it actually reads:
//!
//! - [`TemplateSpec`] - parent, components, commands, projects, events, attributes
//! - [`Component`] / [`ComponentKind`] - the component union (container, volume, plugin, ...)
//! - [`Command`] / [`CommandKind`] - exec, apply, composite and custom commands
//! - [`ImportReference`] - validated plugin/parent source
//! - [`Attributes`] - string-keyed bag with typed, fallible accessors
//! - [`TemplateDocument`] - devfile / DevWorkspace / DevWorkspaceTemplate shape detection
//!
//! Fields the resolver never interprets (container `args`, endpoint exposure,
//! project git remotes, ...) are preserved in flattened `extra` maps.

pub mod attributes;
pub mod command;
pub mod component;
pub mod documents;
pub mod import_reference;
pub mod template;

pub use attributes::Attributes;
pub use command::{ApplyCommand, Command, CommandKind, CompositeCommand, Events, ExecCommand, Project};
pub use component::{
    Component, ComponentKind, ContainerComponent, Endpoint, EnvVar, PluginComponent, VolumeComponent,
    VolumeMount,
};
pub use documents::{
    DevWorkspace, DevWorkspaceSpec, DevWorkspaceTemplate, Devfile, DevfileMetadata, FetchedTemplate,
    ObjectMeta, TemplateDocument,
};
pub use import_reference::{ImportReference, ImportReferenceSpec, KubernetesReference};
pub use template::{Parent, TemplateSpec, WorkspaceContribution};
