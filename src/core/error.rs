//! Error handling for the flattening library
//!
//! Resolution fails in a small number of well-defined ways, and callers (the
//! reconciliation loop, the CLI, tests) need to tell them apart. The error
//! system therefore has two layers:
//! 1. [`FlattenError`], a strongly-typed enum with one variant per failure kind
//! 2. [`ErrorContext`], a wrapper adding user-facing details and suggestions for the CLI
//!
//! # Breadcrumbs
//!
//! Errors raised while resolving a plugin are wrapped in
//! [`FlattenError::Reference`] at every level of the recursion, so the final
//! message reads like a path through the import tree:
//!
//! ```text
//! failed to resolve plugin 'tools': failed to resolve plugin 'java': DevWorkspace has a cycle in references: devworkspace -> tools -> java -> tools
//! ```
//!
//! Use [`FlattenError::root_cause`] to match on the underlying kind.
//!
//! # Examples
//!
//! ```rust
//! use devfile_flatten::core::FlattenError;
//!
//! let err = FlattenError::Reference {
//!     component: "tools".to_string(),
//!     source: Box::new(FlattenError::Cycle {
//!         chain: "devworkspace -> tools -> tools".to_string(),
//!     }),
//! };
//! assert!(matches!(err.root_cause(), FlattenError::Cycle { .. }));
//! assert!(err.to_string().contains("devworkspace -> tools -> tools"));
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Result alias used by every fallible library operation.
pub type Result<T> = std::result::Result<T, FlattenError>;

/// The error type for resolution, fetching and merging.
///
/// # Error Categories
///
/// ## References and fetching
/// - [`InvalidReference`] - a plugin or parent names none (or more than one) of the source kinds
/// - [`Fetch`] - network failure, non-200 status, unparsable or unrecognized body
/// - [`TemplateNotFound`] - the Kubernetes object does not exist
/// - [`ImportDenied`] - cross-namespace import refused; displays exactly like [`TemplateNotFound`]
///
/// ## Structure
/// - [`Cycle`] - an import reference reappears among its own ancestors
/// - [`UnsupportedStructure`] - a parent that itself has a parent or plugins
///
/// ## Merging
/// - [`MergeConflict`] - duplicate identifiers, ambiguous contribution targets,
///   apply commands pointing at absorbed contributions
/// - [`Override`] - an override entry matched no element
/// - [`InvalidQuantity`] - a size, memory or cpu value that is not a Kubernetes quantity
/// - [`InvalidAttribute`] - an attribute whose value does not decode to the expected type
///
/// ## Editors
/// - [`Compatibility`] - zero/multiple editors, or unsatisfied editor requirements
///
/// [`InvalidReference`]: FlattenError::InvalidReference
/// [`Fetch`]: FlattenError::Fetch
/// [`TemplateNotFound`]: FlattenError::TemplateNotFound
/// [`ImportDenied`]: FlattenError::ImportDenied
/// [`Cycle`]: FlattenError::Cycle
/// [`UnsupportedStructure`]: FlattenError::UnsupportedStructure
/// [`MergeConflict`]: FlattenError::MergeConflict
/// [`Override`]: FlattenError::Override
/// [`InvalidQuantity`]: FlattenError::InvalidQuantity
/// [`InvalidAttribute`]: FlattenError::InvalidAttribute
/// [`Compatibility`]: FlattenError::Compatibility
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlattenError {
    /// A plugin or parent reference that cannot be dispatched to a fetcher.
    #[error("invalid import reference for '{component}': {reason}")]
    InvalidReference {
        /// Component (or `parent`) holding the reference
        component: String,
        /// Why the reference is unusable
        reason: String,
    },

    /// Fetching a template failed.
    #[error("failed to fetch template from {location}: {reason}")]
    Fetch {
        /// URI, registry URL or `namespace/name` that was fetched
        location: String,
        /// Underlying failure
        reason: String,
    },

    /// The referenced DevWorkspaceTemplate does not exist.
    #[error("plugin for component {component} not found")]
    TemplateNotFound {
        /// Component holding the reference
        component: String,
    },

    /// The referenced DevWorkspaceTemplate exists but does not allow import
    /// from the workspace namespace.
    ///
    /// The message is identical to [`FlattenError::TemplateNotFound`] so users
    /// cannot probe for objects in namespaces they cannot read.
    #[error("plugin for component {component} not found")]
    ImportDenied {
        /// Component holding the reference
        component: String,
    },

    /// An import reference appears twice on one path of the import tree.
    #[error("DevWorkspace has a cycle in references: {chain}")]
    Cycle {
        /// Arrow-joined path from the workspace root to the repeated reference
        chain: String,
    },

    /// The template uses a structure the resolver does not support.
    #[error("unsupported template structure: {reason}")]
    UnsupportedStructure {
        /// Description of the unsupported structure
        reason: String,
    },

    /// Elements from different sources cannot be merged.
    #[error("{reason}")]
    MergeConflict {
        /// Description of the conflict
        reason: String,
    },

    /// Override entries that do not target any existing element.
    #[error("{reason}")]
    Override {
        /// Description of the failed override
        reason: String,
    },

    /// Editor compatibility requirements are not met.
    #[error("{reason}")]
    Compatibility {
        /// Description of the incompatibility
        reason: String,
    },

    /// An attribute exists but its value has the wrong type.
    #[error("failed to parse attribute {key} on {element}: {reason}")]
    InvalidAttribute {
        /// Attribute key
        key: String,
        /// Element (component, command, ...) carrying the attribute
        element: String,
        /// Decode failure
        reason: String,
    },

    /// A resource quantity could not be parsed.
    #[error("invalid quantity '{value}': {reason}")]
    InvalidQuantity {
        /// The offending value
        value: String,
        /// Why it failed to parse
        reason: String,
    },

    /// A document could not be decoded.
    #[error("failed to parse {what}: {reason}")]
    Parse {
        /// What was being decoded
        what: String,
        /// Decoder message
        reason: String,
    },

    /// Configuration is missing or inconsistent.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Breadcrumb added while unwinding out of a plugin or parent.
    #[error("failed to resolve {component}: {source}")]
    Reference {
        /// Display name of the reference being resolved (`plugin 'x'`, `parent`)
        component: String,
        /// The error raised while resolving it
        #[source]
        source: Box<FlattenError>,
    },
}

impl FlattenError {
    /// Wrap this error with the identity of the reference being resolved.
    #[must_use]
    pub fn in_reference(self, component: impl Into<String>) -> Self {
        Self::Reference {
            component: component.into(),
            source: Box::new(self),
        }
    }

    /// Return the innermost error, skipping every [`FlattenError::Reference`] breadcrumb.
    #[must_use]
    pub fn root_cause(&self) -> &FlattenError {
        let mut current = self;
        while let Self::Reference {
            source,
            ..
        } = current
        {
            current = source;
        }
        current
    }

    /// Names of the references wrapped around the root cause, outermost first.
    #[must_use]
    pub fn breadcrumbs(&self) -> Vec<&str> {
        let mut crumbs = Vec::new();
        let mut current = self;
        while let Self::Reference {
            component,
            source,
        } = current
        {
            crumbs.push(component.as_str());
            current = source;
        }
        crumbs
    }

    pub(crate) fn merge_conflict(reason: impl Into<String>) -> Self {
        Self::MergeConflict {
            reason: reason.into(),
        }
    }
}

/// Error wrapper with user-facing context for CLI display.
///
/// Mirrors a [`FlattenError`] with optional details and a suggestion. Produced
/// by [`user_friendly_error`] and printed by the binary before it exits.
#[derive(Debug)]
pub struct ErrorContext {
    /// The main message
    pub message: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context with only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.message);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with suggestions.
///
/// Flattening errors get a suggestion tailored to their root cause; anything
/// else is rendered with its full `anyhow` cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(flatten_error) = error.downcast_ref::<FlattenError>() {
        return create_error_context(flatten_error);
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    // Resolution errors usually arrive wrapped in CLI context
    if let Some(flatten_error) = error.chain().find_map(|e| e.downcast_ref::<FlattenError>()) {
        let mut ctx = create_error_context(flatten_error);
        ctx.message = format!("{message}: {}", ctx.message);
        return ctx;
    }

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(message)
}

fn create_error_context(error: &FlattenError) -> ErrorContext {
    let ctx = ErrorContext::new(error.to_string());
    let crumbs = error.breadcrumbs();
    let ctx = if crumbs.is_empty() {
        ctx
    } else {
        ctx.with_details(format!("while resolving {}", crumbs.join(" -> ")))
    };

    match error.root_cause() {
        FlattenError::InvalidReference { .. } => ctx.with_suggestion(
            "Each plugin or parent must set exactly one of 'kubernetes', 'uri' or 'id'",
        ),
        FlattenError::Fetch { .. } => ctx.with_suggestion(
            "Check that the URI or registry is reachable and serves a devfile, DevWorkspace or DevWorkspaceTemplate",
        ),
        FlattenError::TemplateNotFound { .. } | FlattenError::ImportDenied { .. } => ctx
            .with_suggestion(
                "Verify the DevWorkspaceTemplate name and namespace, and that it may be imported from this namespace",
            ),
        FlattenError::Cycle { .. } => {
            ctx.with_suggestion("Remove one of the plugin references that forms the cycle")
        }
        FlattenError::UnsupportedStructure { .. } => ctx.with_suggestion(
            "Inline the parent's own parent and plugins so the parent template is already flattened",
        ),
        FlattenError::MergeConflict { .. } | FlattenError::Override { .. } => ctx.with_suggestion(
            "Rename or remove the conflicting elements in the workspace, its parent or its plugins",
        ),
        FlattenError::Compatibility { .. } => ctx.with_suggestion(
            "Make sure exactly one editor is imported and every plugin supports it",
        ),
        FlattenError::InvalidAttribute { .. } | FlattenError::InvalidQuantity { .. } => {
            ctx.with_suggestion("Fix the attribute or quantity value in the template")
        }
        FlattenError::Config { .. } => {
            ctx.with_suggestion("Check the configuration file passed with --config")
        }
        FlattenError::Parse { .. } | FlattenError::Reference { .. } => ctx,
    }
}
