//! # UI Error Types
//!
//! Two families, both surfaced synchronously to the caller:
//! - [`HierarchyError`]: structural misuse of the tree (caller bugs)
//! - [`ConfigError`]: bad configuration, caught before the per-frame path runs

use lumen_core::NodeId;
use thiserror::Error;

/// Structural violations of the node tree.
///
/// These are programmer errors. The tree is left exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    /// The id does not refer to a live node.
    #[error("node {0} does not exist")]
    StaleId(NodeId),

    /// Attach was called on a node that already has a parent.
    #[error("node '{child}' already has parent '{parent}'")]
    AlreadyAttached {
        /// Name of the node being attached.
        child: String,
        /// Name of its current parent.
        parent: String,
    },

    /// Attach was called on a scene root.
    #[error("node '{0}' is a scene root and cannot be attached")]
    IsRoot(String),

    /// A node was promoted to scene root while still attached.
    #[error("node '{0}' has a parent and cannot become a scene root")]
    HasParent(String),

    /// The node is not registered as a scene root.
    #[error("node '{0}' is not a scene root")]
    NotRoot(String),

    /// Detach was called on a node without a parent.
    #[error("node '{0}' has no parent")]
    NotAttached(String),

    /// Attaching would make a node its own ancestor.
    #[error("attaching '{child}' under '{parent}' would create a cycle")]
    Cycle {
        /// Name of the node being attached.
        child: String,
        /// Name of the requested parent.
        parent: String,
    },
}

/// Configuration errors, raised by property setters, the registry and the
/// config loader.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The property name is not recognized by the node or any of its behaviors.
    #[error("unknown property '{name}' on '{node}'")]
    UnknownProperty {
        /// Node name.
        node: String,
        /// Property name.
        name: String,
    },

    /// The property value could not be parsed or is out of range.
    #[error("invalid value '{value}' for property '{name}'")]
    InvalidValue {
        /// Property name.
        name: String,
        /// Offending value.
        value: String,
    },

    /// Unknown waveform kind.
    #[error("unknown waveform '{0}'")]
    UnknownWaveform(String),

    /// Unknown quantization rounding mode.
    #[error("unknown rounding mode '{0}'")]
    UnknownRounding(String),

    /// Unknown facet name.
    #[error("unknown facet '{0}'")]
    UnknownFacet(String),

    /// Unknown write-back policy.
    #[error("unknown write policy '{0}'")]
    UnknownWritePolicy(String),

    /// An animator targets a facet its owner does not expose.
    #[error("animator '{animator}' drives facet '{facet}' which '{owner}' does not expose")]
    UnsupportedFacet {
        /// Animator name.
        animator: String,
        /// Facet name.
        facet: String,
        /// Owner name.
        owner: String,
    },

    /// The registry has no constructor for this type name.
    #[error("unknown type '{0}'")]
    UnknownType(String),

    /// A node name is already registered in the scene.
    #[error("duplicate node name '{0}'")]
    DuplicateName(String),

    /// The configuration document could not be read or parsed.
    #[error("invalid configuration: {0}")]
    Parse(String),
}

/// Any error raised by the UI core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UiError {
    /// Structural tree violation.
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for UI operations.
pub type UiResult<T> = Result<T, UiError>;
