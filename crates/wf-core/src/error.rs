//! Error type shared by every WF crate.
//!
//! Errors are raised synchronously to whoever drove the failing operation
//! (the element lifecycle or a direct API caller). Nothing is retried.

use thiserror::Error;

/// Host-facing error category.
///
/// Mirrors the split between `TypeError` (the input has the wrong shape)
/// and plain `Error` (the call is not allowed in the current state).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Type,
    Error,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WfError {
    // ─── Attachment (configuration) ──────────────────────────────────────
    #[error("Enclosing wf-graph element is missing!")]
    MissingGraph,

    #[error("Child elements of wf-graph require an id!")]
    MissingId,

    #[error("Element id `{0}` is already used in this wf-graph.")]
    DuplicateId(String),

    #[error("Abstract method.")]
    AbstractSymbol,

    // ─── Registration (misuse) ───────────────────────────────────────────
    #[error("Movable needs to be a SVG group.")]
    NotAGroup,

    #[error("Element seems to be movable already.")]
    AlreadyMovable,

    #[error("Element is not movable.")]
    NotMovable,

    #[error("Not a SVG element.")]
    NotSvg,

    #[error("Custom element `{0}` has already been defined.")]
    AlreadyDefined(String),

    // ─── Input ───────────────────────────────────────────────────────────
    #[error("Markup parse error: {0}")]
    Markup(String),

    #[error("Invalid transform `{0}`")]
    Transform(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unknown element")]
    UnknownElement,
}

impl WfError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingGraph | Self::MissingId | Self::NotAGroup | Self::NotSvg => {
                ErrorKind::Type
            }
            _ => ErrorKind::Error,
        }
    }

    pub fn is_type_error(&self) -> bool {
        self.kind() == ErrorKind::Type
    }
}

pub type Result<T, E = WfError> = std::result::Result<T, E>;
