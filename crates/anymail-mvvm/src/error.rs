//! Error types for view-model plumbing.

/// Result type alias for view-model plumbing.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while wiring commands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A command was built without an execute action.
    #[error("Command '{0}' has no execute action")]
    MissingAction(String),
}
