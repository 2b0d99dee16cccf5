//! Error types for the PH-tree.

/// Result type alias using [`PhTreeError`].
pub type Result<T> = std::result::Result<T, PhTreeError>;

/// Recoverable errors surfaced by the public API.
///
/// Structural invariant breaches are bugs and panic instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhTreeError {
    /// A coordinate slice did not have exactly `D` components.
    #[error("dimension mismatch: expected {expected} coordinates, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A [`PhTreeConfig`](crate::PhTreeConfig) value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
