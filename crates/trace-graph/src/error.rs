//! Error types for the graph engines

/// Errors raised while assembling the graph
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Tree nesting exceeded the recursion guard
    ///
    /// Raised for pathologically deep or self-referencing input. Not
    /// recoverable by retrying with the same data.
    #[error("malformed hierarchy: depth {depth} exceeds limit {limit} at '{at}'")]
    MalformedHierarchy {
        depth: usize,
        limit: usize,
        at: String,
    },
}

impl GraphError {
    /// Build the depth-guard error
    pub(crate) fn malformed(depth: usize, limit: usize, at: Option<&str>) -> Self {
        Self::MalformedHierarchy {
            depth,
            limit,
            at: at.unwrap_or("<unnamed>").to_string(),
        }
    }

    /// The input itself is defective
    #[inline]
    #[must_use]
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, Self::MalformedHierarchy { .. })
    }
}

/// Result type alias for graph operations
pub type GraphResult<T> = Result<T, GraphError>;
