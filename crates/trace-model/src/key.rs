//! Recomposition cache keys
//!
//! Provides [`ViewKey`], a 32-byte Blake3 digest over the semantic inputs
//! of a view. Two keys are equal exactly when the hashed inputs are.

use std::fmt::{self, Display, Formatter};

/// Digest of a view's semantic inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewKey([u8; 32]);

impl ViewKey {
    /// Start hashing a new key
    #[inline]
    #[must_use]
    pub fn hasher() -> ViewKeyHasher {
        ViewKeyHasher(blake3::Hasher::new())
    }

    /// Raw bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for ViewKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Incremental builder for [`ViewKey`]
///
/// Every field is length- or width-prefixed so adjacent fields cannot
/// run together.
#[derive(Debug, Clone)]
pub struct ViewKeyHasher(blake3::Hasher);

impl ViewKeyHasher {
    /// Mix a string field
    #[must_use]
    pub fn str(mut self, value: &str) -> Self {
        self.0.update(&(value.len() as u64).to_le_bytes());
        self.0.update(value.as_bytes());
        self
    }

    /// Mix an integer field
    #[must_use]
    pub fn u64(mut self, value: u64) -> Self {
        self.0.update(&value.to_le_bytes());
        self
    }

    /// Mix a length
    #[must_use]
    pub fn len(self, value: usize) -> Self {
        self.u64(value as u64)
    }

    /// Finish the key
    #[must_use]
    pub fn finish(self) -> ViewKey {
        ViewKey(*self.0.finalize().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_inputs_equal_keys() {
        let a = ViewKey::hasher().str("collapsed").u64(3).finish();
        let b = ViewKey::hasher().str("collapsed").u64(3).finish();
        assert_eq!(a, b);
        assert_eq!(a.short().len(), 16);
    }

    #[test]
    fn field_boundaries_matter() {
        let a = ViewKey::hasher().str("ab").str("c").finish();
        let b = ViewKey::hasher().str("a").str("bc").finish();
        assert_ne!(a, b);
    }
}
