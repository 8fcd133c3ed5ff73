//! Annotext Core Type Definitions
//!
//! Defines fundamental types used throughout the engine.

use std::fmt;

use sha2::{Digest, Sha256};

// =============================================================================
// ID Types
// =============================================================================

/// Annotation task unique identifier (ULID)
pub type TaskId = String;

/// Render surface unique identifier (monotonic counter)
pub type SurfaceId = u64;

// =============================================================================
// Content Fingerprint
// =============================================================================

/// 128-bit content fingerprint of a string.
///
/// Two equal strings always produce the same fingerprint, so it serves as the
/// cache key for annotated text and for link-record lookups. Computed as
/// SHA-256 truncated to 16 bytes; collision probability is negligible at this
/// width.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    /// Computes the fingerprint of a string.
    pub fn of(text: &str) -> Self {
        let digest = Sha256::digest(text.as_bytes());
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        Self(bytes)
    }

    /// Returns the raw fingerprint bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Returns the lowercase hex form (32 characters).
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_deterministic() {
        let a = Fingerprint::of("hello [smile] @bob");
        let b = Fingerprint::of("hello [smile] @bob");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_distinct_inputs() {
        let a = Fingerprint::of("hello");
        let b = Fingerprint::of("hello ");
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_hex_width() {
        let fp = Fingerprint::of("");
        assert_eq!(fp.to_hex().len(), 32);
        assert_eq!(fp.to_string(), fp.to_hex());
    }
}
