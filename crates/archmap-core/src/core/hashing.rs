// crates/archmap-core/src/core/hashing.rs
// ============================================================================
// Module: Archmap Hashing
// Description: Canonical JSON hashing for stable derived identifiers.
// Purpose: Produce issue and workflow identifiers stable across runs.
// Dependencies: serde, serde_jcs, serde_json, sha2, thiserror
// ============================================================================

//! ## Overview
//! Derived records (issues, workflows) need identifiers that are identical
//! across repeated analyses of the same graph. Identifiers are computed by
//! hashing the canonical JSON (RFC 8785) form of a small identity document
//! with SHA-256 and rendering the first sixteen bytes as lowercase hex.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of digest bytes kept in rendered identifiers.
const ID_DIGEST_BYTES: usize = 16;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Hashing failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum HashError {
    /// Canonical JSON serialization failed.
    #[error("canonical json failure: {0}")]
    Canonicalization(String),
}

// ============================================================================
// SECTION: Canonical Hashing
// ============================================================================

/// Serializes a value to canonical JSON bytes (RFC 8785).
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when the value cannot be
/// serialized.
pub fn canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Computes a SHA-256 digest over raw bytes, hex encoded.
#[must_use]
pub fn hash_bytes_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Computes a stable identifier for a canonical identity document.
///
/// The identifier is the first sixteen bytes of the SHA-256 digest over the
/// canonical JSON form, rendered as lowercase hex.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when the document cannot be
/// serialized.
pub fn stable_id<T: Serialize>(identity: &T) -> Result<String, HashError> {
    let bytes = canonical_json_bytes(identity)?;
    let mut hex = hash_bytes_hex(&bytes);
    hex.truncate(ID_DIGEST_BYTES * 2);
    Ok(hex)
}
