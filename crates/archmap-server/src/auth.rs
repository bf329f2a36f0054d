// crates/archmap-server/src/auth.rs
// ============================================================================
// Module: Archmap Tenant Authentication
// Description: Bearer-token to tenant binding for every request.
// Purpose: Provide a deterministic, fail-closed tenant resolution seam.
// Dependencies: archmap-config, archmap-core, axum
// ============================================================================

//! ## Overview
//! Every ingest and read call except the liveness check carries a
//! tenant-bound bearer credential. Resolution is deterministic for identical
//! inputs and fails closed: a missing, malformed, or unknown token denies the
//! request, and no component ever sees data for a tenant other than the one
//! bound to the presented credential.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use archmap_config::AuthToken;
use archmap_core::TenantId;
use axum::http::HeaderMap;

use crate::error::ApiError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header naming the tenant in loopback-only, tokenless deployments.
pub const TENANT_HEADER: &str = "x-archmap-tenant";

// ============================================================================
// SECTION: Authenticator
// ============================================================================

/// Token-to-tenant resolver built once from configuration.
///
/// # Invariants
/// - Tokens are unique (enforced by config validation).
/// - Resolution has no side effects.
#[derive(Debug, Clone, Default)]
pub struct TenantAuthenticator {
    /// Token registry keyed by bearer token value.
    tokens: BTreeMap<String, TenantId>,
}

impl TenantAuthenticator {
    /// Builds the authenticator from configured tokens.
    #[must_use]
    pub fn new(tokens: &[AuthToken]) -> Self {
        Self {
            tokens: tokens
                .iter()
                .map(|auth| (auth.token.clone(), TenantId::new(auth.tenant.clone())))
                .collect(),
        }
    }

    /// Resolves the tenant bound to the request's bearer token.
    ///
    /// Loopback-only deployments with no configured tokens (the config layer
    /// rejects non-loopback binds in that state) bind the tenant from the
    /// `x-archmap-tenant` header instead; a missing header still denies.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when the credential is missing,
    /// malformed, or names an unknown token.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<TenantId, ApiError> {
        if self.tokens.is_empty() {
            let tenant = headers
                .get(TENANT_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .ok_or(ApiError::Unauthorized)?;
            return Ok(TenantId::new(tenant));
        }
        let header = headers
            .get(axum::http::header::AUTHORIZATION)
            .ok_or(ApiError::Unauthorized)?;
        let value = header.to_str().map_err(|_| ApiError::Unauthorized)?;
        let token = value.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;
        self.tokens.get(token.trim()).cloned().ok_or(ApiError::Unauthorized)
    }

    /// Returns true when no tokens are configured (loopback-only deployments).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
