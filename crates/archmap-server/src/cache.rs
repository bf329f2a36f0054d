// crates/archmap-server/src/cache.rs
// ============================================================================
// Module: Archmap Analysis Cache
// Description: Per-tenant TTL cache over computed analysis documents.
// Purpose: Keep reads stable between ingests without serving stale data.
// Dependencies: archmap-core
// ============================================================================

//! ## Overview
//! A cached analysis stays valid as long as no new spans were accepted for
//! the tenant since it was computed and its TTL has not lapsed. The ingest
//! path invalidates per tenant on accept and again after the durable write,
//! so two concurrent analyses may observe different snapshots but each is
//! self-consistent. Key spaces are partitioned by tenant.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use archmap_core::TenantId;

// ============================================================================
// SECTION: Cache
// ============================================================================

/// One cached value with its computation instant.
struct CacheEntry<T> {
    /// When the value was computed.
    computed_at: Instant,
    /// The cached value.
    value: Arc<T>,
}

/// Per-tenant TTL cache.
///
/// # Invariants
/// - Entries never outlive the TTL; invalidation removes them immediately.
/// - A lookup for one tenant can never observe another tenant's entry.
pub struct AnalysisCache<T> {
    /// Time-to-live for cached entries.
    ttl: Duration,
    /// Entries keyed by tenant.
    entries: Mutex<HashMap<TenantId, CacheEntry<T>>>,
}

impl<T> AnalysisCache<T> {
    /// Creates a cache with the given TTL.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached value for a tenant when still fresh.
    #[must_use]
    pub fn get(&self, tenant: &TenantId) -> Option<Arc<T>> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(tenant) {
            Some(entry) if entry.computed_at.elapsed() <= self.ttl => {
                Some(Arc::clone(&entry.value))
            }
            Some(_) => {
                entries.remove(tenant);
                None
            }
            None => None,
        }
    }

    /// Stores a freshly computed value for a tenant.
    pub fn put(&self, tenant: &TenantId, value: Arc<T>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                tenant.clone(),
                CacheEntry {
                    computed_at: Instant::now(),
                    value,
                },
            );
        }
    }

    /// Drops the cached value for a tenant.
    pub fn invalidate(&self, tenant: &TenantId) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(tenant);
        }
    }
}
