// crates/archmap-config/tests/common/mod.rs
// ============================================================================
// Module: Common Config Test Utilities
// Description: Shared builders for archmap-config tests.
// Purpose: Provide a known-valid configuration to mutate per test.
// Dependencies: archmap-config
// ============================================================================

//! ## Overview
//! Provides a minimal valid configuration and shared assertion helpers.

#![allow(
    dead_code,
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only helpers; not every test file uses every helper."
)]

use archmap_config::AppConfig;
use archmap_config::AuthToken;
use archmap_config::ConfigError;

/// Returns a minimal valid configuration.
pub fn minimal_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.auth = vec![AuthToken {
        token: "token-acme".to_string(),
        tenant: "acme".to_string(),
    }];
    config
}

/// Asserts that validation fails with a message containing `needle`.
pub fn assert_invalid(result: Result<(), ConfigError>, needle: &str) -> Result<(), String> {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(()) => Err("expected invalid config".to_string()),
    }
}
