#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! QRScout — a configuration-driven form state engine for scouting forms exported as QR codes.
//!
//! This crate organizes the codebase into cohesive modules and exposes a convenient prelude
//! for downstream crates/binaries. Most implementation details live under the internal modules:
//! - `config`: Configuration models, validator, and loaders (bundled, file, HTTP).
//! - `form`: Value derivation, the shared store, reset signals, and widget model.
//! - `match_data`: Opaque match schedule records and team selection helpers.
//! - `export`: Delimited rendering of the value list for the QR collaborator.
//!
//! Use `qrscout::prelude::*` to bring commonly used items into scope quickly.

/// Public module: configuration (models, validation, loading).
pub mod config;
/// Public module: export string rendering.
pub mod export;
/// Public module: form state (deriver, store, signals, widgets).
pub mod form;
/// Public module: match schedule records.
pub mod match_data;

#[cfg(test)]
mod test_util;

/// Crate-level constants for consumers that want to inspect package metadata at runtime.
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version (e.g., "0.1.0").
#[inline]
pub const fn version() -> &'static str {
    PKG_VERSION
}

/// Parse a level name (trace|debug|info|warn|error).
pub fn parse_level(s: &str) -> Option<tracing::Level> {
    use tracing::Level;
    match s.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize tracing (logging) with a reasonable default.
/// - Honors the `RUST_LOG` environment variable if set.
/// - Falls back to `info` level.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init_tracing() {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| parse_level(&s))
        .unwrap_or(tracing::Level::INFO);
    init_tracing_with_level(level);
}

/// Initialize tracing at an explicit level. Subsequent calls are no-ops.
pub fn init_tracing_with_level(level: tracing::Level) {
    // Ignore the error if the global subscriber was already set.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

/// A convenient set of exports for most consumers.
///
/// Bring this into scope with:
/// `use qrscout::prelude::*;`
pub mod prelude {
    // Common result/error handling
    pub use anyhow::{Context, Error, Result, anyhow, bail, ensure};

    // Serialization
    pub use serde::{Deserialize, Serialize};

    // Tracing macros
    pub use tracing::{debug, error, info, instrument, trace, warn};

    pub use crate as qrscout;

    // Frequently used items
    pub use crate::config::{ConfigError, Configuration, FieldValue};
    pub use crate::form::{FieldEntry, FieldWidget, FormStore, ResetSignal};
    pub use crate::{config, export, form, match_data};
}
