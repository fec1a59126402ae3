//! Configuration module for QRScout.
//!
//! This module wires together the form configuration models, the structural
//! validator, and the loading helpers (bundled default, file, HTTP). Import from
//! here for a convenient, stable API.
//!
//! Example:
//! use qrscout::config::{Configuration, parse_config};
//!
//! let cfg = parse_config(&std::fs::read_to_string("config/default.json")?)?;

pub mod error;
pub mod loader;
pub mod models;
pub mod validator;

// Re-export core data models
pub use models::{
    ActionDefinition, Configuration, FieldDefinition, FieldKind, FieldValue, FloatingField,
    ResetBehavior, SectionDefinition, TeamAndRobot, ThemeMode, ThemePalettes, ValueShape,
};

// Re-export errors
pub use error::{ConfigError, ErrorKind, TransportFailure, Violation};

// Re-export loader utilities
pub use loader::{
    BUNDLED_CONFIG, bundled_config, fetch_config_text, generate_schema, http_client, parse_config,
    read_config_text_async, write_schema_to_writer,
};
pub use validator::validate;
