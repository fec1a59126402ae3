use anyhow::{Context, Result};
use schemars::{Schema, schema_for};
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use super::error::{ConfigError, TransportFailure};
use super::models::Configuration;
use super::validator::validate;

/// Configuration compiled into the binary and used at startup and on reset.
pub const BUNDLED_CONFIG: &str = include_str!("../../config/default.json");

/// Timeout applied to remote configuration fetches.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Parse and validate a configuration document.
///
/// Non-JSON input is reported as [`ConfigError::Parse`] before any schema check runs.
pub fn parse_config(text: &str) -> Result<Configuration, ConfigError> {
    let raw: Value = serde_json::from_str(text).map_err(|source| ConfigError::Parse { source })?;
    validate(&raw)
}

/// Parse the configuration bundled with the crate.
pub fn bundled_config() -> Result<Configuration, ConfigError> {
    parse_config(BUNDLED_CONFIG)
}

/// Read a configuration file asynchronously (Tokio), returning its raw text.
///
/// Validation is left to the caller (usually [`crate::form::FormStore::set_config`])
/// so a bad file never touches the store.
pub async fn read_config_text_async<P: AsRef<Path>>(path: P) -> Result<String> {
    let path_ref = path.as_ref();
    let text = tokio::fs::read_to_string(path_ref)
        .await
        .with_context(|| format!("Failed to read config file {}", path_ref.display()))?;
    debug!(target: "qrscout::config", "Read config text from {}", path_ref.display());
    Ok(text)
}

/// Build the HTTP client used for remote configuration fetches.
///
/// Fails only if the TLS backend cannot be initialized.
pub fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()
}

/// Fetch a configuration document over HTTP.
///
/// Single shot: no retry and no caching. A non-success status or a transport error
/// yields [`ConfigError::Transport`]; the body is returned unvalidated.
pub async fn fetch_config_text(client: &reqwest::Client, url: &str) -> Result<String, ConfigError> {
    let transport = |failure: TransportFailure| ConfigError::Transport {
        url: url.to_string(),
        failure,
    };

    info!(target: "qrscout::config", %url, "Fetching configuration");
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| transport(TransportFailure::Network(e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(transport(TransportFailure::Status {
            code: status.as_u16(),
        }));
    }

    let body = response
        .text()
        .await
        .map_err(|e| transport(TransportFailure::Network(e)))?;
    debug!(target: "qrscout::config", %url, bytes = body.len(), "Fetched configuration body");
    Ok(body)
}

/// Generate the JSON Schema for the Configuration model (for editors and tooling).
pub fn generate_schema() -> Schema {
    schema_for!(Configuration)
}

/// Write the JSON Schema for the Configuration model to any writer (pretty-printed).
pub fn write_schema_to_writer<W: Write>(mut writer: W) -> Result<()> {
    let schema = generate_schema();
    let json = serde_json::to_string_pretty(&schema).context("Failed to serialize schema")?;
    writer
        .write_all(json.as_bytes())
        .context("Failed to write schema to writer")?;
    Ok(())
}
