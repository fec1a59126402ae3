use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use tracing::{debug, info};

use qrscout::config::{self as cfg, FieldValue};
use qrscout::export;
use qrscout::form::FormStore;

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Pretty-printed JSON list of `{code, value}` entries
    Json,
    /// Header line plus the delimited export string
    Delimited,
}

/// QRScout form engine CLI
#[derive(Debug, Parser)]
#[command(
    name = qrscout::PKG_NAME,
    version = qrscout::PKG_VERSION,
    about = "Load a QRScout form configuration, fill values, and print the export"
)]
struct Args {
    /// Path to a JSON configuration file (defaults to the bundled configuration)
    #[arg(short = 'c', long = "config", conflicts_with = "url")]
    config: Option<PathBuf>,

    /// URL to fetch the JSON configuration from
    #[arg(long = "url")]
    url: Option<String>,

    /// Set a field value, e.g. `--set autoCoral=3` (value parsed as JSON, else text)
    #[arg(long = "set", value_name = "CODE=VALUE")]
    set: Vec<String>,

    /// Output format
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Set log level (e.g., trace, debug, info, warn, error). Overrides RUST_LOG.
    #[arg(long = "log-level")]
    log_level: Option<String>,

    /// Print the JSON Schema for the configuration and exit
    #[arg(long = "print-schema")]
    print_schema: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.log_level.as_deref() {
        Some(level) => qrscout::init_tracing_with_level(
            qrscout::parse_level(level).unwrap_or(tracing::Level::INFO),
        ),
        None => qrscout::init_tracing(),
    }
    info!(version = qrscout::PKG_VERSION, "Starting QRScout");

    if args.print_schema {
        let schema = cfg::generate_schema();
        let json = serde_json::to_string_pretty(&schema)?;
        println!("{json}");
        return Ok(());
    }

    let store = FormStore::with_bundled_default().context("Bundled configuration is invalid")?;

    if let Some(path) = &args.config {
        let text = cfg::read_config_text_async(path).await?;
        store
            .set_config(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
    } else if let Some(url) = &args.url {
        store.fetch_config_from_url(url).await?;
    }
    debug!(target: "qrscout", title = %store.get_config().title, "Configuration ready");

    for assignment in &args.set {
        let (code, value) = parse_assignment(assignment)?;
        store.update_value(code, value);
    }

    let values = store.field_values();
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&values)?),
        OutputFormat::Delimited => {
            let delimiter = store.get_config().delimiter.clone();
            println!("{}", export::header_string(&values, &delimiter));
            println!("{}", export::export_string(&values, &delimiter));
        }
    }

    Ok(())
}

/// Split `code=value`; the value is read as JSON when possible, otherwise as text.
fn parse_assignment(raw: &str) -> anyhow::Result<(&str, FieldValue)> {
    let Some((code, value)) = raw.split_once('=') else {
        bail!("Expected CODE=VALUE, got '{raw}'");
    };
    let code = code.trim();
    if code.is_empty() {
        bail!("Missing field code in '{raw}'");
    }
    let value = serde_json::from_str::<FieldValue>(value)
        .unwrap_or_else(|_| FieldValue::Text(value.to_string()));
    Ok((code, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_values() {
        let (code, v) = parse_assignment("autoCoral=3").unwrap();
        assert_eq!(code, "autoCoral");
        assert_eq!(v, FieldValue::Number(3.0));

        let (_, v) = parse_assignment("comments=fast robot").unwrap();
        assert_eq!(v, FieldValue::Text("fast robot".into()));

        let (_, v) = parse_assignment(r#"climb=["p","dc"]"#).unwrap();
        assert_eq!(v, FieldValue::List(vec!["p".into(), "dc".into()]));

        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=3").is_err());
    }
}
