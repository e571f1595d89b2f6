//! brc - fetch, inspect and clear remote configs from the command line.
//!
//! Configuration comes from `--config FILE`, then `BRC_*` environment
//! variables (a `.env` file is honoured), then the default config file.
//! `--url` and `--header` override whatever was loaded.

use std::io;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use remote_configs_core::config::parse_header;
use remote_configs_core::{ConfigStore, FetchOutcome, StoreConfig};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ============================================================================
// Constants
// ============================================================================

/// Directory for an optional log file, in addition to stderr
const ENV_LOG_DIR: &str = "BRC_LOG_DIR";

const LOG_FILE_NAME: &str = "brc.log";

const USAGE: &str = "\
Usage: brc [OPTIONS]

Options:
  --config FILE          Read store configuration from a JSON file
  --url URL              Remote configs URL (overrides config)
  --header 'Name: value' Extra request header, may be repeated
  --ignore-cache         Always ask the server first
  --json                 Print the whole document as JSON
  --clear                Delete the cached configs and exit
  -h, --help             Show this message
";

#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    url: Option<String>,
    headers: Vec<(String, String)>,
    ignore_cache: bool,
    json: bool,
    clear: bool,
    help: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config needs a file path")?;
                parsed.config = Some(PathBuf::from(path));
            }
            "--url" => {
                parsed.url = Some(args.next().context("--url needs a value")?);
            }
            "--header" => {
                let raw = args.next().context("--header needs 'Name: value'")?;
                parsed.headers.push(parse_header(&raw)?);
            }
            "--ignore-cache" => parsed.ignore_cache = true,
            "--json" => parsed.json = true,
            "--clear" => parsed.clear = true,
            "-h" | "--help" => parsed.help = true,
            other => bail!("Unknown argument: {}\n\n{}", other, USAGE),
        }
    }
    Ok(parsed)
}

/// Initialize the tracing subscriber for logging
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var_os(ENV_LOG_DIR) {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn load_config(args: &Args) -> Result<StoreConfig> {
    let mut config = match &args.config {
        Some(path) => StoreConfig::load(path)?,
        None => match StoreConfig::from_env() {
            Ok(config) => config,
            Err(env_err) => {
                let default_path = StoreConfig::default_config_path()?;
                if default_path.exists() {
                    StoreConfig::load(&default_path)?
                } else if let Some(url) = &args.url {
                    StoreConfig::new(url.clone())
                } else {
                    return Err(anyhow!(env_err))
                        .context("No remote URL: pass --url or --config, or set BRC_REMOTE_URL");
                }
            }
        },
    };

    if let Some(url) = &args.url {
        config.remote_url = url.clone();
    }
    for (name, value) in &args.headers {
        config.custom_headers.insert(name.clone(), value.clone());
    }
    config.validate()?;
    Ok(config)
}

fn outcome_label(outcome: FetchOutcome) -> &'static str {
    match outcome {
        FetchOutcome::Cache => "cache (fresh)",
        FetchOutcome::Remote => "remote",
        FetchOutcome::Unchanged => "remote (unchanged)",
        FetchOutcome::Fallback => "cache (remote fetch failed)",
    }
}

fn print_configs(store: &ConfigStore, outcome: FetchOutcome, as_json: bool) -> Result<()> {
    if as_json {
        let snapshot = store.snapshot();
        println!("{}", serde_json::to_string_pretty(&*snapshot)?);
        return Ok(());
    }

    let fetched = store
        .fetch_date()
        .map(|date| date.with_timezone(&Local).format("%b %d, %Y %H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());

    println!("source:     {}", outcome_label(outcome));
    println!("version:    {}", store.version());
    println!("fetched at: {}", fetched);
    println!();
    for key in store.get_keys() {
        let value = store.get_json(&key).unwrap_or(serde_json::Value::Null);
        println!("{} = {}", key, value);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = parse_args(std::env::args().skip(1))?;
    if args.help {
        print!("{}", USAGE);
        return Ok(());
    }

    let _log_guard = init_tracing();

    let config = load_config(&args)?;
    info!(url = %config.remote_url, "brc starting");
    let store = ConfigStore::new(config).context("Failed to set up config store")?;

    if args.clear {
        store.clear_cache().context("Failed to clear cached configs")?;
        println!("Cached configs cleared");
        return Ok(());
    }

    let outcome = store
        .fetch_configs(args.ignore_cache)
        .await
        .context("Failed to fetch configs")?;
    print_configs(&store, outcome, args.json)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Result<Args> {
        parse_args(raw.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_args_defaults() {
        assert_eq!(args(&[]).expect("args"), Args::default());
    }

    #[test]
    fn test_parse_args_all_flags() {
        let parsed = args(&[
            "--config",
            "/etc/brc.json",
            "--url",
            "https://example.com/c.json",
            "--header",
            "X-Api-Key: secret",
            "--header",
            "X-Platform:linux",
            "--ignore-cache",
            "--json",
            "--clear",
        ])
        .expect("args");

        assert_eq!(parsed.config, Some(PathBuf::from("/etc/brc.json")));
        assert_eq!(parsed.url.as_deref(), Some("https://example.com/c.json"));
        assert_eq!(
            parsed.headers,
            vec![
                ("X-Api-Key".to_string(), "secret".to_string()),
                ("X-Platform".to_string(), "linux".to_string()),
            ]
        );
        assert!(parsed.ignore_cache && parsed.json && parsed.clear);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(args(&["--url"]).is_err());
        assert!(args(&["--header", "missing-colon"]).is_err());
        assert!(args(&["--bogus"]).is_err());
    }

    #[test]
    fn test_load_config_from_file_with_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"remote_url": "https://example.com/a.json", "custom_headers": {"X-A": "1"}}"#,
        )
        .expect("write");

        let parsed = Args {
            config: Some(path),
            url: Some("https://example.com/b.json".to_string()),
            headers: vec![("X-B".to_string(), "2".to_string())],
            ..Args::default()
        };
        let config = load_config(&parsed).expect("config");
        assert_eq!(config.remote_url, "https://example.com/b.json");
        assert_eq!(config.custom_headers.len(), 2);
    }
}
