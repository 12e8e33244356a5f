//! Config command - manage configuration.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use tracing::debug;

use taxlookup_core::LookupConfig;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Initialize a new configuration file
    Init(InitArgs),

    /// Get a specific configuration value
    Get {
        /// Configuration key (e.g., "fetch.timeout_secs")
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// New value
        value: String,
    },

    /// Show configuration file path
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Output path for configuration file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing file
    #[arg(long)]
    force: bool,
}

pub fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let path = config_file(config_path);
    match args.command {
        ConfigCommand::Show => show_config(&path),
        ConfigCommand::Init(init_args) => init_config(init_args, &path),
        ConfigCommand::Get { key } => get_config(&path, &key),
        ConfigCommand::Set { key, value } => set_config(&path, &key, &value),
        ConfigCommand::Path => show_path(&path),
    }
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taxlookup")
        .join("config.json")
}

fn config_file(config_path: Option<&str>) -> PathBuf {
    config_path.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load the configuration used by lookup commands.
///
/// An explicit `--config` path must exist. Without one, the default path is
/// used when present and built-in defaults otherwise.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<LookupConfig> {
    if let Some(path) = config_path {
        debug!("Loading config from {}", path);
        return LookupConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path, e));
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Loading config from {}", path.display());
        Ok(LookupConfig::from_file(&path)?)
    } else {
        Ok(LookupConfig::default())
    }
}

fn load_or_default(path: &Path) -> anyhow::Result<LookupConfig> {
    if path.exists() {
        Ok(LookupConfig::from_file(path)?)
    } else {
        Ok(LookupConfig::default())
    }
}

fn show_config(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        eprintln!(
            "{} No config file found, showing defaults.",
            style("ℹ").blue()
        );
    }
    let config = load_or_default(path)?;

    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}

fn init_config(args: InitArgs, path: &Path) -> anyhow::Result<()> {
    let output_path = args.output.unwrap_or_else(|| path.to_path_buf());

    if output_path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            output_path.display()
        );
    }

    create_parent(&output_path)?;

    let config = LookupConfig::default();
    config.save(&output_path)?;

    println!(
        "{} Created configuration file at {}",
        style("✓").green(),
        output_path.display()
    );

    Ok(())
}

fn get_config(path: &Path, key: &str) -> anyhow::Result<()> {
    let config = load_or_default(path)?;
    let json = serde_json::to_value(&config)?;

    let value = key
        .split('.')
        .try_fold(&json, |current, part| current.get(part))
        .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))?;

    println!("{}", serde_json::to_string_pretty(value)?);

    Ok(())
}

/// Set `key` to `value` inside a configuration rendered as JSON.
///
/// `value` is parsed as JSON when possible and kept as a string otherwise.
/// Only existing keys can be set.
fn set_value(config: &LookupConfig, key: &str, value: &str) -> anyhow::Result<LookupConfig> {
    let parsed_value: serde_json::Value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));

    let mut json = serde_json::to_value(config)?;

    let (parent, last) = match key.rsplit_once('.') {
        Some((parent, last)) => (Some(parent), last),
        None => (None, key),
    };

    let mut current = &mut json;
    if let Some(parent) = parent {
        for part in parent.split('.') {
            current = current
                .get_mut(part)
                .ok_or_else(|| anyhow::anyhow!("Configuration path not found: {}", key))?;
        }
    }

    let Some(obj) = current.as_object_mut() else {
        anyhow::bail!("Cannot set value at non-object path");
    };
    if !obj.contains_key(last) {
        anyhow::bail!("Configuration key not found: {}", key);
    }
    obj.insert(last.to_string(), parsed_value);

    serde_json::from_value(json)
        .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))
}

fn set_config(path: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let config = load_or_default(path)?;
    let config = set_value(&config, key, value)?;

    create_parent(path)?;
    config.save(path)?;

    let json = serde_json::to_value(&config)?;
    let stored = key
        .split('.')
        .try_fold(&json, |current, part| current.get(part))
        .cloned()
        .unwrap_or(serde_json::Value::Null);

    println!(
        "{} Set {} = {}",
        style("✓").green(),
        key,
        serde_json::to_string(&stored)?
    );

    Ok(())
}

fn show_path(path: &Path) -> anyhow::Result<()> {
    println!("Configuration file: {}", path.display());

    if path.exists() {
        println!("Status: {}", style("exists").green());
    } else {
        println!("Status: {}", style("not created").yellow());
        println!();
        println!("Run 'taxlookup config init' to create a configuration file.");
    }

    Ok(())
}

fn create_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_value_parses_json() {
        let config = set_value(&LookupConfig::default(), "fetch.timeout_secs", "30").unwrap();
        assert_eq!(config.fetch.timeout_secs, 30);
    }

    #[test]
    fn test_set_value_keeps_plain_strings() {
        let config = set_value(
            &LookupConfig::default(),
            "fetch.headers.accept_language",
            "en-US,en;q=0.8",
        )
        .unwrap();
        assert_eq!(config.fetch.headers.accept_language, "en-US,en;q=0.8");
    }

    #[test]
    fn test_set_value_store_path() {
        let config = set_value(&LookupConfig::default(), "store.path", "companies.json").unwrap();
        assert_eq!(config.store.path, Some(PathBuf::from("companies.json")));
    }

    #[test]
    fn test_set_value_rejects_unknown_key() {
        assert!(set_value(&LookupConfig::default(), "fetch.retries", "3").is_err());
        assert!(set_value(&LookupConfig::default(), "nothing.here", "3").is_err());
    }

    #[test]
    fn test_set_value_rejects_wrong_type() {
        assert!(set_value(&LookupConfig::default(), "fetch.timeout_secs", "soon").is_err());
    }

    #[test]
    fn test_load_config_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        assert!(load_config(path.to_str()).is_err());
    }

    #[test]
    fn test_load_config_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"fetch": {"timeout_secs": 4}}"#).unwrap();

        let config = load_config(path.to_str()).unwrap();
        assert_eq!(config.fetch.timeout_secs, 4);
    }
}
