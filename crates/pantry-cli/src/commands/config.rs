//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use pantry_core::Config;

use crate::output::{Output, OutputFormat};

/// Valid keys for `config set`
const KEYS: &str = "data_dir, store_path, poll_interval_ms, image_search.api_key, \
                    image_search.engine_id, image_search.endpoint, log_file";

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "store_path": config.store_path(),
                    "poll_interval_ms": config.poll_interval_ms,
                    "image_search": {
                        "api_key_set": config.image_search.api_key.is_some(),
                        "engine_id": config.image_search.engine_id,
                        "endpoint": config.image_search.endpoint
                    },
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:               {}", config.data_dir.display());
            println!("  store_path:             {}", config.store_path().display());
            println!("  poll_interval_ms:       {}", config.poll_interval_ms);
            println!(
                "  image_search.api_key:   {}",
                if config.image_search.api_key.is_some() {
                    "(set)"
                } else {
                    "(not set)"
                }
            );
            println!(
                "  image_search.engine_id: {}",
                config
                    .image_search
                    .engine_id
                    .as_deref()
                    .unwrap_or("(not set)")
            );
            println!("  image_search.endpoint:  {}", config.image_search.endpoint);
            println!(
                "  log_file:               {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    // Environment overrides are left out so they are not saved to the file
    let mut config =
        Config::load_file_only(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    let shown = if key == "image_search.api_key" && !value.is_empty() {
        "(set)"
    } else {
        value.as_str()
    };
    output.success(&format!("Set {} = {}", key, shown));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "store_path" => {
            config.store_path = optional(value).map(PathBuf::from);
        }
        "poll_interval_ms" => {
            config.poll_interval_ms = value
                .parse()
                .context("Invalid value for poll_interval_ms. Use a whole number of milliseconds.")?;
        }
        "image_search.api_key" => {
            config.image_search.api_key = optional(value);
        }
        "image_search.engine_id" => {
            config.image_search.engine_id = optional(value);
        }
        "image_search.endpoint" => {
            if value.is_empty() {
                bail!("image_search.endpoint cannot be empty");
            }
            config.image_search.endpoint = value.to_string();
        }
        "log_file" => {
            config.log_file = optional(value).map(PathBuf::from);
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\nValid keys: {}",
                key,
                KEYS
            );
        }
    }
    Ok(())
}

/// Empty or "none" clears an optional value
fn optional(value: &str) -> Option<String> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_known_keys() {
        let mut config = Config::default();

        apply(&mut config, "poll_interval_ms", "250").unwrap();
        assert_eq!(config.poll_interval_ms, 250);

        apply(&mut config, "image_search.api_key", "secret").unwrap();
        apply(&mut config, "image_search.engine_id", "cx").unwrap();
        assert!(config.image_search.is_configured());

        apply(&mut config, "store_path", "/srv/items.json").unwrap();
        assert_eq!(config.store_path(), PathBuf::from("/srv/items.json"));
    }

    #[test]
    fn test_apply_clears_optional_values() {
        let mut config = Config::default();
        apply(&mut config, "log_file", "/tmp/pantry.log").unwrap();
        assert!(config.log_file.is_some());

        apply(&mut config, "log_file", "none").unwrap();
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_apply_rejects_bad_values() {
        let mut config = Config::default();
        assert!(apply(&mut config, "poll_interval_ms", "fast").is_err());
        assert!(apply(&mut config, "image_search.endpoint", "").is_err());

        let err = apply(&mut config, "colour", "blue").unwrap_err();
        assert!(err.to_string().contains("Unknown configuration key"));
    }
}
