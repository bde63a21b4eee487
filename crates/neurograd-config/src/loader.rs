// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later tiers win:
//! 1. TOML file (base values)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, NeurogradConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "neurograd.toml";

/// Find the neurograd configuration file
///
/// Search order:
/// 1. `NEUROGRAD_CONFIG_PATH` environment variable
/// 2. Current working directory: `./neurograd.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("NEUROGRAD_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by NEUROGRAD_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|path| path.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet NEUROGRAD_CONFIG_PATH to specify a custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from a TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, the file is searched for.
/// * `cli_args` - Optional CLI overrides keyed by `section.field`
///
/// # Errors
///
/// Returns an error if the file is missing, unreadable or not valid TOML.
/// Value-range checks are left to [`validate_config`](crate::validate_config).
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<NeurogradConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: NeurogradConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);

    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli)?;
    }

    Ok(config)
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes")
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `NEUROGRAD_NEURON_MODEL` -> `neuron.model`
/// - `NEUROGRAD_V_THRESHOLD` -> `neuron.v_threshold`
/// - `NEUROGRAD_V_RESET` -> `neuron.v_reset` (`none` selects soft reset)
/// - `NEUROGRAD_TAU` -> `neuron.tau`
/// - `NEUROGRAD_DETACH_RESET` -> `neuron.detach_reset`
/// - `NEUROGRAD_SURROGATE` -> `surrogate.name`
/// - `NEUROGRAD_PRECISION` -> `execution.precision`
/// - `NEUROGRAD_MAX_THREADS` -> `execution.max_threads`
/// - `NEUROGRAD_LOG_LEVEL` -> `logging.level`
///
/// Unparseable numeric values are ignored.
pub fn apply_environment_overrides(config: &mut NeurogradConfig) {
    if let Ok(value) = env::var("NEUROGRAD_NEURON_MODEL") {
        config.neuron.model = value;
    }
    if let Ok(value) = env::var("NEUROGRAD_V_THRESHOLD") {
        if let Ok(threshold) = value.parse::<f32>() {
            config.neuron.v_threshold = threshold;
        }
    }
    if let Ok(value) = env::var("NEUROGRAD_V_RESET") {
        if value.eq_ignore_ascii_case("none") {
            config.neuron.v_reset = None;
        } else if let Ok(v_reset) = value.parse::<f32>() {
            config.neuron.v_reset = Some(v_reset);
        }
    }
    if let Ok(value) = env::var("NEUROGRAD_TAU") {
        if let Ok(tau) = value.parse::<f32>() {
            config.neuron.tau = tau;
        }
    }
    if let Ok(value) = env::var("NEUROGRAD_DETACH_RESET") {
        config.neuron.detach_reset = parse_flag(&value);
    }

    if let Ok(value) = env::var("NEUROGRAD_SURROGATE") {
        config.surrogate.name = value;
    }

    if let Ok(value) = env::var("NEUROGRAD_PRECISION") {
        config.execution.precision = value;
    }
    if let Ok(value) = env::var("NEUROGRAD_MAX_THREADS") {
        if let Ok(threads) = value.parse::<usize>() {
            config.execution.max_threads = threads;
        }
    }

    if let Ok(value) = env::var("NEUROGRAD_LOG_LEVEL") {
        config.logging.level = value;
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue(format!("{} = {:?}", key, value)))
}

/// Apply CLI argument overrides to configuration
///
/// Keys use `section.field` form, e.g. `{"neuron.tau": "3.0", "execution.precision": "fp16"}`.
/// Unlike environment overrides, a malformed value or an unknown key is an error.
pub fn apply_cli_overrides(
    config: &mut NeurogradConfig,
    cli_args: &HashMap<String, String>,
) -> ConfigResult<()> {
    for (key, value) in cli_args {
        match key.as_str() {
            "neuron.model" => config.neuron.model = value.clone(),
            "neuron.v_threshold" => config.neuron.v_threshold = parse_value(key, value)?,
            "neuron.v_reset" => {
                config.neuron.v_reset = if value.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(parse_value(key, value)?)
                }
            }
            "neuron.tau" => config.neuron.tau = parse_value(key, value)?,
            "neuron.detach_reset" => config.neuron.detach_reset = parse_flag(value),
            "surrogate.name" => config.surrogate.name = value.clone(),
            "surrogate.alpha" => config.surrogate.alpha = Some(parse_value(key, value)?),
            "execution.precision" => config.execution.precision = value.clone(),
            "execution.max_threads" => config.execution.max_threads = parse_value(key, value)?,
            "logging.level" => config.logging.level = value.clone(),
            other => {
                return Err(ConfigError::InvalidValue(format!(
                    "unknown override key: {}",
                    other
                )))
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const OVERRIDE_VARS: [&str; 9] = [
        "NEUROGRAD_NEURON_MODEL",
        "NEUROGRAD_V_THRESHOLD",
        "NEUROGRAD_V_RESET",
        "NEUROGRAD_TAU",
        "NEUROGRAD_DETACH_RESET",
        "NEUROGRAD_SURROGATE",
        "NEUROGRAD_PRECISION",
        "NEUROGRAD_MAX_THREADS",
        "NEUROGRAD_LOG_LEVEL",
    ];

    fn clear_override_vars() {
        for var in OVERRIDE_VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom.toml");
        File::create(&config_path).unwrap();

        env::set_var("NEUROGRAD_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("NEUROGRAD_CONFIG_PATH");

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_env_var_missing() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("absent.toml");

        env::set_var("NEUROGRAD_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("NEUROGRAD_CONFIG_PATH");

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_override_vars();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[neuron]").unwrap();
        writeln!(file, "model = \"plif\"").unwrap();
        writeln!(file, "tau = 4.0").unwrap();
        writeln!(file, "[execution]").unwrap();
        writeln!(file, "precision = \"fp16\"").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.neuron.model, "plif");
        assert_eq!(config.neuron.tau, 4.0);
        assert_eq!(config.neuron.v_reset, None);
        assert_eq!(config.execution.precision, "fp16");
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[neuron\nmodel = ").unwrap();

        let result = load_config(Some(&config_path), None);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = NeurogradConfig::default();

        env::set_var("NEUROGRAD_PRECISION", "fp16");
        env::set_var("NEUROGRAD_V_RESET", "none");
        env::set_var("NEUROGRAD_MAX_THREADS", "not-a-number");

        apply_environment_overrides(&mut config);
        clear_override_vars();

        assert_eq!(config.execution.precision, "fp16");
        assert_eq!(config.neuron.v_reset, None);
        assert_eq!(config.execution.max_threads, 0);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = NeurogradConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("neuron.tau".to_string(), "3.0".to_string());
        cli_args.insert("surrogate.name".to_string(), "atan".to_string());
        cli_args.insert("neuron.detach_reset".to_string(), "true".to_string());

        apply_cli_overrides(&mut config, &cli_args).unwrap();

        assert_eq!(config.neuron.tau, 3.0);
        assert_eq!(config.surrogate.name, "atan");
        assert!(config.neuron.detach_reset);
    }

    #[test]
    fn test_cli_rejects_bad_values() {
        let mut config = NeurogradConfig::default();

        let mut bad_number = HashMap::new();
        bad_number.insert("neuron.v_threshold".to_string(), "high".to_string());
        assert!(matches!(
            apply_cli_overrides(&mut config, &bad_number),
            Err(ConfigError::InvalidValue(_))
        ));

        let mut unknown = HashMap::new();
        unknown.insert("neuron.refractory".to_string(), "2".to_string());
        assert!(apply_cli_overrides(&mut config, &unknown).is_err());
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_override_vars();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[neuron]").unwrap();
        writeln!(file, "model = \"if\"").unwrap();
        writeln!(file, "v_threshold = 2.0").unwrap();

        env::set_var("NEUROGRAD_NEURON_MODEL", "lif");
        env::set_var("NEUROGRAD_V_THRESHOLD", "1.5");

        let mut cli_args = HashMap::new();
        cli_args.insert("neuron.model".to_string(), "plif".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args)).unwrap();
        clear_override_vars();

        // CLI wins for model, env wins for threshold
        assert_eq!(config.neuron.model, "plif");
        assert_eq!(config.neuron.v_threshold, 1.5);
    }
}
