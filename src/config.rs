//! Configuration management for herakles-memory-collector.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat};
use herakles_memory_collector::collectors::{ProcMeminfo, SysinfoMemory, PROC_MEMINFO};
use herakles_memory_collector::{MemoryCollector, RuntimeConfig, UnitError, UnitSymbol};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9216;
pub const DEFAULT_METRIC_PREFIX: &str = "herakles_memory";
pub const DEFAULT_BYTE_UNIT: &str = "byte";

/// Collector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,

    // Collection
    pub enabled: Option<bool>,
    /// Report every counter instead of the well-known set
    pub detailed: Option<bool>,
    /// Target units; only the first one is applied per cycle.
    /// Accepts a list or a comma-separated string.
    #[serde(
        default,
        alias = "byte-unit",
        deserialize_with = "deserialize_units"
    )]
    pub byte_unit: Option<Vec<String>>,
    #[serde(alias = "meminfo-path")]
    pub meminfo_path: Option<PathBuf>,
    #[serde(alias = "enable-fallback")]
    pub enable_fallback: Option<bool>,

    // Export
    #[serde(alias = "metric-prefix")]
    pub metric_prefix: Option<String>,
    #[serde(alias = "enable-health")]
    pub enable_health: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: Some(DEFAULT_PORT),
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            log_level: Some("info".into()),
            enabled: Some(true),
            detailed: Some(false),
            byte_unit: Some(vec![DEFAULT_BYTE_UNIT.to_string()]),
            meminfo_path: Some(PathBuf::from(PROC_MEMINFO)),
            enable_fallback: Some(true),
            metric_prefix: Some(DEFAULT_METRIC_PREFIX.to_string()),
            enable_health: Some(true),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn deserialize_units<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let units = Option::<OneOrMany>::deserialize(deserializer)?;
    Ok(units.map(|u| match u {
        OneOrMany::One(s) => split_units(&s),
        OneOrMany::Many(v) => v,
    }))
}

fn split_units(s: &str) -> Vec<String> {
    s.split(',')
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect()
}

impl Config {
    pub fn meminfo_path(&self) -> PathBuf {
        self.meminfo_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(PROC_MEMINFO))
    }

    pub fn metric_prefix(&self) -> &str {
        self.metric_prefix.as_deref().unwrap_or(DEFAULT_METRIC_PREFIX)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    /// Collector over the configured meminfo file, with or without fallback.
    pub fn memory_collector(&self) -> MemoryCollector {
        let fallback = if self.enable_fallback.unwrap_or(true) {
            Some(SysinfoMemory::new())
        } else {
            None
        };
        MemoryCollector::with_sources(ProcMeminfo::new(self.meminfo_path()), fallback)
    }

    /// Per-cycle view of the collection settings.
    pub fn runtime_config(&self) -> Result<RuntimeConfig, UnitError> {
        let default_units = [DEFAULT_BYTE_UNIT.to_string()];
        let units = self.byte_unit.as_deref().unwrap_or(&default_units);
        RuntimeConfig::from_unit_names(self.detailed.unwrap_or(false), units)
    }
}

/// Prometheus metric names: `[a-zA-Z_:][a-zA-Z0-9_:]*`
fn is_valid_metric_prefix(prefix: &str) -> bool {
    let mut chars = prefix.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(units) = &cfg.byte_unit {
        if units.is_empty() {
            return Err("byte_unit must name at least one unit".into());
        }
        for unit in units {
            unit.parse::<UnitSymbol>()
                .map_err(|e| format!("Invalid byte_unit: {}", e))?;
        }
    }

    if let Some(bind) = &cfg.bind {
        bind.parse::<std::net::IpAddr>()
            .map_err(|e| format!("Invalid bind address '{}': {}", bind, e))?;
    }

    if let Some(path) = &cfg.meminfo_path {
        if path.as_os_str().is_empty() {
            return Err("meminfo_path must not be empty".into());
        }
    }

    let prefix = cfg.metric_prefix();
    if !is_valid_metric_prefix(prefix) {
        return Err(format!(
            "Invalid metric_prefix '{}', expected [a-zA-Z_:][a-zA-Z0-9_:]*",
            prefix
        )
        .into());
    }

    if let Some(level) = cfg.log_level.as_deref() {
        match level {
            "off" | "error" | "warn" | "info" | "debug" | "trace" => {}
            other => {
                return Err(format!(
                    "Invalid log_level '{}', expected off, error, warn, info, debug or trace",
                    other
                )
                .into());
            }
        }
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }

    // Collection overrides
    if args.detailed {
        config.detailed = Some(true);
    }
    if let Some(units) = &args.byte_unit {
        config.byte_unit = Some(split_units(units));
    }
    if let Some(path) = &args.meminfo_path {
        config.meminfo_path = Some(path.clone());
    }
    if args.disable_fallback {
        config.enable_fallback = Some(false);
    }

    if args.disable_health {
        config.enable_health = Some(false);
    }

    Ok(config)
}

/// Configuration loading with multiple format support
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = if let Some(p) = path {
        PathBuf::from(p)
    } else {
        // Try default locations
        let defaults = [
            "/etc/herakles/memory-collector.yaml",
            "/etc/herakles/memory-collector.yml",
            "/etc/herakles/memory-collector.json",
            "/etc/herakles/memory-collector.toml",
            "./herakles-memory-collector.yaml",
            "./herakles-memory-collector.yml",
            "./herakles-memory-collector.json",
        ];

        defaults
            .iter()
            .find(|p| Path::new(p).exists())
            .map(PathBuf::from)
            .unwrap_or_default()
    };

    if path.as_os_str().is_empty() || !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Renders configuration in the requested format
pub fn render_config(
    config: &Config,
    format: &ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, &format)?);
    Ok(())
}
