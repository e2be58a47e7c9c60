//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from("herakles-memory-collector.yaml"),
    };

    let mut content = render_config(&config, &format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# Herakles Memory Collector Configuration
# =======================================
#
# Server Configuration
# --------------------
# bind: "0.0.0.0"              # Bind IP (0.0.0.0 = all interfaces)
# port: 9216                   # HTTP port
# enable_health: true          # Enable /health endpoint
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
#
# Collection
# ----------
# enabled: true                # false = serve self-telemetry only
# detailed: false              # true = report every meminfo counter,
#                              # false = only MemTotal, MemFree, Buffers, Cached,
#                              #   Active, Dirty, Inactive, Shmem, SwapTotal, SwapFree,
#                              #   SwapCached, VmallocTotal, VmallocUsed, VmallocChunk
# byte_unit:                   # Target unit; only the first entry is applied.
#   - byte                     #   bit, kilobit .. exabit, byte, kilobyte .. exabyte
#                              #   (aliases such as kB, MiB, GiB are accepted)
# meminfo_path: /proc/meminfo  # Primary source
# enable_fallback: true        # Use sysinfo(2) when the primary source is unreadable
#
# Export
# ------
# metric_prefix: herakles_memory  # Gauges are exported as <prefix>_value{field,unit}
"#;

    format!("{comments}\n{yaml}")
}
