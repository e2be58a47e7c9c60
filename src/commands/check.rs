//! Check command implementation.
//!
//! Validates memory sources and configuration.

use herakles_memory_collector::collectors::{FallbackSource, PrimarySource};

use crate::config::{validate_effective_config, Config};

/// Validates memory sources and configuration.
pub fn command_check(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Herakles Memory Collector - System Check");
    println!("===========================================");

    let mut all_ok = true;
    let collector = config.memory_collector();

    println!("\n📁 Checking primary source...");
    let primary = collector.primary();
    let primary_ok = primary.can_read();
    if primary_ok {
        match primary.read_all() {
            Ok(text) => println!(
                "   ✅ {} readable ({} lines)",
                primary.path().display(),
                text.lines().count()
            ),
            Err(e) => println!("   ⚠️  {} readable but read failed: {}", primary.path().display(), e),
        }
    } else {
        println!("   ⚠️  {} not readable", primary.path().display());
    }

    println!("\n💾 Checking fallback source...");
    let fallback_ok = match collector.fallback().map(|f| f.snapshot()) {
        Some(Some((physical, _))) => {
            println!(
                "   ✅ sysinfo(2) available: total={}MB, free={}MB",
                physical.total / 1024 / 1024,
                physical.free / 1024 / 1024
            );
            true
        }
        Some(None) => {
            println!("   ⚠️  sysinfo(2) not available on this platform");
            false
        }
        None => {
            println!("   ⚠️  Fallback disabled in configuration");
            false
        }
    };

    if !primary_ok && !fallback_ok {
        println!("   ❌ No memory source usable, every cycle would report no data");
        all_ok = false;
    }

    // Check configuration
    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => {
            println!("   ✅ Configuration is valid");
        }
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}
