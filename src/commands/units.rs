//! Units command implementation.
//!
//! Lists recognized unit symbols.

use herakles_memory_collector::UnitSymbol;

/// Lists every unit with its aliases and size in bytes.
pub fn command_units() -> Result<(), Box<dyn std::error::Error>> {
    println!("📏 Herakles Memory Collector - Supported Units");
    println!("==============================================");
    println!();
    println!("{:10} | {:>26} | Aliases", "Unit", "Bytes");
    println!("{}", "-".repeat(72));

    for unit in UnitSymbol::ALL {
        println!(
            "{:10} | {:>26} | {}",
            unit.name(),
            unit.scale_factor(),
            unit.aliases()[1..].join(", ")
        );
    }

    println!("\n📋 Total: {} units (binary, 1 kilobyte = 1024 bytes)", UnitSymbol::ALL.len());
    Ok(())
}
