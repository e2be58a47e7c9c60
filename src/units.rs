//! Binary unit vocabulary and conversion.
//!
//! Every unit is described by its scale factor relative to one byte. Byte
//! units step by 1024, bit units are an eighth of the byte unit of the same
//! tier. All factors are powers of two, so rescaling a finite value never
//! loses precision beyond what `f64` itself imposes.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Number of bytes in one step of the binary ladder.
const BINARY_STEP: f64 = 1024.0;

/// A binary byte-magnitude unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSymbol {
    Bit,
    Kilobit,
    Megabit,
    Gigabit,
    Terabit,
    Petabit,
    Exabit,
    Byte,
    Kilobyte,
    Megabyte,
    Gigabyte,
    Terabyte,
    Petabyte,
    Exabyte,
}

/// Error returned when a unit token is not part of the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitError {
    #[error("unknown unit '{0}'")]
    Unknown(String),
}

impl UnitSymbol {
    /// All recognized units, smallest first.
    pub const ALL: [UnitSymbol; 14] = [
        UnitSymbol::Bit,
        UnitSymbol::Byte,
        UnitSymbol::Kilobit,
        UnitSymbol::Kilobyte,
        UnitSymbol::Megabit,
        UnitSymbol::Megabyte,
        UnitSymbol::Gigabit,
        UnitSymbol::Gigabyte,
        UnitSymbol::Terabit,
        UnitSymbol::Terabyte,
        UnitSymbol::Petabit,
        UnitSymbol::Petabyte,
        UnitSymbol::Exabit,
        UnitSymbol::Exabyte,
    ];

    /// Canonical long name, as used in configuration and metric labels.
    pub fn name(self) -> &'static str {
        self.aliases()[0]
    }

    /// Accepted spellings; the first entry is the canonical name.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            UnitSymbol::Bit => &["bit", "b"],
            UnitSymbol::Kilobit => &["kilobit", "kbit", "Kibit"],
            UnitSymbol::Megabit => &["megabit", "Mbit", "Mibit"],
            UnitSymbol::Gigabit => &["gigabit", "Gbit", "Gibit"],
            UnitSymbol::Terabit => &["terabit", "Tbit", "Tibit"],
            UnitSymbol::Petabit => &["petabit", "Pbit", "Pibit"],
            UnitSymbol::Exabit => &["exabit", "Ebit", "Eibit"],
            UnitSymbol::Byte => &["byte", "B"],
            UnitSymbol::Kilobyte => &["kilobyte", "kB", "KB", "KiB"],
            UnitSymbol::Megabyte => &["megabyte", "MB", "MiB", "Mbyte"],
            UnitSymbol::Gigabyte => &["gigabyte", "GB", "GiB"],
            UnitSymbol::Terabyte => &["terabyte", "TB", "TiB"],
            UnitSymbol::Petabyte => &["petabyte", "PB", "PiB"],
            UnitSymbol::Exabyte => &["exabyte", "EB", "EiB"],
        }
    }

    /// Position on the 1024 ladder (byte and bit are tier 0).
    fn tier(self) -> i32 {
        match self {
            UnitSymbol::Bit | UnitSymbol::Byte => 0,
            UnitSymbol::Kilobit | UnitSymbol::Kilobyte => 1,
            UnitSymbol::Megabit | UnitSymbol::Megabyte => 2,
            UnitSymbol::Gigabit | UnitSymbol::Gigabyte => 3,
            UnitSymbol::Terabit | UnitSymbol::Terabyte => 4,
            UnitSymbol::Petabit | UnitSymbol::Petabyte => 5,
            UnitSymbol::Exabit | UnitSymbol::Exabyte => 6,
        }
    }

    pub fn is_bit_unit(self) -> bool {
        matches!(
            self,
            UnitSymbol::Bit
                | UnitSymbol::Kilobit
                | UnitSymbol::Megabit
                | UnitSymbol::Gigabit
                | UnitSymbol::Terabit
                | UnitSymbol::Petabit
                | UnitSymbol::Exabit
        )
    }

    /// Number of bytes in one of this unit.
    pub fn scale_factor(self) -> f64 {
        let bytes = BINARY_STEP.powi(self.tier());
        if self.is_bit_unit() {
            bytes / 8.0
        } else {
            bytes
        }
    }
}

impl FromStr for UnitSymbol {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        UnitSymbol::ALL
            .into_iter()
            .find(|unit| unit.aliases().contains(&token))
            .ok_or_else(|| UnitError::Unknown(token.to_string()))
    }
}

impl fmt::Display for UnitSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rescales `value` from one unit to another.
///
/// The ratio of two scale factors is itself a power of two, so the result is
/// exact for every finite input that does not overflow.
pub fn convert(value: f64, from: UnitSymbol, to: UnitSymbol) -> f64 {
    if from == to {
        return value;
    }
    value * (from.scale_factor() / to.scale_factor())
}

/// Like [`convert`], with both units given as tokens.
pub fn convert_str(value: f64, from: &str, to: &str) -> Result<f64, UnitError> {
    Ok(convert(value, from.parse()?, to.parse()?))
}
