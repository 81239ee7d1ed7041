//! Bar widths understood by price providers, and the horizons the signal sweep scans

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Candle width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "2h")]
    H2,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    pub const fn as_str(self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::H2 => "2h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }

    pub const fn duration(self) -> Duration {
        match self {
            Timeframe::M1 => Duration::from_secs(60),
            Timeframe::M5 => Duration::from_secs(5 * 60),
            Timeframe::M15 => Duration::from_secs(15 * 60),
            Timeframe::H1 => Duration::from_secs(3600),
            Timeframe::H2 => Duration::from_secs(2 * 3600),
            Timeframe::H4 => Duration::from_secs(4 * 3600),
            Timeframe::D1 => Duration::from_secs(24 * 3600),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1m" => Ok(Timeframe::M1),
            "5m" => Ok(Timeframe::M5),
            "15m" => Ok(Timeframe::M15),
            "1h" => Ok(Timeframe::H1),
            "2h" => Ok(Timeframe::H2),
            "4h" => Ok(Timeframe::H4),
            "1d" => Ok(Timeframe::D1),
            other => Err(format!("unsupported timeframe '{}'", other)),
        }
    }
}

/// Timeframes scanned by the signal sweep, each on its own wall-clock boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Horizon {
    #[serde(rename = "2h")]
    H2,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl Horizon {
    pub const ALL: [Horizon; 3] = [Horizon::H2, Horizon::H4, Horizon::D1];

    pub const fn timeframe(self) -> Timeframe {
        match self {
            Horizon::H2 => Timeframe::H2,
            Horizon::H4 => Timeframe::H4,
            Horizon::D1 => Timeframe::D1,
        }
    }

    /// Spacing between candle closes, in whole UTC hours
    pub const fn period_hours(self) -> u32 {
        match self {
            Horizon::H2 => 2,
            Horizon::H4 => 4,
            Horizon::D1 => 24,
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.timeframe().as_str())
    }
}

impl FromStr for Horizon {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<Timeframe>()? {
            Timeframe::H2 => Ok(Horizon::H2),
            Timeframe::H4 => Ok(Horizon::H4),
            Timeframe::D1 => Ok(Horizon::D1),
            other => Err(format!("'{}' is not a scan horizon", other)),
        }
    }
}
