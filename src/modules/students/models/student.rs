// Student identity as the billing engine sees it.
//
// Only the fields that participate in fee resolution are modelled here;
// admissions/profile data lives outside this service.

use serde::{Deserialize, Serialize};

/// Delivery channel. Each mode has independently configurable fee fields
/// on every level of the academic hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "online")]
    Online,
    #[serde(rename = "offline")]
    Offline,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Online => write!(f, "online"),
            Mode::Offline => write!(f, "offline"),
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "online" => Ok(Mode::Online),
            "offline" => Ok(Mode::Offline),
            _ => Err(format!("Invalid mode: {}", s)),
        }
    }
}

/// Fee classification. Sadka students bill against the subsidized fee
/// fields instead of the general monthly fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeTier {
    #[serde(rename = "general")]
    General,
    #[serde(rename = "sadka")]
    Sadka,
}

impl std::fmt::Display for FeeTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeeTier::General => write!(f, "general"),
            FeeTier::Sadka => write!(f, "sadka"),
        }
    }
}

impl std::str::FromStr for FeeTier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "general" => Ok(FeeTier::General),
            "sadka" => Ok(FeeTier::Sadka),
            _ => Err(format!("Invalid fee tier: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub mode: Mode,
    pub fee_tier: FeeTier,
    /// Deactivated students are never billed. Students are soft-deactivated
    /// rather than deleted while invoices reference them.
    pub active: bool,
}
