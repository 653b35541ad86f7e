use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::filter::FilterState;
use crate::projection::SimulationParams;

/// A stored simulation setup.
///
/// ```toml
/// [params]
/// spend_change_pct = 10.0
/// price_change_pct = 0.05
/// spend_adjustment_start = 202407
/// price_adjustment_start = 202409
///
/// [filters]
/// LPGU = ["North"]
/// "Supplier Type" = ["Local", "Global"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub params: SimulationParams,
    pub filters: FilterState,
}

impl Scenario {
    pub fn from_toml_str(text: &str) -> Result<Self, SimError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path)?;
        let scenario = Self::from_toml_str(&text)?;
        log::info!("Loaded scenario from {}", path.display());
        Ok(scenario)
    }
}
