use std::path::Path;

use polars::prelude::*;

use crate::error::SimError;
use crate::filter::{self, Dimension, FilterState};
use crate::loader;
use crate::projection::{GlobalAnchor, Projection, SimulationParams};
use crate::report::Report;

/// Loaded dataset plus its global anchor month.
///
/// The dataset never changes after construction; every query and
/// simulation is computed from scratch against it.
#[derive(Debug, Clone)]
pub struct BudgetSimulator {
    dataset: DataFrame,
    anchor: GlobalAnchor,
}

/// Result of one apply action.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub filtered: DataFrame,
    pub projection: Projection,
    pub report: Report,
}

impl BudgetSimulator {
    /// Normalize an in-memory table and anchor it.
    pub fn from_frame(raw: DataFrame) -> Result<Self, SimError> {
        let dataset = loader::normalize(raw)?;
        Self::from_normalized(dataset)
    }

    /// Load a CSV or workbook. `sheet` applies to workbooks only.
    pub fn from_path(path: &Path, sheet: Option<&str>) -> Result<Self, SimError> {
        let dataset = loader::load_path(path, sheet)?;
        Self::from_normalized(dataset)
    }

    fn from_normalized(dataset: DataFrame) -> Result<Self, SimError> {
        let anchor = GlobalAnchor::from_dataset(&dataset)?;
        log::debug!(
            "Anchored {} rows at {} (month {})",
            dataset.height(),
            anchor.year_month,
            anchor.month()
        );
        Ok(Self { dataset, anchor })
    }

    pub fn dataset(&self) -> &DataFrame {
        &self.dataset
    }

    pub fn anchor(&self) -> &GlobalAnchor {
        &self.anchor
    }

    // ── Filtering ───────────────────────────────────────────────────────────

    pub fn available_options(
        &self,
        state: &FilterState,
        dim: Dimension,
    ) -> Result<Vec<String>, SimError> {
        filter::available_options(&self.dataset, state, dim)
    }

    pub fn available_options_all(
        &self,
        state: &FilterState,
    ) -> Result<Vec<(Dimension, Vec<String>)>, SimError> {
        filter::available_options_all(&self.dataset, state)
    }

    pub fn apply_filters(&self, state: &FilterState) -> Result<DataFrame, SimError> {
        filter::apply_filters(&self.dataset, state)
    }

    // ── Projection ──────────────────────────────────────────────────────────

    pub fn project(
        &self,
        filtered: &DataFrame,
        params: &SimulationParams,
    ) -> Result<Projection, SimError> {
        Projection::from_frame(filtered, &self.anchor, params)
    }

    /// Filter, project and build the report tables.
    pub fn simulate(
        &self,
        state: &FilterState,
        params: &SimulationParams,
    ) -> Result<Simulation, SimError> {
        let filtered = self.apply_filters(state)?;
        log::debug!(
            "Applied {} active filters: {} of {} rows",
            state.active().count(),
            filtered.height(),
            self.dataset.height()
        );

        let projection = self.project(&filtered, params)?;
        let report = Report::build(&filtered, &projection, &self.anchor)?;

        Ok(Simulation {
            filtered,
            projection,
            report,
        })
    }
}
