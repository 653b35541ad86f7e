use std::collections::HashMap;
use std::path::Path;

use pyo3::prelude::*;
use pyo3::types::PyModule;
use pyo3_polars::PyDataFrame;

use crate::filter::{Dimension, FilterState};
use crate::projection::{SimulationParams, YearMonth};
use crate::schema;
use crate::simulator::BudgetSimulator;

type Selections = HashMap<String, Vec<String>>;

fn filter_state(filters: Option<Selections>) -> PyResult<FilterState> {
    Ok(FilterState::from_selections(filters.unwrap_or_default())?)
}

#[pyclass(name = "BudgetSimulator")]
pub struct PyBudgetSimulator {
    inner: BudgetSimulator,
}

#[pymethods]
impl PyBudgetSimulator {
    /// Load a CSV or Excel file. `sheet` defaults to "data" for workbooks.
    #[new]
    #[pyo3(signature = (path, sheet=None))]
    fn new(path: &str, sheet: Option<&str>) -> PyResult<Self> {
        let inner = BudgetSimulator::from_path(Path::new(path), sheet)?;
        Ok(Self { inner })
    }

    /// Build from a polars DataFrame already in memory.
    #[staticmethod]
    fn from_frame(df: PyDataFrame) -> PyResult<Self> {
        let inner = BudgetSimulator::from_frame(df.0)?;
        Ok(Self { inner })
    }

    // ── Filters ─────────────────────────────────────────────────────────────

    /// Values still selectable for `dimension` given the other selections.
    #[pyo3(signature = (dimension, filters=None))]
    fn available_options(
        &self,
        dimension: &str,
        filters: Option<Selections>,
    ) -> PyResult<Vec<String>> {
        let dim: Dimension = dimension.parse()?;
        Ok(self.inner.available_options(&filter_state(filters)?, dim)?)
    }

    /// `(dimension, options)` pairs in filter-box order.
    #[pyo3(signature = (filters=None))]
    fn available_options_all(&self, filters: Option<Selections>) -> PyResult<Vec<(String, Vec<String>)>> {
        let all = self.inner.available_options_all(&filter_state(filters)?)?;
        Ok(all
            .into_iter()
            .map(|(d, opts)| (d.column().to_string(), opts))
            .collect())
    }

    #[pyo3(signature = (filters=None))]
    fn apply_filters(&self, filters: Option<Selections>) -> PyResult<PyDataFrame> {
        let df = self.inner.apply_filters(&filter_state(filters)?)?;
        Ok(PyDataFrame(df))
    }

    // ── Simulation ──────────────────────────────────────────────────────────

    /// Run one apply action and return `(title, table)` pairs.
    ///
    /// `price_change_pct` is a fraction (0.05 = 5%); `spend_change_pct` is a
    /// percentage (5.0 = 5%). Start months are YYYYMM integers and default
    /// to the current month.
    #[pyo3(signature = (
        filters=None,
        spend_change_pct=0.0,
        price_change_pct=0.0,
        spend_adjustment_start=None,
        price_adjustment_start=None,
        projection_year=None,
    ))]
    fn simulate(
        &self,
        filters: Option<Selections>,
        spend_change_pct: f64,
        price_change_pct: f64,
        spend_adjustment_start: Option<u32>,
        price_adjustment_start: Option<u32>,
        projection_year: Option<i32>,
    ) -> PyResult<Vec<(String, PyDataFrame)>> {
        let defaults = SimulationParams::default();
        let params = SimulationParams {
            spend_change_pct,
            price_change_pct,
            spend_adjustment_start: match spend_adjustment_start {
                Some(v) => YearMonth::try_from(v)?,
                None => defaults.spend_adjustment_start,
            },
            price_adjustment_start: match price_adjustment_start {
                Some(v) => YearMonth::try_from(v)?,
                None => defaults.price_adjustment_start,
            },
            projection_year,
        };

        let sim = self.inner.simulate(&filter_state(filters)?, &params)?;
        Ok(sim
            .report
            .tables
            .into_iter()
            .map(|t| (t.title.to_string(), PyDataFrame(t.frame)))
            .collect())
    }

    // ── Properties ──────────────────────────────────────────────────────────

    #[getter]
    fn dataset(&self) -> PyDataFrame {
        PyDataFrame(self.inner.dataset().clone())
    }

    #[getter]
    fn global_max_year_month(&self) -> i64 {
        self.inner.anchor().year_month
    }

    #[getter]
    fn global_max_month(&self) -> u32 {
        self.inner.anchor().month()
    }

    #[getter]
    fn global_max_month_name(&self) -> Option<&'static str> {
        self.inner.anchor().month_name()
    }
}

/// Export schema constants as Python submodules
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let dimension = PyModule::new(m.py(), "dimension")?;
    dimension.add("LPGU", schema::dimension::LPGU)?;
    dimension.add("SUPPLIER_TYPE", schema::dimension::SUPPLIER_TYPE)?;
    dimension.add("SUPPLIER_GUID", schema::dimension::SUPPLIER_GUID)?;
    dimension.add("LOCATION", schema::dimension::LOCATION)?;
    dimension.add("BUSINESS_LINE", schema::dimension::BUSINESS_LINE)?;
    dimension.add("SUPPLIER_NAME", schema::dimension::SUPPLIER_NAME)?;
    dimension.add("MDF", schema::dimension::MDF)?;
    dimension.add("ALL", schema::dimension::ALL.to_vec())?;
    m.add_submodule(&dimension)?;

    let key = PyModule::new(m.py(), "key")?;
    key.add("YEAR_MONTH", schema::key::YEAR_MONTH)?;
    key.add("PRODUCT_GROUP", schema::key::PRODUCT_GROUP)?;
    m.add_submodule(&key)?;

    let measure = PyModule::new(m.py(), "measure")?;
    measure.add("INVOICE_QUANTITY", schema::measure::INVOICE_QUANTITY)?;
    measure.add("INVOICE_QTY_REP", schema::measure::INVOICE_QTY_REP)?;
    measure.add("INVOICE_QTY_NON_REP", schema::measure::INVOICE_QTY_NON_REP)?;
    measure.add("SPEND", schema::measure::SPEND)?;
    measure.add("REP_SPEND", schema::measure::REP_SPEND)?;
    measure.add("NON_REP_SPEND", schema::measure::NON_REP_SPEND)?;
    measure.add("TOTAL_NMI_ACT", schema::measure::TOTAL_NMI_ACT)?;
    measure.add("NMI_REP_ACT", schema::measure::NMI_REP_ACT)?;
    measure.add("NMI_NON_REP_ACT", schema::measure::NMI_NON_REP_ACT)?;
    measure.add("ALL", schema::measure::ALL.to_vec())?;
    m.add_submodule(&measure)?;

    let report = PyModule::new(m.py(), "report")?;
    report.add("TITLES", crate::report::title::ALL.to_vec())?;
    m.add_submodule(&report)?;

    Ok(())
}

#[pymodule]
#[pyo3(name = "_core")]
fn core_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyBudgetSimulator>()?;
    add_schema_exports(m)?;
    Ok(())
}
