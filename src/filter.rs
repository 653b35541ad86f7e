//! Faceted filtering over the seven categorical dimensions.
//!
//! A [`FilterState`] is a plain value: every edit returns a new state, and
//! the functions here are pure over `(dataset, state)`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::schema::dimension;

/// One of the filterable categorical columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
    Lpgu,
    SupplierType,
    SupplierGuid,
    Location,
    BusinessLine,
    SupplierName,
    Mdf,
}

impl Dimension {
    /// Canonical order, as presented in the filters box.
    pub const ALL: [Dimension; 7] = [
        Dimension::Lpgu,
        Dimension::SupplierType,
        Dimension::SupplierGuid,
        Dimension::Location,
        Dimension::BusinessLine,
        Dimension::SupplierName,
        Dimension::Mdf,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Dimension::Lpgu => dimension::LPGU,
            Dimension::SupplierType => dimension::SUPPLIER_TYPE,
            Dimension::SupplierGuid => dimension::SUPPLIER_GUID,
            Dimension::Location => dimension::LOCATION,
            Dimension::BusinessLine => dimension::BUSINESS_LINE,
            Dimension::SupplierName => dimension::SUPPLIER_NAME,
            Dimension::Mdf => dimension::MDF,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Dimension {
    type Err = SimError;

    /// Accepts the exact column name (case-sensitive, as in the input table).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dimension::ALL
            .into_iter()
            .find(|d| d.column() == s)
            .ok_or_else(|| SimError::UnknownDimension(s.to_string()))
    }
}

/// Selected values per dimension. A dimension without a selection is
/// unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Vec<String>>",
    into = "BTreeMap<String, Vec<String>>"
)]
pub struct FilterState {
    selections: BTreeMap<Dimension, BTreeSet<String>>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection for one dimension. An empty selection clears it.
    #[must_use]
    pub fn with_selection<I, S>(mut self, dim: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if set.is_empty() {
            self.selections.remove(&dim);
        } else {
            self.selections.insert(dim, set);
        }
        self
    }

    #[must_use]
    pub fn clear_dimension(mut self, dim: Dimension) -> Self {
        self.selections.remove(&dim);
        self
    }

    /// The state after "Clear Filters".
    #[must_use]
    pub fn cleared(&self) -> Self {
        Self::default()
    }

    pub fn selection(&self, dim: Dimension) -> Option<&BTreeSet<String>> {
        self.selections.get(&dim)
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Dimensions that currently restrict the dataset.
    pub fn active(&self) -> impl Iterator<Item = (Dimension, &BTreeSet<String>)> {
        self.selections.iter().map(|(d, v)| (*d, v))
    }

    /// Build from column-name keyed selections, e.g. parsed from a scenario
    /// file or handed over from Python.
    pub fn from_selections<I, K, V>(selections: I) -> Result<Self, SimError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoIterator<Item = String>,
    {
        let mut state = Self::new();
        for (name, values) in selections {
            let dim: Dimension = name.as_ref().parse()?;
            state = state.with_selection(dim, values);
        }
        Ok(state)
    }
}

impl TryFrom<BTreeMap<String, Vec<String>>> for FilterState {
    type Error = SimError;

    fn try_from(map: BTreeMap<String, Vec<String>>) -> Result<Self, Self::Error> {
        Self::from_selections(map)
    }
}

impl From<FilterState> for BTreeMap<String, Vec<String>> {
    fn from(state: FilterState) -> Self {
        state
            .selections
            .into_iter()
            .map(|(d, v)| (d.column().to_string(), v.into_iter().collect()))
            .collect()
    }
}

// ── Filtering ───────────────────────────────────────────────────────────────

fn membership(dim: Dimension, values: &BTreeSet<String>) -> Expr {
    let allowed = Series::new(
        dim.column().into(),
        values.iter().map(String::as_str).collect::<Vec<_>>(),
    );
    col(dim.column()).is_in(lit(allowed), false)
}

/// AND of the membership predicates of every active dimension except `skip`.
fn restrict(df: &DataFrame, state: &FilterState, skip: Option<Dimension>) -> Result<DataFrame, SimError> {
    let predicate = state
        .active()
        .filter(|(d, _)| Some(*d) != skip)
        .map(|(d, values)| membership(d, values))
        .reduce(|acc, e| acc.and(e));

    match predicate {
        Some(p) => Ok(df.clone().lazy().filter(p).collect()?),
        None => Ok(df.clone()),
    }
}

/// Distinct non-missing values of `target` left once every *other*
/// dimension's selection is applied. Sorted.
pub fn available_options(
    df: &DataFrame,
    state: &FilterState,
    target: Dimension,
) -> Result<Vec<String>, SimError> {
    let subset = restrict(df, state, Some(target))?;
    let values = subset
        .column(target.column())
        .map_err(|_| SimError::ColumnNotFound(target.column().to_string()))?
        .str()?;

    let distinct: BTreeSet<String> = values
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect();
    Ok(distinct.into_iter().collect())
}

/// [`available_options`] for every dimension, in canonical order.
pub fn available_options_all(
    df: &DataFrame,
    state: &FilterState,
) -> Result<Vec<(Dimension, Vec<String>)>, SimError> {
    Dimension::ALL
        .into_iter()
        .map(|d| Ok((d, available_options(df, state, d)?)))
        .collect()
}

/// Rows matching every active selection. An empty result is valid.
pub fn apply_filters(df: &DataFrame, state: &FilterState) -> Result<DataFrame, SimError> {
    restrict(df, state, None)
}
