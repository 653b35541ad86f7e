//! Year-end extrapolation and the spend/price simulation.
//!
//! Rounding (half to even) happens at fixed points in the sequence. The
//! rounded intermediates are part of the output contract and must not be
//! carried at higher precision.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local, Month};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::schema::{key, measure, year_end};

const MONTHS_PER_YEAR: u32 = 12;

fn round(x: f64) -> f64 {
    x.round_ties_even()
}

/// `num / den`, or 0 when the denominator is 0.
fn guarded_div(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

pub fn month_name(month: u32) -> Option<&'static str> {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
}

// ── YearMonth ───────────────────────────────────────────────────────────────

/// A calendar month in YYYYMM form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct YearMonth(u32);

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, SimError> {
        if !(1..=MONTHS_PER_YEAR).contains(&month) || !(0..=9999).contains(&year) {
            return Err(SimError::Validation(format!(
                "Invalid year-month: {year}-{month:02}"
            )));
        }
        Ok(Self(year as u32 * 100 + month))
    }

    pub fn current() -> Self {
        let now = Local::now();
        Self(now.year() as u32 * 100 + now.month())
    }

    pub fn year(self) -> i32 {
        (self.0 / 100) as i32
    }

    pub fn month(self) -> u32 {
        self.0 % 100
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for YearMonth {
    type Error = SimError;

    fn try_from(v: u32) -> Result<Self, Self::Error> {
        Self::new((v / 100) as i32, v % 100)
    }
}

impl From<YearMonth> for u32 {
    fn from(ym: YearMonth) -> u32 {
        ym.0
    }
}

impl FromStr for YearMonth {
    type Err = SimError;

    /// Accepts `YYYYMM` or `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s.trim().chars().filter(|c| *c != '-').collect();
        if digits.len() != 6 {
            return Err(SimError::Validation(format!(
                "Expected YYYYMM, got '{s}'"
            )));
        }
        let v: u32 = digits
            .parse()
            .map_err(|_| SimError::Validation(format!("Expected YYYYMM, got '{s}'")))?;
        Self::try_from(v)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Global anchor ───────────────────────────────────────────────────────────

/// Latest month with actuals in the *unfiltered* dataset. Filters never move it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalAnchor {
    pub year_month: i64,
}

impl GlobalAnchor {
    pub fn new(year_month: i64) -> Result<Self, SimError> {
        if year_month < 0 || year_month % 100 > MONTHS_PER_YEAR as i64 {
            return Err(SimError::InvalidData(format!(
                "'{}' value {year_month} is not a valid YYYYMM",
                key::YEAR_MONTH
            )));
        }
        Ok(Self { year_month })
    }

    pub fn from_dataset(df: &DataFrame) -> Result<Self, SimError> {
        let s = df.column(key::YEAR_MONTH)?.as_materialized_series();
        let max = s
            .max_reduce()?
            .value()
            .try_extract::<i64>()
            .unwrap_or(0);
        let anchor = Self::new(max)?;
        if anchor.month() == 0 {
            log::warn!(
                "No '{}' month in the dataset; per-month figures default to 0",
                key::YEAR_MONTH
            );
        }
        Ok(anchor)
    }

    /// Month component; 0 when the data carries no usable month.
    pub fn month(&self) -> u32 {
        (self.year_month % 100) as u32
    }

    pub fn month_name(&self) -> Option<&'static str> {
        month_name(self.month())
    }

    /// Months strictly after the anchor month, through December.
    pub fn remaining_months(&self) -> std::ops::RangeInclusive<u32> {
        (self.month() + 1)..=MONTHS_PER_YEAR
    }
}

// ── Parameters ──────────────────────────────────────────────────────────────

/// User inputs of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Spend change in percent (10.0 = 10%).
    pub spend_change_pct: f64,
    /// Price change as a fraction (0.05 = 5%).
    pub price_change_pct: f64,
    pub spend_adjustment_start: YearMonth,
    pub price_adjustment_start: YearMonth,
    /// Year the remaining months belong to. Defaults to the current year.
    pub projection_year: Option<i32>,
}

impl SimulationParams {
    /// Explicit `projection_year`, else the calendar year of today.
    pub fn resolved_year(&self) -> i32 {
        self.projection_year
            .unwrap_or_else(|| YearMonth::current().year())
    }
}

impl Default for SimulationParams {
    fn default() -> Self {
        let now = YearMonth::current();
        Self {
            spend_change_pct: 0.0,
            price_change_pct: 0.0,
            spend_adjustment_start: now,
            price_adjustment_start: now,
            projection_year: None,
        }
    }
}

// ── Inputs aggregated from the filtered subset ──────────────────────────────

/// Column sums the projection needs, taken from the filtered subset.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeasureTotals {
    pub invoice_quantity: f64,
    pub invoice_qty_rep: f64,
    pub invoice_qty_non_rep: f64,
    pub spend: f64,
    pub rep_spend: f64,
    pub non_rep_spend: f64,
    pub total_nmi_act: f64,
    pub nmi_rep_act: f64,
    pub nmi_non_rep_act: f64,
    pub year_end: YearEndValues,
}

impl MeasureTotals {
    /// Sum the nine actuals and the six per-row year-end extrapolations.
    pub fn from_frame(df: &DataFrame, anchor_month: u32) -> Result<Self, SimError> {
        let with_ye = with_year_end_columns(df, anchor_month)?;
        let sum = |name: &str| -> Result<f64, SimError> { column_sum(&with_ye, name) };

        Ok(Self {
            invoice_quantity: sum(measure::INVOICE_QUANTITY)?,
            invoice_qty_rep: sum(measure::INVOICE_QTY_REP)?,
            invoice_qty_non_rep: sum(measure::INVOICE_QTY_NON_REP)?,
            spend: sum(measure::SPEND)?,
            rep_spend: sum(measure::REP_SPEND)?,
            non_rep_spend: sum(measure::NON_REP_SPEND)?,
            total_nmi_act: sum(measure::TOTAL_NMI_ACT)?,
            nmi_rep_act: sum(measure::NMI_REP_ACT)?,
            nmi_non_rep_act: sum(measure::NMI_NON_REP_ACT)?,
            year_end: YearEndValues {
                spend: sum(year_end::SPEND_YE)?,
                spend_rep: sum(year_end::SPEND_REP_YE)?,
                spend_non_rep: sum(year_end::SPEND_NON_REP_YE)?,
                nmi: sum(year_end::NMI_YE)?,
                nmi_rep: sum(year_end::NMI_REP_YE)?,
                nmi_non_rep: sum(year_end::NMI_NON_REP_YE)?,
            },
        })
    }

    /// Values in the order of `measure::ALL`.
    pub fn actuals(&self) -> [f64; 9] {
        [
            self.invoice_quantity,
            self.invoice_qty_rep,
            self.invoice_qty_non_rep,
            self.spend,
            self.rep_spend,
            self.non_rep_spend,
            self.total_nmi_act,
            self.nmi_rep_act,
            self.nmi_non_rep_act,
        ]
    }
}

fn column_sum(df: &DataFrame, name: &str) -> Result<f64, SimError> {
    let s = df.column(name)?.as_materialized_series();
    let val = s.sum_reduce()?;
    Ok(val.value().try_extract::<f64>().unwrap_or(0.0))
}

/// Add the six `... YE` columns: `(actual / anchor_month) * 12` per row,
/// or 0 when there is no anchor month.
pub fn with_year_end_columns(df: &DataFrame, anchor_month: u32) -> Result<DataFrame, SimError> {
    let exprs: Vec<Expr> = year_end::PAIRS
        .iter()
        .map(|(actual, ye)| {
            if anchor_month == 0 {
                lit(0.0).alias(*ye)
            } else {
                ((col(*actual) / lit(anchor_month as f64)) * lit(MONTHS_PER_YEAR as f64)).alias(*ye)
            }
        })
        .collect();
    Ok(df.clone().lazy().with_columns(exprs).collect()?)
}

// ── Outputs ─────────────────────────────────────────────────────────────────

/// A value attached to one of the remaining calendar months.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthValue {
    pub month: u32,
    pub year_month: u32,
    pub value: f64,
}

impl MonthValue {
    pub fn name(&self) -> &'static str {
        month_name(self.month).unwrap_or("")
    }
}

/// Inputs to the NMI adjustment.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriceCalculations {
    pub average_price_ytd: f64,
    pub average_new_price: f64,
    pub monthly_volumes_impacted: f64,
    pub delta_nmi_impact_monthly: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct YearEndValues {
    pub spend: f64,
    pub spend_rep: f64,
    pub spend_non_rep: f64,
    pub nmi: f64,
    pub nmi_rep: f64,
    pub nmi_non_rep: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimulatedValues {
    pub spend: f64,
    pub spend_rep: f64,
    pub spend_non_rep: f64,
    pub nmi: f64,
    pub nmi_rep: f64,
    pub nmi_non_rep: f64,
}

/// Every figure one apply action produces.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub anchor_month: u32,
    pub ytd_rep_spend: f64,
    pub monthly_spend: f64,
    /// Remaining months at the flat run-rate.
    pub baseline_spend: Vec<MonthValue>,
    pub total_projected_spend: f64,
    pub calculations: PriceCalculations,
    pub adjusted_spend: Vec<MonthValue>,
    pub adjusted_total_spend: f64,
    pub nmi_rep_act: f64,
    pub monthly_nmi_rep: f64,
    pub adjusted_nmi_rep: Vec<MonthValue>,
    pub total_nmi_rep_variation: f64,
    pub simulated: SimulatedValues,
    pub year_end: YearEndValues,
    pub totals: MeasureTotals,
}

impl Projection {
    /// Run the simulation over already aggregated totals.
    ///
    /// Fails with `SimError::Validation` when the projection year is outside
    /// 0..=9999.
    pub fn compute(
        totals: &MeasureTotals,
        anchor: &GlobalAnchor,
        params: &SimulationParams,
    ) -> Result<Self, SimError> {
        let m = anchor.month() as f64;
        let year = params.resolved_year();
        // Also rejects a bad year when no month remains.
        YearMonth::new(year, 1)?;
        let months: Vec<(u32, u32)> = anchor
            .remaining_months()
            .map(|mm| YearMonth::new(year, mm).map(|ym| (mm, ym.as_u32())))
            .collect::<Result<_, _>>()?;

        let ytd_rep_spend = round(totals.rep_spend);
        let monthly_spend = round(guarded_div(ytd_rep_spend, m));

        let baseline_spend: Vec<MonthValue> = months
            .iter()
            .map(|&(month, year_month)| MonthValue {
                month,
                year_month,
                value: monthly_spend,
            })
            .collect();
        let total_projected_spend =
            ytd_rep_spend + baseline_spend.iter().map(|v| v.value).sum::<f64>();

        let average_price_ytd = guarded_div(ytd_rep_spend, totals.invoice_qty_rep);
        let average_new_price = average_price_ytd * (1.0 - params.price_change_pct);
        let monthly_volumes_impacted = guarded_div(totals.invoice_qty_rep, m);
        let calculations = PriceCalculations {
            average_price_ytd,
            average_new_price,
            monthly_volumes_impacted,
            delta_nmi_impact_monthly: (average_price_ytd - average_new_price)
                * monthly_volumes_impacted,
        };

        let spend_start = params.spend_adjustment_start.as_u32();
        let price_start = params.price_adjustment_start.as_u32();

        // Spend and price both scale spend.
        let adjusted_spend: Vec<MonthValue> = months
            .iter()
            .map(|&(month, year_month)| {
                let mut value = monthly_spend;
                if year_month >= spend_start {
                    value *= 1.0 - params.spend_change_pct / 100.0;
                }
                if year_month >= price_start {
                    value *= 1.0 - params.price_change_pct;
                }
                MonthValue {
                    month,
                    year_month,
                    value: round(value),
                }
            })
            .collect();
        let adjusted_total_spend =
            ytd_rep_spend + adjusted_spend.iter().map(|v| v.value).sum::<f64>();

        // Price shifts NMI by an additive monthly delta.
        let monthly_nmi_rep = round(guarded_div(totals.nmi_rep_act, m));
        let adjusted_nmi_rep: Vec<MonthValue> = months
            .iter()
            .map(|&(month, year_month)| {
                let value = if year_month >= price_start {
                    monthly_nmi_rep + calculations.delta_nmi_impact_monthly
                } else {
                    monthly_nmi_rep
                };
                MonthValue {
                    month,
                    year_month,
                    value: round(value),
                }
            })
            .collect();
        let total_nmi_rep_variation =
            totals.nmi_rep_act + adjusted_nmi_rep.iter().map(|v| v.value).sum::<f64>();

        let year_end = totals.year_end;
        let spend_rep = adjusted_total_spend;
        let nmi_rep = total_nmi_rep_variation;
        let simulated = SimulatedValues {
            spend: spend_rep + year_end.spend_non_rep,
            spend_rep,
            spend_non_rep: year_end.spend_non_rep,
            nmi: nmi_rep + year_end.nmi_non_rep,
            nmi_rep,
            nmi_non_rep: year_end.nmi_non_rep,
        };

        Ok(Self {
            anchor_month: anchor.month(),
            ytd_rep_spend,
            monthly_spend,
            baseline_spend,
            total_projected_spend,
            calculations,
            adjusted_spend,
            adjusted_total_spend,
            nmi_rep_act: totals.nmi_rep_act,
            monthly_nmi_rep,
            adjusted_nmi_rep,
            total_nmi_rep_variation,
            simulated,
            year_end,
            totals: *totals,
        })
    }

    /// Aggregate the filtered subset and run the simulation.
    pub fn from_frame(
        filtered: &DataFrame,
        anchor: &GlobalAnchor,
        params: &SimulationParams,
    ) -> Result<Self, SimError> {
        let totals = MeasureTotals::from_frame(filtered, anchor.month())?;
        Self::compute(&totals, anchor, params)
    }
}
