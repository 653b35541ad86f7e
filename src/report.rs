//! Report module: the eight named tables shown after each apply action.
//!
//! Every table is a display-ready DataFrame of strings. Monetary and count
//! figures are truncated to whole units and thousands-separated; the
//! calculation inputs keep two decimals.

use std::fmt::Write as FmtWrite;

use polars::prelude::*;

use crate::error::SimError;
use crate::projection::{GlobalAnchor, MonthValue, Projection};
use crate::schema::*;

// ── Titles ──────────────────────────────────────────────────────────────────

pub mod title {
    pub const AVAILABLE_DATA: &str = "Available Data";
    pub const CALCULATIONS: &str = "Calculations";
    pub const REP_SPEND_EXTRAPOLATION: &str = "Rep Spend Extrapolation";
    pub const REP_SPEND_VARIATION: &str = "Rep Spend Variation";
    pub const NMI_REP_VARIATION: &str = "NMI Rep Variation";
    pub const SIMULATED_VALUES: &str = "Simulated Values";
    pub const YEAR_END_VALUES: &str = "Year End Extrapolated Values";
    pub const YTD_VALUES: &str = "YTD Available Values";

    pub const ALL: [&str; 8] = [
        AVAILABLE_DATA,
        CALCULATIONS,
        REP_SPEND_EXTRAPOLATION,
        REP_SPEND_VARIATION,
        NMI_REP_VARIATION,
        SIMULATED_VALUES,
        YEAR_END_VALUES,
        YTD_VALUES,
    ];
}

const TOTAL: &str = "Total";

// ── Number formatting ───────────────────────────────────────────────────────

fn group_digits(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Whole units, truncated toward zero, with `,` thousands separators.
pub fn format_thousands(x: f64) -> String {
    let v = x.trunc() as i64;
    let grouped = group_digits(&v.unsigned_abs().to_string());
    if v < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Fixed decimals with `,` thousands separators on the integer part.
pub fn format_decimal(x: f64, places: usize) -> String {
    let text = format!("{:.*}", places, x.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };
    let mut out = String::new();
    if x < 0.0 && text.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    out.push_str(&group_digits(int_part));
    if let Some(f) = frac_part {
        out.push('.');
        out.push_str(f);
    }
    out
}

// ── Tables ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NamedTable {
    pub title: &'static str,
    pub frame: DataFrame,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub tables: Vec<NamedTable>,
}

/// One-row frame of formatted values.
fn single_row(names: &[String], values: &[String]) -> Result<DataFrame, SimError> {
    let columns: Vec<Column> = names
        .iter()
        .zip(values)
        .map(|(name, value)| Column::new(name.as_str().into(), [value.as_str()]))
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Leading actual, one column per remaining month, then the total.
fn monthly_table(
    lead: String,
    lead_value: f64,
    months: &[MonthValue],
    total: f64,
) -> Result<DataFrame, SimError> {
    let mut names = vec![lead];
    let mut values = vec![format_thousands(lead_value)];
    for m in months {
        names.push(m.name().to_string());
        values.push(format_thousands(m.value));
    }
    names.push(TOTAL.to_string());
    values.push(format_thousands(total));
    single_row(&names, &values)
}

fn lead_label(prefix: &str, anchor: &GlobalAnchor) -> String {
    match anchor.month_name() {
        Some(name) => format!("{prefix} with {name}"),
        None => prefix.to_string(),
    }
}

/// The filtered rows as shown to the user: keys as text, financial
/// columns formatted.
pub fn available_data(filtered: &DataFrame) -> Result<DataFrame, SimError> {
    let mut df = filtered.clone();
    for name in key::ALL {
        let text = df
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        df.with_column(text)?;
    }
    for name in measure::ALL {
        let formatted: Vec<Option<String>> = df
            .column(name)?
            .f64()?
            .into_iter()
            .map(|v| v.map(format_thousands))
            .collect();
        df.with_column(Column::new(name.into(), formatted))?;
    }
    Ok(df)
}

impl Report {
    pub fn build(
        filtered: &DataFrame,
        projection: &Projection,
        anchor: &GlobalAnchor,
    ) -> Result<Self, SimError> {
        let p = projection;
        let mut tables = Vec::with_capacity(title::ALL.len());
        let mut push = |title: &'static str, frame: DataFrame| tables.push(NamedTable { title, frame });

        push(title::AVAILABLE_DATA, available_data(filtered)?);

        let c = &p.calculations;
        push(
            title::CALCULATIONS,
            single_row(
                &[
                    calculation::AVERAGE_PRICE_YTD.to_string(),
                    calculation::AVERAGE_NEW_PRICE.to_string(),
                    calculation::MONTHLY_VOLUMES_IMPACTED.to_string(),
                    calculation::DELTA_NMI_IMPACT_MONTHLY.to_string(),
                ],
                &[
                    format_decimal(c.average_price_ytd, 2),
                    format_decimal(c.average_new_price, 2),
                    format_decimal(c.monthly_volumes_impacted, 2),
                    format_decimal(c.delta_nmi_impact_monthly, 2),
                ],
            )?,
        );

        let spend_lead = lead_label("YTD Spend", anchor);
        push(
            title::REP_SPEND_EXTRAPOLATION,
            monthly_table(
                spend_lead.clone(),
                p.ytd_rep_spend,
                &p.baseline_spend,
                p.total_projected_spend,
            )?,
        );
        push(
            title::REP_SPEND_VARIATION,
            monthly_table(
                spend_lead,
                p.ytd_rep_spend,
                &p.adjusted_spend,
                p.adjusted_total_spend,
            )?,
        );
        push(
            title::NMI_REP_VARIATION,
            monthly_table(
                lead_label("NMI Rep", anchor),
                p.nmi_rep_act,
                &p.adjusted_nmi_rep,
                p.total_nmi_rep_variation,
            )?,
        );

        let s = &p.simulated;
        push(
            title::SIMULATED_VALUES,
            single_row(
                &[
                    simulated::SPEND_SIM,
                    simulated::SPEND_REP_SIM,
                    simulated::SPEND_NON_REP_SIM,
                    simulated::NMI_SIM,
                    simulated::NMI_REP_SIM,
                    simulated::NMI_NON_REP_SIM,
                ]
                .map(String::from),
                &[s.spend, s.spend_rep, s.spend_non_rep, s.nmi, s.nmi_rep, s.nmi_non_rep]
                    .map(format_thousands),
            )?,
        );

        let ye = &p.year_end;
        push(
            title::YEAR_END_VALUES,
            single_row(
                &year_end::PAIRS.map(|(_, name)| name.to_string()),
                &[ye.spend, ye.spend_rep, ye.spend_non_rep, ye.nmi, ye.nmi_rep, ye.nmi_non_rep]
                    .map(format_thousands),
            )?,
        );

        push(
            title::YTD_VALUES,
            single_row(
                &measure::ALL.map(String::from),
                &p.totals.actuals().map(format_thousands),
            )?,
        );

        Ok(Self { tables })
    }

    pub fn get(&self, title: &str) -> Option<&DataFrame> {
        self.tables
            .iter()
            .find(|t| t.title == title)
            .map(|t| &t.frame)
    }

    /// Plain-text rendering, one titled block per table.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for table in &self.tables {
            let _ = writeln!(out, "### {}", table.title);
            let _ = writeln!(out, "{}", table.frame);
            out.push('\n');
        }
        out
    }
}
