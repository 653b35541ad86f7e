mod common;

use pama_budget_sim::report::title;
use pama_budget_sim::schema::{key, measure};
use pama_budget_sim::{BudgetSimulator, Dimension, FilterState, SimError, SimulationParams, YearMonth};
use polars::prelude::*;
use pretty_assertions::assert_eq;

fn params(spend: f64, price: f64, spend_start: u32, price_start: u32) -> SimulationParams {
    SimulationParams {
        spend_change_pct: spend,
        price_change_pct: price,
        spend_adjustment_start: YearMonth::try_from(spend_start).unwrap(),
        price_adjustment_start: YearMonth::try_from(price_start).unwrap(),
        projection_year: Some(2024),
    }
}

fn load() -> (tempfile::TempDir, BudgetSimulator) {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_csv(dir.path(), &common::ROWS);
    let sim = BudgetSimulator::from_path(&path, None).unwrap();
    (dir, sim)
}

/// Column name -> first-row text of a report table.
fn row(df: &DataFrame) -> Vec<(String, String)> {
    df.get_columns()
        .iter()
        .map(|c| {
            (
                c.name().to_string(),
                c.str().unwrap().get(0).unwrap_or_default().to_string(),
            )
        })
        .collect()
}

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect()
}

#[test]
fn loads_csv_and_anchors_on_latest_month() {
    let (_dir, sim) = load();
    assert_eq!(sim.dataset().height(), 3);
    assert_eq!(sim.anchor().year_month, 202406);
    assert_eq!(sim.anchor().month_name(), Some("June"));

    let pg: Vec<Option<i64>> = sim
        .dataset()
        .column(key::PRODUCT_GROUP)
        .unwrap()
        .i64()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(pg, vec![Some(10), Some(20), Some(0)]);
}

#[test]
fn unadjusted_run_rate_doubles_half_year() {
    let (_dir, sim) = load();
    let result = sim
        .simulate(&FilterState::new(), &params(0.0, 0.0, 209912, 209912))
        .unwrap();

    let p = &result.projection;
    assert_eq!(p.ytd_rep_spend, 600_000.0);
    assert_eq!(p.monthly_spend, 100_000.0);
    assert_eq!(p.total_projected_spend, 1_200_000.0);
    assert_eq!(p.adjusted_total_spend, 1_200_000.0);

    assert_eq!(
        row(result.report.get(title::REP_SPEND_EXTRAPOLATION).unwrap()),
        pairs(&[
            ("YTD Spend with June", "600,000"),
            ("July", "100,000"),
            ("August", "100,000"),
            ("September", "100,000"),
            ("October", "100,000"),
            ("November", "100,000"),
            ("December", "100,000"),
            ("Total", "1,200,000"),
        ])
    );
}

#[test]
fn full_simulation_tables() {
    let (_dir, sim) = load();
    let result = sim
        .simulate(&FilterState::new(), &params(10.0, 0.1, 202407, 202410))
        .unwrap();
    let report = &result.report;

    assert_eq!(
        report.tables.iter().map(|t| t.title).collect::<Vec<_>>(),
        title::ALL.to_vec()
    );

    assert_eq!(
        row(report.get(title::CALCULATIONS).unwrap()),
        pairs(&[
            ("Average Price YTD", "5,000.00"),
            ("Average New Price", "4,500.00"),
            ("Monthly Volumes Impacted", "20.00"),
            ("Delta NMI Impact | Monthly", "10,000.00"),
        ])
    );

    assert_eq!(
        row(report.get(title::REP_SPEND_VARIATION).unwrap()),
        pairs(&[
            ("YTD Spend with June", "600,000"),
            ("July", "90,000"),
            ("August", "90,000"),
            ("September", "90,000"),
            ("October", "81,000"),
            ("November", "81,000"),
            ("December", "81,000"),
            ("Total", "1,113,000"),
        ])
    );

    assert_eq!(
        row(report.get(title::NMI_REP_VARIATION).unwrap()),
        pairs(&[
            ("NMI Rep with June", "60,000"),
            ("July", "10,000"),
            ("August", "10,000"),
            ("September", "10,000"),
            ("October", "20,000"),
            ("November", "20,000"),
            ("December", "20,000"),
            ("Total", "150,000"),
        ])
    );

    assert_eq!(
        row(report.get(title::SIMULATED_VALUES).unwrap()),
        pairs(&[
            ("Spend Sim", "1,473,000"),
            ("Spend Rep. Sim", "1,113,000"),
            ("Spend Non Rep Sim", "360,000"),
            ("NMI Sim", "186,000"),
            ("NMI Rep Sim", "150,000"),
            ("NMI Non Rep Sim", "36,000"),
        ])
    );

    assert_eq!(
        row(report.get(title::YEAR_END_VALUES).unwrap()),
        pairs(&[
            ("Spend YE", "1,560,000"),
            ("Spend Rep. YE", "1,200,000"),
            ("Spend Non Rep YE", "360,000"),
            ("NMI YE", "156,000"),
            ("NMI Rep YE", "120,000"),
            ("NMI Non Rep YE", "36,000"),
        ])
    );

    assert_eq!(
        row(report.get(title::YTD_VALUES).unwrap()),
        pairs(&[
            ("Invoice Quantity", "180"),
            ("Invoice QTY Rep", "120"),
            ("Invoice QTY Non Rep", "60"),
            ("Spend", "780,000"),
            ("Rep Spend", "600,000"),
            ("Non rep Spend", "180,000"),
            ("Total NMI Act", "78,000"),
            ("NMI Rep Act", "60,000"),
            ("NMI Non-Rep Act", "18,000"),
        ])
    );
}

#[test]
fn available_data_formats_financial_columns() {
    let (_dir, sim) = load();
    let state = FilterState::new().with_selection(Dimension::Lpgu, ["South"]);
    let result = sim.simulate(&state, &params(0.0, 0.0, 209912, 209912)).unwrap();

    let table = result.report.get(title::AVAILABLE_DATA).unwrap();
    assert_eq!(table.height(), 1);
    assert_eq!(table.column(key::YEAR_MONTH).unwrap().str().unwrap().get(0), Some("202405"));
    assert_eq!(table.column(measure::SPEND).unwrap().str().unwrap().get(0), Some("300,000"));
}

#[test]
fn filters_do_not_move_the_anchor() {
    let (_dir, sim) = load();
    // South only has data through May
    let state = FilterState::new().with_selection(Dimension::Lpgu, ["South"]);
    let result = sim.simulate(&state, &params(0.0, 0.0, 209912, 209912)).unwrap();

    let p = &result.projection;
    assert_eq!(p.anchor_month, 6);
    assert_eq!(p.ytd_rep_spend, 240_000.0);
    assert_eq!(p.monthly_spend, 40_000.0);
    assert_eq!(p.baseline_spend.len(), 6);
}

#[test]
fn cross_filtered_options() {
    let (_dir, sim) = load();
    let state = FilterState::new().with_selection(Dimension::Location, ["Oslo"]);

    assert_eq!(
        sim.available_options(&state, Dimension::SupplierName).unwrap(),
        vec!["Acme", "Gamma"]
    );
    assert_eq!(
        sim.available_options(&state, Dimension::Location).unwrap(),
        vec!["Bergen", "Oslo"]
    );

    let all = sim.available_options_all(&state).unwrap();
    assert_eq!(all.len(), 7);
    assert_eq!(all[0], (Dimension::Lpgu, vec!["North".to_string()]));
}

#[test]
fn empty_filter_result_zeroes_aggregates() {
    let (_dir, sim) = load();
    let state = FilterState::new()
        .with_selection(Dimension::Lpgu, ["South"])
        .with_selection(Dimension::Location, ["Oslo"]);
    let result = sim.simulate(&state, &params(10.0, 0.1, 202407, 202407)).unwrap();

    assert_eq!(result.filtered.height(), 0);
    let p = &result.projection;
    assert_eq!(p.ytd_rep_spend, 0.0);
    assert_eq!(p.adjusted_total_spend, 0.0);
    assert_eq!(p.simulated.spend, 0.0);
    assert_eq!(p.simulated.nmi, 0.0);
    assert_eq!(p.calculations.delta_nmi_impact_monthly, 0.0);
}

#[test]
fn missing_column_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.csv");
    std::fs::write(&path, "LPGU,Spend\nNorth,1\n").unwrap();

    let err = BudgetSimulator::from_path(&path, None).unwrap_err();
    assert!(matches!(err, SimError::MissingColumn(_)));
}

#[test]
fn non_numeric_measure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let bad = common::ROWS[0].replace("480000", "lots");
    let path = common::write_csv(dir.path(), &[bad.as_str()]);

    match BudgetSimulator::from_path(&path, None) {
        Err(SimError::NonNumeric { column, count }) => {
            assert_eq!(column, measure::SPEND);
            assert_eq!(count, 1);
        }
        other => panic!("expected NonNumeric, got {other:?}"),
    }
}

#[test]
fn missing_workbook_reports_excel_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = BudgetSimulator::from_path(&dir.path().join("data.xlsx"), Some("data")).unwrap_err();
    assert!(matches!(err, SimError::Excel(_)));
}

#[test]
fn blank_year_month_projects_all_twelve_months() {
    let dir = tempfile::tempdir().unwrap();
    let rows: Vec<String> = common::ROWS
        .iter()
        .map(|r| {
            let mut fields: Vec<&str> = r.split(',').collect();
            fields[7] = "";
            fields.join(",")
        })
        .collect();
    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
    let path = common::write_csv(dir.path(), &rows);

    let sim = BudgetSimulator::from_path(&path, None).unwrap();
    assert_eq!(sim.anchor().year_month, 0);
    assert_eq!(sim.anchor().month(), 0);
    assert_eq!(sim.anchor().month_name(), None);

    let result = sim
        .simulate(&FilterState::new(), &params(10.0, 0.1, 202401, 202401))
        .unwrap();
    assert_eq!(result.filtered.height(), 3);
    assert_eq!(result.projection.adjusted_spend.len(), 12);
    assert_eq!(result.projection.adjusted_spend[0].year_month, 202401);

    let extrapolation = row(result.report.get(title::REP_SPEND_EXTRAPOLATION).unwrap());
    let names: Vec<&str> = extrapolation.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "YTD Spend", "January", "February", "March", "April", "May", "June", "July",
            "August", "September", "October", "November", "December", "Total",
        ]
    );
    assert_eq!(extrapolation[0].1, "600,000");
    assert!(extrapolation[1..13].iter().all(|(_, v)| v == "0"));
    assert_eq!(extrapolation[13].1, "600,000");

    let nmi = row(result.report.get(title::NMI_REP_VARIATION).unwrap());
    assert_eq!(nmi[0], ("NMI Rep".to_string(), "60,000".to_string()));
    assert_eq!(nmi[13], ("Total".to_string(), "60,000".to_string()));

    let ye = row(result.report.get(title::YEAR_END_VALUES).unwrap());
    assert!(ye.iter().all(|(_, v)| v == "0"));
}
