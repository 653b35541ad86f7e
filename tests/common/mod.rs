#![allow(dead_code)]

use std::path::{Path, PathBuf};

use pama_budget_sim::schema::{dimension, key, measure};
use polars::prelude::*;

pub const HEADER: [&str; 18] = [
    dimension::LPGU,
    dimension::SUPPLIER_TYPE,
    dimension::SUPPLIER_GUID,
    dimension::LOCATION,
    dimension::BUSINESS_LINE,
    dimension::SUPPLIER_NAME,
    dimension::MDF,
    key::YEAR_MONTH,
    key::PRODUCT_GROUP,
    measure::INVOICE_QUANTITY,
    measure::INVOICE_QTY_REP,
    measure::INVOICE_QTY_NON_REP,
    measure::SPEND,
    measure::REP_SPEND,
    measure::NON_REP_SPEND,
    measure::TOTAL_NMI_ACT,
    measure::NMI_REP_ACT,
    measure::NMI_NON_REP_ACT,
];

/// Three suppliers; latest data in June 2024; 600,000 represented spend.
pub const ROWS: [&str; 3] = [
    "North,Local,G1,Oslo,Ops,Acme,M1,202406,10,120,90,30,480000,360000,120000,48000,36000,12000",
    "South,Global,G2,Bergen,IT,Beta,M2,202405,20,60,30,30,300000,240000,60000,30000,24000,6000",
    "North,Global,G3,Oslo,IT,Gamma,M1,202401,,,,,,,,,,",
];

pub fn write_csv(dir: &Path, rows: &[&str]) -> PathBuf {
    let path = dir.join("data.csv");
    let mut text = HEADER.join(",");
    text.push('\n');
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    std::fs::write(&path, text).unwrap();
    path
}

/// One generated record: indices into small label alphabets plus spend.
#[derive(Debug, Clone, Copy)]
pub struct GenRow {
    pub lpgu: usize,
    pub supplier_type: usize,
    pub location: usize,
    pub rep_spend: u32,
}

pub const LPGU: [&str; 3] = ["North", "South", "East"];
pub const SUPPLIER_TYPE: [&str; 2] = ["Local", "Global"];
pub const LOCATION: [&str; 3] = ["Oslo", "Bergen", "Tromso"];

pub fn frame(rows: &[GenRow]) -> DataFrame {
    let n = rows.len();
    let text = |f: fn(&GenRow) -> String| -> Vec<String> { rows.iter().map(f).collect() };

    let mut columns = vec![
        Column::new(dimension::LPGU.into(), text(|r| LPGU[r.lpgu].to_string())),
        Column::new(
            dimension::SUPPLIER_TYPE.into(),
            text(|r| SUPPLIER_TYPE[r.supplier_type].to_string()),
        ),
        Column::new(
            dimension::SUPPLIER_GUID.into(),
            (0..n).map(|i| format!("G{i}")).collect::<Vec<_>>(),
        ),
        Column::new(dimension::LOCATION.into(), text(|r| LOCATION[r.location].to_string())),
        Column::new(dimension::BUSINESS_LINE.into(), vec!["Ops"; n]),
        Column::new(dimension::SUPPLIER_NAME.into(), text(|r| format!("S{}", r.lpgu))),
        Column::new(dimension::MDF.into(), vec!["M1"; n]),
        Column::new(key::YEAR_MONTH.into(), vec![202404i64; n]),
        Column::new(key::PRODUCT_GROUP.into(), vec![1i64; n]),
    ];
    for m in measure::ALL {
        let values: Vec<f64> = rows.iter().map(|r| r.rep_spend as f64).collect();
        columns.push(Column::new(m.into(), values));
    }
    DataFrame::new(columns).unwrap()
}
