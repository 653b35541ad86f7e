/// Column-name constants for the procurement spend table.
/// Single source of truth - exported to Python via PyO3 when the `python` feature is on.

// ── Filterable dimensions ───────────────────────────────────────────────────
pub mod dimension {
    pub const LPGU: &str = "LPGU";
    pub const SUPPLIER_TYPE: &str = "Supplier Type";
    pub const SUPPLIER_GUID: &str = "Supplier GUID";
    pub const LOCATION: &str = "Location";
    pub const BUSINESS_LINE: &str = "Business Line";
    pub const SUPPLIER_NAME: &str = "Supplier Name";
    pub const MDF: &str = "MDF";

    pub const ALL: [&str; 7] = [
        LPGU,
        SUPPLIER_TYPE,
        SUPPLIER_GUID,
        LOCATION,
        BUSINESS_LINE,
        SUPPLIER_NAME,
        MDF,
    ];
}

// ── Integer keys ────────────────────────────────────────────────────────────
pub mod key {
    pub const YEAR_MONTH: &str = "Year Month";
    pub const PRODUCT_GROUP: &str = "Product Group";

    pub const ALL: [&str; 2] = [YEAR_MONTH, PRODUCT_GROUP];
}

// ── Financial measures (year-to-date actuals) ───────────────────────────────
pub mod measure {
    pub const INVOICE_QUANTITY: &str = "Invoice Quantity";
    pub const INVOICE_QTY_REP: &str = "Invoice QTY Rep";
    pub const INVOICE_QTY_NON_REP: &str = "Invoice QTY Non Rep";
    pub const SPEND: &str = "Spend";
    pub const REP_SPEND: &str = "Rep Spend";
    pub const NON_REP_SPEND: &str = "Non rep Spend";
    pub const TOTAL_NMI_ACT: &str = "Total NMI Act";
    pub const NMI_REP_ACT: &str = "NMI Rep Act";
    pub const NMI_NON_REP_ACT: &str = "NMI Non-Rep Act";

    /// Display order of the YTD Available Values table.
    pub const ALL: [&str; 9] = [
        INVOICE_QUANTITY,
        INVOICE_QTY_REP,
        INVOICE_QTY_NON_REP,
        SPEND,
        REP_SPEND,
        NON_REP_SPEND,
        TOTAL_NMI_ACT,
        NMI_REP_ACT,
        NMI_NON_REP_ACT,
    ];
}

// ── Year-end extrapolation columns ──────────────────────────────────────────
pub mod year_end {
    use super::measure;

    pub const SPEND_YE: &str = "Spend YE";
    pub const SPEND_REP_YE: &str = "Spend Rep. YE";
    pub const SPEND_NON_REP_YE: &str = "Spend Non Rep YE";
    pub const NMI_YE: &str = "NMI YE";
    pub const NMI_REP_YE: &str = "NMI Rep YE";
    pub const NMI_NON_REP_YE: &str = "NMI Non Rep YE";

    /// (source actual, extrapolated column) pairs.
    pub const PAIRS: [(&str, &str); 6] = [
        (measure::SPEND, SPEND_YE),
        (measure::REP_SPEND, SPEND_REP_YE),
        (measure::NON_REP_SPEND, SPEND_NON_REP_YE),
        (measure::TOTAL_NMI_ACT, NMI_YE),
        (measure::NMI_REP_ACT, NMI_REP_YE),
        (measure::NMI_NON_REP_ACT, NMI_NON_REP_YE),
    ];
}

// ── Simulated value labels ──────────────────────────────────────────────────
pub mod simulated {
    pub const SPEND_SIM: &str = "Spend Sim";
    pub const SPEND_REP_SIM: &str = "Spend Rep. Sim";
    pub const SPEND_NON_REP_SIM: &str = "Spend Non Rep Sim";
    pub const NMI_SIM: &str = "NMI Sim";
    pub const NMI_REP_SIM: &str = "NMI Rep Sim";
    pub const NMI_NON_REP_SIM: &str = "NMI Non Rep Sim";
}

// ── Calculation labels ──────────────────────────────────────────────────────
pub mod calculation {
    pub const AVERAGE_PRICE_YTD: &str = "Average Price YTD";
    pub const AVERAGE_NEW_PRICE: &str = "Average New Price";
    pub const MONTHLY_VOLUMES_IMPACTED: &str = "Monthly Volumes Impacted";
    pub const DELTA_NMI_IMPACT_MONTHLY: &str = "Delta NMI Impact | Monthly";
}

/// Every column a loaded table must carry.
pub fn required_columns() -> Vec<&'static str> {
    dimension::ALL
        .iter()
        .chain(key::ALL.iter())
        .chain(measure::ALL.iter())
        .copied()
        .collect()
}
