use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Column '{column}' has {count} non-numeric values")]
    NonNumeric { column: String, count: usize },

    #[error("Unknown filter dimension: {0}")]
    UnknownDimension(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Excel error: {0}")]
    Excel(#[from] calamine::Error),

    #[error("Scenario error: {0}")]
    Scenario(#[from] toml::de::Error),

    #[error("Validation: {0}")]
    Validation(String),

    #[error("InvalidData: {0}")]
    InvalidData(String),
}

#[cfg(feature = "python")]
impl From<SimError> for pyo3::PyErr {
    fn from(err: SimError) -> pyo3::PyErr {
        pyo3::exceptions::PyRuntimeError::new_err(err.to_string())
    }
}
