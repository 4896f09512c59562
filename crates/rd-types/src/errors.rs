use thiserror::Error;

/// Main error type for the risk report pipeline
#[derive(Error, Debug)]
pub enum RdError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Portfolio error: {0}")]
    Portfolio(#[from] PortfolioError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Input-related errors
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Could not find file: {path}")]
    FileNotFound { path: String },

    #[error("Missing required column '{column}' in {source_name}")]
    MissingColumn { column: String, source_name: String },

    #[error("Data loading failed: {message}")]
    LoadingFailed { message: String },

    #[error("Data parsing error: {message}")]
    ParseError { message: String },
}

impl DataError {
    /// True for defects in the content of an input file, as opposed to
    /// failures to locate or read it.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            DataError::MissingColumn { .. } | DataError::ParseError { .. }
        )
    }
}

/// Valuation and aggregation errors
#[derive(Error, Debug)]
pub enum PortfolioError {
    #[error("Portfolio has no positions")]
    Empty,

    #[error("Gross market value must be positive, got {gmv} ({valued} of {total} positions valued)")]
    NonPositiveGmv {
        gmv: rust_decimal::Decimal,
        valued: usize,
        total: usize,
    },

    /// Decimal arithmetic left the representable range.
    #[error("Portfolio calculation error: {message}")]
    CalculationError { message: String },
}

/// Result type alias for risk report operations
pub type RdResult<T> = Result<T, RdError>;

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::RdError::Config(format!($($arg)*))
    };
}
