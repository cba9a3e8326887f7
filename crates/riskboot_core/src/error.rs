use std::fmt;

/// Errors related to the input price panel
#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    /// The panel contains no dates at all
    EmptyPanel,
    /// A date's category group does not contain the requested category
    MissingCategory(String),
    /// Fewer than two dates survived the missing-value filter, so no return
    /// row can be derived
    EmptyAfterFilter(String),
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::EmptyPanel => write!(f, "price panel is empty"),
            DataError::MissingCategory(category) => {
                write!(f, "category {category:?} not present on every date")
            }
            DataError::EmptyAfterFilter(category) => {
                write!(
                    f,
                    "no usable dates left for category {category:?} after dropping incomplete dates"
                )
            }
        }
    }
}

impl std::error::Error for DataError {}

/// Errors related to calling engine operations out of order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    /// A simulation or weight operation was requested before any category
    /// was selected
    NotSelected,
    /// A risk measure was requested before any simulation batch was produced
    NoSimulation,
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::NotSelected => {
                write!(f, "no category selected; call select_category first")
            }
            StateError::NoSimulation => {
                write!(f, "no simulated batch available; call run_simulation first")
            }
        }
    }
}

impl std::error::Error for StateError {}

/// Errors related to invalid configuration or parameters.
///
/// All of these surface synchronously, before any random draw is made.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Alpha must be an integer percent strictly between 0 and 100
    InvalidAlpha(u32),
    /// Block size / mean block length must be in `[1, series_len]`
    InvalidBlock { block: usize, series_len: usize },
    /// Lambda bias strength must be in `[0, 1]`
    InvalidLambda(f64),
    /// Tilt severity must be non-negative and finite
    InvalidTheta(f64),
    /// Damping factor must be in `(0, 1]`
    InvalidDamping(f64),
    /// Simulation counts must be at least 1
    InvalidCount { field: &'static str, value: usize },
    /// Weight vector length does not match the number of selected tickers
    WeightLength { expected: usize, actual: usize },
    /// Weight entries must be non-negative finite numbers
    InvalidWeight { index: usize, value: f64 },
    /// Weights must sum to 1 within tolerance
    WeightSum(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidAlpha(alpha) => {
                write!(f, "alpha must be an integer percent in (0, 100), got {alpha}")
            }
            ConfigError::InvalidBlock { block, series_len } => {
                write!(
                    f,
                    "block parameter {block} out of range [1, {series_len}] for the selected series"
                )
            }
            ConfigError::InvalidLambda(lambda) => {
                write!(f, "lambda must be in [0, 1], got {lambda}")
            }
            ConfigError::InvalidTheta(theta) => {
                write!(f, "theta must be non-negative and finite, got {theta}")
            }
            ConfigError::InvalidDamping(damping) => {
                write!(f, "damping must be in (0, 1], got {damping}")
            }
            ConfigError::InvalidCount { field, value } => {
                write!(f, "{field} must be at least 1, got {value}")
            }
            ConfigError::WeightLength { expected, actual } => {
                write!(f, "expected {expected} weights, got {actual}")
            }
            ConfigError::InvalidWeight { index, value } => {
                write!(f, "weight {index} must be non-negative and finite, got {value}")
            }
            ConfigError::WeightSum(sum) => {
                write!(f, "weights must sum to 1 (tolerance 1e-6), got {sum}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Umbrella error for every fallible engine operation
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    Data(DataError),
    State(StateError),
    Config(ConfigError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Data(e) => write!(f, "{e}"),
            EngineError::State(e) => write!(f, "{e}"),
            EngineError::Config(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Data(e) => Some(e),
            EngineError::State(e) => Some(e),
            EngineError::Config(e) => Some(e),
        }
    }
}

impl From<DataError> for EngineError {
    fn from(e: DataError) -> Self {
        EngineError::Data(e)
    }
}

impl From<StateError> for EngineError {
    fn from(e: StateError) -> Self {
        EngineError::State(e)
    }
}

impl From<ConfigError> for EngineError {
    fn from(e: ConfigError) -> Self {
        EngineError::Config(e)
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
