use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Routing error: {0}")]
    Routing(#[from] RoutingError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Execute error: {0}")]
    Execute(#[from] ExecuteError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("exactly one of identifier list or date range must be provided")]
    ModeSelection,

    #[error("batch size must be a positive integer, got '{value}'")]
    BatchSize { value: String },

    #[error("invalid date '{value}': expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS")]
    DateFormat { value: String },

    #[error("date range start {start} is after end {end}")]
    DateRangeOrder { start: String, end: String },
}

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error(
        "no sender configured for location {location}, data type {data_type}, tester type {tester_type}"
    )]
    NotFound {
        location: String,
        data_type: String,
        tester_type: String,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration from {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("failed to parse configuration: {reason}")]
    Parse { reason: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },

    #[error("no location configured with name {location}")]
    UnknownLocation { location: String },

    #[error("credential environment variable {var} is not set")]
    MissingCredential { var: String },
}

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("failed to acquire connection: {reason}")]
    Acquire { reason: String },

    #[error("statement execution failed: {reason}")]
    Statement { reason: String },

    #[error("commit failed: {reason}")]
    Commit { reason: String },

    #[error("rollback failed: {reason}")]
    Rollback { reason: String },

    #[error("failed to close connection: {reason}")]
    Close { reason: String },
}

#[derive(Error, Debug)]
pub enum ExecuteError {
    #[error("batch {index} ({} identifiers) failed: {source}", .identifiers.len())]
    Batch {
        index: usize,
        identifiers: Vec<String>,
        #[source]
        source: ConnectionError,
    },

    #[error("date range {start} to {end} failed: {source}")]
    Range {
        start: String,
        end: String,
        #[source]
        source: ConnectionError,
    },
}

pub type Result<T> = std::result::Result<T, IngestError>;

impl IngestError {
    /// Whether a caller may reasonably retry the failed unit of work.
    /// The engine itself never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            IngestError::Connection(_) => true,
            IngestError::Execute(_) => true,
            IngestError::Validation(_) => false,
            IngestError::Routing(_) => false,
            IngestError::Config(_) => false,
            IngestError::Io(_) => false,
        }
    }
}
