use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    #[error("price series is empty")]
    Empty,

    #[error("bar {index} is not after its predecessor")]
    OutOfOrder { index: usize },
}

/// Failure of a single outbound fetch.
///
/// "Nothing came back" (`Transport`, `Timeout`, `Status`, `Empty`) is kept apart from
/// "something came back that we could not understand" (`Upstream`, `Malformed`).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("upstream reported an error: {0}")]
    Upstream(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("no data returned")]
    Empty,
}

impl From<SeriesError> for FetchError {
    fn from(err: SeriesError) -> Self {
        match err {
            SeriesError::Empty => FetchError::Empty,
            other => FetchError::Malformed(other.to_string()),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unknown briefing profile: {0}")]
    UnknownProfile(String),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}
