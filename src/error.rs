use thiserror::Error;

/// Failures surfaced by the engines. None of them is recovered inside a
/// Buchberger loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GbError {
    #[error("relation table is not associative: {0}")]
    Construction(String),

    #[error("division by a non-unit: {0}")]
    Division(String),

    #[error("pair queue or basis corrupted: {0}")]
    Concurrency(String),

    #[error("worker pool has been shut down")]
    ShutDown,

    #[error("distributed computation failed: {0}")]
    Distributed(String),
}

pub type GbResult<T> = Result<T, GbError>;
