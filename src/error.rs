use std::io;

use thiserror::Error;

/// Errors surfaced before a simulation starts. Once the epoch loop begins no
/// operation can fail.
#[derive(Error, Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum ContagionError {
    /// The location graph is empty or malformed.
    #[error("invalid location graph: {0}")]
    InvalidGraph(String),

    /// A configuration value is out of range, or the seed count exceeds the population.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Two executions of the same run disagree, or a run broke a statistics invariant.
    #[error("inconsistent results: {0}")]
    InconsistentResults(String),

    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl ContagionError {
    pub(crate) fn invalid_graph(message: impl Into<String>) -> Self {
        ContagionError::InvalidGraph(message.into())
    }

    pub(crate) fn invalid_configuration(message: impl Into<String>) -> Self {
        ContagionError::InvalidConfiguration(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_category_and_message() {
        let error = ContagionError::invalid_graph("graph has no locations");
        assert_eq!(
            error.to_string(),
            "invalid location graph: graph has no locations"
        );

        let error = ContagionError::invalid_configuration("worker_count must be at least 1");
        assert_eq!(
            error.to_string(),
            "invalid configuration: worker_count must be at least 1"
        );
    }

    #[test]
    fn converts_io_errors() {
        let error: ContagionError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(error, ContagionError::Io(_)));
    }
}
