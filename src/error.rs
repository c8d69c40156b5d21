use thiserror::Error;

use crate::cluster::PointId;

/// Errors returned by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A point was submitted with no attribute indices.
    #[error("point {id} has no attributes")]
    EmptyPoint {
        /// Id of the rejected point.
        id: PointId,
    },

    /// A point's index and value lists have different lengths.
    #[error("point {id} has {indices} attribute indices but {values} values")]
    MismatchedLengths {
        /// Id of the rejected point.
        id: PointId,
        /// Number of attribute indices supplied.
        indices: usize,
        /// Number of values supplied.
        values: usize,
    },

    /// A point with this id is already stored.
    #[error("point {id} was already added")]
    DuplicatePoint {
        /// Id of the rejected point.
        id: PointId,
    },

    /// Input is empty where at least one item is required.
    #[error("empty input")]
    EmptyInput,

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// A delimited-text record could not be interpreted.
    #[error("line {line}: {message}")]
    Parse {
        /// 1-based line number of the record.
        line: u64,
        /// What was wrong with it.
        message: String,
    },

    /// Underlying reader or writer failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Delimited-text decoding or encoding failed.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Whether this error came from point ingestion (the record can be skipped).
    pub fn is_ingest(&self) -> bool {
        matches!(
            self,
            Error::EmptyPoint { .. } | Error::MismatchedLengths { .. } | Error::DuplicatePoint { .. }
        )
    }
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
