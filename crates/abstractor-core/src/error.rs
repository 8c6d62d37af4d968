use serde::Serialize;

/// Failure of the query-execution collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Network, authentication or endpoint-side failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// The response (or the source file) could not be turned into rows.
    #[error("parse error: {0}")]
    Parse(String),
}

/// A row missing a column the classifier needs. Recovered by dropping the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{query} row {row}: missing field `{field}`")]
pub struct RowShapeError {
    pub query: String,
    pub row: usize,
    pub field: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AbstractionError {
    /// A required query failed outright; the run is aborted.
    #[error("query `{query}` failed: {source}")]
    Query {
        query: String,
        #[source]
        source: QueryError,
    },
}
