//! The query-execution boundary.
//!
//! The engine depends on this trait and never implements it; the transports
//! (remote endpoint, local parsed file) live in `abstractor-sparql`.

use std::collections::BTreeMap;

use crate::error::QueryError;

/// One result row: variable name → lexical value of the bound term.
///
/// Unbound variables are absent.
pub type Row = BTreeMap<String, String>;

pub trait QueryExecutor {
    /// Run a read-only `SELECT` query and return every row.
    fn execute(&self, query: &str) -> Result<Vec<Row>, QueryError>;
}

impl<E: QueryExecutor + ?Sized> QueryExecutor for &E {
    fn execute(&self, query: &str) -> Result<Vec<Row>, QueryError> {
        (**self).execute(query)
    }
}

impl<E: QueryExecutor + ?Sized> QueryExecutor for Box<E> {
    fn execute(&self, query: &str) -> Result<Vec<Row>, QueryError> {
        (**self).execute(query)
    }
}

/// Build a row from `(column, value)` pairs.
pub fn row<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Row {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
