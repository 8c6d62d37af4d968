//! Local RDF file, parsed into an in-memory store and queried in place.
//!
//! The default graph of every query is the union of all graphs, so quad
//! formats (TriG, N-Quads) are abstracted as a whole.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use abstractor_core::{QueryError, QueryExecutor, Row};
use oxigraph::io::RdfFormat;
use oxigraph::model::Term;
use oxigraph::sparql::{Query, QueryResults};
use oxigraph::store::Store;

pub struct RdfFileSource {
    store: Store,
    location: String,
}

impl std::fmt::Debug for RdfFileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RdfFileSource")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl RdfFileSource {
    /// Load `path`; the format comes from `format` or else the file extension.
    pub fn open(path: &Path, format: Option<RdfFormat>) -> Result<Self, QueryError> {
        let format = match format {
            Some(format) => format,
            None => path
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(RdfFormat::from_extension)
                .ok_or_else(|| {
                    QueryError::Parse(format!(
                        "cannot infer an RDF format from `{}`",
                        path.display()
                    ))
                })?,
        };
        let file = File::open(path)
            .map_err(|e| QueryError::Parse(format!("failed to open {}: {e}", path.display())))?;
        let source = Self::from_reader(BufReader::new(file), format, &path.display().to_string())?;
        tracing::info!(path = %path.display(), format = format.name(), "loaded RDF file");
        Ok(source)
    }

    pub fn from_reader(reader: impl Read, format: RdfFormat, location: &str) -> Result<Self, QueryError> {
        let store = Store::new().map_err(|e| QueryError::Parse(format!("failed to create store: {e}")))?;
        store
            .load_from_reader(format, reader)
            .map_err(|e| QueryError::Parse(format!("failed to parse {location}: {e}")))?;
        Ok(Self {
            store,
            location: location.to_string(),
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Number of loaded quads.
    pub fn len(&self) -> Result<usize, QueryError> {
        self.store
            .len()
            .map_err(|e| QueryError::Parse(e.to_string()))
    }

    pub fn is_empty(&self) -> Result<bool, QueryError> {
        Ok(self.len()? == 0)
    }
}

impl QueryExecutor for RdfFileSource {
    fn execute(&self, query: &str) -> Result<Vec<Row>, QueryError> {
        let mut query = Query::parse(query, None)
            .map_err(|e| QueryError::Transport(format!("malformed query: {e}")))?;
        query.dataset_mut().set_default_graph_as_union();

        let results = self
            .store
            .query(query)
            .map_err(|e| QueryError::Transport(format!("query evaluation failed: {e}")))?;

        match results {
            QueryResults::Solutions(solutions) => {
                let mut rows = Vec::new();
                for solution in solutions {
                    let solution = solution
                        .map_err(|e| QueryError::Transport(format!("query evaluation failed: {e}")))?;
                    let row: Row = solution
                        .iter()
                        .map(|(variable, term)| (variable.as_str().to_string(), lexical(term)))
                        .collect();
                    rows.push(row);
                }
                Ok(rows)
            }
            QueryResults::Boolean(_) | QueryResults::Graph(_) => Err(QueryError::Parse(
                "only SELECT queries are supported".to_string(),
            )),
        }
    }
}

/// The string an endpoint would put in a JSON `value` field.
fn lexical(term: &Term) -> String {
    match term {
        Term::NamedNode(node) => node.as_str().to_string(),
        Term::BlankNode(node) => node.as_str().to_string(),
        Term::Literal(literal) => literal.value().to_string(),
        #[allow(unreachable_patterns)]
        other => other.to_string(),
    }
}
