//! Query transports for the abstractor.
//!
//! Two [`QueryExecutor`] implementations:
//! - [`SparqlEndpoint`]: a remote SPARQL 1.1 endpoint over HTTP (`reqwest`)
//! - [`RdfFileSource`]: a local RDF file loaded into an in-memory `oxigraph` store
//!
//! [`open_source`] picks one from a location and an optional format tag.

pub mod endpoint;
pub mod file;

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use abstractor_core::{QueryError, QueryExecutor};
use oxigraph::io::RdfFormat;

pub use endpoint::{parse_results, SparqlEndpoint};
pub use file::RdfFileSource;

/// Where rows come from: a remote endpoint or a file serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Sparql,
    Turtle,
    NTriples,
    NQuads,
    TriG,
    RdfXml,
    N3,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown source format `{0}` (expected sparql, turtle, ntriples, nquads, trig, rdfxml or n3)")]
pub struct UnknownFormat(pub String);

impl FromStr for SourceFormat {
    type Err = UnknownFormat;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "sparql" | "endpoint" => Ok(SourceFormat::Sparql),
            "turtle" | "ttl" => Ok(SourceFormat::Turtle),
            "ntriples" | "nt" => Ok(SourceFormat::NTriples),
            "nquads" | "nq" => Ok(SourceFormat::NQuads),
            "trig" => Ok(SourceFormat::TriG),
            "rdfxml" | "xml" | "owl" | "rdf" => Ok(SourceFormat::RdfXml),
            "n3" => Ok(SourceFormat::N3),
            other => Err(UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceFormat::Sparql => "sparql",
            SourceFormat::Turtle => "turtle",
            SourceFormat::NTriples => "ntriples",
            SourceFormat::NQuads => "nquads",
            SourceFormat::TriG => "trig",
            SourceFormat::RdfXml => "rdfxml",
            SourceFormat::N3 => "n3",
        })
    }
}

impl SourceFormat {
    /// Guess from the location: `http(s)://` is an endpoint, otherwise the file extension decides.
    pub fn detect(location: &str) -> Option<Self> {
        if location.starts_with("http://") || location.starts_with("https://") {
            return Some(SourceFormat::Sparql);
        }
        Path::new(location)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }

    /// The parser to use; `None` for endpoints.
    pub fn rdf_format(self) -> Option<RdfFormat> {
        match self {
            SourceFormat::Sparql => None,
            SourceFormat::Turtle => Some(RdfFormat::Turtle),
            SourceFormat::NTriples => Some(RdfFormat::NTriples),
            SourceFormat::NQuads => Some(RdfFormat::NQuads),
            SourceFormat::TriG => Some(RdfFormat::TriG),
            SourceFormat::RdfXml => Some(RdfFormat::RdfXml),
            SourceFormat::N3 => Some(RdfFormat::N3),
        }
    }
}

/// Transport settings; only endpoints use them.
#[derive(Debug, Clone, Default)]
pub struct SourceOptions {
    pub timeout: Option<Duration>,
    pub user: Option<String>,
    pub password: Option<String>,
}

/// Open `location` as a query source.
///
/// Without an explicit `format`, the location is classified by [`SourceFormat::detect`].
pub fn open_source(
    location: &str,
    format: Option<SourceFormat>,
    options: &SourceOptions,
) -> Result<Box<dyn QueryExecutor>, QueryError> {
    let format = format
        .or_else(|| SourceFormat::detect(location))
        .ok_or_else(|| QueryError::Parse(format!("cannot tell what kind of source `{location}` is")))?;

    match format.rdf_format() {
        None => {
            let mut endpoint = SparqlEndpoint::new(location, options.timeout)?;
            if let Some(user) = &options.user {
                endpoint = endpoint.with_credentials(user, options.password.as_deref());
            }
            tracing::info!(endpoint = %location, "using SPARQL endpoint");
            Ok(Box::new(endpoint))
        }
        Some(rdf_format) => Ok(Box::new(RdfFileSource::open(
            Path::new(location),
            Some(rdf_format),
        )?)),
    }
}
