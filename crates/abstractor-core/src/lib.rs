//! Abstractor: infer a lightweight schema from RDF data.
//!
//! Given a source that answers SPARQL `SELECT` queries (a remote endpoint or a
//! parsed local file), the engine discovers which entity types exist, which
//! relations connect them, which numeric/text attributes they carry and how
//! they specialize one another, then materializes that as a small schema graph
//! suitable for driving a query-building UI.
//!
//! ## Pipeline
//!
//! 1. [`catalog`]: SPARQL templates per introspection [`Strategy`]
//! 2. [`executor`]: the [`QueryExecutor`] boundary (implemented elsewhere)
//! 3. [`classify`]: rows → [`SchemaFact`]s, behind one exclusion gate
//! 4. [`builder`]: facts → [`SchemaGraph`], with derived labels and provenance
//! 5. [`serialize`]: Turtle / N-Triples
//!
//! [`run::abstract_schema`] drives steps 1–4 for one run.
//!
//! ## Module Organization
//!
//! - `vocab`: namespaces and the run [`Vocabulary`] (gate, markers, label predicate)
//! - `label`: label derivation from identifiers
//! - `graph`: the in-memory triple set
//! - `fact`: schema facts
//! - `error`: typed errors

pub mod builder;
pub mod catalog;
pub mod classify;
pub mod error;
pub mod executor;
pub mod fact;
pub mod graph;
pub mod label;
pub mod run;
pub mod serialize;
pub mod vocab;

pub use builder::{Provenance, SchemaGraphBuilder};
pub use catalog::{Query, QueryCatalog, QueryKind, Strategy};
pub use classify::{parse_truth, Classified, Classifier};
pub use error::{AbstractionError, QueryError, RowShapeError};
pub use executor::{QueryExecutor, Row};
pub use fact::{AttributeKind, EntityFlags, SchemaFact};
pub use graph::{Pattern, SchemaGraph, Term, Triple};
pub use label::derive_label;
pub use run::{abstract_schema, Abstraction, RunStats};
pub use serialize::{is_prefix_name, to_ntriples, to_turtle};
pub use vocab::Vocabulary;
