//! One abstraction run: plan → execute → classify → ingest.
//!
//! Strictly sequential. Each query's full result set is classified and
//! ingested before the next query is issued, so per-entity discovery sees
//! every entity the entity query admitted.

use serde::Serialize;

use crate::builder::SchemaGraphBuilder;
use crate::catalog::{Query, QueryCatalog, Strategy};
use crate::classify::Classifier;
use crate::error::{AbstractionError, RowShapeError};
use crate::executor::QueryExecutor;
use crate::graph::SchemaGraph;
use crate::vocab::{marker, Vocabulary};

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub queries: usize,
    pub rows: usize,
    pub facts: usize,
    /// Facts that changed the graph.
    pub applied: usize,
    pub skipped_rows: usize,
    pub entities: usize,
    pub triples: usize,
}

#[derive(Debug, Clone)]
pub struct Abstraction {
    pub graph: SchemaGraph,
    /// Rows dropped for a missing column.
    pub diagnostics: Vec<RowShapeError>,
    pub stats: RunStats,
}

/// Run `strategy` against `executor` and build the schema graph.
///
/// A failing query aborts the whole run; rows with missing columns are only
/// reported in [`Abstraction::diagnostics`].
pub fn abstract_schema<E: QueryExecutor + ?Sized>(
    executor: &E,
    vocabulary: &Vocabulary,
    strategy: &Strategy,
    source_location: &str,
) -> Result<Abstraction, AbstractionError> {
    tracing::info!(strategy = strategy.name(), source = %source_location, "starting abstraction");

    let catalog = QueryCatalog::new(vocabulary);
    let mut run = Run {
        classifier: Classifier::new(vocabulary),
        builder: SchemaGraphBuilder::new(vocabulary.clone()),
        diagnostics: Vec::new(),
        stats: RunStats::default(),
    };

    for query in catalog.plan(strategy) {
        run.execute(executor, &query)?;
    }

    if let Strategy::Free { bulk: false, .. } = strategy {
        let entities = run.entities(vocabulary);
        tracing::info!(entities = entities.len(), "describing entities one by one");
        for entity in &entities {
            for query in catalog.per_entity(entity) {
                run.execute(executor, &query)?;
            }
        }
    }

    run.builder.add_provenance(source_location);

    let graph = run.builder.finish();
    let mut stats = run.stats;
    stats.entities = graph
        .instances_of(&vocabulary.term(marker::ENTITY))
        .len();
    stats.triples = graph.len();
    stats.skipped_rows = run.diagnostics.len();

    tracing::info!(
        queries = stats.queries,
        rows = stats.rows,
        entities = stats.entities,
        triples = stats.triples,
        skipped = stats.skipped_rows,
        "abstraction finished"
    );

    Ok(Abstraction {
        graph,
        diagnostics: run.diagnostics,
        stats,
    })
}

struct Run<'v> {
    classifier: Classifier<'v>,
    builder: SchemaGraphBuilder,
    diagnostics: Vec<RowShapeError>,
    stats: RunStats,
}

impl Run<'_> {
    fn execute<E: QueryExecutor + ?Sized>(&mut self, executor: &E, query: &Query) -> Result<(), AbstractionError> {
        tracing::debug!(query = %query.kind, "executing");
        let rows = executor
            .execute(&query.text)
            .map_err(|source| AbstractionError::Query {
                query: query.kind.to_string(),
                source,
            })?;

        let classified = self.classifier.classify(&rows, &query.kind);
        let applied = self.builder.ingest(&classified.facts);

        self.stats.queries += 1;
        self.stats.rows += rows.len();
        self.stats.facts += classified.facts.len();
        self.stats.applied += applied;
        self.diagnostics.extend(classified.skipped);
        Ok(())
    }

    /// Admitted entity identifiers, sorted.
    fn entities(&self, vocabulary: &Vocabulary) -> Vec<String> {
        let mut ids: Vec<String> = self
            .builder
            .graph()
            .instances_of(&vocabulary.term(marker::ENTITY))
            .into_iter()
            .filter_map(|t| t.as_iri().map(str::to_string))
            .collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::executor::{row, Row};
    use crate::graph::Term;
    use crate::vocab::{PROV_ENTITY, RDFS_DOMAIN, RDFS_LABEL, RDFS_RANGE, XSD_DECIMAL};
    use std::cell::RefCell;

    /// Answers by query kind, recognised from the text.
    struct Scripted {
        answers: Vec<(&'static str, Vec<Row>)>,
        seen: RefCell<Vec<String>>,
    }

    impl QueryExecutor for Scripted {
        fn execute(&self, query: &str) -> Result<Vec<Row>, QueryError> {
            self.seen.borrow_mut().push(query.to_string());
            for (needle, rows) in &self.answers {
                if query.contains(needle) {
                    return Ok(rows.clone());
                }
            }
            Ok(Vec::new())
        }
    }

    struct Failing;

    impl QueryExecutor for Failing {
        fn execute(&self, _query: &str) -> Result<Vec<Row>, QueryError> {
            Err(QueryError::Transport("connection refused".to_string()))
        }
    }

    fn vocab() -> Vocabulary {
        Vocabulary::new("http://ns/")
    }

    #[test]
    fn per_entity_discovery_queries_every_entity() {
        let exec = Scripted {
            answers: vec![
                ("SELECT DISTINCT ?entity\n", vec![
                    row([("entity", "http://ex/Gene")]),
                    row([("entity", "http://ex/Transcript")]),
                    row([("entity", "http://www.w3.org/2002/07/owl#Class")]),
                ]),
                ("a <http://ex/Gene> .\n    ?instance ?attribute ?value .\n    FILTER (isNumeric", vec![
                    row([("attribute", "http://ex/length")]),
                ]),
            ],
            seen: RefCell::new(Vec::new()),
        };
        let out = abstract_schema(&exec, &vocab(), &Strategy::Free { bulk: false, superclasses: false }, "mem")
            .expect("run");
        // one entity query + three per admitted entity
        assert_eq!(out.stats.queries, 7);
        assert_eq!(out.stats.entities, 2);
        assert_eq!(exec.seen.borrow().len(), 7);
        assert!(out.graph.contains(
            &Term::iri("http://ex/length"),
            RDFS_RANGE,
            &Term::iri(XSD_DECIMAL)
        ));
    }

    #[test]
    fn query_failure_aborts_the_run() {
        let err = abstract_schema(&Failing, &vocab(), &Strategy::ToolConvention, "mem").unwrap_err();
        match err {
            AbstractionError::Query { query, source } => {
                assert_eq!(query, "tool_entities");
                assert_eq!(source, QueryError::Transport("connection refused".to_string()));
            }
        }
    }

    #[test]
    fn bulk_run_collects_diagnostics_and_provenance() {
        let exec = Scripted {
            answers: vec![(
                "?source_entity",
                vec![
                    row([
                        ("source_entity", "http://ex/Gene"),
                        ("relation", "http://ex/encodes"),
                        ("target_entity", "http://ex/Protein"),
                    ]),
                    row([("source_entity", "http://ex/Gene")]),
                ],
            )],
            seen: RefCell::new(Vec::new()),
        };
        let out = abstract_schema(
            &exec,
            &vocab(),
            &Strategy::Free {
                bulk: true,
                superclasses: true,
            },
            "http://localhost/sparql",
        )
        .expect("run");
        assert_eq!(out.stats.queries, 3);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].field, "relation");
        assert!(out.graph.contains(
            &Term::iri("http://ex/encodes"),
            RDFS_DOMAIN,
            &Term::iri("http://ex/Gene")
        ));
        assert_eq!(out.graph.instances_of(PROV_ENTITY).len(), 1);
    }

    #[test]
    fn ontology_union_domain_keeps_both_arms() {
        let exec = Scripted {
            answers: vec![
                (
                    "owl:ObjectProperty",
                    vec![
                        row([
                            ("source_entity", "http://ex/A"),
                            ("relation", "http://ex/r"),
                            ("target_entity", "http://ex/C"),
                        ]),
                        row([
                            ("source_entity", "http://ex/B"),
                            ("relation", "http://ex/r"),
                            ("target_entity", "http://ex/C"),
                        ]),
                    ],
                ),
                (
                    "owl:Class",
                    vec![row([("entity", "http://ex/A"), ("label", "Class A")])],
                ),
            ],
            seen: RefCell::new(Vec::new()),
        };
        let out = abstract_schema(
            &exec,
            &vocab(),
            &Strategy::Ontology {
                ontology: "http://ex/onto".to_string(),
            },
            "mem",
        )
        .expect("run");
        let rel = Term::iri("http://ex/r");
        let domains: Vec<_> = out.graph.objects(&rel, RDFS_DOMAIN).collect();
        assert_eq!(domains, vec![&Term::iri("http://ex/A"), &Term::iri("http://ex/B")]);
        assert!(out
            .graph
            .contains(&Term::iri("http://ex/A"), RDFS_LABEL, &Term::literal("Class A")));
    }
}
