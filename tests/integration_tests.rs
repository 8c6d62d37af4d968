//! End-to-end tests for the abstraction pipeline
//!
//! These tests run every strategy against real RDF fixtures:
//! - RDF file → oxigraph store → catalog queries → classifier → builder
//! - schema graph → Turtle → parsed back
//!
//! Run with: cargo test --test integration_tests

use std::path::PathBuf;

use abstractor_core::vocab::{
    OWL_CLASS, PROV_ENTITY, RDFS_DOMAIN, RDFS_LABEL, RDFS_RANGE, RDFS_SUBCLASS_OF, RDF_TYPE,
    XSD_DECIMAL, XSD_STRING,
};
use abstractor_core::{
    abstract_schema, to_ntriples, to_turtle, Abstraction, SchemaGraph, Strategy, Term, Vocabulary,
};
use abstractor_sparql::{open_source, RdfFileSource, SourceOptions};
use oxigraph::io::RdfFormat;
use tempfile::tempdir;

const NS: &str = "http://askomics.org/internal/";
const GENOMICS: &str = "http://example.org/genomics/";
const ONTO: &str = "http://example.org/onto#";
const DATA: &str = "http://example.org/data/";

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn run(name: &str, strategy: Strategy) -> Abstraction {
    run_with(name, strategy, &Vocabulary::default())
}

fn run_with(name: &str, strategy: Strategy, vocabulary: &Vocabulary) -> Abstraction {
    let location = fixture(name);
    let source = open_source(&location, None, &SourceOptions::default()).expect("open fixture");
    abstract_schema(source.as_ref(), vocabulary, &strategy, &location).expect("abstraction")
}

/// Every IRI subject passes the gate of `vocabulary`.
fn assert_only_admitted_nodes(g: &SchemaGraph, vocabulary: &Vocabulary) {
    for subject in g.subjects() {
        if let Some(id) = subject.as_iri() {
            assert!(vocabulary.admits(id), "{id} should never be a node");
        }
    }
}

fn iri(base: &str, local: &str) -> Term {
    Term::iri(format!("{base}{local}"))
}

fn marker(local: &str) -> Term {
    iri(NS, local)
}

fn is_entity(g: &SchemaGraph, t: &Term) -> bool {
    g.contains(t, RDF_TYPE, &marker("entity"))
}

fn has_no_labels_marker(g: &SchemaGraph, t: &Term) -> bool {
    g.contains(t, &format!("{NS}instancesHaveNoLabels"), &Term::boolean(true))
}

fn labels(g: &SchemaGraph, t: &Term) -> Vec<String> {
    g.objects(t, RDFS_LABEL)
        .filter_map(|o| o.lexical().map(str::to_string))
        .collect()
}

// ============================================================================
// Free discovery
// ============================================================================

#[test]
fn test_free_discovery_per_entity() {
    let out = run(
        "genes.ttl",
        Strategy::Free {
            bulk: false,
            superclasses: false,
        },
    );
    let g = &out.graph;

    for local in ["Gene", "Transcript", "Protein", "Molecule"] {
        assert!(is_entity(g, &iri(GENOMICS, local)), "{local} should be an entity");
    }
    assert!(!is_entity(g, &Term::iri(OWL_CLASS)));
    assert_eq!(out.stats.entities, 4);
    // entity query + three per entity
    assert_eq!(out.stats.queries, 13);

    let encodes = iri(GENOMICS, "encodes");
    assert!(g.contains(&encodes, RDFS_DOMAIN, &iri(GENOMICS, "Gene")));
    assert!(g.contains(&encodes, RDFS_RANGE, &iri(GENOMICS, "Protein")));

    let length = iri(GENOMICS, "length");
    assert!(g.contains(&length, RDFS_RANGE, &Term::iri(XSD_DECIMAL)));
    let symbol = iri(GENOMICS, "geneSymbol");
    assert!(g.contains(&symbol, RDFS_RANGE, &Term::iri(XSD_STRING)));
    assert_eq!(labels(g, &symbol), vec!["gene symbol".to_string()]);

    // BRCA2 carries an rdfs:label, transcripts don't.
    assert!(!has_no_labels_marker(g, &iri(GENOMICS, "Gene")));
    assert!(has_no_labels_marker(g, &iri(GENOMICS, "Transcript")));
    assert!(g
        .matching(abstractor_core::Pattern::new(Some(&Term::iri(RDFS_LABEL)), None, None))
        .next()
        .is_none());

    assert!(out.diagnostics.is_empty());
}

#[test]
fn test_bulk_discovery_with_superclasses() {
    let out = run(
        "genes.ttl",
        Strategy::Free {
            bulk: true,
            superclasses: true,
        },
    );
    let g = &out.graph;
    assert_eq!(out.stats.queries, 3);
    assert!(g.contains(
        &iri(GENOMICS, "Protein"),
        RDFS_SUBCLASS_OF,
        &iri(GENOMICS, "Molecule")
    ));
    assert!(g.contains(
        &iri(GENOMICS, "interactsWith"),
        RDFS_RANGE,
        &iri(GENOMICS, "Molecule")
    ));
    assert!(g.contains(
        &iri(GENOMICS, "exonCount"),
        RDFS_DOMAIN,
        &iri(GENOMICS, "Transcript")
    ));
    assert!(!has_no_labels_marker(g, &iri(GENOMICS, "Gene")));
}

#[test]
fn test_bulk_and_per_entity_agree_on_relations() {
    let relations = |out: &Abstraction| -> Vec<Term> {
        out.graph
            .instances_of(&format!("{NS}AskomicsRelation"))
            .into_iter()
            .cloned()
            .collect()
    };
    let free = run(
        "genes.ttl",
        Strategy::Free {
            bulk: false,
            superclasses: false,
        },
    );
    let bulk = run(
        "genes.ttl",
        Strategy::Free {
            bulk: true,
            superclasses: false,
        },
    );
    assert_eq!(relations(&free), relations(&bulk));
}

// ============================================================================
// Declared-ontology discovery
// ============================================================================

#[test]
fn test_ontology_union_domains_keep_every_arm() {
    let out = run(
        "ontology.ttl",
        Strategy::Ontology {
            ontology: "http://example.org/onto".to_string(),
        },
    );
    let g = &out.graph;

    assert!(is_entity(g, &iri(ONTO, "Gene")));
    assert!(is_entity(g, &iri(ONTO, "Pseudogene")));
    assert!(is_entity(g, &iri(ONTO, "Chromosome")));
    assert!(!is_entity(g, &iri(ONTO, "Unrelated")));
    assert!(g.contains(&iri(ONTO, "Pseudogene"), RDFS_SUBCLASS_OF, &iri(ONTO, "Gene")));

    let located_on = iri(ONTO, "locatedOn");
    let domains: Vec<&Term> = g.objects(&located_on, RDFS_DOMAIN).collect();
    assert_eq!(domains, vec![&iri(ONTO, "Gene"), &iri(ONTO, "Pseudogene")]);
    assert!(g.contains(&located_on, RDFS_RANGE, &iri(ONTO, "Chromosome")));
    assert_eq!(labels(g, &located_on), vec!["located on".to_string()]);

    let start = iri(ONTO, "startPosition");
    assert_eq!(g.objects(&start, RDFS_DOMAIN).count(), 2);
    assert!(g.contains(&start, RDFS_RANGE, &Term::iri(XSD_DECIMAL)));
    assert_eq!(labels(g, &start), vec!["start position".to_string()]);

    assert!(g.contains(&iri(ONTO, "name"), RDFS_RANGE, &Term::iri(XSD_STRING)));
    assert_eq!(labels(g, &iri(ONTO, "Gene")), vec!["Gene".to_string()]);
}

// ============================================================================
// Tool-convention discovery
// ============================================================================

#[test]
fn test_askomics_graph_reads_back() {
    // Strand values live in FALDO; keep that namespace to see them.
    let vocabulary = Vocabulary::default().with_positional(None);
    let out = run_with("askomics.ttl", Strategy::ToolConvention, &vocabulary);
    let g = &out.graph;
    let gene = iri(DATA, "Gene");
    let transcript = iri(DATA, "Transcript");

    assert!(g.contains(&gene, RDF_TYPE, &marker("startPoint")));
    assert!(!g.contains(&transcript, RDF_TYPE, &marker("startPoint")));
    assert!(has_no_labels_marker(g, &transcript));
    assert!(!has_no_labels_marker(g, &gene));
    assert!(g.contains(&transcript, RDFS_SUBCLASS_OF, &gene));

    let transcribed = iri(DATA, "transcribedFrom");
    assert!(g.contains(&transcribed, RDFS_DOMAIN, &transcript));
    assert!(g.contains(&transcribed, RDFS_RANGE, &gene));
    assert_eq!(labels(g, &transcribed), vec!["transcribed from".to_string()]);

    let start = iri(DATA, "start");
    assert!(g.contains(&start, RDF_TYPE, &marker("faldoStart")));
    assert!(g.contains(&start, RDFS_RANGE, &Term::iri(XSD_DECIMAL)));

    let strand = iri(DATA, "strand");
    assert!(g.contains(&strand, RDF_TYPE, &marker("AskomicsCategory")));
    let strand_category = iri(DATA, "StrandCategory");
    let category_pred = format!("{NS}category");
    let values: Vec<&Term> = g.objects(&strand_category, &category_pred).collect();
    assert_eq!(values.len(), 2);
    let forward = Term::iri("http://biohackathon.org/resource/faldo#ForwardStrandPosition");
    assert_eq!(labels(g, &forward), vec!["+".to_string()]);
    assert!(g.contains(&forward, RDF_TYPE, &iri(DATA, "StrandCategory")));
    assert_only_admitted_nodes(g, &vocabulary);
}

#[test]
fn test_askomics_categories_with_excluded_values_are_dropped() {
    let vocabulary = Vocabulary::default();
    let out = run_with("askomics.ttl", Strategy::ToolConvention, &vocabulary);
    let g = &out.graph;
    assert!(is_entity(g, &iri(DATA, "Gene")));
    assert!(!g.contains(&iri(DATA, "strand"), RDF_TYPE, &marker("AskomicsCategory")));
    assert_eq!(
        g.objects(&iri(DATA, "StrandCategory"), &format!("{NS}category")).count(),
        0
    );
    assert_only_admitted_nodes(g, &vocabulary);
}

#[test]
fn test_anonymous_types_never_become_entities() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("anonymous.ttl");
    std::fs::write(
        &path,
        r#"@prefix ex: <http://example.org/data/> .
ex:c a [ ex:note "anonymous class" ] ;
    ex:partOf ex:d ;
    ex:size 3 .
ex:d a ex:Container .
"#,
    )
    .expect("write");
    let location = path.to_string_lossy().into_owned();
    let source = open_source(&location, None, &SourceOptions::default()).expect("open");

    for bulk in [true, false] {
        let out = abstract_schema(
            source.as_ref(),
            &Vocabulary::default(),
            &Strategy::Free {
                bulk,
                superclasses: true,
            },
            &location,
        )
        .expect("abstraction");
        assert_only_admitted_nodes(&out.graph, &Vocabulary::default());
        assert!(out
            .graph
            .iter()
            .filter_map(|t| t.object.as_iri())
            .all(|id| url::Url::parse(id).is_ok()));

        let nt = to_ntriples(&out.graph);
        let reparsed = RdfFileSource::from_reader(nt.as_bytes(), RdfFormat::NTriples, "anonymous.nt")
            .expect("output must parse");
        assert_eq!(reparsed.len().expect("len"), out.graph.len());
    }
}

// ============================================================================
// Output
// ============================================================================

#[test]
fn test_turtle_output_parses_back() {
    let out = run("askomics.ttl", Strategy::ToolConvention);
    let ttl = to_turtle(&out.graph, &Vocabulary::default());
    let reparsed = RdfFileSource::from_reader(ttl.as_bytes(), RdfFormat::Turtle, "output.ttl")
        .expect("turtle output must parse");
    assert_eq!(reparsed.len().expect("len"), out.graph.len());

    let nt = to_ntriples(&out.graph);
    let reparsed = RdfFileSource::from_reader(nt.as_bytes(), RdfFormat::NTriples, "output.nt")
        .expect("n-triples output must parse");
    assert_eq!(reparsed.len().expect("len"), out.graph.len());
}

#[test]
fn test_provenance_is_recorded_once() {
    let out = run("ontology.ttl", Strategy::Ontology { ontology: "http://example.org/onto".to_string() });
    assert_eq!(out.graph.instances_of(PROV_ENTITY).len(), 1);
}

#[test]
fn test_output_roundtrips_through_a_file() {
    let out = run(
        "genes.ttl",
        Strategy::Free {
            bulk: true,
            superclasses: true,
        },
    );
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("abstraction.ttl");
    std::fs::write(&path, to_turtle(&out.graph, &Vocabulary::default())).expect("write");

    // The abstraction of an abstraction is read back with the tool convention.
    let again = abstract_schema(
        &RdfFileSource::open(&path, None).expect("open"),
        &Vocabulary::default(),
        &Strategy::ToolConvention,
        &path.to_string_lossy(),
    )
    .expect("abstraction");
    let relations = |g: &SchemaGraph| g.instances_of(&format!("{NS}AskomicsRelation")).len();
    assert_eq!(relations(&again.graph), relations(&out.graph));
    assert_eq!(again.stats.entities, out.stats.entities);
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempdir().expect("tempdir");
    let missing = dir.path().join("missing.ttl");
    assert!(open_source(&missing.to_string_lossy(), None, &SourceOptions::default()).is_err());
}
