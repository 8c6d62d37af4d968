use abstractor_core::vocab::{OWL_NS, RDFS_LABEL, RDFS_NS, RDF_NS, VIRTRDF_NS};
use abstractor_core::{derive_label, AttributeKind, SchemaGraphBuilder, Vocabulary};
use proptest::prelude::*;

const NS: &str = "http://askomics.org/internal/";

fn local() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z][A-Za-z0-9_]{0,12}").unwrap()
}

fn excluded_iri() -> impl Strategy<Value = String> {
    (
        prop_oneof![
            Just(RDF_NS),
            Just(RDFS_NS),
            Just(OWL_NS),
            Just(VIRTRDF_NS),
            Just(NS),
            Just("http://biohackathon.org/resource/faldo#"),
        ],
        local(),
    )
        .prop_map(|(ns, local)| format!("{ns}{local}"))
}

/// Identifiers the gate must reject: excluded namespaces or no IRI at all.
fn rejected_id() -> impl Strategy<Value = String> {
    prop_oneof![
        excluded_iri(),
        proptest::string::string_regex("[a-z0-9]{1,16}").unwrap(),
        local().prop_map(|local| format!("/relative/{local}")),
    ]
}

fn data_iri() -> impl Strategy<Value = String> {
    local().prop_map(|local| format!("http://example.org/data/{local}"))
}

/// A builder that already holds some unrelated schema.
fn seeded() -> SchemaGraphBuilder {
    let mut b = SchemaGraphBuilder::new(Vocabulary::new(NS));
    b.add_relation(
        "http://example.org/data/Gene",
        "http://example.org/data/hasName",
        "http://example.org/data/Name",
        None,
    );
    b
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn excluded_identifiers_never_change_the_graph(
        bad in excluded_iri(),
        good in data_iri(),
        numeric in any::<bool>(),
    ) {
        let mut b = seeded();
        let before = b.graph().clone();
        let kind = if numeric { AttributeKind::Numeric } else { AttributeKind::Text };

        prop_assert!(!b.add_entity(&bad));
        prop_assert!(!b.add_relation(&good, &bad, &good, None));
        prop_assert!(!b.add_attribute(&bad, &good, kind, None, None));
        prop_assert_eq!(b.graph(), &before);
    }

    #[test]
    fn every_operation_ignores_a_rejected_identifier(
        bad in rejected_id(),
        good in data_iri(),
        position in 0usize..5,
        numeric in any::<bool>(),
    ) {
        prop_assume!(bad != RDFS_LABEL);
        let mut b = seeded();
        b.add_entity(&good);
        let before = b.graph().clone();
        let kind = if numeric { AttributeKind::Numeric } else { AttributeKind::Text };
        // The rejected id takes argument slot `position % arity` of each call.
        let arg = |arity: usize, slot: usize| {
            if slot == position % arity { bad.as_str() } else { good.as_str() }
        };

        prop_assert!(!b.add_entity(&bad));
        prop_assert!(!b.retract_no_labels(&bad));
        prop_assert!(!b.add_subclass(arg(2, 0), arg(2, 1)));
        prop_assert!(!b.add_relation(arg(3, 0), arg(3, 1), arg(3, 2), None));
        prop_assert!(!b.add_attribute(arg(2, 0), arg(2, 1), kind, None, None));
        prop_assert!(!b.add_category(
            arg(5, 0),
            arg(5, 1),
            "category",
            arg(5, 2),
            arg(5, 3),
            "value",
            arg(5, 4)
        ));
        prop_assert_eq!(b.graph(), &before);
    }

    #[test]
    fn add_entity_twice_equals_once(id in data_iri()) {
        let mut once = seeded();
        once.add_entity(&id);
        let mut twice = once.clone();
        twice.add_entity(&id);
        prop_assert_eq!(once.graph(), twice.graph());
    }

    #[test]
    fn label_predicate_never_becomes_an_attribute(entity in data_iri()) {
        let mut b = seeded();
        b.add_entity(&entity);
        b.add_attribute(&entity, RDFS_LABEL, AttributeKind::Text, None, None);
        let g = b.graph();
        prop_assert!(g.iter().all(|t| t.subject.as_iri() != Some(RDFS_LABEL)));
        prop_assert!(g
            .iter()
            .filter(|t| t.subject.as_iri() == Some(entity.as_str()))
            .all(|t| !t.predicate.ends_with("instancesHaveNoLabels")));
    }

    #[test]
    fn label_derivation_is_total(s in ".{0,40}") {
        let label = derive_label(&s);
        prop_assert!(!label.contains('_'));
        prop_assert!(!label.contains('/'));
    }

    #[test]
    fn labels_preserve_letters(local in "[A-Za-z]{1,16}") {
        let label = derive_label(&format!("http://example.org/{local}"));
        prop_assert_eq!(
            label.replace(' ', "").to_lowercase(),
            local.to_lowercase()
        );
    }
}
