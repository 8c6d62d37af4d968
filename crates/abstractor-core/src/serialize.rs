//! Turtle and N-Triples writers for a finished schema graph.
//!
//! Output is deterministic: the graph is an ordered set, so subjects,
//! predicates and objects always come out in the same order.

use crate::graph::{escape_literal, SchemaGraph, Term, Triple};
use crate::vocab::{Vocabulary, OWL_NS, PROV_NS, RDFS_NS, RDF_NS, RDF_TYPE, XSD_BOOLEAN, XSD_NS, XSD_STRING};

/// One triple per line, absolute IRIs.
#[must_use]
pub fn to_ntriples(graph: &SchemaGraph) -> String {
    let mut out = String::with_capacity(graph.len() * 96);
    for t in graph {
        out.push_str(&format!("{} <{}> {} .\n", t.subject, t.predicate, t.object));
    }
    out
}

/// Turtle with prefixes and subjects grouped.
#[must_use]
pub fn to_turtle(graph: &SchemaGraph, vocabulary: &Vocabulary) -> String {
    let prefixes = Prefixes::new(vocabulary);
    let mut out = String::with_capacity(graph.len() * 64);

    for (name, iri) in &prefixes.0 {
        out.push_str(&format!("@prefix {name}: <{iri}> .\n"));
    }

    let triples: Vec<&Triple> = graph.iter().collect();
    let mut i = 0;
    while i < triples.len() {
        let subject = &triples[i].subject;
        out.push('\n');
        out.push_str(&prefixes.node(subject));

        let mut first_predicate = true;
        while i < triples.len() && triples[i].subject == *subject {
            let predicate = &triples[i].predicate;
            out.push_str(if first_predicate { " " } else { " ;\n    " });
            first_predicate = false;
            out.push_str(&prefixes.predicate(predicate));

            let mut first_object = true;
            while i < triples.len() && triples[i].subject == *subject && triples[i].predicate == *predicate {
                out.push_str(if first_object { " " } else { " , " });
                first_object = false;
                out.push_str(&prefixes.node(&triples[i].object));
                i += 1;
            }
        }
        out.push_str(" .\n");
    }
    out
}

struct Prefixes(Vec<(String, String)>);

impl Prefixes {
    /// Fixed prefixes first; vocabulary bindings never shadow them.
    fn new(vocabulary: &Vocabulary) -> Self {
        let mut prefixes: Vec<(String, String)> = [
            ("", vocabulary.namespace.as_str()),
            ("owl", OWL_NS),
            ("prov", PROV_NS),
            ("rdf", RDF_NS),
            ("rdfs", RDFS_NS),
            ("xsd", XSD_NS),
        ]
        .into_iter()
        .map(|(name, ns)| (name.to_string(), ns.to_string()))
        .collect();
        for (name, ns) in &vocabulary.bindings {
            if is_prefix_name(name) && !prefixes.iter().any(|(bound, _)| bound == name) {
                prefixes.push((name.clone(), ns.clone()));
            }
        }
        Self(prefixes)
    }

    fn iri(&self, iri: &str) -> String {
        // Longest namespace first, so nested namespaces compact correctly.
        let best = self
            .0
            .iter()
            .filter_map(|(name, ns)| iri.strip_prefix(ns.as_str()).map(|local| (name, ns, local)))
            .filter(|(_, _, local)| is_safe_local(local))
            .max_by_key(|(_, ns, _)| ns.len());
        match best {
            Some((name, _, local)) => format!("{name}:{local}"),
            None => format!("<{iri}>"),
        }
    }

    fn predicate(&self, predicate: &str) -> String {
        if predicate == RDF_TYPE {
            "a".to_string()
        } else {
            self.iri(predicate)
        }
    }

    fn node(&self, term: &Term) -> String {
        match term {
            Term::Iri(iri) => self.iri(iri),
            Term::Blank(id) => format!("_:{id}"),
            Term::Literal { lexical, datatype } => match datatype.as_deref() {
                Some(XSD_BOOLEAN) if lexical == "true" || lexical == "false" => lexical.clone(),
                None | Some(XSD_STRING) => format!("\"{}\"", escape_literal(lexical)),
                Some(dt) => format!("\"{}\"^^{}", escape_literal(lexical), self.iri(dt)),
            },
        }
    }
}

/// Conservative PN_PREFIX check: an ASCII letter, then letters, digits, `_` or `-`.
pub fn is_prefix_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Conservative PN_LOCAL check: ASCII letters, digits, `_` and `-`, not starting with `-`.
fn is_safe_local(local: &str) -> bool {
    let mut chars = local.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphanumeric() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
