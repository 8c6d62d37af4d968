//! In-memory schema graph.
//!
//! A deliberately small triple set: labelled nodes (`Term`) joined by labelled
//! edges (predicate IRIs). It supports exactly what the builder needs:
//! insert, membership, pattern matching and pattern removal. Storage is
//! ordered so serialization is deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::vocab::XSD_BOOLEAN;

// ============================================================================
// Terms
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    Iri(String),
    Blank(String),
    Literal {
        lexical: String,
        datatype: Option<String>,
    },
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(iri.into())
    }

    /// Plain (`xsd:string`) literal.
    pub fn literal(lexical: impl Into<String>) -> Self {
        Term::Literal {
            lexical: lexical.into(),
            datatype: None,
        }
    }

    pub fn typed(lexical: impl Into<String>, datatype: &str) -> Self {
        Term::Literal {
            lexical: lexical.into(),
            datatype: Some(datatype.to_string()),
        }
    }

    pub fn boolean(value: bool) -> Self {
        Term::typed(value.to_string(), XSD_BOOLEAN)
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn lexical(&self) -> Option<&str> {
        match self {
            Term::Literal { lexical, .. } => Some(lexical),
            _ => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{iri}>"),
            Term::Blank(id) => write!(f, "_:{id}"),
            Term::Literal { lexical, datatype } => {
                write!(f, "\"{}\"", escape_literal(lexical))?;
                if let Some(dt) = datatype {
                    write!(f, "^^<{dt}>")?;
                }
                Ok(())
            }
        }
    }
}

/// Escape a lexical form for N-Triples/Turtle short string literals.
pub fn escape_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Term,
    pub predicate: String,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Term, predicate: &str, object: Term) -> Self {
        Self {
            subject,
            predicate: predicate.to_string(),
            object,
        }
    }
}

/// A triple pattern; `None` matches anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pattern<'a> {
    pub subject: Option<&'a Term>,
    pub predicate: Option<&'a str>,
    pub object: Option<&'a Term>,
}

impl<'a> Pattern<'a> {
    pub fn new(subject: Option<&'a Term>, predicate: Option<&'a str>, object: Option<&'a Term>) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    pub fn matches(&self, triple: &Triple) -> bool {
        self.subject.map_or(true, |s| *s == triple.subject)
            && self.predicate.map_or(true, |p| p == triple.predicate)
            && self.object.map_or(true, |o| *o == triple.object)
    }
}

// ============================================================================
// Graph
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaGraph {
    triples: BTreeSet<Triple>,
    next_blank: usize,
}

impl SchemaGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the triple was already present.
    pub fn insert(&mut self, subject: Term, predicate: &str, object: Term) -> bool {
        self.triples.insert(Triple::new(subject, predicate, object))
    }

    pub fn contains(&self, subject: &Term, predicate: &str, object: &Term) -> bool {
        self.matching(Pattern::new(Some(subject), Some(predicate), Some(object)))
            .next()
            .is_some()
    }

    pub fn matching<'a>(&'a self, pattern: Pattern<'a>) -> impl Iterator<Item = &'a Triple> + 'a {
        let start = pattern.subject.cloned();
        self.triples
            .iter()
            .skip_while(move |t| start.as_ref().is_some_and(|s| t.subject < *s))
            .take_while(move |t| pattern.subject.map_or(true, |s| t.subject == *s))
            .filter(move |t| pattern.matches(t))
    }

    /// Objects of every `(subject, predicate, ?)` triple.
    pub fn objects<'a>(&'a self, subject: &'a Term, predicate: &'a str) -> impl Iterator<Item = &'a Term> + 'a {
        self.matching(Pattern::new(Some(subject), Some(predicate), None))
            .map(|t| &t.object)
    }

    /// Remove every triple matching `pattern`; returns how many were removed.
    pub fn remove_matching(&mut self, pattern: Pattern<'_>) -> usize {
        let before = self.triples.len();
        self.triples.retain(|t| !pattern.matches(t));
        before - self.triples.len()
    }

    /// A blank node label not used before in this graph.
    pub fn fresh_blank(&mut self) -> Term {
        let id = format!("b{}", self.next_blank);
        self.next_blank += 1;
        Term::Blank(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Distinct subjects, in order.
    pub fn subjects(&self) -> Vec<&Term> {
        let mut out: Vec<&Term> = Vec::new();
        for t in &self.triples {
            if out.last() != Some(&&t.subject) {
                out.push(&t.subject);
            }
        }
        out
    }

    /// Subjects carrying `rdf:type <class>`.
    pub fn instances_of(&self, class: &str) -> Vec<&Term> {
        let class = Term::iri(class);
        self.triples
            .iter()
            .filter(|t| t.predicate == crate::vocab::RDF_TYPE && t.object == class)
            .map(|t| &t.subject)
            .collect()
    }
}

impl<'a> IntoIterator for &'a SchemaGraph {
    type Item = &'a Triple;
    type IntoIter = std::collections::btree_set::Iter<'a, Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.iter()
    }
}
