//! Schema facts → schema graph.
//!
//! The builder is valid after every call; there is no finalize step besides
//! handing the graph off with [`SchemaGraphBuilder::finish`].
//!
//! Node shapes written:
//! - entity: `a ns:entity, owl:Class`, optionally `a ns:startPoint` and
//!   `ns:instancesHaveNoLabels true`, one label
//! - relation: `a owl:ObjectProperty, ns:AskomicsRelation`, one label, domain(s), range(s)
//! - attribute: `a owl:DatatypeProperty` (plus its positional marker, if any),
//!   one label, domain(s), `xsd:decimal` or `xsd:string` range
//! - category: `a owl:ObjectProperty, ns:AskomicsCategory`, one label, domain,
//!   range = value type; each value is `a <concrete>, owl:NamedIndividual`
//!   with one label and hangs off the value type via `ns:category`
//! - provenance: one blank `prov:Entity`
//!
//! Every identifier argument goes through [`Vocabulary::admits`]; a rejected
//! identifier turns the call into a no-op.

use std::collections::HashSet;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::fact::{AttributeKind, EntityFlags, SchemaFact};
use crate::graph::{Pattern, SchemaGraph, Term};
use crate::label::derive_label;
use crate::vocab::{
    marker, Vocabulary, OWL_CLASS, OWL_DATATYPE_PROPERTY, OWL_NAMED_INDIVIDUAL,
    OWL_OBJECT_PROPERTY, PROV_AT_LOCATION, PROV_ENTITY, PROV_GENERATED_AT_TIME,
    PROV_WAS_ATTRIBUTED_TO, RDFS_DOMAIN, RDFS_RANGE, RDFS_SUBCLASS_OF, RDF_TYPE, XSD_DATE_TIME,
};

/// What the provenance node records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub location: String,
    pub generated_at: DateTime<Utc>,
    pub tool: String,
}

impl Provenance {
    pub fn now(location: &str, tool: &str) -> Self {
        Self {
            location: location.to_string(),
            generated_at: Utc::now(),
            tool: tool.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchemaGraphBuilder {
    vocabulary: Vocabulary,
    graph: SchemaGraph,
    categories: HashSet<String>,
    provenance: Option<Term>,
}

impl SchemaGraphBuilder {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self {
            vocabulary,
            graph: SchemaGraph::new(),
            categories: HashSet::new(),
            provenance: None,
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn graph(&self) -> &SchemaGraph {
        &self.graph
    }

    pub fn finish(self) -> SchemaGraph {
        self.graph
    }

    fn marker(&self, local: &str) -> Term {
        Term::iri(self.vocabulary.term(local))
    }

    pub fn has_entity(&self, id: &str) -> bool {
        self.graph.contains(
            &Term::iri(id),
            RDF_TYPE,
            &self.marker(marker::ENTITY),
        )
    }

    /// Replace the node's label.
    fn set_label(&mut self, node: &Term, label: &str) {
        let predicate = self.vocabulary.label_predicate.clone();
        self.graph
            .remove_matching(Pattern::new(Some(node), Some(predicate.as_str()), None));
        self.graph
            .insert(node.clone(), &predicate, Term::literal(label));
    }

    fn label_for(id: &str, supplied: Option<&str>) -> String {
        match supplied.map(str::trim).filter(|l| !l.is_empty()) {
            Some(label) => label.to_string(),
            None => {
                let derived = derive_label(id);
                if derived.is_empty() {
                    id.to_string()
                } else {
                    derived
                }
            }
        }
    }

    // ========================================================================
    // Entities
    // ========================================================================

    /// Returns true when the entity node was created by this call.
    pub fn add_entity(&mut self, id: &str) -> bool {
        self.add_entity_with(id, None, EntityFlags::default())
    }

    /// First call wins: label and flags of an existing entity are left alone.
    pub fn add_entity_with(&mut self, id: &str, label: Option<&str>, flags: EntityFlags) -> bool {
        if !self.vocabulary.admits(id) || self.has_entity(id) {
            return false;
        }
        let node = Term::iri(id);
        let entity = self.marker(marker::ENTITY);
        let start_point = self.marker(marker::START_POINT);
        self.graph.insert(node.clone(), RDF_TYPE, entity);
        if flags.start_point {
            self.graph.insert(node.clone(), RDF_TYPE, start_point);
        }
        self.graph.insert(node.clone(), RDF_TYPE, Term::iri(OWL_CLASS));
        if flags.instances_have_no_labels {
            let predicate = self.vocabulary.term(marker::INSTANCES_HAVE_NO_LABELS);
            self.graph.insert(node.clone(), &predicate, Term::boolean(true));
        }
        self.set_label(&node, &Self::label_for(id, label));
        tracing::trace!(entity = %id, "added entity");
        true
    }

    /// Clear the "instances have no labels" marker; true when one was removed.
    pub fn retract_no_labels(&mut self, entity: &str) -> bool {
        if !self.vocabulary.admits(entity) {
            return false;
        }
        let node = Term::iri(entity);
        let predicate = self.vocabulary.term(marker::INSTANCES_HAVE_NO_LABELS);
        self.graph
            .remove_matching(Pattern::new(Some(&node), Some(predicate.as_str()), None))
            > 0
    }

    /// Both ends must already be entities.
    pub fn add_subclass(&mut self, child: &str, parent: &str) -> bool {
        if !self.vocabulary.admits(child) || !self.vocabulary.admits(parent) {
            return false;
        }
        if !self.has_entity(child) || !self.has_entity(parent) {
            tracing::debug!(child = %child, parent = %parent, "subclass edge between unknown entities skipped");
            return false;
        }
        self.graph
            .insert(Term::iri(child), RDFS_SUBCLASS_OF, Term::iri(parent))
    }

    // ========================================================================
    // Relations and attributes
    // ========================================================================

    /// Domain and range accumulate; the label is replaced on every call.
    pub fn add_relation(&mut self, source: &str, relation: &str, target: &str, label: Option<&str>) -> bool {
        let v = &self.vocabulary;
        if !v.admits(source) || !v.admits(relation) || !v.admits(target) {
            return false;
        }
        self.add_entity(source);
        self.add_entity(target);

        let node = Term::iri(relation);
        let relation_marker = self.marker(marker::RELATION);
        self.graph
            .insert(node.clone(), RDF_TYPE, Term::iri(OWL_OBJECT_PROPERTY));
        self.graph.insert(node.clone(), RDF_TYPE, relation_marker);
        self.set_label(&node, &Self::label_for(relation, label));
        self.graph
            .insert(node.clone(), RDFS_DOMAIN, Term::iri(source));
        self.graph.insert(node, RDFS_RANGE, Term::iri(target));
        true
    }

    pub fn add_attribute(
        &mut self,
        entity: &str,
        attribute: &str,
        kind: AttributeKind,
        label: Option<&str>,
        positional: Option<&str>,
    ) -> bool {
        if !self.vocabulary.admits(entity) {
            return false;
        }
        if self.vocabulary.is_label_predicate(attribute) {
            self.retract_no_labels(entity);
            return false;
        }
        if !self.vocabulary.admits(attribute) {
            return false;
        }
        self.add_entity(entity);

        let node = Term::iri(attribute);
        self.graph
            .insert(node.clone(), RDF_TYPE, Term::iri(OWL_DATATYPE_PROPERTY));
        if let Some(class) = positional.filter(|m| self.vocabulary.is_positional_marker(m)) {
            self.graph.insert(node.clone(), RDF_TYPE, Term::iri(class));
        }
        self.set_label(&node, &Self::label_for(attribute, label));
        self.graph
            .insert(node.clone(), RDFS_DOMAIN, Term::iri(entity));
        self.graph
            .insert(node, RDFS_RANGE, Term::iri(kind.datatype()));
        true
    }

    // ========================================================================
    // Categories
    // ========================================================================

    /// Node facts once per category; value edges for every call.
    #[allow(clippy::too_many_arguments)]
    pub fn add_category(
        &mut self,
        entity: &str,
        category: &str,
        label: &str,
        value_type: &str,
        value: &str,
        value_label: &str,
        value_concrete_type: &str,
    ) -> bool {
        let v = &self.vocabulary;
        if ![entity, category, value_type, value, value_concrete_type]
            .iter()
            .all(|id| v.admits(id))
        {
            return false;
        }
        self.add_entity(entity);

        if self.categories.insert(category.to_string()) {
            let node = Term::iri(category);
            let category_marker = self.marker(marker::CATEGORY);
            self.graph
                .insert(node.clone(), RDF_TYPE, Term::iri(OWL_OBJECT_PROPERTY));
            self.graph.insert(node.clone(), RDF_TYPE, category_marker);
            self.set_label(&node, &Self::label_for(category, Some(label)));
            self.graph
                .insert(node.clone(), RDFS_DOMAIN, Term::iri(entity));
            self.graph.insert(node, RDFS_RANGE, Term::iri(value_type));
        }

        let value_node = Term::iri(value);
        let membership = self.vocabulary.term(marker::CATEGORY_VALUE);
        self.graph
            .insert(Term::iri(value_type), &membership, value_node.clone());
        self.graph
            .insert(value_node.clone(), RDF_TYPE, Term::iri(value_concrete_type));
        self.graph
            .insert(value_node.clone(), RDF_TYPE, Term::iri(OWL_NAMED_INDIVIDUAL));
        self.set_label(&value_node, &Self::label_for(value, Some(value_label)));
        true
    }

    // ========================================================================
    // Provenance
    // ========================================================================

    pub fn add_provenance(&mut self, location: &str) -> bool {
        let provenance = Provenance::now(location, &self.vocabulary.tool);
        self.add_provenance_at(&provenance)
    }

    /// At most one provenance node per builder; later calls return false.
    pub fn add_provenance_at(&mut self, provenance: &Provenance) -> bool {
        if self.provenance.is_some() {
            return false;
        }
        let node = self.graph.fresh_blank();
        self.graph
            .insert(node.clone(), RDF_TYPE, Term::iri(PROV_ENTITY));
        self.set_label(&node, &format!("Abstraction of {}", provenance.location));

        let location = if url::Url::parse(&provenance.location).is_ok() {
            Term::iri(provenance.location.as_str())
        } else {
            Term::literal(provenance.location.as_str())
        };
        self.graph.insert(node.clone(), PROV_AT_LOCATION, location);
        self.graph.insert(
            node.clone(),
            PROV_GENERATED_AT_TIME,
            Term::typed(
                provenance
                    .generated_at
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
                XSD_DATE_TIME,
            ),
        );
        self.graph.insert(
            node.clone(),
            PROV_WAS_ATTRIBUTED_TO,
            Term::literal(provenance.tool.as_str()),
        );
        self.provenance = Some(node);
        true
    }

    // ========================================================================
    // Facts
    // ========================================================================

    /// Apply one fact.
    pub fn apply(&mut self, fact: &SchemaFact) -> bool {
        match fact {
            SchemaFact::Entity { id, label, flags } => {
                self.add_entity_with(id, label.as_deref(), *flags)
            }
            SchemaFact::Relation {
                source_id,
                target_id,
                relation_id,
                label,
            } => self.add_relation(source_id, relation_id, target_id, label.as_deref()),
            SchemaFact::Attribute {
                entity_id,
                attribute_id,
                kind,
                label,
                positional,
                ..
            } => self.add_attribute(
                entity_id,
                attribute_id,
                *kind,
                label.as_deref(),
                positional.as_deref(),
            ),
            SchemaFact::InstanceLabels { entity_id } => self.retract_no_labels(entity_id),
            SchemaFact::Subclass { child_id, parent_id } => self.add_subclass(child_id, parent_id),
            SchemaFact::Category {
                entity_id,
                category_id,
                label,
                value_type_id,
                value_id,
                value_label,
                value_concrete_type_id,
            } => self.add_category(
                entity_id,
                category_id,
                label,
                value_type_id,
                value_id,
                value_label,
                value_concrete_type_id,
            ),
            SchemaFact::Provenance { source_location } => self.add_provenance(source_location),
        }
    }

    /// Apply a batch in dependency order; returns how many facts changed the graph.
    pub fn ingest(&mut self, facts: &[SchemaFact]) -> usize {
        let mut ordered: Vec<&SchemaFact> = facts.iter().collect();
        ordered.sort_by_key(|f| f.phase());
        ordered.into_iter().filter(|f| self.apply(f)).count()
    }
}
