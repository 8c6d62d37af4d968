//! SPARQL templates for every introspection strategy.
//!
//! Three families:
//! - free discovery: read the implicit schema off instance data
//!   (per-entity, or bulk with optional direct superclasses),
//! - declared-ontology discovery: classes/properties `rdfs:isDefinedBy` an ontology,
//!   with single-class and `owl:unionOf` domains,
//! - tool-convention discovery: read back a graph already annotated with the
//!   internal marker vocabulary (entities, start points, positional attributes,
//!   categories and their values).
//!
//! Templates only substitute identifiers. Interpolated IRIs are written as
//! `<iri>` verbatim; escaping is the transport's business, not ours.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::vocab::{marker, Vocabulary, OWL_NS, RDFS_NS, RDF_NS};

/// Introspection strategy, chosen once at the start of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Implicit schema from instance data.
    Free { bulk: bool, superclasses: bool },
    /// Classes and properties declared by one ontology.
    Ontology { ontology: String },
    /// A graph already annotated with the internal marker vocabulary.
    ToolConvention,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Free { bulk: false, .. } => "free",
            Strategy::Free { bulk: true, .. } => "bulk",
            Strategy::Ontology { .. } => "ontology",
            Strategy::ToolConvention => "askomics",
        }
    }
}

/// Which query produced a batch of rows; decides the columns the classifier reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryKind {
    Entities,
    EntityRelations { entity: String },
    EntityNumericAttributes { entity: String },
    EntityTextAttributes { entity: String },
    EntitiesAndRelations { superclasses: bool },
    NumericAttributes,
    TextAttributes,
    OntologyEntities,
    OntologyRelations,
    OntologyAttributes,
    ToolEntities,
    ToolRelations,
    ToolAttributes,
    ToolCategories,
}

impl QueryKind {
    pub fn name(&self) -> &'static str {
        match self {
            QueryKind::Entities => "entities",
            QueryKind::EntityRelations { .. } => "entity_relations",
            QueryKind::EntityNumericAttributes { .. } => "entity_numeric_attributes",
            QueryKind::EntityTextAttributes { .. } => "entity_text_attributes",
            QueryKind::EntitiesAndRelations { .. } => "entities_and_relations",
            QueryKind::NumericAttributes => "numeric_attributes",
            QueryKind::TextAttributes => "text_attributes",
            QueryKind::OntologyEntities => "ontology_entities",
            QueryKind::OntologyRelations => "ontology_relations",
            QueryKind::OntologyAttributes => "ontology_attributes",
            QueryKind::ToolEntities => "tool_entities",
            QueryKind::ToolRelations => "tool_relations",
            QueryKind::ToolAttributes => "tool_attributes",
            QueryKind::ToolCategories => "tool_categories",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKind::EntityRelations { entity }
            | QueryKind::EntityNumericAttributes { entity }
            | QueryKind::EntityTextAttributes { entity } => write!(f, "{}(<{}>)", self.name(), entity),
            _ => f.write_str(self.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub kind: QueryKind,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct QueryCatalog {
    namespace: String,
}

impl QueryCatalog {
    pub fn new(vocabulary: &Vocabulary) -> Self {
        Self {
            namespace: vocabulary.namespace.clone(),
        }
    }

    fn prefixes(&self) -> String {
        format!(
            "PREFIX rdf: <{RDF_NS}>\nPREFIX rdfs: <{RDFS_NS}>\nPREFIX owl: <{OWL_NS}>\nPREFIX askomics: <{}>\n",
            self.namespace
        )
    }

    fn query(&self, kind: QueryKind, body: String) -> Query {
        Query {
            kind,
            text: format!("{}{}", self.prefixes(), body),
        }
    }

    /// The static queries of a strategy, in ingestion order.
    ///
    /// Per-entity free discovery starts with the entity query only; the
    /// orchestrator asks for [`QueryCatalog::per_entity`] once entities are known.
    pub fn plan(&self, strategy: &Strategy) -> Vec<Query> {
        match strategy {
            Strategy::Free { bulk: false, .. } => vec![self.entities()],
            Strategy::Free {
                bulk: true,
                superclasses,
            } => vec![
                self.entities_and_relations(*superclasses),
                self.numeric_attributes(),
                self.text_attributes(),
            ],
            Strategy::Ontology { ontology } => vec![
                self.ontology_entities(ontology),
                self.ontology_relations(ontology),
                self.ontology_attributes(ontology),
            ],
            Strategy::ToolConvention => vec![
                self.tool_entities(),
                self.tool_relations(),
                self.tool_attributes(),
                self.tool_categories(),
            ],
        }
    }

    pub fn per_entity(&self, entity: &str) -> Vec<Query> {
        vec![
            self.entity_relations(entity),
            self.entity_numeric_attributes(entity),
            self.entity_text_attributes(entity),
        ]
    }

    // ------------------------------------------------------------------------
    // Free discovery
    // ------------------------------------------------------------------------

    pub fn entities(&self) -> Query {
        self.query(
            QueryKind::Entities,
            r#"SELECT DISTINCT ?entity
WHERE {
    ?instance a ?entity .
    FILTER (isIRI(?entity))
}
"#
            .to_string(),
        )
    }

    pub fn entity_relations(&self, entity: &str) -> Query {
        self.query(
            QueryKind::EntityRelations {
                entity: entity.to_string(),
            },
            format!(
                r#"SELECT DISTINCT ?relation ?target_entity
WHERE {{
    ?instance_of_source a <{entity}> .
    ?instance_of_target a ?target_entity .
    ?instance_of_source ?relation ?instance_of_target .
    FILTER (isIRI(?target_entity))
}}
"#
            ),
        )
    }

    pub fn entity_numeric_attributes(&self, entity: &str) -> Query {
        self.query(
            QueryKind::EntityNumericAttributes {
                entity: entity.to_string(),
            },
            format!(
                r#"SELECT DISTINCT ?attribute
WHERE {{
    ?instance a <{entity}> .
    ?instance ?attribute ?value .
    FILTER (isNumeric(?value))
}}
"#
            ),
        )
    }

    pub fn entity_text_attributes(&self, entity: &str) -> Query {
        self.query(
            QueryKind::EntityTextAttributes {
                entity: entity.to_string(),
            },
            format!(
                r#"SELECT DISTINCT ?attribute
WHERE {{
    ?instance a <{entity}> .
    ?instance ?attribute ?value .
    FILTER (isLiteral(?value))
    FILTER (!isNumeric(?value))
}}
"#
            ),
        )
    }

    /// Every (source type, relation, target type) triple at once.
    pub fn entities_and_relations(&self, superclasses: bool) -> Query {
        let (columns, parents) = if superclasses {
            (
                " ?source_parent ?target_parent",
                r#"    OPTIONAL {
        ?source_entity rdfs:subClassOf ?source_parent .
        FILTER (isIRI(?source_parent))
    }
    OPTIONAL {
        ?target_entity rdfs:subClassOf ?target_parent .
        FILTER (isIRI(?target_parent))
    }
"#,
            )
        } else {
            ("", "")
        };
        self.query(
            QueryKind::EntitiesAndRelations { superclasses },
            format!(
                r#"SELECT DISTINCT ?source_entity ?relation ?target_entity{columns}
WHERE {{
    ?instance_of_source a ?source_entity .
    ?instance_of_target a ?target_entity .
    ?instance_of_source ?relation ?instance_of_target .
    FILTER (isIRI(?source_entity) && isIRI(?target_entity))
{parents}}}
"#
            ),
        )
    }

    pub fn numeric_attributes(&self) -> Query {
        self.query(
            QueryKind::NumericAttributes,
            r#"SELECT DISTINCT ?entity ?attribute
WHERE {
    ?instance_of_entity a ?entity .
    ?instance_of_entity ?attribute ?value .
    FILTER (isIRI(?entity))
    FILTER (isNumeric(?value))
}
"#
            .to_string(),
        )
    }

    pub fn text_attributes(&self) -> Query {
        self.query(
            QueryKind::TextAttributes,
            r#"SELECT DISTINCT ?entity ?attribute
WHERE {
    ?instance_of_entity a ?entity .
    ?instance_of_entity ?attribute ?value .
    FILTER (isIRI(?entity))
    FILTER (isLiteral(?value))
    FILTER (!isNumeric(?value))
}
"#
            .to_string(),
        )
    }

    // ------------------------------------------------------------------------
    // Declared-ontology discovery
    // ------------------------------------------------------------------------

    pub fn ontology_entities(&self, ontology: &str) -> Query {
        self.query(
            QueryKind::OntologyEntities,
            format!(
                r#"SELECT DISTINCT ?entity ?label ?parent
WHERE {{
    ?entity a owl:Class .
    ?entity rdfs:isDefinedBy <{ontology}> .
    FILTER (isIRI(?entity))
    OPTIONAL {{ ?entity rdfs:label ?label . }}
    OPTIONAL {{
        ?entity rdfs:subClassOf ?parent .
        FILTER (isIRI(?parent))
    }}
}}
"#
            ),
        )
    }

    /// Object properties; domain and range may each be a class or an `owl:unionOf` list.
    pub fn ontology_relations(&self, ontology: &str) -> Query {
        self.query(
            QueryKind::OntologyRelations,
            format!(
                r#"SELECT DISTINCT ?source_entity ?relation ?target_entity ?label
WHERE {{
    ?relation a owl:ObjectProperty .
    ?relation rdfs:isDefinedBy <{ontology}> .
    {{
        ?relation rdfs:domain ?source_entity .
        FILTER (isIRI(?source_entity))
    }}
    UNION
    {{
        ?relation rdfs:domain ?source_union .
        ?source_union owl:unionOf ?source_members .
        ?source_members rdf:rest*/rdf:first ?source_entity .
    }}
    {{
        ?relation rdfs:range ?target_entity .
        FILTER (isIRI(?target_entity))
    }}
    UNION
    {{
        ?relation rdfs:range ?target_union .
        ?target_union owl:unionOf ?target_members .
        ?target_members rdf:rest*/rdf:first ?target_entity .
    }}
    OPTIONAL {{ ?relation rdfs:label ?label . }}
}}
"#
            ),
        )
    }

    pub fn ontology_attributes(&self, ontology: &str) -> Query {
        self.query(
            QueryKind::OntologyAttributes,
            format!(
                r#"SELECT DISTINCT ?entity ?attribute ?range ?label
WHERE {{
    ?attribute a owl:DatatypeProperty .
    ?attribute rdfs:isDefinedBy <{ontology}> .
    ?attribute rdfs:range ?range .
    {{
        ?attribute rdfs:domain ?entity .
        FILTER (isIRI(?entity))
    }}
    UNION
    {{
        ?attribute rdfs:domain ?domain_union .
        ?domain_union owl:unionOf ?domain_members .
        ?domain_members rdf:rest*/rdf:first ?entity .
    }}
    OPTIONAL {{ ?attribute rdfs:label ?label . }}
}}
"#
            ),
        )
    }

    // ------------------------------------------------------------------------
    // Tool-convention discovery
    // ------------------------------------------------------------------------

    pub fn tool_entities(&self) -> Query {
        let entity = marker::ENTITY;
        let start_point = marker::START_POINT;
        let no_labels = marker::INSTANCES_HAVE_NO_LABELS;
        self.query(
            QueryKind::ToolEntities,
            format!(
                r#"SELECT DISTINCT ?entity ?label ?start_point ?instances_have_no_labels ?parent
WHERE {{
    ?entity a askomics:{entity} .
    OPTIONAL {{ ?entity rdfs:label ?label . }}
    BIND (EXISTS {{ ?entity a askomics:{start_point} }} AS ?start_point)
    OPTIONAL {{ ?entity askomics:{no_labels} ?instances_have_no_labels . }}
    OPTIONAL {{
        ?entity rdfs:subClassOf ?parent .
        FILTER (isIRI(?parent))
    }}
}}
"#
            ),
        )
    }

    pub fn tool_relations(&self) -> Query {
        let relation = marker::RELATION;
        self.query(
            QueryKind::ToolRelations,
            format!(
                r#"SELECT DISTINCT ?source_entity ?relation ?target_entity ?label
WHERE {{
    ?relation a askomics:{relation} .
    ?relation rdfs:domain ?source_entity .
    ?relation rdfs:range ?target_entity .
    OPTIONAL {{ ?relation rdfs:label ?label . }}
}}
"#
            ),
        )
    }

    pub fn tool_attributes(&self) -> Query {
        let entity = marker::ENTITY;
        let positional = marker::POSITIONAL_PREFIX;
        self.query(
            QueryKind::ToolAttributes,
            format!(
                r#"SELECT DISTINCT ?entity ?attribute ?range ?label ?positional
WHERE {{
    ?attribute a owl:DatatypeProperty .
    ?attribute rdfs:domain ?entity .
    ?entity a askomics:{entity} .
    ?attribute rdfs:range ?range .
    OPTIONAL {{ ?attribute rdfs:label ?label . }}
    OPTIONAL {{
        ?attribute a ?positional .
        FILTER (STRSTARTS(STR(?positional), STR(askomics:{positional})))
    }}
}}
"#
            ),
        )
    }

    pub fn tool_categories(&self) -> Query {
        let category = marker::CATEGORY;
        let value = marker::CATEGORY_VALUE;
        self.query(
            QueryKind::ToolCategories,
            format!(
                r#"SELECT DISTINCT ?entity ?category ?label ?value_type ?value ?value_label ?value_concrete_type
WHERE {{
    ?category a askomics:{category} .
    ?category rdfs:domain ?entity .
    ?category rdfs:label ?label .
    ?category rdfs:range ?value_type .
    ?value_type askomics:{value} ?value .
    ?value rdfs:label ?value_label .
    ?value a ?value_concrete_type .
    FILTER (?value_concrete_type != owl:NamedIndividual)
}}
"#
            ),
        )
    }
}
