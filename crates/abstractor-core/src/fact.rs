//! Schema facts: the classifier's output and the builder's input.

use serde::{Deserialize, Serialize};

use crate::vocab::{self, XSD_DECIMAL, XSD_STRING};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeKind {
    Numeric,
    Text,
}

impl AttributeKind {
    /// Classify a declared range: XSD numeric datatypes are numeric, anything else is text.
    pub fn from_range(range: &str) -> Self {
        if vocab::is_numeric_datatype(range) {
            AttributeKind::Numeric
        } else {
            AttributeKind::Text
        }
    }

    /// The datatype written as the attribute's range.
    pub fn datatype(self) -> &'static str {
        match self {
            AttributeKind::Numeric => XSD_DECIMAL,
            AttributeKind::Text => XSD_STRING,
        }
    }
}

/// Per-entity flags; first-seen values win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityFlags {
    pub start_point: bool,
    pub instances_have_no_labels: bool,
}

impl Default for EntityFlags {
    fn default() -> Self {
        Self {
            start_point: true,
            instances_have_no_labels: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaFact {
    Entity {
        id: String,
        label: Option<String>,
        flags: EntityFlags,
    },
    Relation {
        source_id: String,
        target_id: String,
        relation_id: String,
        label: Option<String>,
    },
    Attribute {
        entity_id: String,
        attribute_id: String,
        kind: AttributeKind,
        label: Option<String>,
        range_id: Option<String>,
        /// Positional marker class, when the source tool annotated one.
        positional: Option<String>,
    },
    /// The entity's instances carry labels: retract its "no instance labels" marker.
    InstanceLabels { entity_id: String },
    Subclass { child_id: String, parent_id: String },
    Category {
        entity_id: String,
        category_id: String,
        label: String,
        value_type_id: String,
        value_id: String,
        value_label: String,
        value_concrete_type_id: String,
    },
    Provenance { source_location: String },
}

impl SchemaFact {
    pub fn entity(id: &str) -> Self {
        SchemaFact::Entity {
            id: id.to_string(),
            label: None,
            flags: EntityFlags::default(),
        }
    }

    pub fn relation(source_id: &str, relation_id: &str, target_id: &str) -> Self {
        SchemaFact::Relation {
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            relation_id: relation_id.to_string(),
            label: None,
        }
    }

    pub fn attribute(entity_id: &str, attribute_id: &str, kind: AttributeKind) -> Self {
        SchemaFact::Attribute {
            entity_id: entity_id.to_string(),
            attribute_id: attribute_id.to_string(),
            kind,
            label: None,
            range_id: None,
            positional: None,
        }
    }

    pub fn subclass(child_id: &str, parent_id: &str) -> Self {
        SchemaFact::Subclass {
            child_id: child_id.to_string(),
            parent_id: parent_id.to_string(),
        }
    }

    /// Ingestion phase: facts that depend on entities sort after them.
    pub(crate) fn phase(&self) -> u8 {
        match self {
            SchemaFact::Entity { .. } => 0,
            SchemaFact::Relation { .. } => 1,
            SchemaFact::Attribute { .. } => 2,
            SchemaFact::Category { .. } => 3,
            SchemaFact::InstanceLabels { .. } => 4,
            SchemaFact::Subclass { .. } => 5,
            SchemaFact::Provenance { .. } => 6,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            SchemaFact::Entity { .. } => "entity",
            SchemaFact::Relation { .. } => "relation",
            SchemaFact::Attribute { .. } => "attribute",
            SchemaFact::InstanceLabels { .. } => "instance_labels",
            SchemaFact::Subclass { .. } => "subclass",
            SchemaFact::Category { .. } => "category",
            SchemaFact::Provenance { .. } => "provenance",
        }
    }
}
