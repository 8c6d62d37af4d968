//! Raw query rows → schema facts.
//!
//! Every classification path goes through the same gate
//! ([`Vocabulary::admits`]), so meta-vocabulary and store-internal triples
//! cannot leak into the schema from any one query family.
//!
//! Entity facts are de-duplicated per call: each [`Classifier::classify`]
//! invocation opens its own scope.

use std::collections::HashSet;

use crate::catalog::QueryKind;
use crate::error::RowShapeError;
use crate::executor::Row;
use crate::fact::{AttributeKind, EntityFlags, SchemaFact};
use crate::vocab::Vocabulary;

/// String-encoded truth values: `"true"` and `"1"` (any case) are true.
pub fn parse_truth(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    pub facts: Vec<SchemaFact>,
    /// Rows dropped because a required column was missing.
    pub skipped: Vec<RowShapeError>,
}

#[derive(Debug, Clone)]
pub struct Classifier<'v> {
    vocabulary: &'v Vocabulary,
}

impl<'v> Classifier<'v> {
    pub fn new(vocabulary: &'v Vocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn classify(&self, rows: &[Row], kind: &QueryKind) -> Classified {
        let mut batch = Batch {
            vocabulary: self.vocabulary,
            kind,
            seen_entities: HashSet::new(),
            seen_subclasses: HashSet::new(),
            out: Classified::default(),
        };

        for (index, row) in rows.iter().enumerate() {
            if let Err(err) = batch.row(index, row) {
                tracing::warn!(
                    query = %kind,
                    row = err.row,
                    field = %err.field,
                    "dropping row with missing field"
                );
                batch.out.skipped.push(err);
            }
        }

        tracing::debug!(
            query = %kind,
            rows = rows.len(),
            facts = batch.out.facts.len(),
            skipped = batch.out.skipped.len(),
            "classified batch"
        );
        batch.out
    }
}

struct Batch<'a> {
    vocabulary: &'a Vocabulary,
    kind: &'a QueryKind,
    seen_entities: HashSet<String>,
    seen_subclasses: HashSet<(String, String)>,
    out: Classified,
}

impl<'a> Batch<'a> {
    fn required<'r>(&self, index: usize, row: &'r Row, field: &str) -> Result<&'r str, RowShapeError> {
        match row.get(field) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(RowShapeError {
                query: self.kind.to_string(),
                row: index,
                field: field.to_string(),
            }),
        }
    }

    fn row(&mut self, index: usize, row: &Row) -> Result<(), RowShapeError> {
        let kind = self.kind;
        match kind {
            QueryKind::Entities => {
                let entity = self.required(index, row, "entity")?;
                self.entity(entity, None, EntityFlags::default());
            }
            QueryKind::EntityRelations { entity } => {
                let relation = self.required(index, row, "relation")?;
                let target = self.required(index, row, "target_entity")?;
                self.relation(entity, relation, target, None);
            }
            QueryKind::EntityNumericAttributes { entity } => {
                let attribute = self.required(index, row, "attribute")?;
                self.attribute(entity, attribute, AttributeKind::Numeric, None, None, None);
            }
            QueryKind::EntityTextAttributes { entity } => {
                let attribute = self.required(index, row, "attribute")?;
                self.attribute(entity, attribute, AttributeKind::Text, None, None, None);
            }
            QueryKind::EntitiesAndRelations { superclasses } => {
                let source = self.required(index, row, "source_entity")?;
                let relation = self.required(index, row, "relation")?;
                let target = self.required(index, row, "target_entity")?;
                self.relation(source, relation, target, None);
                if *superclasses {
                    // Each parent column describes its own entity.
                    if let Some(parent) = optional(row, "source_parent") {
                        self.subclass(source, parent);
                    }
                    if let Some(parent) = optional(row, "target_parent") {
                        self.subclass(target, parent);
                    }
                }
            }
            QueryKind::NumericAttributes | QueryKind::TextAttributes => {
                let entity = self.required(index, row, "entity")?;
                let attribute = self.required(index, row, "attribute")?;
                let attribute_kind = if *kind == QueryKind::NumericAttributes {
                    AttributeKind::Numeric
                } else {
                    AttributeKind::Text
                };
                self.attribute(entity, attribute, attribute_kind, None, None, None);
            }
            QueryKind::OntologyEntities => {
                let entity = self.required(index, row, "entity")?;
                self.entity(entity, optional(row, "label"), EntityFlags::default());
                if let Some(parent) = optional(row, "parent") {
                    self.subclass(entity, parent);
                }
            }
            QueryKind::OntologyRelations | QueryKind::ToolRelations => {
                let source = self.required(index, row, "source_entity")?;
                let relation = self.required(index, row, "relation")?;
                let target = self.required(index, row, "target_entity")?;
                self.relation(source, relation, target, optional(row, "label"));
            }
            QueryKind::OntologyAttributes => {
                let entity = self.required(index, row, "entity")?;
                let attribute = self.required(index, row, "attribute")?;
                let range = self.required(index, row, "range")?;
                self.attribute(
                    entity,
                    attribute,
                    AttributeKind::from_range(range),
                    optional(row, "label"),
                    Some(range),
                    None,
                );
            }
            QueryKind::ToolEntities => {
                let entity = self.required(index, row, "entity")?;
                let flags = EntityFlags {
                    start_point: optional(row, "start_point").is_some_and(parse_truth),
                    instances_have_no_labels: optional(row, "instances_have_no_labels")
                        .is_some_and(parse_truth),
                };
                self.entity(entity, optional(row, "label"), flags);
                if let Some(parent) = optional(row, "parent") {
                    self.subclass(entity, parent);
                }
            }
            QueryKind::ToolAttributes => {
                let entity = self.required(index, row, "entity")?;
                let attribute = self.required(index, row, "attribute")?;
                let range = self.required(index, row, "range")?;
                let positional = optional(row, "positional")
                    .filter(|marker| self.vocabulary.is_positional_marker(marker));
                self.attribute(
                    entity,
                    attribute,
                    AttributeKind::from_range(range),
                    optional(row, "label"),
                    Some(range),
                    positional,
                );
            }
            QueryKind::ToolCategories => {
                let entity = self.required(index, row, "entity")?;
                let category = self.required(index, row, "category")?;
                let label = self.required(index, row, "label")?;
                let value_type = self.required(index, row, "value_type")?;
                let value = self.required(index, row, "value")?;
                let value_label = self.required(index, row, "value_label")?;
                let concrete = self.required(index, row, "value_concrete_type")?;
                let v = self.vocabulary;
                if [entity, category, value_type, value, concrete]
                    .iter()
                    .all(|id| v.admits(id))
                {
                    self.out.facts.push(SchemaFact::Category {
                        entity_id: entity.to_string(),
                        category_id: category.to_string(),
                        label: label.to_string(),
                        value_type_id: value_type.to_string(),
                        value_id: value.to_string(),
                        value_label: value_label.to_string(),
                        value_concrete_type_id: concrete.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn entity(&mut self, id: &str, label: Option<&str>, flags: EntityFlags) {
        if !self.vocabulary.admits(id) || !self.seen_entities.insert(id.to_string()) {
            return;
        }
        self.out.facts.push(SchemaFact::Entity {
            id: id.to_string(),
            label: label.map(str::to_string),
            flags,
        });
    }

    fn relation(&mut self, source: &str, relation: &str, target: &str, label: Option<&str>) {
        self.entity(source, None, EntityFlags::default());
        self.entity(target, None, EntityFlags::default());
        let v = self.vocabulary;
        if v.admits(source) && v.admits(relation) && v.admits(target) {
            self.out.facts.push(SchemaFact::Relation {
                source_id: source.to_string(),
                target_id: target.to_string(),
                relation_id: relation.to_string(),
                label: label.map(str::to_string),
            });
        }
    }

    fn attribute(
        &mut self,
        entity: &str,
        attribute: &str,
        kind: AttributeKind,
        label: Option<&str>,
        range: Option<&str>,
        positional: Option<&str>,
    ) {
        if !self.vocabulary.admits(entity) {
            return;
        }
        // The label predicate lives in an excluded namespace: check it before the gate.
        if self.vocabulary.is_label_predicate(attribute) {
            self.out.facts.push(SchemaFact::InstanceLabels {
                entity_id: entity.to_string(),
            });
            return;
        }
        if !self.vocabulary.admits(attribute) {
            return;
        }
        self.out.facts.push(SchemaFact::Attribute {
            entity_id: entity.to_string(),
            attribute_id: attribute.to_string(),
            kind,
            label: label.map(str::to_string),
            range_id: range.map(str::to_string),
            positional: positional.map(str::to_string),
        });
    }

    fn subclass(&mut self, child: &str, parent: &str) {
        if !self.vocabulary.admits(child) || !self.vocabulary.admits(parent) {
            return;
        }
        if self
            .seen_subclasses
            .insert((child.to_string(), parent.to_string()))
        {
            self.out.facts.push(SchemaFact::subclass(child, parent));
        }
    }
}

fn optional<'r>(row: &'r Row, field: &str) -> Option<&'r str> {
    row.get(field)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}
