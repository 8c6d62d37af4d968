//! Namespaces and the configurable vocabulary of an abstraction run.
//!
//! Two kinds of IRIs live here:
//! - fixed W3C terms used to *write* the schema graph (`rdf:type`, `rdfs:domain`, ...),
//! - the run-level [`Vocabulary`]: the internal namespace that mints marker
//!   identifiers, the excluded-namespace gate and the reserved label predicate.
//!
//! Everything the gate depends on is a field of [`Vocabulary`], so tests can
//! substitute fixtures instead of relying on compiled-in globals.

use serde::{Deserialize, Serialize};

pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const OWL_NS: &str = "http://www.w3.org/2002/07/owl#";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";
pub const PROV_NS: &str = "http://www.w3.org/ns/prov#";
pub const FALDO_NS: &str = "http://biohackathon.org/resource/faldo#";

pub const VIRTRDF_NS: &str = "http://www.openlinksw.com/schemas/virtrdf#";
pub const VIRTRDF_DATA_FORMATS_NS: &str = "http://www.openlinksw.com/virtrdf-data-formats#";
pub const SPARQL_SERVICE_NS: &str = "http://www.w3.org/ns/sparql-service-description#";

pub const DEFAULT_NAMESPACE: &str = "http://askomics.org/internal/";

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
pub const RDFS_DOMAIN: &str = "http://www.w3.org/2000/01/rdf-schema#domain";
pub const RDFS_RANGE: &str = "http://www.w3.org/2000/01/rdf-schema#range";
pub const RDFS_SUBCLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
pub const OWL_CLASS: &str = "http://www.w3.org/2002/07/owl#Class";
pub const OWL_OBJECT_PROPERTY: &str = "http://www.w3.org/2002/07/owl#ObjectProperty";
pub const OWL_DATATYPE_PROPERTY: &str = "http://www.w3.org/2002/07/owl#DatatypeProperty";
pub const OWL_NAMED_INDIVIDUAL: &str = "http://www.w3.org/2002/07/owl#NamedIndividual";
pub const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
pub const XSD_DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
pub const PROV_ENTITY: &str = "http://www.w3.org/ns/prov#Entity";
pub const PROV_AT_LOCATION: &str = "http://www.w3.org/ns/prov#atLocation";
pub const PROV_GENERATED_AT_TIME: &str = "http://www.w3.org/ns/prov#generatedAtTime";
pub const PROV_WAS_ATTRIBUTED_TO: &str = "http://www.w3.org/ns/prov#wasAttributedTo";

/// XSD datatypes whose values count as numeric attributes.
const NUMERIC_XSD_LOCAL_NAMES: &[&str] = &[
    "decimal",
    "integer",
    "int",
    "long",
    "short",
    "byte",
    "float",
    "double",
    "nonNegativeInteger",
    "nonPositiveInteger",
    "positiveInteger",
    "negativeInteger",
    "unsignedLong",
    "unsignedInt",
    "unsignedShort",
    "unsignedByte",
];

/// Is `datatype` one of the XSD numeric datatypes?
pub fn is_numeric_datatype(datatype: &str) -> bool {
    datatype
        .strip_prefix(XSD_NS)
        .is_some_and(|local| NUMERIC_XSD_LOCAL_NAMES.contains(&local))
}

// ============================================================================
// Run vocabulary
// ============================================================================

/// Marker local names minted under [`Vocabulary::namespace`].
pub mod marker {
    pub const ENTITY: &str = "entity";
    pub const START_POINT: &str = "startPoint";
    pub const INSTANCES_HAVE_NO_LABELS: &str = "instancesHaveNoLabels";
    pub const RELATION: &str = "AskomicsRelation";
    pub const CATEGORY: &str = "AskomicsCategory";
    pub const CATEGORY_VALUE: &str = "category";
    /// Prefix shared by the positional attribute markers (`faldoStart`, `faldoEnd`, ...).
    pub const POSITIONAL_PREFIX: &str = "faldo";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Internal namespace; every marker identifier is `namespace + local name`.
    pub namespace: String,
    /// Prefixes whose identifiers never become schema nodes.
    pub excluded: Vec<String>,
    /// Positional/genomic-coordinate vocabulary, excluded when present.
    pub positional: Option<String>,
    /// If non-empty, an identifier must start with one of these to be admitted.
    pub required: Vec<String>,
    /// The reserved label predicate.
    pub label_predicate: String,
    /// Generating-tool identifier recorded in provenance.
    pub tool: String,
    /// Extra `(name, namespace)` prefixes bound in Turtle output.
    #[serde(default)]
    pub bindings: Vec<(String, String)>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

impl Vocabulary {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            excluded: vec![
                RDF_NS.to_string(),
                RDFS_NS.to_string(),
                OWL_NS.to_string(),
                XSD_NS.to_string(),
                VIRTRDF_NS.to_string(),
                VIRTRDF_DATA_FORMATS_NS.to_string(),
                SPARQL_SERVICE_NS.to_string(),
                namespace.to_string(),
            ],
            positional: Some(FALDO_NS.to_string()),
            required: Vec::new(),
            label_predicate: RDFS_LABEL.to_string(),
            tool: format!("abstractor {}", env!("CARGO_PKG_VERSION")),
            bindings: Vec::new(),
        }
    }

    pub fn with_excluded(mut self, prefix: &str) -> Self {
        if !self.excluded.iter().any(|p| p == prefix) {
            self.excluded.push(prefix.to_string());
        }
        self
    }

    pub fn with_required(mut self, prefix: &str) -> Self {
        self.required.push(prefix.to_string());
        self
    }

    pub fn with_positional(mut self, positional: Option<&str>) -> Self {
        self.positional = positional.map(str::to_string);
        self
    }

    pub fn with_label_predicate(mut self, predicate: &str) -> Self {
        self.label_predicate = predicate.to_string();
        self
    }

    pub fn with_tool(mut self, tool: &str) -> Self {
        self.tool = tool.to_string();
        self
    }

    /// Bind `name:` to `namespace` in Turtle output; a later binding of the same name replaces it.
    pub fn with_binding(mut self, name: &str, namespace: &str) -> Self {
        self.bindings.retain(|(bound, _)| bound != name);
        self.bindings.push((name.to_string(), namespace.to_string()));
        self
    }

    /// Identifier of a marker under the internal namespace.
    pub fn term(&self, local: &str) -> String {
        format!("{}{}", self.namespace, local)
    }

    pub fn is_label_predicate(&self, id: &str) -> bool {
        id == self.label_predicate
    }

    /// True when `id` falls under an excluded (or positional) namespace.
    pub fn is_excluded(&self, id: &str) -> bool {
        self.excluded
            .iter()
            .chain(self.positional.iter())
            .any(|prefix| id.starts_with(prefix.as_str()))
    }

    /// The single validity gate shared by the classifier and the builder.
    ///
    /// Only absolute IRIs pass; blank-node labels and relative references never
    /// become schema nodes.
    pub fn admits(&self, id: &str) -> bool {
        if id.is_empty() || self.is_excluded(id) || url::Url::parse(id).is_err() {
            return false;
        }
        self.required.is_empty()
            || self
                .required
                .iter()
                .any(|prefix| id.starts_with(prefix.as_str()))
    }

    /// Is `id` one of the tool's positional attribute markers?
    pub fn is_positional_marker(&self, id: &str) -> bool {
        id.strip_prefix(self.namespace.as_str())
            .is_some_and(|local| local.starts_with(marker::POSITIONAL_PREFIX))
    }
}
