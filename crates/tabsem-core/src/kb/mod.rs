//! Knowledge-base accessor
//!
//! Read-only view of the entity store: adjacency, labels, hierarchical
//! types, popularity and unit symbols. `KnowledgeBase` is the abstract
//! capability set; `WikidataKb` implements it over the SQLite key-value
//! store. Missing and corrupt records degrade to empty data, only store I/O
//! errors surface.

mod record;
mod store;
mod wikidata;

pub use record::{is_rank_tag, Adjacency, EntityRecord, PredicateObjects, INVERSE_PREFIX};
pub use store::{KbError, KbStore, KbStoreWriter, Result};
pub use wikidata::WikidataKb;

use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// ACCESSOR TYPES
// ============================================================================

/// Primary label and aliases of an entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityLabels {
    pub label: Option<String>,
    pub aliases: Vec<String>,
}

/// Types of an entity across three taxonomy levels. Level 1 holds the
/// direct types (with their statement rank tag); each higher level is the
/// subclass-of closure of the previous one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HierarchicalTypes {
    pub level_1: BTreeMap<String, String>,
    pub level_2: BTreeMap<String, String>,
    pub level_3: BTreeMap<String, String>,
}

impl HierarchicalTypes {
    pub fn is_empty(&self) -> bool {
        self.level_1.is_empty() && self.level_2.is_empty() && self.level_3.is_empty()
    }
}

// ============================================================================
// CAPABILITY SET
// ============================================================================

/// Read-only KB capabilities the engine relies on.
///
/// The store is process-shared; implementations must allow concurrent
/// readers (`Send + Sync`) without external locking.
pub trait KnowledgeBase: Send + Sync {
    /// Shape check for identifiers of this KB.
    fn is_valid_id(&self, s: &str) -> bool;

    /// Full stored record (labels, aliases, adjacency). Missing ids return
    /// the empty record.
    fn record(&self, entity_id: &str) -> Result<EntityRecord>;

    /// Adjacency only, stripped of labels/aliases/descriptions.
    fn adjacency(&self, entity_id: &str) -> Result<Adjacency> {
        Ok(self.record(entity_id)?.edges)
    }

    /// Primary label and aliases.
    fn labels(&self, entity_id: &str) -> Result<EntityLabels> {
        let record = self.record(entity_id)?;
        Ok(EntityLabels {
            label: record.labels.first().cloned(),
            aliases: record.aliases,
        })
    }

    /// Edge count used as the node-popularity signal.
    fn num_incoming_edges(&self, entity_id: &str) -> Result<u64> {
        Ok(self.record(entity_id)?.num_edges())
    }

    /// Hierarchical types up to `levels` (1..=3).
    fn types_of(&self, entity_id: &str, levels: u8) -> Result<HierarchicalTypes>;

    /// Direct subclass-of targets of a type.
    fn supertypes_of(&self, type_id: &str) -> Result<BTreeSet<String>>;

    /// Unit symbol of a unit entity ("m" for metre), with currency entities
    /// mapped to a canonical lowercase name ("euro").
    fn unit_symbol(&self, unit_entity_id: &str) -> Result<Option<String>>;

    /// Predicates known to be transitive; paths collapsing over them keep
    /// full semantic proximity.
    fn transitive_predicates(&self) -> &BTreeSet<String>;

    /// Predicate carrying instance-of statements.
    fn instance_of_predicate(&self) -> &str;

    /// One-hop entity neighborhood of a candidate type, used for
    /// adjacency-based level promotion. Backward instance-of edges are
    /// skipped; they would enumerate every instance of the type.
    fn type_adjacency(&self, type_id: &str) -> Result<BTreeSet<String>> {
        let adjacency = self.adjacency(type_id)?;
        let skip = format!("{INVERSE_PREFIX}{}", self.instance_of_predicate());
        let mut neighbors = BTreeSet::new();
        for (key, objects) in &adjacency {
            if *key == skip {
                continue;
            }
            match objects {
                PredicateObjects::Backward(subjects) => {
                    neighbors.extend(subjects.iter().cloned());
                }
                PredicateObjects::Forward(map) => {
                    for (object, tag) in map {
                        if is_rank_tag(tag) {
                            neighbors.insert(object.clone());
                        }
                    }
                }
            }
        }
        Ok(neighbors)
    }

    /// Numeric weight of a statement rank tag.
    fn rank_weight(&self, rank: &str) -> u8 {
        match rank {
            "PREFERRED" => 2,
            "NORMAL" => 1,
            _ => 0,
        }
    }

    /// Namespace-prefixed URI for any identifier (entity or property).
    fn uri(&self, id: &str) -> String;
}
