//! Wikidata accessor
//!
//! Implements the KB capability set over the key-value store with the
//! Wikidata vocabulary: P31/P279 taxonomy, the type-bearing predicate list,
//! the transitive-predicate list, P5061 unit symbols with the Q8142
//! currency special case, and Q/P namespace prefixing.

use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Mutex;

use lru::LruCache;

use super::record::EntityRecord;
use super::store::{KbError, KbStore, Result};
use super::{HierarchicalTypes, KnowledgeBase};

/// Predicates whose objects count as direct types of an entity:
/// instance-of, occupation, position-held, taxon-rank.
pub const TYPE_PROPERTIES: &[&str] = &["P31", "P106", "P39", "P105"];

/// instance-of
pub const INSTANCE_OF: &str = "P31";
/// subclass-of
pub const SUBCLASS_OF: &str = "P279";
/// unit symbol
pub const UNIT_SYMBOL: &str = "P5061";
/// the "currency" type
pub const CURRENCY_TYPE: &str = "Q8142";

/// Transitive properties (Wikidata:List_of_properties/transitive_relation).
const TRANSITIVE_PROPERTIES: &[&str] = &[
    "P131", "P276", "P279", "P361", "P403", "P460", "P527", "P706", "P927", "P1647", "P2094",
    "P3373", "P3403", "P5607", "P5973", "P171",
];

const ENTITY_NAMESPACE: &str = "http://www.wikidata.org/entity/";
const PROPERTY_NAMESPACE: &str = "http://www.wikidata.org/prop/direct/";

const UNIT_SYMBOL_CACHE_SIZE: usize = 256;

// ============================================================================
// ACCESSOR
// ============================================================================

/// Wikidata view over a [`KbStore`].
pub struct WikidataKb {
    store: KbStore,
    type_properties: Vec<String>,
    transitive: BTreeSet<String>,
    entity_namespace: String,
    property_namespace: String,
    /// Symbol-of-unit lookups repeat heavily across a table's quantity cells.
    unit_symbol_cache: Mutex<LruCache<String, Option<String>>>,
}

impl WikidataKb {
    /// Open the store at `path` (or the platform default) with the standard
    /// Wikidata vocabulary.
    pub fn open(path: Option<PathBuf>) -> Result<Self> {
        Ok(Self::new(KbStore::open(path)?))
    }

    pub fn new(store: KbStore) -> Self {
        Self {
            store,
            type_properties: TYPE_PROPERTIES.iter().map(|s| s.to_string()).collect(),
            transitive: TRANSITIVE_PROPERTIES.iter().map(|s| s.to_string()).collect(),
            entity_namespace: ENTITY_NAMESPACE.to_string(),
            property_namespace: PROPERTY_NAMESPACE.to_string(),
            unit_symbol_cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(UNIT_SYMBOL_CACHE_SIZE).expect("cache size is non-zero"),
            )),
        }
    }

    /// Override the namespace prefixes (mirrored KBs, test fixtures).
    pub fn with_namespaces(mut self, entity: impl Into<String>, property: impl Into<String>) -> Self {
        self.entity_namespace = entity.into();
        self.property_namespace = property.into();
        self
    }

    /// Canonical currency name: the English label, lowercased, spaces
    /// replaced by underscores ("Pound sterling" → "pound_sterling").
    fn currency_name(record: &EntityRecord) -> Option<String> {
        record
            .labels
            .first()
            .map(|label| label.to_lowercase().split_whitespace().collect::<Vec<_>>().join("_"))
    }
}

impl KnowledgeBase for WikidataKb {
    fn is_valid_id(&self, s: &str) -> bool {
        let mut chars = s.chars();
        matches!(chars.next(), Some('P' | 'Q'))
            && s.len() > 1
            && chars.all(|c| c.is_ascii_digit())
    }

    fn record(&self, entity_id: &str) -> Result<EntityRecord> {
        self.store.get(entity_id)
    }

    fn types_of(&self, entity_id: &str, levels: u8) -> Result<HierarchicalTypes> {
        let mut types = HierarchicalTypes::default();
        if levels == 0 {
            return Ok(types);
        }

        let record = self.store.get(entity_id)?;
        for pid in &self.type_properties {
            if let Some(objects) = record.forward(pid) {
                types.level_1.extend(objects.clone());
            }
        }

        let mut frontier: Vec<String> = types.level_1.keys().cloned().collect();
        for level in 2..=levels.min(3) {
            let mut next = std::collections::BTreeMap::new();
            for type_id in &frontier {
                let record = self.store.get(type_id)?;
                if let Some(supers) = record.forward(SUBCLASS_OF) {
                    next.extend(supers.clone());
                }
            }
            frontier = next.keys().cloned().collect();
            match level {
                2 => types.level_2 = next,
                _ => types.level_3 = next,
            }
        }
        Ok(types)
    }

    fn supertypes_of(&self, type_id: &str) -> Result<BTreeSet<String>> {
        let record = self.store.get(type_id)?;
        Ok(record
            .forward(SUBCLASS_OF)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn unit_symbol(&self, unit_entity_id: &str) -> Result<Option<String>> {
        {
            let mut cache = self
                .unit_symbol_cache
                .lock()
                .map_err(|_| KbError::Init("Unit-symbol cache lock poisoned".to_string()))?;
            if let Some(symbol) = cache.get(unit_entity_id) {
                return Ok(symbol.clone());
            }
        }

        let symbol = match self.store.get_raw(unit_entity_id)? {
            None => None,
            Some(bytes) => {
                let record = EntityRecord::decode(unit_entity_id, &bytes);
                let is_currency = record
                    .forward(INSTANCE_OF)
                    .is_some_and(|types| types.contains_key(CURRENCY_TYPE));
                if is_currency {
                    Self::currency_name(&record)
                } else {
                    record
                        .forward(UNIT_SYMBOL)
                        .and_then(|symbols| symbols.keys().next().cloned())
                }
            }
        };

        let mut cache = self
            .unit_symbol_cache
            .lock()
            .map_err(|_| KbError::Init("Unit-symbol cache lock poisoned".to_string()))?;
        cache.put(unit_entity_id.to_string(), symbol.clone());
        Ok(symbol)
    }

    fn transitive_predicates(&self) -> &BTreeSet<String> {
        &self.transitive
    }

    fn instance_of_predicate(&self) -> &str {
        INSTANCE_OF
    }

    fn uri(&self, id: &str) -> String {
        match id.chars().next() {
            Some('Q') => format!("{}{}", self.entity_namespace, id),
            Some('P') => format!("{}{}", self.property_namespace, id),
            _ => id.to_string(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
