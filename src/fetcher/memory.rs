use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::RelationFetcher;
use crate::error::{DocflowError, Result};
use crate::graph::{demo, Relation, RelationSet};

/// In-memory relation source keyed by object id
///
/// Unknown ids answer with an empty set. Ids registered with
/// [`StaticRelationFetcher::failing_for`] answer with a fetch error.
/// Every call is counted per object id.
#[derive(Default)]
pub struct StaticRelationFetcher {
    relations: HashMap<String, Vec<Relation>>,
    failing: HashSet<String>,
    calls: Mutex<HashMap<String, usize>>,
}

impl StaticRelationFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offline answers for the demo graph
    pub fn demo() -> Self {
        demo::demo_relations()
            .into_iter()
            .fold(Self::new(), |fetcher, (id, relations)| fetcher.with_relations(id, relations))
    }

    pub fn with_relations(mut self, object_id: &str, relations: Vec<Relation>) -> Self {
        self.relations.insert(object_id.to_string(), relations);
        self
    }

    pub fn failing_for(mut self, object_id: &str) -> Self {
        self.failing.insert(object_id.to_string());
        self
    }

    /// Number of fetches issued for `object_id`
    pub fn calls_for(&self, object_id: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(object_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl RelationFetcher for StaticRelationFetcher {
    async fn fetch_relations(&self, object_id: &str, _object_type: &str) -> Result<RelationSet> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(object_id.to_string())
            .or_insert(0) += 1;

        if self.failing.contains(object_id) {
            return Err(DocflowError::Fetch(format!(
                "Relationship API error 503 Service Unavailable: {}",
                object_id
            )));
        }

        Ok(self
            .relations
            .get(object_id)
            .cloned()
            .map(RelationSet::from)
            .unwrap_or_default())
    }
}
