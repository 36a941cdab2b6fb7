//! Relation fetchers: the I/O boundary to the relationship API.

mod http;
mod memory;

pub use http::HttpRelationFetcher;
pub use memory::StaticRelationFetcher;

use async_trait::async_trait;

use crate::error::Result;
use crate::graph::RelationSet;

/// Source of typed relations for a business object.
#[async_trait]
pub trait RelationFetcher: Send + Sync {
    /// Fetch every relation of `(object_id, object_type)`.
    async fn fetch_relations(&self, object_id: &str, object_type: &str) -> Result<RelationSet>;
}
