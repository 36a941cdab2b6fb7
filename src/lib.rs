pub mod config;
pub mod error;
pub mod registry;
pub mod graph;
pub mod fetcher;
pub mod engine;
pub mod navigation;
pub mod session;
pub mod server;

pub use config::Config;
pub use engine::{ExpansionEngine, ExpansionStatus, GraphSnapshot};
pub use error::{DocflowError, Result};
pub use fetcher::{HttpRelationFetcher, RelationFetcher, StaticRelationFetcher};
pub use graph::{transform, Graph, Link, Node, Relation, RelationSet, Role};
pub use session::{Session, SourceRef};
