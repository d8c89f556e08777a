pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::geo::GeoPoint;
use crate::query::{Filter, Projection, SortKey};

/// A hospital as served to clients: a free-form JSON object with a string `_id`.
pub type Hospital = Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("mongodb: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("bson: {0}")]
    Bson(#[from] mongodb::bson::ser::Error),
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub projection: Option<Projection>,
    pub sort: Vec<SortKey>,
    pub skip: u64,
    pub limit: u64,
}

/// Read-only access to the hospitals collection.
#[async_trait]
pub trait HospitalStore: Send + Sync {
    /// Hospitals whose `location` lies within `max_distance_m` of `point`,
    /// nearest first, at most `limit` of them.
    async fn find_near(
        &self,
        point: GeoPoint,
        max_distance_m: f64,
        limit: u64,
    ) -> Result<Vec<Hospital>, StoreError>;

    /// Case-insensitive literal substring match on `name`.
    async fn search_name(&self, needle: &str) -> Result<Vec<Hospital>, StoreError>;

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError>;

    async fn find(&self, filter: &Filter, opts: &FindOptions) -> Result<Vec<Hospital>, StoreError>;
}
