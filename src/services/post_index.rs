/// Elasticsearch-backed post collection
///
/// Schema setup is idempotent and runs at process start. Inserts use
/// `refresh=wait_for` so a written document is visible to the next read
/// before the call returns.
use elasticsearch::{
    http::transport::{BuildError, SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    params::Refresh,
    Elasticsearch, IndexParts, SearchParts,
};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::config::ElasticsearchConfig;
use crate::models::Post;

/// Radius applied when a search request carries none.
pub const DEFAULT_RADIUS_KM: f64 = 200.0;

/// Minimum score for the clustering endpoint.
pub const CLUSTER_THRESHOLD: f64 = 0.9;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("invalid Elasticsearch URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("failed to build transport: {0}")]
    TransportBuild(#[from] BuildError),
    #[error("transport error: {0}")]
    Transport(#[from] elasticsearch::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("index request rejected with status {0}")]
    Rejected(u16),
}

/// Numeric fields the clustering endpoint may query. The field name never
/// comes from the raw query string; unknown names are rejected upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterField {
    Face,
}

impl ClusterField {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "face" => Some(ClusterField::Face),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterField::Face => "face",
        }
    }
}

#[derive(Clone)]
pub struct PostIndex {
    client: Elasticsearch,
    index: String,
}

impl PostIndex {
    pub async fn new(config: &ElasticsearchConfig) -> Result<Self, IndexError> {
        let parsed = Url::parse(&config.url)?;
        let pool = SingleNodeConnectionPool::new(parsed);
        let transport = TransportBuilder::new(pool).build()?;
        let client = Elasticsearch::new(transport);

        let instance = Self {
            client,
            index: config.post_index.clone(),
        };

        instance.ensure_schema().await?;

        Ok(instance)
    }

    /// Create the post index with its geo-point mapping if it does not
    /// exist yet. Safe to call on every startup.
    async fn ensure_schema(&self) -> Result<(), IndexError> {
        let exists_response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[self.index.as_str()]))
            .send()
            .await?;

        if exists_response.status_code().is_success() {
            return Ok(());
        }

        let body = json!({
            "mappings": {
                "properties": {
                    "user": { "type": "keyword" },
                    "message": { "type": "text" },
                    "location": { "type": "geo_point" },
                    "url": { "type": "keyword" },
                    "type": { "type": "keyword" },
                    "face": { "type": "float" }
                }
            }
        });

        self.client
            .indices()
            .create(IndicesCreateParts::Index(&self.index))
            .body(body)
            .send()
            .await?;

        Ok(())
    }

    /// Write the document keyed by `id`, waiting for the index refresh so
    /// the post is visible to subsequent reads.
    pub async fn insert(&self, post: &Post, id: Uuid) -> Result<(), IndexError> {
        let response = self
            .client
            .index(IndexParts::IndexId(&self.index, id.to_string().as_str()))
            .refresh(Refresh::WaitFor)
            .body(post)
            .send()
            .await?;

        let status = response.status_code();
        if !status.is_success() {
            return Err(IndexError::Rejected(status.as_u16()));
        }

        tracing::info!(post_id = %id, "post saved to index");
        Ok(())
    }

    /// All posts within `radius_km` of the given point, in index relevance
    /// order. Radius magnitude and sign are not validated.
    pub async fn search_radius(
        &self,
        lat: f64,
        lon: f64,
        radius_km: Option<f64>,
    ) -> Result<Vec<Post>, IndexError> {
        let radius = radius_km.unwrap_or(DEFAULT_RADIUS_KM);
        self.search(geo_distance_query(lat, lon, radius)).await
    }

    /// All posts whose numeric `field` is at or above `min`.
    pub async fn search_range(&self, field: ClusterField, min: f64) -> Result<Vec<Post>, IndexError> {
        self.search(range_query(field, min)).await
    }

    async fn search(&self, body: Value) -> Result<Vec<Post>, IndexError> {
        let response = self
            .client
            .search(SearchParts::Index(&[self.index.as_str()]))
            .body(body)
            .send()
            .await?;

        let status = response.status_code();
        if !status.is_success() {
            return Err(IndexError::Rejected(status.as_u16()));
        }

        let search_response: SearchResponse = response.json().await?;
        let posts = search_response
            .hits
            .hits
            .into_iter()
            .filter_map(|hit| hit.source)
            .collect();
        Ok(posts)
    }
}

fn geo_distance_query(lat: f64, lon: f64, radius_km: f64) -> Value {
    json!({
        "query": {
            "bool": {
                "filter": {
                    "geo_distance": {
                        "distance": format!("{}km", radius_km),
                        "location": { "lat": lat, "lon": lon }
                    }
                }
            }
        }
    })
}

fn range_query(field: ClusterField, min: f64) -> Value {
    json!({
        "query": {
            "range": {
                field.as_str(): { "gte": min }
            }
        }
    })
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: InnerHits,
}

#[derive(Debug, Deserialize)]
struct InnerHits {
    hits: Vec<PostHit>,
}

#[derive(Debug, Deserialize)]
struct PostHit {
    #[serde(rename = "_source")]
    source: Option<Post>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_query_uses_default_radius() {
        let body = geo_distance_query(37.0, -122.0, DEFAULT_RADIUS_KM);
        let geo = &body["query"]["bool"]["filter"]["geo_distance"];
        assert_eq!(geo["distance"], "200km");
        assert_eq!(geo["location"]["lat"], 37.0);
        assert_eq!(geo["location"]["lon"], -122.0);
    }

    #[test]
    fn test_geo_query_caller_radius() {
        let body = geo_distance_query(0.0, 0.0, 5.0);
        assert_eq!(body["query"]["bool"]["filter"]["geo_distance"]["distance"], "5km");
    }

    #[test]
    fn test_range_query_threshold() {
        let body = range_query(ClusterField::Face, CLUSTER_THRESHOLD);
        assert_eq!(body["query"]["range"]["face"]["gte"], 0.9);
    }

    #[test]
    fn test_cluster_field_allow_list() {
        assert_eq!(ClusterField::parse("face"), Some(ClusterField::Face));
        assert_eq!(ClusterField::parse("password_hash"), None);
        assert_eq!(ClusterField::parse("user"), None);
        assert_eq!(ClusterField::parse(""), None);
    }

    #[test]
    fn test_hit_decode() {
        let raw = serde_json::json!({
            "hits": { "hits": [
                { "_source": {
                    "user": "alice", "message": "hello",
                    "location": {"lat": 37.0, "lon": -122.0},
                    "url": "https://example.com/o", "type": "image", "face": 0.95
                } },
                { "_source": null }
            ] }
        });
        let decoded: SearchResponse = serde_json::from_value(raw).unwrap();
        let posts: Vec<Post> = decoded.hits.hits.into_iter().filter_map(|h| h.source).collect();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].user, "alice");
        assert_eq!(posts[0].face, 0.95);
    }
}
