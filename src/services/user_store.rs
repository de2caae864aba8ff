/// Elasticsearch-backed user collection
///
/// User documents are keyed by username, so registration is an atomic
/// conditional create: the index refuses the write when the key already
/// exists, and two concurrent registrations cannot both succeed.
use elasticsearch::{
    http::transport::{BuildError, SingleNodeConnectionPool, TransportBuilder},
    http::StatusCode,
    indices::{IndicesCreateParts, IndicesExistsParts},
    params::Refresh,
    CreateParts, Elasticsearch, GetParts,
};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use url::Url;

use crate::config::ElasticsearchConfig;
use crate::models::UserRecord;
use crate::security::password;

#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("username already exists")]
    AlreadyExists,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("invalid Elasticsearch URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("failed to build transport: {0}")]
    TransportBuild(#[from] BuildError),
    #[error("transport error: {0}")]
    Transport(#[from] elasticsearch::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("store request rejected with status {0}")]
    Rejected(u16),
}

#[derive(Clone)]
pub struct UserStore {
    client: Elasticsearch,
    index: String,
}

impl UserStore {
    pub async fn new(config: &ElasticsearchConfig) -> Result<Self, UserStoreError> {
        let parsed = Url::parse(&config.url)?;
        let pool = SingleNodeConnectionPool::new(parsed);
        let transport = TransportBuilder::new(pool).build()?;
        let client = Elasticsearch::new(transport);

        let instance = Self {
            client,
            index: config.user_index.clone(),
        };

        instance.ensure_schema().await?;

        Ok(instance)
    }

    async fn ensure_schema(&self) -> Result<(), UserStoreError> {
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
                    "username": { "type": "keyword" },
                    "password_hash": { "type": "keyword" },
                    "age": { "type": "long" },
                    "gender": { "type": "keyword" }
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

    /// Insert the user document keyed by username. Fails with
    /// `AlreadyExists` when the key is taken; the existence check and the
    /// write are a single store operation.
    pub async fn register(&self, user: &UserRecord) -> Result<(), UserStoreError> {
        let response = self
            .client
            .create(CreateParts::IndexId(&self.index, &user.username))
            .refresh(Refresh::WaitFor)
            .body(user)
            .send()
            .await?;

        let status = response.status_code();
        if status == StatusCode::CONFLICT {
            return Err(UserStoreError::AlreadyExists);
        }
        if !status.is_success() {
            return Err(UserStoreError::Rejected(status.as_u16()));
        }

        tracing::info!(username = %user.username, "registered user");
        Ok(())
    }

    /// Check the supplied password against the stored hash. An unknown
    /// username and a wrong password are indistinguishable to the caller.
    pub async fn verify(&self, username: &str, password: &str) -> Result<(), UserStoreError> {
        let response = self
            .client
            .get(GetParts::IndexId(&self.index, username))
            .send()
            .await?;

        let status = response.status_code();
        if status == StatusCode::NOT_FOUND {
            return Err(UserStoreError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(UserStoreError::Rejected(status.as_u16()));
        }

        let document: GetResponse = response.json().await?;
        if !document.found {
            return Err(UserStoreError::InvalidCredentials);
        }
        let record = document.source.ok_or(UserStoreError::InvalidCredentials)?;

        password::verify_password(password, &record.password_hash)
            .map_err(|_| UserStoreError::InvalidCredentials)?;

        tracing::info!(%username, "login verified");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    found: bool,
    #[serde(rename = "_source")]
    source: Option<UserRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_response_decode() {
        let raw = serde_json::json!({
            "_index": "user",
            "_id": "alice",
            "found": true,
            "_source": {
                "username": "alice",
                "password_hash": "$argon2id$stub",
                "age": 30,
                "gender": "f"
            }
        });
        let decoded: GetResponse = serde_json::from_value(raw).unwrap();
        assert!(decoded.found);
        assert_eq!(decoded.source.unwrap().username, "alice");
    }

    #[test]
    fn test_get_response_miss_decode() {
        let raw = serde_json::json!({ "_index": "user", "_id": "bob", "found": false });
        let decoded: GetResponse = serde_json::from_value(raw).unwrap();
        assert!(!decoded.found);
        assert!(decoded.source.is_none());
    }
}
