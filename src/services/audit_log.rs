/// ClickHouse audit mirror
///
/// Best-effort copy of select post fields into a wide-column store. The
/// ingestion pipeline dispatches writes as detached background tasks;
/// failures are logged and never affect the request outcome.
use clickhouse::{Client, Row};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, Row)]
pub struct PostAuditRow {
    pub id: String,
    pub user: String,
    pub message: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Clone)]
pub struct AuditLog {
    client: Client,
    table: String,
}

impl AuditLog {
    pub async fn new(url: &str, table: &str) -> Result<Self, clickhouse::error::Error> {
        let client = Client::default().with_url(url);

        let instance = Self {
            client,
            table: table.to_string(),
        };
        instance.ensure_schema().await?;
        Ok(instance)
    }

    async fn ensure_schema(&self) -> Result<(), clickhouse::error::Error> {
        self.client
            .query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    id String,
                    user String,
                    message String,
                    lat Float64,
                    lon Float64
                ) ENGINE = MergeTree()
                ORDER BY id
                "#,
                self.table
            ))
            .execute()
            .await
    }

    pub async fn record(&self, row: &PostAuditRow) -> Result<(), clickhouse::error::Error> {
        let mut insert = self.client.insert(&self.table)?;
        insert.write(row).await?;
        insert.end().await?;
        tracing::debug!(post_id = %row.id, "post mirrored to audit store");
        Ok(())
    }
}
