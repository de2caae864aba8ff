/// Configuration management for geopost-service
///
/// Loads configuration from environment variables with sensible defaults.
/// The JWT signing secret has no default and must be provided.

#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppConfig,
    pub auth: AuthConfig,
    pub elasticsearch: ElasticsearchConfig,
    pub s3: S3Config,
    pub vision: VisionConfig,
    pub audit: AuditConfig,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Symmetric HS256 signing secret, injected at startup.
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
}

#[derive(Clone, Debug)]
pub struct ElasticsearchConfig {
    pub url: String,
    pub post_index: String,
    pub user_index: String,
}

#[derive(Clone, Debug)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Custom endpoint for S3-compatible storage like MinIO.
    pub endpoint: Option<String>,
}

#[derive(Clone, Debug)]
pub struct VisionConfig {
    pub endpoint: String,
    pub api_key: String,
}

#[derive(Clone, Debug)]
pub struct AuditConfig {
    /// Mirroring is disabled when no ClickHouse URL is configured.
    pub clickhouse_url: Option<String>,
    pub table: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Config {
            app: AppConfig {
                host: std::env::var("GEOPOST_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("GEOPOST_PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .unwrap_or(8080),
            },
            auth: AuthConfig {
                jwt_secret: std::env::var("JWT_SECRET")
                    .map_err(|_| "JWT_SECRET must be set")?,
                token_ttl_minutes: std::env::var("TOKEN_TTL_MINUTES")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            },
            elasticsearch: ElasticsearchConfig {
                url: std::env::var("ELASTICSEARCH_URL")
                    .unwrap_or_else(|_| "http://localhost:9200".to_string()),
                post_index: std::env::var("POST_INDEX")
                    .unwrap_or_else(|_| "post".to_string()),
                user_index: std::env::var("USER_INDEX")
                    .unwrap_or_else(|_| "user".to_string()),
            },
            s3: S3Config {
                bucket: std::env::var("S3_BUCKET")
                    .unwrap_or_else(|_| "geopost-media".to_string()),
                region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                access_key_id: std::env::var("AWS_ACCESS_KEY_ID").ok(),
                secret_access_key: std::env::var("AWS_SECRET_ACCESS_KEY").ok(),
                endpoint: std::env::var("S3_ENDPOINT").ok(),
            },
            vision: VisionConfig {
                endpoint: std::env::var("VISION_API_URL").unwrap_or_else(|_| {
                    "https://vision.googleapis.com/v1/images:annotate".to_string()
                }),
                api_key: std::env::var("VISION_API_KEY").unwrap_or_default(),
            },
            audit: AuditConfig {
                clickhouse_url: std::env::var("CLICKHOUSE_URL").ok(),
                table: std::env::var("AUDIT_TABLE")
                    .unwrap_or_else(|_| "post_audit".to_string()),
            },
        })
    }
}

impl S3Config {
    /// Durable public URL for an uploaded object.
    ///
    /// Path-style against the custom endpoint when one is configured,
    /// virtual-hosted-style against AWS otherwise.
    pub fn object_url(&self, key: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key),
            None => format!("https://{}.s3.{}.amazonaws.com/{}", self.bucket, self.region, key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_endpoint(endpoint: Option<&str>) -> S3Config {
        S3Config {
            bucket: "test-bucket".to_string(),
            region: "us-east-1".to_string(),
            access_key_id: None,
            secret_access_key: None,
            endpoint: endpoint.map(str::to_string),
        }
    }

    #[test]
    fn test_object_url_virtual_hosted_style() {
        let config = config_with_endpoint(None);
        assert_eq!(
            config.object_url("abc123"),
            "https://test-bucket.s3.us-east-1.amazonaws.com/abc123"
        );
    }

    #[test]
    fn test_object_url_custom_endpoint() {
        let config = config_with_endpoint(Some("http://localhost:9000/"));
        assert_eq!(
            config.object_url("abc123"),
            "http://localhost:9000/test-bucket/abc123"
        );
    }
}
