/// S3 media store adapter
///
/// Uploads post media under a generated object key with a public-read ACL
/// and returns the durable public URL. Any failure aborts the operation;
/// no partial object is ever made publicly readable.
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use thiserror::Error;

use crate::config::S3Config;

#[derive(Debug, Error)]
pub enum MediaStoreError {
    #[error("upload failed: {0}")]
    Upload(String),
}

#[derive(Clone)]
pub struct MediaStore {
    client: Client,
    config: S3Config,
}

impl MediaStore {
    /// Build the S3 client from config. Explicit credentials when provided,
    /// otherwise the default credential chain; custom endpoint supported
    /// for S3-compatible storage like MinIO.
    pub async fn new(config: &S3Config) -> Self {
        use aws_sdk_s3::config::Region;

        let mut builder = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let (Some(access_key_id), Some(secret_access_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            use aws_sdk_s3::config::Credentials;

            let credentials = Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                "geopost_media_store",
            );
            builder = builder.credentials_provider(credentials);
        }

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        let aws_config = builder.load().await;

        Self {
            client: Client::new(&aws_config),
            config: config.clone(),
        }
    }

    /// Store the bytes under `key`, grant public read, and return the
    /// durable link. The object is globally reachable on success and
    /// irreversible without an explicit delete, which this service never
    /// issues.
    pub async fn store(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, MediaStoreError> {
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .acl(ObjectCannedAcl::PublicRead)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| {
                let error_msg = e.to_string();
                if error_msg.contains("403") || error_msg.contains("Forbidden") {
                    MediaStoreError::Upload("S3 auth failed (403): check AWS credentials".to_string())
                } else if error_msg.contains("NoSuchBucket") {
                    MediaStoreError::Upload(format!("S3 bucket not found: {}", self.config.bucket))
                } else {
                    MediaStoreError::Upload(error_msg)
                }
            })?;

        let url = self.config.object_url(key);
        tracing::info!(%key, %url, "media saved to object store");
        Ok(url)
    }
}
