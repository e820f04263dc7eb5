#[cfg(feature = "s3")]
mod inner {
    use async_trait::async_trait;
    use aws_sdk_s3::Client;
    use aws_sdk_s3::error::DisplayErrorContext;
    use aws_sdk_s3::primitives::ByteStream;
    use chrono::{DateTime, Utc};
    use std::path::Path;
    use tokio::io::AsyncWriteExt;
    use tracing::{debug, warn};

    use s3snap_core::config::StoreConfig;
    use s3snap_core::types::RemoteObject;

    use crate::error::{StoreError, StoreResult};
    use crate::provider::ObjectStore;

    /// AWS S3 and S3-compatible object store.
    ///
    /// Works with AWS S3, MinIO, Garage, Ceph RGW and any other service
    /// implementing the S3 API.
    pub struct S3ObjectStore {
        client: Client,
        bucket: String,
    }

    impl S3ObjectStore {
        /// Build a client from an explicit configuration.
        pub async fn from_config(config: &StoreConfig) -> anyhow::Result<Self> {
            let mut config_loader = aws_config::from_env();

            if let Some(r) = config.region.as_deref() {
                config_loader = config_loader.region(aws_config::Region::new(r.to_string()));
            } else if config.endpoint_url.is_some() {
                // S3-compatible servers still want a signing region.
                config_loader = config_loader.region(aws_config::Region::new("us-east-1"));
            }

            // If explicit credentials are provided, inject them
            let explicit = (config.access_key.as_deref(), config.secret_key.as_deref());
            if let (Some(ak), Some(sk)) = explicit {
                let creds =
                    aws_sdk_s3::config::Credentials::new(ak, sk, None, None, "s3snap-config");
                config_loader = config_loader.credentials_provider(creds);
            }

            let sdk_config = config_loader.load().await;

            let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&sdk_config);

            if let Some(endpoint) = config.endpoint_url.as_deref() {
                s3_config_builder = s3_config_builder.endpoint_url(endpoint);
            }

            if config.use_path_style() {
                s3_config_builder = s3_config_builder.force_path_style(true);
            }

            let client = Client::from_conf(s3_config_builder.build());

            Ok(Self {
                client,
                bucket: config.bucket.clone(),
            })
        }
    }

    fn sdk_error<E: std::error::Error>(e: E) -> anyhow::Error {
        anyhow::anyhow!("{}", DisplayErrorContext(e))
    }

    fn to_utc(t: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(t.secs(), t.subsec_nanos())
    }

    #[async_trait]
    impl ObjectStore for S3ObjectStore {
        async fn list_objects(&self) -> StoreResult<Vec<RemoteObject>> {
            let mut objects = Vec::new();
            let mut token: Option<String> = None;

            loop {
                let resp = self
                    .client
                    .list_objects_v2()
                    .bucket(&self.bucket)
                    .set_continuation_token(token.take())
                    .send()
                    .await
                    .map_err(|e| StoreError::list(&self.bucket, sdk_error(e)))?;

                for obj in resp.contents() {
                    let Some(key) = obj.key() else { continue };
                    let last_modified = obj.last_modified().and_then(to_utc).unwrap_or_default();
                    let size = obj.size().unwrap_or(0).max(0) as u64;
                    objects.push(RemoteObject::new(key, last_modified, size));
                }

                match resp.next_continuation_token() {
                    Some(next) if resp.is_truncated().unwrap_or(false) => {
                        token = Some(next.to_string());
                    }
                    _ => break,
                }
            }

            debug!("listed {} objects in {}", objects.len(), self.bucket);
            Ok(objects)
        }

        async fn upload(&self, local_file: &Path, key: &str) -> StoreResult<()> {
            let body = ByteStream::from_path(local_file)
                .await
                .map_err(|e| StoreError::upload(&self.bucket, key, e))?;

            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(key)
                .body(body)
                .send()
                .await
                .map_err(|e| StoreError::upload(&self.bucket, key, sdk_error(e)))?;
            Ok(())
        }

        async fn download(&self, key: &str, local_file: &Path) -> StoreResult<()> {
            let resp = self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| StoreError::download(&self.bucket, key, sdk_error(e)))?;

            let write = async {
                let mut body = resp.body.into_async_read();
                let mut file = tokio::fs::File::create(local_file).await?;
                tokio::io::copy(&mut body, &mut file).await?;
                file.flush().await
            };

            if let Err(e) = write.await {
                // Do not leave a truncated archive behind.
                if let Err(rm) = tokio::fs::remove_file(local_file).await {
                    warn!("could not remove partial download {}: {rm}", local_file.display());
                }
                return Err(StoreError::download(&self.bucket, key, e));
            }
            Ok(())
        }

        async fn delete_object(&self, key: &str) -> StoreResult<()> {
            self.client
                .delete_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| StoreError::delete(&self.bucket, key, sdk_error(e)))?;
            Ok(())
        }

        fn bucket(&self) -> &str {
            &self.bucket
        }
    }
}

#[cfg(feature = "s3")]
pub use inner::S3ObjectStore;
