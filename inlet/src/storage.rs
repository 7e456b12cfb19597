//! Blob storage access.
//!
//! The storage backend is any S3-compatible blob service. Clients are built
//! per call site rather than pooled: the upload path constructs a fresh
//! [`BlobStore`] for every request, so configuration changes are picked up
//! without a restart and no connection state outlives a request.

use aws_config::{BehaviorVersion, meta::region::RegionProviderChain};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    Client,
    config::{Builder, Region},
    error::SdkError,
    primitives::ByteStream,
};

use crate::config::StorageConfig;
use crate::errors::{Error, Result};

/// A handle on one container of the blob storage service.
#[derive(Debug)]
pub struct BlobStore {
    client: Client,
    container: String,
}

impl BlobStore {
    /// Build a client for the configured container.
    ///
    /// Fails with [`Error::NotConfigured`] when the endpoint or container
    /// cannot be determined from the configuration.
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        let endpoint = config.endpoint_url().ok_or_else(|| Error::NotConfigured {
            message: "storage.account_name is required to derive the service endpoint".to_string(),
        })?;
        let container = config.container_name.clone().ok_or_else(|| Error::NotConfigured {
            message: "storage.container_name is required".to_string(),
        })?;

        tracing::debug!(endpoint = %endpoint, container = %container, "Connecting to blob storage");

        let region_provider = match &config.region {
            Some(region) => RegionProviderChain::first_try(Region::new(region.clone())),
            None => RegionProviderChain::default_provider(),
        }
        .or_else("us-east-1");

        let base = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;

        let mut builder = Builder::from(&base)
            .endpoint_url(endpoint)
            .force_path_style(config.force_path_style);
        if let (Some(id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            builder = builder.credentials_provider(Credentials::new(id.clone(), secret.clone(), None, None, "static"));
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            container,
        })
    }

    /// Make sure the container exists, creating it when absent.
    ///
    /// Returns whether this call created the container.
    pub async fn ensure_container(&self) -> Result<bool> {
        match self.client.head_bucket().bucket(&self.container).send().await {
            Ok(_) => Ok(false),
            Err(SdkError::ServiceError(context)) if context.err().is_not_found() => {
                tracing::debug!("Create a container ({})", self.container);
                self.client
                    .create_bucket()
                    .bucket(&self.container)
                    .send()
                    .await
                    .map_err(|err| Error::from_sdk("create container", &self.container, err))?;
                Ok(true)
            }
            Err(err) => Err(Error::from_sdk("check container", &self.container, err)),
        }
    }

    /// Write one blob, overwriting any existing blob with the same name.
    pub async fn put_blob(&self, name: &str, data: Vec<u8>) -> Result<()> {
        let content_length = data.len() as i64;
        self.client
            .put_object()
            .bucket(&self.container)
            .key(name)
            .content_length(content_length)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|err| Error::from_sdk("upload blob", &self.container, err))?;
        Ok(())
    }
}
