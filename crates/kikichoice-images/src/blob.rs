//! Blob storage for product images.
//!
//! Blob names are `{sku}/{id}{ext}` inside a single public container, so every
//! image of one SKU sits under the `{sku}/` prefix.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{ObjectStore, ObjectStoreExt, PutPayload};

use crate::error::BlobError;

/// Container holding every product and variant image.
pub const PRODUCT_IMAGE_CONTAINER: &str = "products";

/// The blob operations the uploader needs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Uploads `data` under `blob_name` and returns its public URL.
    async fn upload(&self, blob_name: &str, data: Bytes) -> Result<String, BlobError>;

    /// Names of every blob under `prefix`.
    async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, BlobError>;

    async fn delete(&self, blob_name: &str) -> Result<(), BlobError>;

    /// Deletes every blob under `prefix` and returns how many were removed.
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, BlobError> {
        let names = self.list_prefix(prefix).await?;
        for name in &names {
            self.delete(name).await?;
        }
        Ok(names.len())
    }
}

/// [`BlobStore`] backed by any `object_store` implementation.
#[derive(Clone)]
pub struct ObjectBlobStore {
    store: Arc<dyn ObjectStore>,
    base_url: String,
}

impl std::fmt::Debug for ObjectBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectBlobStore")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ObjectBlobStore {
    /// Wraps `store`; public URLs are `{base_url}/{blob_name}`.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, base_url: impl Into<String>) -> Self {
        Self {
            store,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Azure Blob Storage client for the product image container, authenticated
    /// with a shared account key.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError::Config`] if the client cannot be built.
    pub fn azure(account: &str, access_key: &str) -> Result<Self, BlobError> {
        if account.trim().is_empty() {
            return Err(BlobError::Config("storage account name is empty".to_string()));
        }
        let store = MicrosoftAzureBuilder::new()
            .with_account(account)
            .with_access_key(access_key)
            .with_container_name(PRODUCT_IMAGE_CONTAINER)
            .build()
            .map_err(|e| BlobError::Config(e.to_string()))?;

        Ok(Self::new(Arc::new(store), azure_container_url(account)))
    }

    /// In-process store, used by tests and local experiments.
    #[must_use]
    pub fn in_memory(base_url: impl Into<String>) -> Self {
        Self::new(Arc::new(InMemory::new()), base_url)
    }

    #[must_use]
    pub fn public_url(&self, blob_name: &str) -> String {
        format!("{}/{blob_name}", self.base_url)
    }
}

/// `https://{account}.blob.core.windows.net/products`
#[must_use]
pub fn azure_container_url(account: &str) -> String {
    format!("https://{account}.blob.core.windows.net/{PRODUCT_IMAGE_CONTAINER}")
}

fn store_error(location: &str) -> impl FnOnce(object_store::Error) -> BlobError + '_ {
    move |source| BlobError::Store {
        location: location.to_string(),
        source,
    }
}

#[async_trait]
impl BlobStore for ObjectBlobStore {
    async fn upload(&self, blob_name: &str, data: Bytes) -> Result<String, BlobError> {
        let location = Path::from(blob_name);
        self.store
            .put(&location, PutPayload::from(data))
            .await
            .map_err(store_error(blob_name))?;
        Ok(self.public_url(blob_name))
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, BlobError> {
        // object_store prefixes match whole path segments, so "kivy-007" never
        // matches "kivy-007-dog/...".
        let location = Path::from(prefix.trim_end_matches('/'));
        let objects: Vec<_> = self
            .store
            .list(Some(&location))
            .try_collect()
            .await
            .map_err(store_error(prefix))?;

        let mut names: Vec<String> = objects
            .into_iter()
            .map(|meta| meta.location.to_string())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn delete(&self, blob_name: &str) -> Result<(), BlobError> {
        let location = Path::from(blob_name);
        self.store
            .delete(&location)
            .await
            .map_err(store_error(blob_name))
    }
}
