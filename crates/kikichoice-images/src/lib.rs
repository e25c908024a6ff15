//! Batch ingestion of product and variant images.
//!
//! A source tree holds one directory per SKU. Each directory is classified,
//! confirmed against the catalog, and its images uploaded to blob storage
//! and recorded in the primary database and any mirrors.

pub mod blob;
pub mod classify;
pub mod cleanup;
pub mod error;
pub mod pipeline;
pub mod reconcile;
pub mod report;
pub mod scan;
pub mod targets;

pub use blob::{azure_container_url, BlobStore, ObjectBlobStore, PRODUCT_IMAGE_CONTAINER};
pub use classify::{classify_directory, Candidate};
pub use cleanup::{blob_prefix, clean_entity, CleanupReport, EntityHandle, MirrorEntity};
pub use error::{BlobError, IngestError};
pub use pipeline::{blob_name, generate_blob_id, ImageUploader, UploadOptions};
pub use reconcile::{reconcile, validate_variants, DirectoryInfo, DirectoryKind, VariantInfo};
pub use report::UploadResult;
pub use scan::{scan_source, validate_source_path, ScannedDirectory, ALLOWED_EXTENSIONS};
pub use targets::{DbTarget, Targets};
