//! Upload orchestration: scan, reconcile, then one directory at a time.
//!
//! Work is strictly sequential. A failing image or directory is recorded in
//! the [`UploadResult`] and the run moves on; only setup failures abort.

use std::path::Path;

use bytes::Bytes;
use kikichoice_core::EntityType;
use kikichoice_db::NewEntityImage;
use rand::Rng;

use crate::blob::BlobStore;
use crate::cleanup::{clean_entity, EntityHandle, MirrorEntity};
use crate::error::IngestError;
use crate::reconcile::{validate_variants, DirectoryInfo};
use crate::report::UploadResult;
use crate::scan::{scan_source, validate_source_path};
use crate::targets::Targets;

const BLOB_ID_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";
const BLOB_ID_LEN: usize = 12;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadOptions {
    /// Log what would happen without uploading, deleting, or writing rows.
    pub dry_run: bool,
    /// Remove each entity's existing images before uploading new ones.
    pub clean_first: bool,
}

/// Random 12-character id drawn from the URL-safe nanoid alphabet.
#[must_use]
pub fn generate_blob_id() -> String {
    let mut rng = rand::rng();
    (0..BLOB_ID_LEN)
        .map(|_| char::from(BLOB_ID_ALPHABET[rng.random_range(0..BLOB_ID_ALPHABET.len())]))
        .collect()
}

/// `{sku}/{id}{ext}`, keeping the source file's extension as written.
#[must_use]
pub fn blob_name(sku: &str, id: &str, source: &Path) -> String {
    match source.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("{sku}/{id}.{ext}"),
        None => format!("{sku}/{id}"),
    }
}

pub struct ImageUploader<'a> {
    targets: &'a Targets,
    blobs: &'a dyn BlobStore,
    options: UploadOptions,
}

impl<'a> ImageUploader<'a> {
    #[must_use]
    pub fn new(targets: &'a Targets, blobs: &'a dyn BlobStore, options: UploadOptions) -> Self {
        Self {
            targets,
            blobs,
            options,
        }
    }

    /// Uploads every eligible image under `source`.
    ///
    /// # Errors
    ///
    /// Returns an error only for setup failures: an invalid source path, an
    /// unlistable root, or a failed variant lookup. Everything after that is
    /// collected in the returned [`UploadResult`].
    pub async fn run(&self, source: &Path) -> Result<UploadResult, IngestError> {
        tracing::info!(
            source = %source.display(),
            dry_run = self.options.dry_run,
            clean_first = self.options.clean_first,
            mirrors = self.targets.mirrors.len(),
            "starting image upload"
        );

        validate_source_path(source)?;
        let scanned = scan_source(source)?;

        let mut result = UploadResult::new(self.options.dry_run, self.targets.has_mirrors());
        if scanned.is_empty() {
            tracing::warn!(source = %source.display(), "no image directories found");
            return Ok(result);
        }

        let directories = validate_variants(&self.targets.primary.pool, scanned).await?;
        let variant_dirs = directories.iter().filter(|d| d.is_variant()).count();
        tracing::info!(
            products = directories.len() - variant_dirs,
            variants = variant_dirs,
            "directories to process"
        );

        for dir in &directories {
            let entity_type = dir.entity_type();
            match self.process_directory(dir, &mut result).await {
                Ok(()) => result.record_processed(entity_type),
                Err(e) => {
                    tracing::error!(sku = %dir.sku, entity_type = %entity_type, error = %e, "directory failed");
                    result.record_error(format!("{entity_type} SKU {}: {e}", dir.sku));
                }
            }
        }

        tracing::info!(
            dry_run = result.dry_run,
            products = result.processed_products,
            variants = result.processed_variants,
            uploaded = result.uploaded_images(),
            skipped = result.skipped_images(),
            errors = result.errors.len(),
            "image upload finished"
        );
        Ok(result)
    }

    async fn process_directory(
        &self,
        dir: &DirectoryInfo,
        result: &mut UploadResult,
    ) -> Result<(), IngestError> {
        let entity_type = dir.entity_type();
        let primary = &self.targets.primary;

        let Some(entity) =
            kikichoice_db::find_entity_by_sku(&primary.pool, entity_type, &dir.sku).await?
        else {
            tracing::warn!(
                sku = %dir.sku,
                entity_type = %entity_type,
                images = dir.images.len(),
                "entity not found, skipping its images"
            );
            result.record_skipped(entity_type, dir.images.len());
            return Ok(());
        };

        tracing::info!(
            sku = %dir.sku,
            name = %entity.name,
            entity_id = entity.id,
            images = dir.images.len(),
            "processing {}",
            entity_type.label()
        );

        let handle = EntityHandle {
            sku: &dir.sku,
            entity_type,
            entity_id: entity.id,
        };

        let mirror_ids = if self.options.dry_run {
            Vec::new()
        } else {
            self.resolve_mirrors(entity_type, &dir.sku).await
        };
        let mirrors: Vec<MirrorEntity<'_>> = self
            .targets
            .mirrors
            .iter()
            .zip(mirror_ids)
            .map(|(target, entity_id)| MirrorEntity { target, entity_id })
            .collect();

        if self.options.clean_first {
            let report =
                clean_entity(self.blobs, primary, &mirrors, handle, self.options.dry_run).await?;
            result.blobs_removed += report.blobs_removed;
            result.local_sync_errors += report.mirror_failures;
        }

        for (index, path) in dir.images.iter().enumerate() {
            self.process_image(handle, &mirrors, index, path, result).await;
        }

        Ok(())
    }

    /// Entity ID of `sku` in each mirror, `None` where it cannot be resolved.
    async fn resolve_mirrors(&self, entity_type: EntityType, sku: &str) -> Vec<Option<i64>> {
        let mut ids = Vec::with_capacity(self.targets.mirrors.len());
        for mirror in &self.targets.mirrors {
            let id = match kikichoice_db::find_entity_by_sku(&mirror.pool, entity_type, sku).await {
                Ok(Some(entity)) => Some(entity.id),
                Ok(None) => {
                    tracing::warn!(sku, target = %mirror.label, "entity not found in mirror");
                    None
                }
                Err(e) => {
                    tracing::warn!(sku, target = %mirror.label, error = %e, "mirror lookup failed");
                    None
                }
            };
            ids.push(id);
        }
        ids
    }

    async fn process_image(
        &self,
        entity: EntityHandle<'_>,
        mirrors: &[MirrorEntity<'_>],
        index: usize,
        path: &Path,
        result: &mut UploadResult,
    ) {
        let entity_type = entity.entity_type;

        let size = match tokio::fs::metadata(path).await {
            Ok(meta) => meta.len(),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "cannot access image file");
                result.record_error(format!("file access {}: {e}", path.display()));
                result.record_skipped(entity_type, 1);
                return;
            }
        };
        result.total_size_bytes += size;

        if self.options.dry_run {
            tracing::info!(
                sku = entity.sku,
                file = %path.display(),
                bytes = size,
                primary = index == 0,
                "[DRY RUN] would upload {} image",
                entity_type.label()
            );
            result.record_uploaded(entity_type);
            return;
        }

        let sort_order = i32::try_from(index).unwrap_or(i32::MAX);
        match self.upload_image(entity, mirrors, sort_order, path).await {
            Ok(mirror_failures) => {
                result.local_sync_errors += mirror_failures;
                result.record_uploaded(entity_type);
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "image upload failed");
                result.record_error(format!("{entity_type} image {}: {e}", path.display()));
                result.record_skipped(entity_type, 1);
            }
        }
    }

    /// Uploads one file and records it in every target. Returns the number of
    /// mirrors that could not be updated.
    async fn upload_image(
        &self,
        entity: EntityHandle<'_>,
        mirrors: &[MirrorEntity<'_>],
        sort_order: i32,
        path: &Path,
    ) -> Result<usize, IngestError> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|source| IngestError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let name = blob_name(entity.sku, &generate_blob_id(), path);
        let url = self.blobs.upload(&name, Bytes::from(data)).await?;
        tracing::debug!(blob = %name, url = %url, "uploaded");

        let alt_text = entity.entity_type.alt_text(entity.sku);
        let mut row = NewEntityImage {
            entity_type: entity.entity_type,
            entity_id: entity.entity_id,
            url: &url,
            alt_text: &alt_text,
            sort_order,
        };
        kikichoice_db::attach_image(&self.targets.primary.pool, &row).await?;

        let mut failures = 0;
        for mirror in mirrors {
            let Some(mirror_id) = mirror.entity_id else {
                failures += 1;
                continue;
            };
            row.entity_id = mirror_id;
            if let Err(e) = kikichoice_db::attach_image(&mirror.target.pool, &row).await {
                tracing::warn!(
                    sku = entity.sku,
                    target = %mirror.target.label,
                    error = %e,
                    "failed to sync image to mirror"
                );
                failures += 1;
            }
        }

        Ok(failures)
    }
}
