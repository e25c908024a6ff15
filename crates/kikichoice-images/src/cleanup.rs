//! Clean-first removal of an entity's existing images.
//!
//! Rows go first, in one transaction per database, so a failure never leaves
//! rows pointing at deleted blobs. Blobs left behind by a later blob failure
//! have no rows and are removed by the next clean-first run.

use kikichoice_core::EntityType;

use crate::blob::BlobStore;
use crate::error::IngestError;
use crate::targets::DbTarget;

/// The entity whose images are being replaced.
#[derive(Debug, Clone, Copy)]
pub struct EntityHandle<'a> {
    pub sku: &'a str,
    pub entity_type: EntityType,
    pub entity_id: i64,
}

/// A mirror database together with the entity's ID in that database.
#[derive(Debug, Clone, Copy)]
pub struct MirrorEntity<'a> {
    pub target: &'a DbTarget,
    /// `None` when the entity could not be resolved in the mirror.
    pub entity_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Blobs deleted, or listed in a dry run.
    pub blobs_removed: usize,
    pub mirror_failures: usize,
}

/// Blob prefix holding every image of `sku`.
#[must_use]
pub fn blob_prefix(sku: &str) -> String {
    format!("{sku}/")
}

/// Removes the entity's image rows from every target and its blobs.
///
/// In a dry run the blobs are only listed and nothing is written.
///
/// # Errors
///
/// Returns [`IngestError::Db`] if the primary database cleanup fails (no blob
/// is touched in that case) and [`IngestError::Blob`] if listing or deleting
/// blobs fails. Mirror failures are counted in the report instead.
pub async fn clean_entity(
    blobs: &dyn BlobStore,
    primary: &DbTarget,
    mirrors: &[MirrorEntity<'_>],
    entity: EntityHandle<'_>,
    dry_run: bool,
) -> Result<CleanupReport, IngestError> {
    let prefix = blob_prefix(entity.sku);

    if dry_run {
        let names = blobs.list_prefix(&prefix).await?;
        if names.is_empty() {
            tracing::info!(sku = entity.sku, entity_type = %entity.entity_type, "[DRY RUN] no existing images");
        }
        for name in &names {
            tracing::info!(sku = entity.sku, blob = %name, "[DRY RUN] would delete");
        }
        return Ok(CleanupReport {
            blobs_removed: names.len(),
            mirror_failures: 0,
        });
    }

    let rows = kikichoice_db::delete_entity_images(&primary.pool, entity.entity_type, entity.entity_id)
        .await?;
    tracing::info!(
        sku = entity.sku,
        target = %primary.label,
        rows,
        "removed existing image rows"
    );

    let mut mirror_failures = 0;
    for mirror in mirrors {
        let Some(mirror_id) = mirror.entity_id else {
            tracing::warn!(sku = entity.sku, target = %mirror.target.label, "entity missing in mirror, cleanup skipped");
            mirror_failures += 1;
            continue;
        };
        if let Err(e) =
            kikichoice_db::delete_entity_images(&mirror.target.pool, entity.entity_type, mirror_id).await
        {
            tracing::warn!(sku = entity.sku, target = %mirror.target.label, error = %e, "mirror cleanup failed");
            mirror_failures += 1;
        }
    }

    let blobs_removed = blobs.delete_prefix(&prefix).await?;
    tracing::info!(sku = entity.sku, blobs_removed, "removed existing blobs");

    Ok(CleanupReport {
        blobs_removed,
        mirror_failures,
    })
}
