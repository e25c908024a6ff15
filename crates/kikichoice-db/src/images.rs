//! Image ownership queries used by the image uploader.
//!
//! Every uploaded file produces two rows: one in `images` holding the public
//! URL, and one in `image_entities` linking it to a product or variant.

use chrono::{DateTime, Utc};
use kikichoice_core::EntityType;
use sqlx::PgPool;

use crate::DbError;

/// A product or variant resolved by SKU.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct EntityRef {
    pub id: i64,
    pub name: String,
}

/// Projection of a `product_variants` row used when reconciling directories.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct VariantInfoRow {
    pub id: i64,
    pub sku: String,
    pub product_id: i64,
    pub name: String,
}

/// Input for [`attach_image`].
#[derive(Debug, Clone, Copy)]
pub struct NewEntityImage<'a> {
    pub entity_type: EntityType,
    pub entity_id: i64,
    pub url: &'a str,
    pub alt_text: &'a str,
    /// Zero-based position; position 0 is the primary image.
    pub sort_order: i32,
}

/// IDs produced by [`attach_image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachedImage {
    pub image_id: i64,
    pub image_entity_id: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EntityImageRow {
    pub image_id: i64,
    pub url: String,
    pub alt_text: Option<String>,
    pub is_primary: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

/// Looks up a product or variant ID by SKU.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn find_entity_by_sku(
    pool: &PgPool,
    entity_type: EntityType,
    sku: &str,
) -> Result<Option<EntityRef>, DbError> {
    let sql = match entity_type {
        EntityType::Product => "SELECT id, name FROM products WHERE sku = $1 LIMIT 1",
        EntityType::ProductVariant => {
            "SELECT id, name FROM product_variants WHERE sku = $1 LIMIT 1"
        }
    };

    let row = sqlx::query_as::<_, EntityRef>(sql)
        .bind(sku)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Returns the persisted variants whose SKU is in `skus`, in SKU order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn find_variants_by_skus(
    pool: &PgPool,
    skus: &[String],
) -> Result<Vec<VariantInfoRow>, DbError> {
    if skus.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, VariantInfoRow>(
        "SELECT id, sku, product_id, name \
         FROM product_variants \
         WHERE sku = ANY($1) \
         ORDER BY sku",
    )
    .bind(skus)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Records an uploaded image and links it to its owner in one transaction.
///
/// The `image_entities` row is marked primary when `sort_order` is 0. Nothing
/// is committed unless both inserts succeed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either insert or the commit fails.
pub async fn attach_image(
    pool: &PgPool,
    image: &NewEntityImage<'_>,
) -> Result<AttachedImage, DbError> {
    let mut tx = pool.begin().await?;

    let image_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO images (url, created_at) VALUES ($1, NOW()) RETURNING id",
    )
    .bind(image.url)
    .fetch_one(&mut *tx)
    .await?;

    let image_entity_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO image_entities \
             (entity_id, image_id, alt_text, is_primary, sort_order, entity_type, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, NOW()) \
         RETURNING id",
    )
    .bind(image.entity_id)
    .bind(image_id)
    .bind(image.alt_text)
    .bind(image.sort_order == 0)
    .bind(image.sort_order)
    .bind(image.entity_type.as_str())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(AttachedImage {
        image_id,
        image_entity_id,
    })
}

/// Removes every image association of one entity, plus the `images` rows
/// they referenced that no other association still uses.
///
/// Returns the number of associations removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on failure; the transaction is rolled back.
pub async fn delete_entity_images(
    pool: &PgPool,
    entity_type: EntityType,
    entity_id: i64,
) -> Result<u64, DbError> {
    let mut tx = pool.begin().await?;

    let image_ids = sqlx::query_scalar::<_, i64>(
        "DELETE FROM image_entities \
         WHERE entity_type = $1 AND entity_id = $2 \
         RETURNING image_id",
    )
    .bind(entity_type.as_str())
    .bind(entity_id)
    .fetch_all(&mut *tx)
    .await?;

    if !image_ids.is_empty() {
        sqlx::query(
            "DELETE FROM images \
             WHERE id = ANY($1) \
               AND NOT EXISTS (SELECT 1 FROM image_entities ie WHERE ie.image_id = images.id)",
        )
        .bind(&image_ids)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(image_ids.len() as u64)
}

/// Lists an entity's images in display order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn list_entity_images(
    pool: &PgPool,
    entity_type: EntityType,
    entity_id: i64,
) -> Result<Vec<EntityImageRow>, DbError> {
    let rows = sqlx::query_as::<_, EntityImageRow>(
        "SELECT i.id AS image_id, i.url, ie.alt_text, ie.is_primary, ie.sort_order, ie.created_at \
         FROM image_entities ie \
         JOIN images i ON i.id = ie.image_id \
         WHERE ie.entity_type = $1 AND ie.entity_id = $2 \
         ORDER BY ie.sort_order, ie.id",
    )
    .bind(entity_type.as_str())
    .bind(entity_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
