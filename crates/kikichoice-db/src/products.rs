//! Read-model queries behind the storefront product endpoints.

use chrono::{DateTime, Utc};
use kikichoice_core::ProductSpec;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// Number of products returned by the hot-selling listing.
pub const HOT_SELLING_LIMIT: i64 = 6;

/// Product card row used by listings.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductCardRow {
    pub uuid: Uuid,
    pub sku: String,
    pub name: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub stock_count: i32,
    pub short_desc: Option<String>,
    pub variant_count: i64,
    pub primary_image_url: Option<String>,
}

impl ProductCardRow {
    #[must_use]
    pub fn has_variant(&self) -> bool {
        self.variant_count > 0
    }
}

/// Full `products` row for a single ready-for-sale product.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub uuid: Uuid,
    pub sku: String,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub stock_count: i32,
    pub short_desc: Option<String>,
    pub full_desc: Option<String>,
    pub specs: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductImageRow {
    pub url: String,
    pub is_primary: bool,
}

/// Variant row joined with its primary image, if any.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VariantWithImageRow {
    pub uuid: Uuid,
    pub sku: String,
    pub name: String,
    pub stock_count: i32,
    pub reserved_count: i32,
    pub price: Decimal,
    pub image_url: Option<String>,
}

/// Everything the product detail endpoint renders.
#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub product: ProductRow,
    pub images: Vec<ProductImageRow>,
    pub specs: Vec<ProductSpec>,
    pub variants: Vec<VariantWithImageRow>,
}

// Primary image per product: the `is_primary` association with the lowest
// sort order.
const PRODUCT_CARD_COLUMNS: &str = "p.uuid, p.sku, p.name, p.price, p.original_price, \
     p.stock_count, p.short_desc, \
     (SELECT COUNT(*) FROM product_variants pv WHERE pv.product_id = p.id) AS variant_count, \
     (SELECT i.url FROM image_entities ie \
        JOIN images i ON i.id = ie.image_id \
       WHERE ie.entity_type = 'product' AND ie.entity_id = p.id AND ie.is_primary \
       ORDER BY ie.sort_order, ie.id LIMIT 1) AS primary_image_url";

/// Returns one page of ready-for-sale products, newest first.
///
/// `page` is 1-based; callers validate the bounds.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn list_products(
    pool: &PgPool,
    page: i64,
    per_page: i64,
) -> Result<Vec<ProductCardRow>, DbError> {
    let offset = (page.max(1) - 1) * per_page;
    let sql = format!(
        "SELECT {PRODUCT_CARD_COLUMNS} \
         FROM products p \
         WHERE p.ready_for_sale = true \
         ORDER BY p.created_at DESC, p.id DESC \
         LIMIT $1 OFFSET $2"
    );

    let rows = sqlx::query_as::<_, ProductCardRow>(&sql)
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Returns up to `limit` ready-for-sale products ranked for the storefront.
///
/// Products with units sold in paid or fulfilled orders from the last 30 days
/// come first, by units sold. The remainder is filled with the newest products.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn list_hot_selling_products(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<ProductCardRow>, DbError> {
    let sql = format!(
        "WITH recent_sales AS ( \
             SELECT oi.product_id, SUM(oi.quantity)::BIGINT AS units_sold \
             FROM order_items oi \
             JOIN orders o ON o.id = oi.order_id \
             WHERE o.status IN ('paid', 'processing', 'shipped', 'delivered') \
               AND o.created_at >= NOW() - INTERVAL '30 days' \
             GROUP BY oi.product_id \
         ) \
         SELECT {PRODUCT_CARD_COLUMNS} \
         FROM products p \
         LEFT JOIN recent_sales rs ON rs.product_id = p.id \
         WHERE p.ready_for_sale = true \
         ORDER BY CASE WHEN rs.units_sold IS NULL THEN 2 ELSE 1 END, \
                  rs.units_sold DESC NULLS LAST, \
                  p.created_at DESC, p.id DESC \
         LIMIT $1"
    );

    let rows = sqlx::query_as::<_, ProductCardRow>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

async fn find_ready_product(pool: &PgPool, product_uuid: Uuid) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT id, uuid, sku, name, slug, price, original_price, stock_count, \
                short_desc, full_desc, specs, created_at, updated_at \
         FROM products \
         WHERE uuid = $1 AND ready_for_sale = true",
    )
    .bind(product_uuid)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

async fn variants_with_images(
    pool: &PgPool,
    product_id: i64,
) -> Result<Vec<VariantWithImageRow>, DbError> {
    let rows = sqlx::query_as::<_, VariantWithImageRow>(
        "SELECT pv.uuid, pv.sku, pv.name, pv.stock_count, pv.reserved_count, pv.price, \
                (SELECT i.url FROM image_entities ie \
                   JOIN images i ON i.id = ie.image_id \
                  WHERE ie.entity_type = 'product_variant' \
                    AND ie.entity_id = pv.id AND ie.is_primary \
                  ORDER BY ie.sort_order, ie.id LIMIT 1) AS image_url \
         FROM product_variants pv \
         WHERE pv.product_id = $1 \
         ORDER BY pv.name, pv.id",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Loads a ready-for-sale product with its images, specs, and variants.
///
/// Returns `None` when no ready-for-sale product has that UUID.
///
/// # Errors
///
/// Returns [`DbError::MalformedSpecs`] if the stored `specs` JSON does not
/// have the `[{spec_name, spec_value}]` shape, or [`DbError::Sqlx`] on query
/// failure.
pub async fn get_product_detail(
    pool: &PgPool,
    product_uuid: Uuid,
) -> Result<Option<ProductDetail>, DbError> {
    let Some(product) = find_ready_product(pool, product_uuid).await? else {
        return Ok(None);
    };

    let images = sqlx::query_as::<_, ProductImageRow>(
        "SELECT i.url, ie.is_primary \
         FROM image_entities ie \
         JOIN images i ON i.id = ie.image_id \
         WHERE ie.entity_type = 'product' AND ie.entity_id = $1 \
         ORDER BY ie.sort_order, ie.id",
    )
    .bind(product.id)
    .fetch_all(pool)
    .await?;

    let specs = parse_specs(product.uuid, &product.specs)?;
    let variants = variants_with_images(pool, product.id).await?;

    Ok(Some(ProductDetail {
        product,
        images,
        specs,
        variants,
    }))
}

/// Lists a product's variants with their primary images, ordered by name.
///
/// A product that does not exist or is not for sale yields an empty list.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn list_variants_for_product(
    pool: &PgPool,
    product_uuid: Uuid,
) -> Result<Vec<VariantWithImageRow>, DbError> {
    let product_id = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM products WHERE uuid = $1 AND ready_for_sale = true",
    )
    .bind(product_uuid)
    .fetch_optional(pool)
    .await?;

    match product_id {
        Some(id) => variants_with_images(pool, id).await,
        None => Ok(Vec::new()),
    }
}

/// Decodes the `products.specs` JSONB column. `null` decodes to no specs.
fn parse_specs(product_uuid: Uuid, raw: &serde_json::Value) -> Result<Vec<ProductSpec>, DbError> {
    if raw.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(raw.clone()).map_err(|source| DbError::MalformedSpecs {
        product_uuid,
        source,
    })
}
