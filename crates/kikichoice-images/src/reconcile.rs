//! Turns scanned directories into their final product/variant classification.
//!
//! Hyphenated names only *propose* a variant. A proposal is accepted when the
//! SKU exists in `product_variants`; otherwise the directory is a product.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use kikichoice_core::EntityType;
use sqlx::PgPool;

use crate::classify::Candidate;
use crate::error::IngestError;
use crate::scan::ScannedDirectory;

/// Persisted variant, as read for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantInfo {
    pub id: i64,
    pub sku: String,
    pub product_id: i64,
    pub name: String,
}

impl From<kikichoice_db::VariantInfoRow> for VariantInfo {
    fn from(row: kikichoice_db::VariantInfoRow) -> Self {
        Self {
            id: row.id,
            sku: row.sku,
            product_id: row.product_id,
            name: row.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryKind {
    Product,
    Variant { parent_sku: String },
}

/// A directory ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryInfo {
    pub path: PathBuf,
    pub sku: String,
    pub kind: DirectoryKind,
    pub images: Vec<PathBuf>,
}

impl DirectoryInfo {
    #[must_use]
    pub fn entity_type(&self) -> EntityType {
        match self.kind {
            DirectoryKind::Product => EntityType::Product,
            DirectoryKind::Variant { .. } => EntityType::ProductVariant,
        }
    }

    #[must_use]
    pub fn is_variant(&self) -> bool {
        matches!(self.kind, DirectoryKind::Variant { .. })
    }
}

/// SKUs of every directory that proposes a variant.
#[must_use]
pub fn variant_candidate_skus(scanned: &BTreeMap<String, ScannedDirectory>) -> Vec<String> {
    scanned
        .values()
        .filter(|dir| matches!(dir.candidate, Candidate::Variant { .. }))
        .map(|dir| dir.sku.clone())
        .collect()
}

/// Finalizes each scanned directory against the persisted variants.
///
/// Products come first, then variants, each group in SKU order.
#[must_use]
pub fn reconcile(
    scanned: BTreeMap<String, ScannedDirectory>,
    persisted: &[VariantInfo],
) -> Vec<DirectoryInfo> {
    let known: HashMap<&str, &VariantInfo> =
        persisted.iter().map(|v| (v.sku.as_str(), v)).collect();

    let (mut products, mut variants): (Vec<_>, Vec<_>) = scanned
        .into_values()
        .map(|dir| {
            let kind = match dir.candidate {
                Candidate::Variant { parent_sku } if known.contains_key(dir.sku.as_str()) => {
                    DirectoryKind::Variant { parent_sku }
                }
                Candidate::Variant { .. } => {
                    tracing::info!(
                        sku = %dir.sku,
                        "no persisted variant for directory, treating as product"
                    );
                    DirectoryKind::Product
                }
                Candidate::Product => DirectoryKind::Product,
            };
            DirectoryInfo {
                path: dir.path,
                sku: dir.sku,
                kind,
                images: dir.images,
            }
        })
        .partition(|dir| !dir.is_variant());

    products.sort_by(|a, b| a.sku.cmp(&b.sku));
    variants.sort_by(|a, b| a.sku.cmp(&b.sku));
    products.extend(variants);
    products
}

/// Looks up the variant candidates in the database and reconciles.
///
/// # Errors
///
/// Returns [`IngestError::VariantLookup`] if the batch query fails. The run
/// must not continue with unconfirmed classifications.
pub async fn validate_variants(
    pool: &PgPool,
    scanned: BTreeMap<String, ScannedDirectory>,
) -> Result<Vec<DirectoryInfo>, IngestError> {
    let skus = variant_candidate_skus(&scanned);
    let persisted: Vec<VariantInfo> = kikichoice_db::find_variants_by_skus(pool, &skus)
        .await
        .map_err(IngestError::VariantLookup)?
        .into_iter()
        .map(VariantInfo::from)
        .collect();

    tracing::debug!(
        candidates = skus.len(),
        confirmed = persisted.len(),
        "variant candidates checked"
    );

    Ok(reconcile(scanned, &persisted))
}
