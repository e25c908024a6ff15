use std::fmt;

use kikichoice_core::EntityType;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Counters for one upload run.
///
/// Every image that reaches the upload step ends up counted as either uploaded
/// or skipped. Dry runs produce the same shape as live runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadResult {
    pub processed_products: usize,
    pub processed_variants: usize,
    pub uploaded_product_images: usize,
    pub uploaded_variant_images: usize,
    pub skipped_product_images: usize,
    pub skipped_variant_images: usize,
    pub total_size_bytes: u64,
    pub errors: Vec<String>,
    pub dry_run: bool,
    pub local_sync_enabled: bool,
    pub local_sync_errors: usize,
    /// Blobs deleted by clean-first, or that would be in a dry run.
    pub blobs_removed: usize,
}

impl UploadResult {
    #[must_use]
    pub fn new(dry_run: bool, local_sync_enabled: bool) -> Self {
        Self {
            dry_run,
            local_sync_enabled,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn uploaded_images(&self) -> usize {
        self.uploaded_product_images + self.uploaded_variant_images
    }

    #[must_use]
    pub fn skipped_images(&self) -> usize {
        self.skipped_product_images + self.skipped_variant_images
    }

    pub fn record_processed(&mut self, entity_type: EntityType) {
        match entity_type {
            EntityType::Product => self.processed_products += 1,
            EntityType::ProductVariant => self.processed_variants += 1,
        }
    }

    pub fn record_uploaded(&mut self, entity_type: EntityType) {
        match entity_type {
            EntityType::Product => self.uploaded_product_images += 1,
            EntityType::ProductVariant => self.uploaded_variant_images += 1,
        }
    }

    pub fn record_skipped(&mut self, entity_type: EntityType, count: usize) {
        match entity_type {
            EntityType::Product => self.skipped_product_images += count,
            EntityType::ProductVariant => self.skipped_variant_images += count,
        }
    }

    pub fn record_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn total_size_mb(&self) -> f64 {
        self.total_size_bytes as f64 / BYTES_PER_MB
    }
}

/// Renders the end-of-run summary printed by the CLI.
impl fmt::Display for UploadResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Upload Summary ===")?;
        if self.dry_run {
            writeln!(f, "DRY RUN: no changes were made")?;
        }
        writeln!(f, "Processed Products: {}", self.processed_products)?;
        writeln!(f, "Processed Variants: {}", self.processed_variants)?;
        writeln!(f, "Total Uploaded Images: {}", self.uploaded_images())?;
        writeln!(f, "  - Product Images: {}", self.uploaded_product_images)?;
        writeln!(f, "  - Variant Images: {}", self.uploaded_variant_images)?;
        writeln!(f, "Total Skipped Images: {}", self.skipped_images())?;
        writeln!(f, "  - Product Images: {}", self.skipped_product_images)?;
        writeln!(f, "  - Variant Images: {}", self.skipped_variant_images)?;
        writeln!(f, "Total Size: {:.2} MB", self.total_size_mb())?;
        if self.blobs_removed > 0 {
            let verb = if self.dry_run { "Blobs To Remove" } else { "Blobs Removed" };
            writeln!(f, "{verb}: {}", self.blobs_removed)?;
        }
        writeln!(f, "Errors: {}", self.errors.len())?;

        if self.local_sync_enabled {
            write!(f, "Local Database Sync: enabled")?;
            if self.local_sync_errors > 0 {
                write!(f, " ({} sync errors)", self.local_sync_errors)?;
            }
            writeln!(f)?;
        }

        if !self.errors.is_empty() {
            writeln!(f)?;
            writeln!(f, "Errors encountered:")?;
            for error in &self.errors {
                writeln!(f, "- {error}")?;
            }
        }

        if self.dry_run {
            writeln!(f)?;
            writeln!(f, "Run without --dry-run to perform the upload.")?;
        }
        Ok(())
    }
}
