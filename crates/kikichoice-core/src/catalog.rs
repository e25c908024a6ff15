//! Catalog vocabulary shared by the API, the database layer, and the image
//! uploader.

use serde::{Deserialize, Serialize};

/// Owner kind recorded in `image_entities.entity_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Product,
    ProductVariant,
}

impl EntityType {
    /// Discriminator value stored in the database.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Product => "product",
            EntityType::ProductVariant => "product_variant",
        }
    }

    /// Human-readable label, e.g. `"Product Variant"`.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            EntityType::Product => "Product",
            EntityType::ProductVariant => "Product Variant",
        }
    }

    /// Alt text written alongside uploaded images.
    #[must_use]
    pub fn alt_text(self, sku: &str) -> String {
        format!("{} image for {sku}", self.label())
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the `products.specs` JSONB array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSpec {
    pub spec_name: String,
    pub spec_value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_type_discriminators_match_schema() {
        assert_eq!(EntityType::Product.as_str(), "product");
        assert_eq!(EntityType::ProductVariant.as_str(), "product_variant");
    }

    #[test]
    fn alt_text_uses_title_cased_label() {
        assert_eq!(
            EntityType::Product.alt_text("kivy-007"),
            "Product image for kivy-007"
        );
        assert_eq!(
            EntityType::ProductVariant.alt_text("kivy-007-dog"),
            "Product Variant image for kivy-007-dog"
        );
    }

    #[test]
    fn product_spec_deserializes_from_jsonb_shape() {
        let specs: Vec<ProductSpec> = serde_json::from_str(
            r#"[{"spec_name":"Material","spec_value":"Cotton"}]"#,
        )
        .expect("parse specs");
        assert_eq!(specs[0].spec_name, "Material");
        assert_eq!(specs[0].spec_value, "Cotton");
    }
}
