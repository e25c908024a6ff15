/// Tentative classification of an image directory, derived from its name alone.
///
/// A `Variant` candidate still has to be confirmed against `product_variants`
/// before it is treated as one; see [`crate::reconcile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    Product,
    Variant { parent_sku: String },
}

/// Classifies a directory name.
///
/// Names without a hyphen are products. Otherwise the parent SKU is every
/// segment but the last, so `kivy-007-dog` proposes a variant of `kivy-007`.
/// A leading hyphen leaves an empty parent and falls back to a product.
#[must_use]
pub fn classify_directory(name: &str) -> Candidate {
    match name.rsplit_once('-') {
        Some((parent, _)) if !parent.is_empty() => Candidate::Variant {
            parent_sku: parent.to_string(),
        },
        _ => Candidate::Product,
    }
}
