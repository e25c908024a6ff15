use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState};

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_PER_PAGE: i64 = 15;
const MAX_PER_PAGE: i64 = 100;

const INVALID_QUERY_PARAMS: &str = "INVALID_QUERY_PARAMS";
const GET_PRODUCTS_FAILED: &str = "GET_PRODUCTS_FAILED";
const GET_PRODUCT_FAILED: &str = "GET_PRODUCT_FAILED";
const GET_PRODUCT_VARIANTS_FAILED: &str = "GET_PRODUCT_VARIANTS_FAILED";

#[derive(Debug, Serialize)]
pub(super) struct ProductItem {
    uuid: Uuid,
    sku: String,
    name: String,
    price: Decimal,
    original_price: Option<Decimal>,
    stock_count: i32,
    short_desc: Option<String>,
    variant_count: i64,
    primary_image_url: Option<String>,
    has_variant: bool,
}

impl From<kikichoice_db::ProductCardRow> for ProductItem {
    fn from(row: kikichoice_db::ProductCardRow) -> Self {
        let has_variant = row.has_variant();
        Self {
            uuid: row.uuid,
            sku: row.sku,
            name: row.name,
            price: row.price,
            original_price: row.original_price,
            stock_count: row.stock_count,
            short_desc: row.short_desc,
            variant_count: row.variant_count,
            primary_image_url: row.primary_image_url,
            has_variant,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ProductList {
    products: Vec<ProductItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct ImageItem {
    url: String,
    is_primary: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct SpecItem {
    name: String,
    value: String,
}

#[derive(Debug, Serialize)]
pub(super) struct VariantItem {
    uuid: Uuid,
    sku: String,
    name: String,
    price: Decimal,
    stock_count: i32,
    image_url: Option<String>,
}

impl From<kikichoice_db::VariantWithImageRow> for VariantItem {
    fn from(row: kikichoice_db::VariantWithImageRow) -> Self {
        Self {
            uuid: row.uuid,
            sku: row.sku,
            name: row.name,
            price: row.price,
            stock_count: row.stock_count,
            image_url: row.image_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct VariantList {
    variants: Vec<VariantItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductDetailItem {
    uuid: Uuid,
    sku: String,
    name: String,
    slug: String,
    price: Decimal,
    original_price: Option<Decimal>,
    short_desc: Option<String>,
    full_desc: Option<String>,
    stock_count: i32,
    images: Vec<ImageItem>,
    specs: Vec<SpecItem>,
    variants: Vec<VariantItem>,
}

impl From<kikichoice_db::ProductDetail> for ProductDetailItem {
    fn from(detail: kikichoice_db::ProductDetail) -> Self {
        let product = detail.product;
        Self {
            uuid: product.uuid,
            sku: product.sku,
            name: product.name,
            slug: product.slug,
            price: product.price,
            original_price: product.original_price,
            short_desc: product.short_desc,
            full_desc: product.full_desc,
            stock_count: product.stock_count,
            images: detail
                .images
                .into_iter()
                .map(|image| ImageItem {
                    url: image.url,
                    is_primary: image.is_primary,
                })
                .collect(),
            specs: detail
                .specs
                .into_iter()
                .map(|spec| SpecItem {
                    name: spec.spec_name,
                    value: spec.spec_value,
                })
                .collect(),
            variants: detail.variants.into_iter().map(VariantItem::from).collect(),
        }
    }
}

/// Raw query string values; parsed by hand so bad input gets this API's
/// error envelope rather than the extractor's plain-text rejection.
#[derive(Debug, Deserialize)]
pub(super) struct ListQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
}

/// Validated `(page, per_page)`.
pub(super) fn parse_pagination(query: &ListQuery) -> Result<(i64, i64), String> {
    let parse = |name: &str, raw: Option<&str>, default: i64| -> Result<i64, String> {
        match raw.map(str::trim).filter(|v| !v.is_empty()) {
            None => Ok(default),
            Some(v) => v
                .parse::<i64>()
                .map_err(|_| format!("{name} must be an integer")),
        }
    };

    let page = parse("page", query.page.as_deref(), DEFAULT_PAGE)?;
    let per_page = parse("per_page", query.per_page.as_deref(), DEFAULT_PER_PAGE)?;

    if page < 1 {
        return Err("page must be at least 1".to_string());
    }
    if !(1..=MAX_PER_PAGE).contains(&per_page) {
        return Err(format!("per_page must be between 1 and {MAX_PER_PAGE}"));
    }
    Ok((page, per_page))
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<ProductList>>, ApiError> {
    let (page, per_page) = parse_pagination(&query).map_err(|message| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            req_id.0.clone(),
            INVALID_QUERY_PARAMS,
            message,
        )
    })?;

    let rows = kikichoice_db::list_products(&state.pool, page, per_page)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), GET_PRODUCTS_FAILED, &e))?;

    let data = ProductList {
        products: rows.into_iter().map(ProductItem::from).collect(),
    };
    Ok(ApiResponse::new(data, req_id.0))
}

pub(super) async fn list_hot_selling_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<ProductList>>, ApiError> {
    let rows = kikichoice_db::list_hot_selling_products(&state.pool, kikichoice_db::HOT_SELLING_LIMIT)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), GET_PRODUCTS_FAILED, &e))?;

    let data = ProductList {
        products: rows.into_iter().map(ProductItem::from).collect(),
    };
    Ok(ApiResponse::new(data, req_id.0))
}

pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(raw_uuid): Path<String>,
) -> Result<Json<ApiResponse<ProductDetailItem>>, ApiError> {
    let not_found = |req_id: String| {
        ApiError::new(
            StatusCode::NOT_FOUND,
            req_id,
            GET_PRODUCT_FAILED,
            "product not found",
        )
    };

    let Ok(product_uuid) = Uuid::parse_str(&raw_uuid) else {
        return Err(not_found(req_id.0));
    };

    match kikichoice_db::get_product_detail(&state.pool, product_uuid).await {
        Ok(Some(detail)) => Ok(ApiResponse::new(ProductDetailItem::from(detail), req_id.0)),
        Ok(None) => Err(not_found(req_id.0)),
        Err(e) => {
            tracing::error!(product_uuid = %product_uuid, error = %e, "failed to load product detail");
            Err(not_found(req_id.0))
        }
    }
}

pub(super) async fn list_product_variants(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(raw_uuid): Path<String>,
) -> Result<Json<ApiResponse<VariantList>>, ApiError> {
    let variants = match Uuid::parse_str(&raw_uuid) {
        Ok(product_uuid) => kikichoice_db::list_variants_for_product(&state.pool, product_uuid)
            .await
            .map_err(|e| {
                tracing::error!(product_uuid = %product_uuid, error = %e, "failed to load variants");
                ApiError::new(
                    StatusCode::NOT_FOUND,
                    req_id.0.clone(),
                    GET_PRODUCT_VARIANTS_FAILED,
                    "failed to load product variants",
                )
            })?,
        Err(_) => Vec::new(),
    };

    let data = VariantList {
        variants: variants.into_iter().map(VariantItem::from).collect(),
    };
    Ok(ApiResponse::new(data, req_id.0))
}
