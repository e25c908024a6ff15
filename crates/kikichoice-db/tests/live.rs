//! Live integration tests for kikichoice-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/kikichoice-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use kikichoice_core::EntityType;
use kikichoice_db::{
    attach_image, delete_entity_images, find_entity_by_sku, find_variants_by_skus,
    get_or_create_user, get_product_detail, list_entity_images, list_hot_selling_products,
    list_products, list_variants_for_product, NewEntityImage, NewUser, HOT_SELLING_LIMIT,
};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Insert a product row and return its `(id, uuid)`.
async fn insert_product(pool: &sqlx::PgPool, sku: &str, ready: bool) -> (i64, Uuid) {
    sqlx::query_as::<_, (i64, Uuid)>(
        "INSERT INTO products (sku, name, slug, price, stock_count, ready_for_sale, specs) \
         VALUES ($1, $2, $1, 19.99, 5, $3, \
                 '[{\"spec_name\":\"Material\",\"spec_value\":\"Cotton\"}]'::jsonb) \
         RETURNING id, uuid",
    )
    .bind(sku)
    .bind(format!("Product {sku}"))
    .bind(ready)
    .fetch_one(pool)
    .await
    .unwrap_or_else(|e| panic!("insert_product failed for sku '{sku}': {e}"))
}

async fn insert_variant(pool: &sqlx::PgPool, product_id: i64, sku: &str, name: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO product_variants (product_id, sku, name, price, stock_count) \
         VALUES ($1, $2, $3, 21.50, 2) RETURNING id",
    )
    .bind(product_id)
    .bind(sku)
    .bind(name)
    .fetch_one(pool)
    .await
    .unwrap_or_else(|e| panic!("insert_variant failed for sku '{sku}': {e}"))
}

async fn insert_order(pool: &sqlx::PgPool, status: &str, product_id: i64, quantity: i32) {
    let order_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO orders (status) VALUES ($1) RETURNING id",
    )
    .bind(status)
    .fetch_one(pool)
    .await
    .expect("insert order");

    sqlx::query("INSERT INTO order_items (order_id, product_id, quantity) VALUES ($1, $2, $3)")
        .bind(order_id)
        .bind(product_id)
        .bind(quantity)
        .execute(pool)
        .await
        .expect("insert order item");
}

async fn attach(pool: &sqlx::PgPool, entity_type: EntityType, entity_id: i64, url: &str, order: i32) {
    let alt = entity_type.alt_text("sku");
    attach_image(
        pool,
        &NewEntityImage {
            entity_type,
            entity_id,
            url,
            alt_text: &alt,
            sort_order: order,
        },
    )
    .await
    .expect("attach_image");
}

// ---------------------------------------------------------------------------
// Image ownership
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn find_entity_by_sku_resolves_products_and_variants(pool: sqlx::PgPool) {
    let (product_id, _) = insert_product(&pool, "kivy-007", true).await;
    let variant_id = insert_variant(&pool, product_id, "kivy-007-dog", "Dog").await;

    let product = find_entity_by_sku(&pool, EntityType::Product, "kivy-007")
        .await
        .expect("product lookup");
    assert_eq!(product.map(|p| p.id), Some(product_id));

    let variant = find_entity_by_sku(&pool, EntityType::ProductVariant, "kivy-007-dog")
        .await
        .expect("variant lookup");
    assert_eq!(variant.map(|v| v.id), Some(variant_id));

    let missing = find_entity_by_sku(&pool, EntityType::Product, "kivy-007-dog")
        .await
        .expect("missing lookup");
    assert!(missing.is_none(), "a variant SKU is not a product SKU");
}

#[sqlx::test(migrations = "../../migrations")]
async fn find_variants_by_skus_returns_only_persisted(pool: sqlx::PgPool) {
    let (product_id, _) = insert_product(&pool, "kivy-007", true).await;
    insert_variant(&pool, product_id, "kivy-007-dog", "Dog").await;

    let found = find_variants_by_skus(
        &pool,
        &["kivy-007-dog".to_string(), "kivy-007-cat".to_string()],
    )
    .await
    .expect("batch lookup");

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].sku, "kivy-007-dog");
    assert_eq!(found[0].product_id, product_id);

    let none = find_variants_by_skus(&pool, &[]).await.expect("empty lookup");
    assert!(none.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn attach_image_marks_only_position_zero_primary(pool: sqlx::PgPool) {
    let (product_id, _) = insert_product(&pool, "kivy-007", true).await;
    attach(&pool, EntityType::Product, product_id, "https://cdn/a.jpg", 0).await;
    attach(&pool, EntityType::Product, product_id, "https://cdn/b.jpg", 1).await;

    let images = list_entity_images(&pool, EntityType::Product, product_id)
        .await
        .expect("list images");
    assert_eq!(images.len(), 2);
    assert!(images[0].is_primary);
    assert_eq!(images[0].sort_order, 0);
    assert!(!images[1].is_primary);
    assert_eq!(images[1].url, "https://cdn/b.jpg");
    assert_eq!(images[0].alt_text.as_deref(), Some("Product image for sku"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn delete_entity_images_removes_rows_for_that_entity_only(pool: sqlx::PgPool) {
    let (product_id, _) = insert_product(&pool, "kivy-007", true).await;
    let variant_id = insert_variant(&pool, product_id, "kivy-007-dog", "Dog").await;
    attach(&pool, EntityType::Product, product_id, "https://cdn/a.jpg", 0).await;
    attach(&pool, EntityType::Product, product_id, "https://cdn/b.jpg", 1).await;
    attach(&pool, EntityType::ProductVariant, variant_id, "https://cdn/c.jpg", 0).await;

    let removed = delete_entity_images(&pool, EntityType::Product, product_id)
        .await
        .expect("delete");
    assert_eq!(removed, 2);

    let remaining_images: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM images")
        .fetch_one(&pool)
        .await
        .expect("count images");
    assert_eq!(remaining_images, 1);

    let variant_images = list_entity_images(&pool, EntityType::ProductVariant, variant_id)
        .await
        .expect("list variant images");
    assert_eq!(variant_images.len(), 1);

    let again = delete_entity_images(&pool, EntityType::Product, product_id)
        .await
        .expect("second delete");
    assert_eq!(again, 0);
}

// ---------------------------------------------------------------------------
// Catalog reads
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn list_products_pages_ready_products_newest_first(pool: sqlx::PgPool) {
    let (first_id, _) = insert_product(&pool, "p-1", true).await;
    insert_product(&pool, "p-2", true).await;
    insert_product(&pool, "p-hidden", false).await;
    insert_variant(&pool, first_id, "p-1-red", "Red").await;
    attach(&pool, EntityType::Product, first_id, "https://cdn/p1.jpg", 0).await;

    sqlx::query("UPDATE products SET created_at = NOW() - INTERVAL '1 day' WHERE sku = 'p-1'")
        .execute(&pool)
        .await
        .expect("age p-1");

    let page_one = list_products(&pool, 1, 1).await.expect("page 1");
    assert_eq!(page_one.len(), 1);
    assert_eq!(page_one[0].sku, "p-2");
    assert!(!page_one[0].has_variant());

    let page_two = list_products(&pool, 2, 1).await.expect("page 2");
    assert_eq!(page_two[0].sku, "p-1");
    assert_eq!(page_two[0].variant_count, 1);
    assert_eq!(
        page_two[0].primary_image_url.as_deref(),
        Some("https://cdn/p1.jpg")
    );

    let all = list_products(&pool, 1, 15).await.expect("all");
    assert_eq!(all.len(), 2, "not-for-sale products are hidden");
}

#[sqlx::test(migrations = "../../migrations")]
async fn hot_selling_ranks_recent_sales_before_new_products(pool: sqlx::PgPool) {
    let (old_seller, _) = insert_product(&pool, "seller", true).await;
    let (big_seller, _) = insert_product(&pool, "big-seller", true).await;
    let (cancelled, _) = insert_product(&pool, "cancelled", true).await;
    insert_product(&pool, "fresh", true).await;

    sqlx::query("UPDATE products SET created_at = NOW() - INTERVAL '90 days' WHERE sku <> 'fresh'")
        .execute(&pool)
        .await
        .expect("age products");

    insert_order(&pool, "paid", old_seller, 2).await;
    insert_order(&pool, "delivered", big_seller, 5).await;
    insert_order(&pool, "cancelled", cancelled, 50).await;

    let rows = list_hot_selling_products(&pool, HOT_SELLING_LIMIT)
        .await
        .expect("hot selling");
    let skus: Vec<&str> = rows.iter().map(|r| r.sku.as_str()).collect();
    assert_eq!(skus[..3], ["big-seller", "seller", "fresh"]);
    assert_eq!(rows.len(), 4);
}

#[sqlx::test(migrations = "../../migrations")]
async fn product_detail_includes_images_specs_and_variants(pool: sqlx::PgPool) {
    let (product_id, product_uuid) = insert_product(&pool, "kivy-007", true).await;
    let dog = insert_variant(&pool, product_id, "kivy-007-dog", "Dog").await;
    insert_variant(&pool, product_id, "kivy-007-cat", "Cat").await;
    attach(&pool, EntityType::Product, product_id, "https://cdn/a.jpg", 0).await;
    attach(&pool, EntityType::ProductVariant, dog, "https://cdn/dog.jpg", 0).await;

    let detail = get_product_detail(&pool, product_uuid)
        .await
        .expect("detail query")
        .expect("product exists");

    assert_eq!(detail.product.sku, "kivy-007");
    assert_eq!(detail.images.len(), 1);
    assert!(detail.images[0].is_primary);
    assert_eq!(detail.specs[0].spec_name, "Material");
    let names: Vec<&str> = detail.variants.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, ["Cat", "Dog"]);
    assert!(detail.variants[0].image_url.is_none());
    assert_eq!(
        detail.variants[1].image_url.as_deref(),
        Some("https://cdn/dog.jpg")
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn product_detail_hides_unknown_and_unready_products(pool: sqlx::PgPool) {
    let (_, hidden_uuid) = insert_product(&pool, "hidden", false).await;

    assert!(get_product_detail(&pool, hidden_uuid).await.expect("query").is_none());
    assert!(get_product_detail(&pool, Uuid::new_v4()).await.expect("query").is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn variants_for_missing_product_is_empty(pool: sqlx::PgPool) {
    let (product_id, product_uuid) = insert_product(&pool, "kivy-007", true).await;
    insert_variant(&pool, product_id, "kivy-007-dog", "Dog").await;

    let variants = list_variants_for_product(&pool, product_uuid)
        .await
        .expect("variants");
    assert_eq!(variants.len(), 1);

    let none = list_variants_for_product(&pool, Uuid::new_v4())
        .await
        .expect("variants for unknown");
    assert!(none.is_empty());
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn get_or_create_user_is_idempotent(pool: sqlx::PgPool) {
    let new_user = NewUser {
        name: "Ada Lovelace",
        email: Some("ada@example.com"),
        auth_provider: "clerk",
        auth_provider_id: "user_123",
        created_at: None,
    };

    let first = get_or_create_user(&pool, &new_user).await.expect("create");
    assert!(first.created);
    assert_eq!(first.user.email.as_deref(), Some("ada@example.com"));

    let renamed = NewUser {
        name: "Someone Else",
        ..new_user
    };
    let second = get_or_create_user(&pool, &renamed).await.expect("fetch");
    assert!(!second.created);
    assert_eq!(second.user.id, first.user.id);
    assert_eq!(second.user.name, "Ada Lovelace");
}
