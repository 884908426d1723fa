use log::{debug, trace};
use sqlx::{types::Json, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{NewProduct, Product, ProductId, ProductUpdate},
    traits::{CatalogApiError, Page, ProductQueryFilter},
};

fn map_write_error(e: sqlx::Error, sku: &str) -> CatalogApiError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => CatalogApiError::DuplicateSku(sku.to_string()),
        sqlx::Error::Database(db) if db.is_check_violation() => {
            CatalogApiError::InvalidProduct(db.message().to_string())
        },
        _ => CatalogApiError::from(e),
    }
}

/// Inserts a new product using the given connection. This is not atomic. You can embed this call inside a
/// transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, CatalogApiError> {
    let sku = product.sku.clone();
    let product: Product = sqlx::query_as(
        r#"
            INSERT INTO products (sku, name, description, price, currency, stock, images)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(product.sku)
    .bind(product.name)
    .bind(product.description)
    .bind(product.price)
    .bind(product.currency)
    .bind(product.stock)
    .bind(Json(product.images))
    .fetch_one(conn)
    .await
    .map_err(|e| map_write_error(e, &sku))?;
    debug!("🗃️ Product [{}] inserted with id {}", product.sku, product.id);
    Ok(product)
}

pub async fn fetch_product(id: ProductId, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(product)
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &ProductQueryFilter) {
    builder.push(" WHERE 1 = 1");
    if let Some(search) = &filter.search {
        let escaped = search.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
        let pattern = format!("%{escaped}%");
        builder.push(" AND (name LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" ESCAPE '\\' OR description LIKE ");
        builder.push_bind(pattern);
        builder.push(" ESCAPE '\\')");
    }
    if let Some(min) = filter.min_price {
        builder.push(" AND price >= ");
        builder.push_bind(min);
    }
    if let Some(max) = filter.max_price {
        builder.push(" AND price <= ");
        builder.push_bind(max);
    }
}

/// Fetches the page of products matching the filter, and the total number of products that match it.
///
/// Text search is case-insensitive for ASCII text (SQLite's `LIKE` semantics).
pub async fn search_products(
    filter: ProductQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Page<Product>, sqlx::Error> {
    let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM products");
    push_filters(&mut count_builder, &filter);
    let total: i64 = count_builder.build_query_scalar().fetch_one(&mut *conn).await?;

    let pagination = filter.pagination;
    let mut builder = QueryBuilder::new("SELECT * FROM products");
    push_filters(&mut builder, &filter);
    builder.push(" ORDER BY ");
    builder.push(filter.sort.order_by_clause());
    builder.push(" LIMIT ");
    builder.push_bind(pagination.size());
    builder.push(" OFFSET ");
    builder.push_bind(pagination.offset());
    trace!("🗃️ Executing query: {}", builder.sql());
    let products = builder.build_query_as::<Product>().fetch_all(conn).await?;
    trace!("🗃️ Product search returned {} of {total} products", products.len());
    Ok(Page::new(products, pagination, total))
}

/// Applies the non-empty fields of `update` to the product. Returns `None` if the product does not exist.
///
/// The caller must ensure that the update is not empty.
pub async fn update_product(
    id: ProductId,
    update: ProductUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, CatalogApiError> {
    let mut builder = QueryBuilder::new("UPDATE products SET updated_at = CURRENT_TIMESTAMP, ");
    let mut set_clause = builder.separated(", ");
    if let Some(name) = update.name {
        set_clause.push("name = ");
        set_clause.push_bind_unseparated(name);
    }
    if let Some(description) = update.description {
        set_clause.push("description = ");
        set_clause.push_bind_unseparated(description);
    }
    if let Some(price) = update.price {
        set_clause.push("price = ");
        set_clause.push_bind_unseparated(price);
    }
    if let Some(currency) = update.currency {
        set_clause.push("currency = ");
        set_clause.push_bind_unseparated(currency);
    }
    if let Some(stock) = update.stock {
        set_clause.push("stock = ");
        set_clause.push_bind_unseparated(stock);
    }
    if let Some(images) = update.images {
        set_clause.push("images = ");
        set_clause.push_bind_unseparated(Json(images));
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING *");
    trace!("🗃️ Executing query: {}", builder.sql());
    let product = builder
        .build_query_as::<Product>()
        .fetch_optional(conn)
        .await
        .map_err(|e| map_write_error(e, &id.to_string()))?;
    Ok(product)
}

/// Deletes the product. Returns `false` if there was no such product.
///
/// Line items of historical orders reference their product, so deleting a product that has been ordered fails with
/// [`CatalogApiError::ProductInUse`].
pub async fn delete_product(id: ProductId, conn: &mut SqliteConnection) -> Result<bool, CatalogApiError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(conn).await.map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => CatalogApiError::ProductInUse(id),
        _ => CatalogApiError::from(e),
    })?;
    Ok(result.rows_affected() > 0)
}

/// Atomically removes `quantity` units from the product's stock, if and only if at least that many are available.
///
/// This is a single conditional `UPDATE`, so concurrent callers can never take the stock below zero, and no explicit
/// locks are needed. Returns `false` if no row was updated, meaning the product has too little stock or does not exist.
///
/// When called inside a transaction, the decrement is undone if the transaction rolls back.
pub async fn decrement_stock(
    id: ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE products SET stock = stock - $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND stock >= $1",
    )
    .bind(quantity)
    .bind(id)
    .execute(conn)
    .await?;
    let reserved = result.rows_affected() == 1;
    trace!("🗃️ Stock decrement of {quantity} for {id}: {}", if reserved { "reserved" } else { "refused" });
    Ok(reserved)
}
