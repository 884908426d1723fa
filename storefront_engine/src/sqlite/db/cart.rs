use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{CartItem, CartItemId, CartLine, ProductId, UserId};

/// Reads the user's cart joined with the current price, currency, stock and name of each product.
///
/// Lines are returned in the order they were first added to the cart.
pub async fn fetch_cart_lines(user_id: UserId, conn: &mut SqliteConnection) -> Result<Vec<CartLine>, sqlx::Error> {
    let lines = sqlx::query_as(
        r#"
            SELECT
                c.id AS item_id,
                c.product_id,
                p.sku,
                p.name,
                p.price AS unit_price,
                p.currency,
                p.stock,
                c.quantity
            FROM cart_items c
            JOIN products p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY c.id ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    Ok(lines)
}

/// Sets the quantity of the product in the user's cart, creating the cart item if necessary.
pub async fn upsert_cart_item(
    user_id: UserId,
    product_id: ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<CartItem, sqlx::Error> {
    let item: CartItem = sqlx::query_as(
        r#"
            INSERT INTO cart_items (user_id, product_id, quantity) VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = excluded.quantity, updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Cart item {} for {user_id} now holds {quantity} of {product_id}", item.id);
    Ok(item)
}

/// Deletes the cart item, but only if it belongs to `user_id`.
pub async fn remove_cart_item(
    user_id: UserId,
    item_id: CartItemId,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
        .bind(item_id)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Deletes every item in the user's cart and returns the number of items deleted.
pub async fn clear_cart(user_id: UserId, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1").bind(user_id).execute(conn).await?;
    trace!("🗃️ Cleared {} items from the cart of {user_id}", result.rows_affected());
    Ok(result.rows_affected())
}

/// Deletes the cart items that `lines` were read from, provided each one still holds the quantity it held when the
/// snapshot was taken. Items added or changed since then are left alone.
///
/// Returns the number of items deleted. This is less than `lines.len()` if the cart changed after the snapshot.
pub async fn remove_ordered_items(
    user_id: UserId,
    lines: &[CartLine],
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let mut removed = 0;
    for line in lines {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2 AND quantity = $3")
            .bind(line.item_id)
            .bind(user_id)
            .bind(line.quantity)
            .execute(&mut *conn)
            .await?;
        removed += result.rows_affected();
    }
    trace!("🗃️ Removed {removed} of {} ordered items from the cart of {user_id}", lines.len());
    Ok(removed)
}
