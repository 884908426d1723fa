use std::collections::HashMap;

use log::{debug, trace};
use serde_json::Value;
use sf_common::Cents;
use sqlx::{types::Json, QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrderItem, Order, OrderId, OrderItem, OrderStatusType, OrderWithItems, PaymentInfo, UserId},
    traits::Pagination,
};

/// Inserts a new order with status `pending`. This is not atomic. Order placement embeds this call in the placement
/// transaction.
pub async fn insert_order(
    user_id: UserId,
    total: Cents,
    currency: &str,
    shipping_address: Value,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (user_id, total, currency, status, shipping_address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(total)
    .bind(currency)
    .bind(OrderStatusType::Pending)
    .bind(Json(shipping_address))
    .fetch_one(conn)
    .await?;
    debug!("🗃️ {} inserted for {user_id} with a total of {} {}", order.id, order.total, order.currency);
    Ok(order)
}

/// Inserts the staged line items for the order.
pub async fn insert_order_items(
    order_id: OrderId,
    items: &[NewOrderItem],
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    if items.is_empty() {
        return Ok(());
    }
    let mut builder = QueryBuilder::new("INSERT INTO order_items (order_id, product_id, unit_price, quantity) ");
    builder.push_values(items, |mut row, item| {
        row.push_bind(order_id).push_bind(item.product_id).push_bind(item.unit_price).push_bind(item.quantity);
    });
    builder.build().execute(conn).await?;
    trace!("🗃️ {} line items inserted for {order_id}", items.len());
    Ok(())
}

pub async fn fetch_order(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

/// Fetches the line items of all the given orders, with the current name and SKU of each product.
pub async fn fetch_items_for_orders(
    ids: &[OrderId],
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new(
        r#"
        SELECT
            oi.id,
            oi.order_id,
            oi.product_id,
            oi.unit_price,
            oi.quantity,
            p.name AS product_name,
            p.sku AS product_sku
        FROM order_items oi
        LEFT JOIN products p ON p.id = oi.product_id
        WHERE oi.order_id IN ("#,
    );
    let mut in_list = builder.separated(", ");
    for id in ids {
        in_list.push_bind(*id);
    }
    builder.push(") ORDER BY oi.order_id, oi.id");
    let items = builder.build_query_as::<OrderItem>().fetch_all(conn).await?;
    Ok(items)
}

/// Loads the line items for every order and pairs them up, preserving the order of `orders`.
pub async fn attach_items(
    orders: Vec<Order>,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderWithItems>, sqlx::Error> {
    let ids = orders.iter().map(|o| o.id).collect::<Vec<_>>();
    let mut items_by_order = fetch_items_for_orders(&ids, conn).await?.into_iter().fold(
        HashMap::<OrderId, Vec<OrderItem>>::new(),
        |mut map, item| {
            map.entry(item.order_id).or_default().push(item);
            map
        },
    );
    let result = orders
        .into_iter()
        .map(|order| {
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            OrderWithItems::new(order, items)
        })
        .collect();
    Ok(result)
}

pub async fn fetch_order_with_items(
    id: OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderWithItems>, sqlx::Error> {
    let Some(order) = fetch_order(id, &mut *conn).await? else {
        return Ok(None);
    };
    let items = fetch_items_for_orders(&[id], conn).await?;
    Ok(Some(OrderWithItems::new(order, items)))
}

/// Fetches one page of orders, newest first. If `user_id` is given, only that user's orders are considered.
///
/// Orders created in the same instant are ordered by descending id, so the ordering is total and consecutive pages
/// never overlap.
pub async fn fetch_orders(
    user_id: Option<UserId>,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders");
    if let Some(user_id) = user_id {
        builder.push(" WHERE user_id = ");
        builder.push_bind(user_id);
    }
    builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    builder.push_bind(pagination.size());
    builder.push(" OFFSET ");
    builder.push_bind(pagination.offset());
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    Ok(orders)
}

pub async fn count_orders(user_id: Option<UserId>, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM orders");
    if let Some(user_id) = user_id {
        builder.push(" WHERE user_id = ");
        builder.push_bind(user_id);
    }
    let count = builder.build_query_scalar::<i64>().fetch_one(conn).await?;
    Ok(count)
}

pub async fn update_order_status(
    id: OrderId,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(status)
            .bind(id)
            .fetch_optional(conn)
            .await?;
    Ok(order)
}

/// Sets the order status to `paid` and records the payment, unless the order is already paid.
/// Returns `None` when no row was updated.
pub async fn mark_order_paid(
    id: OrderId,
    payment: PaymentInfo,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET status = $1, payment_info = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $3 AND status != $1
            RETURNING *
        "#,
    )
    .bind(OrderStatusType::Paid)
    .bind(Json(payment))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}
