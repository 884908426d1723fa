use serde_json::Value;
use thiserror::Error;

use crate::{
    db_types::{CartLine, Order, OrderId, OrderStatusType, OrderWithItems, PaymentInfo, ProductId, UserId},
    traits::{
        data_objects::{OrderPage, Pagination},
        CartApiError,
    },
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The cart is empty")]
    EmptyCart,
    #[error("Insufficient stock for {name} ({product_id})")]
    InsufficientStock { product_id: ProductId, name: String },
    #[error("The cart contains products priced in more than one currency: {}", .0.join(", "))]
    MixedCurrencies(Vec<String>),
    #[error("The order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The order {0} belongs to another user")]
    NotOrderOwner(OrderId),
    #[error("Invalid order status: {0}")]
    InvalidStatus(String),
    #[error("The order {0} has already been paid")]
    OrderAlreadyPaid(OrderId),
    #[error("Invalid shipping address: {0}")]
    InvalidShippingAddress(String),
    #[error("The order total is too large to represent")]
    TotalOverflow,
    #[error("The cart changed while the order was being placed. Please review the cart and try again")]
    CartChanged,
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}

impl From<CartApiError> for OrderFlowError {
    fn from(e: CartApiError) -> Self {
        match e {
            CartApiError::DatabaseError(s) => OrderFlowError::DatabaseError(s),
            other => OrderFlowError::DatabaseError(format!("Could not read the cart. {other}")),
        }
    }
}

impl OrderFlowError {
    /// Client-correctable errors are the result of the request or the current state of the store, and retrying the
    /// same request will not help.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, OrderFlowError::DatabaseError(_))
    }
}

/// Backend behaviour for placing and tracking orders.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Converts the cart snapshot `lines` into an order for `user_id` in a single atomic transaction:
    ///
    /// * every line's stock is reserved with a conditional decrement, which fails the whole transaction with
    ///   [`OrderFlowError::InsufficientStock`] if the product no longer has enough stock (or no longer exists),
    /// * the order is stored with status `pending` and the sum of `unit_price * quantity` over the lines as its total,
    /// * the line items are stored with the unit prices captured in the snapshot,
    /// * the cart items the snapshot was read from are removed from the cart. If none of them are left, a concurrent
    ///   placement has already consumed the cart and [`OrderFlowError::EmptyCart`] is returned. If only some of them
    ///   are left unchanged, the cart was edited after the snapshot was taken and [`OrderFlowError::CartChanged`] is
    ///   returned. Items added to the cart after the snapshot stay in the cart.
    ///
    /// If any step fails, nothing is changed. On success, the new order is returned with its line items.
    async fn place_order(
        &self,
        user_id: UserId,
        lines: &[CartLine],
        shipping_address: Value,
    ) -> Result<OrderWithItems, OrderFlowError>;

    async fn fetch_order(&self, id: OrderId) -> Result<Option<OrderWithItems>, OrderFlowError>;

    /// Returns a page of the user's orders, newest first, with the total number of orders the user has.
    async fn fetch_orders_for_user(&self, user_id: UserId, pagination: Pagination) -> Result<OrderPage, OrderFlowError>;

    /// Returns a page of all orders, newest first, with the total number of orders in the store.
    async fn fetch_all_orders(&self, pagination: Pagination) -> Result<OrderPage, OrderFlowError>;

    /// Sets the order status. Returns `None` if the order does not exist.
    async fn update_order_status(&self, id: OrderId, status: OrderStatusType) -> Result<Option<Order>, OrderFlowError>;

    /// Marks the order as paid and records the payment details, but only if it is not already paid. Returns `None`
    /// if the order does not exist or was already paid.
    async fn mark_order_paid(&self, id: OrderId, payment: PaymentInfo) -> Result<Option<Order>, OrderFlowError>;
}
