use thiserror::Error;

use crate::db_types::{CartItem, CartItemId, CartLine, ProductId, UserId};

#[derive(Debug, Clone, Error)]
pub enum CartApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("Insufficient stock for {product_id}. Requested {requested}, but only {available} available")]
    InsufficientStock { product_id: ProductId, requested: i64, available: i64 },
    #[error("Quantity must be at least 1, but was {0}")]
    InvalidQuantity(i64),
    #[error("The cart item {0} does not exist")]
    CartItemNotFound(CartItemId),
    #[error("The cart total is too large to represent")]
    TotalOverflow,
}

impl From<sqlx::Error> for CartApiError {
    fn from(e: sqlx::Error) -> Self {
        CartApiError::DatabaseError(e.to_string())
    }
}

/// Backend behaviour for maintaining per-user shopping carts.
#[allow(async_fn_in_trait)]
pub trait CartManagement {
    /// Reads the user's cart, joined with the current state of each product, ordered by cart item id.
    async fn fetch_cart_lines(&self, user_id: UserId) -> Result<Vec<CartLine>, CartApiError>;

    /// Puts `quantity` units of the product in the user's cart. If the product is already in the cart, its quantity
    /// is replaced, not added to.
    ///
    /// The product must exist and currently have at least `quantity` units in stock. This check is advisory only;
    /// stock is reserved when the order is placed.
    async fn upsert_cart_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartItem, CartApiError>;

    /// Removes the item from the user's cart. Returns `false` if the user has no such item.
    async fn remove_cart_item(&self, user_id: UserId, item_id: CartItemId) -> Result<bool, CartApiError>;

    /// Empties the user's cart, returning the number of items removed.
    async fn clear_cart(&self, user_id: UserId) -> Result<u64, CartApiError>;
}
