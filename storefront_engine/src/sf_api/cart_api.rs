use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{CartItemId, ProductId, UserId},
    sf_api::cart_objects::CartView,
    traits::{CartApiError, CartManagement},
};

/// `CartApi` manages each user's shopping cart. Carts are private to their user, so every method takes the id of the
/// user acting on the cart.
pub struct CartApi<B> {
    db: B,
}

impl<B> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi")
    }
}

impl<B> CartApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> CartApi<B>
where B: CartManagement
{
    /// Sets the quantity of the product in the user's cart and returns the updated cart.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartView, CartApiError> {
        if quantity < 1 {
            return Err(CartApiError::InvalidQuantity(quantity));
        }
        let item = self.db.upsert_cart_item(user_id, product_id, quantity).await?;
        debug!("🛒 {user_id} now has {} x {product_id} in their cart ({})", item.quantity, item.id);
        self.cart(user_id).await
    }

    pub async fn cart(&self, user_id: UserId) -> Result<CartView, CartApiError> {
        let lines = self.db.fetch_cart_lines(user_id).await?;
        CartView::try_from(lines).map_err(|e| {
            warn!("🛒 Could not total the cart of {user_id}. {e}");
            e
        })
    }

    pub async fn remove_item(&self, user_id: UserId, item_id: CartItemId) -> Result<(), CartApiError> {
        if !self.db.remove_cart_item(user_id, item_id).await? {
            return Err(CartApiError::CartItemNotFound(item_id));
        }
        debug!("🛒 {item_id} removed from the cart of {user_id}");
        Ok(())
    }

    /// Empties the cart, returning how many items were removed.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, CartApiError> {
        let count = self.db.clear_cart(user_id).await?;
        debug!("🛒 Cleared {count} items from the cart of {user_id}");
        Ok(count)
    }
}
