use std::{collections::BTreeSet, fmt::Debug};

use log::*;
use serde_json::Value;

use crate::{
    db_types::{Order, OrderId, OrderStatusType, OrderWithItems, UserId},
    traits::{CartManagement, OrderFlowError, OrderManagement, OrderPage, Pagination},
};

/// `OrderFlowApi` is the primary API for turning carts into orders and for reading and managing orders afterwards.
pub struct OrderFlowApi<B> {
    db: B,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement + CartManagement
{
    /// Places an order for everything in the user's cart.
    ///
    /// The cart is read once. That snapshot fixes the line items, their quantities and their unit prices. Then stock is
    /// reserved, the order and its line items are stored, and the cart is cleared, all in one atomic transaction (see
    /// [`OrderManagement::place_order`]).
    ///
    /// Errors:
    /// * [`OrderFlowError::EmptyCart`] if the cart has no items (no transaction is started),
    /// * [`OrderFlowError::MixedCurrencies`] if the cart holds products priced in different currencies,
    /// * [`OrderFlowError::InsufficientStock`] naming the first product that could not be reserved,
    /// * [`OrderFlowError::InvalidShippingAddress`] if the address is not a JSON object.
    ///
    /// None of these are worth retrying, and none of them change any state.
    pub async fn place_order(&self, user_id: UserId, shipping_address: Value) -> Result<OrderWithItems, OrderFlowError> {
        if !shipping_address.is_object() {
            return Err(OrderFlowError::InvalidShippingAddress("The shipping address must be a JSON object".into()));
        }
        let lines = self.db.fetch_cart_lines(user_id).await?;
        if lines.is_empty() {
            debug!("📦️ {user_id} tried to place an order with an empty cart");
            return Err(OrderFlowError::EmptyCart);
        }
        let currencies = lines.iter().map(|l| l.currency.as_str()).collect::<BTreeSet<_>>();
        if currencies.len() > 1 {
            let currencies = currencies.into_iter().map(String::from).collect();
            return Err(OrderFlowError::MixedCurrencies(currencies));
        }
        trace!("📦️ Placing order for {user_id} from a cart of {} lines", lines.len());
        let order = self.db.place_order(user_id, &lines, shipping_address).await?;
        info!(
            "📦️ {} placed by {user_id} for {} {} ({} line items)",
            order.order.id,
            order.order.total,
            order.order.currency,
            order.items.len()
        );
        Ok(order)
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement
{
    /// Fetches the order with its line items on behalf of `user_id`.
    ///
    /// Returns [`OrderFlowError::OrderNotFound`] if there is no such order and [`OrderFlowError::NotOrderOwner`] if it
    /// belongs to someone else. Callers facing the public should not reveal the difference.
    pub async fn order_for_user(&self, order_id: OrderId, user_id: UserId) -> Result<OrderWithItems, OrderFlowError> {
        let order = self.order_by_id(order_id).await?;
        if order.order.user_id != user_id {
            warn!("📦️ {user_id} requested {order_id}, which belongs to {}", order.order.user_id);
            return Err(OrderFlowError::NotOrderOwner(order_id));
        }
        Ok(order)
    }

    /// Fetches any order with its line items, regardless of owner.
    pub async fn order_by_id(&self, order_id: OrderId) -> Result<OrderWithItems, OrderFlowError> {
        self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))
    }

    pub async fn orders_for_user(&self, user_id: UserId, pagination: Pagination) -> Result<OrderPage, OrderFlowError> {
        let page = self.db.fetch_orders_for_user(user_id, pagination).await?;
        trace!("📦️ Fetched {} of {} orders for {user_id}", page.items.len(), page.total);
        Ok(page)
    }

    pub async fn all_orders(&self, pagination: Pagination) -> Result<OrderPage, OrderFlowError> {
        let page = self.db.fetch_all_orders(pagination).await?;
        trace!("📦️ Fetched {} of {} orders", page.items.len(), page.total);
        Ok(page)
    }

    /// Sets the status of an order. `status` must be one of `pending`, `paid`, `shipped` or `cancelled`. Any status
    /// may be changed to any other.
    pub async fn update_order_status(&self, order_id: OrderId, status: &str) -> Result<Order, OrderFlowError> {
        let status = status.parse::<OrderStatusType>().map_err(|_| OrderFlowError::InvalidStatus(status.to_string()))?;
        let order =
            self.db.update_order_status(order_id, status).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        info!("📦️ {order_id} is now {status}");
        Ok(order)
    }
}
