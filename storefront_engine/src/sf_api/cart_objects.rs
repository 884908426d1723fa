use serde::{Deserialize, Serialize};
use sf_common::{Cents, DEFAULT_CURRENCY_CODE};

use crate::{
    db_types::{CartItemId, CartLine, ProductId},
    traits::CartApiError,
};

/// The product fields shown alongside a cart item. These reflect the product as it is now, and may differ from what
/// the user saw when the item was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartProduct {
    pub sku: String,
    pub name: String,
    pub price: Cents,
    pub currency: String,
    pub stock: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartViewItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub product: CartProduct,
    pub quantity: i64,
    pub subtotal: Cents,
}

/// A user's cart, with a subtotal for every item and the total of all of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartView {
    pub items: Vec<CartViewItem>,
    pub total: Cents,
    pub currency: String,
}

impl TryFrom<CartLine> for CartViewItem {
    type Error = CartApiError;

    fn try_from(line: CartLine) -> Result<Self, Self::Error> {
        let subtotal = line.subtotal().ok_or(CartApiError::TotalOverflow)?;
        Ok(Self {
            id: line.item_id,
            product_id: line.product_id,
            product: CartProduct {
                sku: line.sku,
                name: line.name,
                price: line.unit_price,
                currency: line.currency,
                stock: line.stock,
            },
            quantity: line.quantity,
            subtotal,
        })
    }
}

impl TryFrom<Vec<CartLine>> for CartView {
    type Error = CartApiError;

    fn try_from(lines: Vec<CartLine>) -> Result<Self, Self::Error> {
        let currency =
            lines.first().map(|l| l.currency.clone()).unwrap_or_else(|| DEFAULT_CURRENCY_CODE.to_string());
        let items = lines.into_iter().map(CartViewItem::try_from).collect::<Result<Vec<_>, _>>()?;
        let total = Cents::checked_sum(items.iter().map(|i| i.subtotal)).ok_or(CartApiError::TotalOverflow)?;
        Ok(Self { items, total, currency })
    }
}

impl CartView {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
