//! Data types that are stored in, and returned from, the storefront database.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sf_common::{Cents, DEFAULT_CURRENCY_CODE};
pub use sqlx::types::Json;
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

impl From<String> for ConversionError {
    fn from(value: String) -> Self {
        Self(value)
    }
}

macro_rules! id_type {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }

        impl $name {
            pub fn value(&self) -> i64 {
                self.0
            }
        }
    };
}

//--------------------------------------        Ids          ---------------------------------------------------------
id_type!(ProductId, "product #");
id_type!(CartItemId, "cart item #");
id_type!(OrderId, "order #");
id_type!(OrderItemId, "order item #");
id_type!(UserId, "user #");

//--------------------------------------       Role          ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

impl Role {
    /// The set of roles granted to an account whose stored role is `self`. Administrators can do everything a regular
    /// user can.
    pub fn granted_roles(&self) -> Vec<Role> {
        match self {
            Role::User => vec![Role::User],
            Role::Admin => vec![Role::User, Role::Admin],
        }
    }
}

//--------------------------------------       User          ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
}

//--------------------------------------      Product        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub description: String,
    pub price: Cents,
    pub currency: String,
    pub stock: i64,
    pub images: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Cents,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub images: Vec<String>,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY_CODE.to_string()
}

impl NewProduct {
    pub fn new<S: Into<String>>(sku: S, name: S, price: Cents, stock: i64) -> Self {
        Self {
            sku: sku.into(),
            name: name.into(),
            description: String::default(),
            price,
            currency: default_currency(),
            stock,
            images: Vec::new(),
        }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }
}

/// A partial update to a product. `None` fields are left unchanged. The SKU cannot be changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Cents>,
    pub currency: Option<String>,
    pub stock: Option<i64>,
    pub images: Option<Vec<String>>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.currency.is_none()
            && self.stock.is_none()
            && self.images.is_none()
    }

    pub fn with_price(mut self, price: Cents) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_stock(mut self, stock: i64) -> Self {
        self.stock = Some(stock);
        self
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }
}

//--------------------------------------     CartItem        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cart item together with the state of its product at the moment the cart was read. Order placement freezes
/// `unit_price` from this snapshot.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CartLine {
    pub item_id: CartItemId,
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub unit_price: Cents,
    pub currency: String,
    pub stock: i64,
    pub quantity: i64,
}

impl CartLine {
    /// `unit_price * quantity`, or `None` if that overflows.
    pub fn subtotal(&self) -> Option<Cents> {
        self.unit_price.checked_mul(self.quantity)
    }
}

//--------------------------------------   OrderStatusType   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// The order has been placed and stock has been reserved, but no payment has been taken.
    Pending,
    /// Payment for the order has been received.
    Paid,
    /// The order has been handed to the carrier.
    Shipped,
    /// The order has been cancelled by the user or an admin.
    Cancelled,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "pending"),
            OrderStatusType::Paid => write!(f, "paid"),
            OrderStatusType::Shipped => write!(f, "shipped"),
            OrderStatusType::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "shipped" => Ok(Self::Shipped),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total: Cents,
    pub currency: String,
    pub status: OrderStatusType,
    pub shipping_address: Json<Value>,
    pub payment_info: Option<Json<Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item of an order. `unit_price` is the price of the product when the order was placed. `product_name` and
/// `product_sku` reflect the product as it is now, and are `None` if the product record is gone.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub unit_price: Cents,
    pub quantity: i64,
    pub product_name: Option<String>,
    pub product_sku: Option<String>,
}

impl OrderItem {
    pub fn subtotal(&self) -> Option<Cents> {
        self.unit_price.checked_mul(self.quantity)
    }
}

/// A line item staged during order placement, before the order id is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub unit_price: Cents,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderWithItems {
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        Self { order, items }
    }

    /// The sum of the line item subtotals. For any order placed through the engine this equals `order.total`.
    pub fn items_total(&self) -> Option<Cents> {
        self.items.iter().map(OrderItem::subtotal).collect::<Option<Vec<_>>>().and_then(Cents::checked_sum)
    }
}

//--------------------------------------    PaymentInfo      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub method: String,
    pub transaction_id: String,
}
