use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sf_common::Cents;
use storefront_engine::{
    db_types::{ProductId, User},
    traits::{PageParams, Pagination, ProductQueryFilter, ProductSort},
};

use crate::errors::ServerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

//----------------------------------------------   Auth  ----------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime of the token, in seconds
    pub expires_in: i64,
}

impl AccessToken {
    pub fn bearer(access_token: String, expires_in: i64) -> Self {
        Self { access_token, token_type: "Bearer".to_string(), expires_in }
    }
}

/// The public view of a user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id.value(),
            email: user.email,
            full_name: user.full_name,
            role: user.role.to_string(),
            created_at: user.created_at,
        }
    }
}

//----------------------------------------------   Cart  ----------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

//----------------------------------------------   Orders  ----------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub shipping_address: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

//----------------------------------------------   Products  ----------------------------------------------------
/// Query parameters for the product listing. Prices are in minor units.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductSearchParams {
    pub q: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl TryFrom<ProductSearchParams> for ProductQueryFilter {
    type Error = ServerError;

    fn try_from(params: ProductSearchParams) -> Result<Self, Self::Error> {
        let sort = match params.sort.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => s.parse::<ProductSort>().map_err(|e| ServerError::InvalidQuery(e.to_string()))?,
            None => ProductSort::default(),
        };
        let pagination = Pagination::from(PageParams { page: params.page, size: params.size });
        let mut filter = ProductQueryFilter::default().with_sort(sort).with_pagination(pagination);
        if let Some(q) = params.q {
            filter = filter.with_search(q);
        }
        if let Some(min) = params.min_price {
            filter = filter.with_min_price(Cents::from(min));
        }
        if let Some(max) = params.max_price {
            filter = filter.with_max_price(Cents::from(max));
        }
        Ok(filter)
    }
}
