use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db_types::OrderId;

fn default_payment_method() -> String {
    "card".to_string()
}

/// A request to charge a user for one of their orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeRequest {
    pub order_id: OrderId,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
    /// Card numbers, wallet tokens and the like. These are handed to the payment processor and never stored.
    #[serde(default)]
    pub payment_details: Option<Value>,
}

impl ChargeRequest {
    pub fn new(order_id: OrderId) -> Self {
        Self { order_id, payment_method: default_payment_method(), payment_details: None }
    }

    pub fn with_method<S: Into<String>>(mut self, method: S) -> Self {
        self.payment_method = method.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargeStatus {
    Success,
    Failed,
}

impl Display for ChargeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChargeStatus::Success => write!(f, "success"),
            ChargeStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeResult {
    pub order_id: OrderId,
    pub status: ChargeStatus,
    pub transaction_id: Option<String>,
    pub message: String,
}

impl ChargeResult {
    pub fn success(order_id: OrderId, transaction_id: String) -> Self {
        Self {
            order_id,
            status: ChargeStatus::Success,
            transaction_id: Some(transaction_id),
            message: "Payment processed successfully".into(),
        }
    }

    pub fn failed(order_id: OrderId) -> Self {
        Self {
            order_id,
            status: ChargeStatus::Failed,
            transaction_id: None,
            message: "Payment was declined by the processor".into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ChargeStatus::Success
    }
}
