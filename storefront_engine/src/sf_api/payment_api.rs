use std::fmt::Debug;

use log::*;
use rand::Rng;

use crate::{
    db_types::{OrderStatusType, PaymentInfo, UserId},
    helpers::new_transaction_id,
    sf_api::payment_objects::{ChargeRequest, ChargeResult},
    traits::{OrderFlowError, OrderManagement},
};

pub const DEFAULT_PAYMENT_SUCCESS_RATE: f64 = 0.9;

/// `PaymentApi` takes payment for orders. There is no real payment processor behind it: a charge succeeds with a
/// fixed probability, and on success the order is marked as paid.
pub struct PaymentApi<B> {
    db: B,
    success_rate: f64,
}

impl<B> Debug for PaymentApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentApi (success rate {:.2})", self.success_rate)
    }
}

impl<B> PaymentApi<B> {
    pub fn new(db: B) -> Self {
        Self::with_success_rate(db, DEFAULT_PAYMENT_SUCCESS_RATE)
    }

    /// `success_rate` is clamped to `[0, 1]`. A rate of 1 means every charge succeeds and 0 means every charge fails.
    pub fn with_success_rate(db: B, success_rate: f64) -> Self {
        let success_rate = if success_rate.is_nan() { DEFAULT_PAYMENT_SUCCESS_RATE } else { success_rate.clamp(0.0, 1.0) };
        Self { db, success_rate }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }

    fn processor_approves(&self) -> bool {
        rand::thread_rng().gen_bool(self.success_rate)
    }
}

impl<B> PaymentApi<B>
where B: OrderManagement
{
    /// Charges `user_id` for the order in `request`.
    ///
    /// The order must exist and belong to the user, and must not already be paid. A declined charge is not an error:
    /// it returns a [`ChargeResult`] with a `failed` status and leaves the order untouched. Two concurrent charges for
    /// the same order cannot both succeed; the loser gets [`OrderFlowError::OrderAlreadyPaid`].
    pub async fn charge(&self, user_id: UserId, request: ChargeRequest) -> Result<ChargeResult, OrderFlowError> {
        let order_id = request.order_id;
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        if order.order.user_id != user_id {
            warn!("💳️ {user_id} tried to pay for {order_id}, which belongs to {}", order.order.user_id);
            return Err(OrderFlowError::NotOrderOwner(order_id));
        }
        if order.order.status == OrderStatusType::Paid {
            return Err(OrderFlowError::OrderAlreadyPaid(order_id));
        }
        if request.payment_details.is_some() {
            trace!("💳️ Payment details supplied for {order_id} are passed to the processor only");
        }
        if !self.processor_approves() {
            info!("💳️ Charge of {} {} for {order_id} was declined", order.order.total, order.order.currency);
            return Ok(ChargeResult::failed(order_id));
        }
        let transaction_id = new_transaction_id();
        let payment = PaymentInfo { method: request.payment_method.trim().to_string(), transaction_id };
        let paid =
            self.db.mark_order_paid(order_id, payment.clone()).await?.ok_or(OrderFlowError::OrderAlreadyPaid(order_id))?;
        info!(
            "💳️ {order_id} paid: {} {} by {} ({})",
            paid.total, paid.currency, payment.method, payment.transaction_id
        );
        Ok(ChargeResult::success(order_id, payment.transaction_id))
    }
}
