use chrono::Utc;
use common::{
    api::paypal::PaymentApiObject,
    context::Context,
    entities::order::{Order, Payment},
    error::{self, AddCode},
};
use orders::service::order::OrderService;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTarget {
    pub order_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
    pub id: String,
    pub status: String,
    pub approve_url: Option<String>,
    pub amount: f64,
}

pub struct PaypalService {
    context: Context,
}

impl PaypalService {
    pub fn new(context: Context) -> Self {
        Self { context }
    }

    pub async fn create_checkout(&self, target: PaymentTarget) -> error::Result<Checkout> {
        let quote = OrderService::new(self.context.clone())
            .quote(&target.order_id)
            .await?;

        if quote.total <= 0.0 {
            return Err(anyhow::anyhow!("Order has nothing to pay for").code(400));
        }

        let paypal = self.context.try_get_manual::<PaymentApiObject>()?;
        let order = paypal.create_order(quote.total, &quote.order_id).await?;

        log::info!(
            "PayPal order {} created for order {} ({:.2} USD)",
            order.id,
            quote.order_id,
            quote.total
        );

        Ok(Checkout {
            id: order.id,
            status: order.status,
            approve_url: order.approve_url,
            amount: quote.total,
        })
    }

    /// Captures the PayPal order and records it on the stored order. The order status is left as is.
    /// The capture must carry this order's id as its reference.
    pub async fn capture(
        &self,
        paypal_order_id: &str,
        target: PaymentTarget,
    ) -> error::Result<Order<String>> {
        let orders = OrderService::new(self.context.clone());
        let mut order = orders.find_for_update(&target.order_id).await?;

        let paypal = self.context.try_get_manual::<PaymentApiObject>()?;
        let capture = paypal.capture_order(paypal_order_id).await?;

        let order_id = order.id.to_hex();
        if capture.reference_id.as_deref() != Some(order_id.as_str()) {
            log::warn!(
                "PayPal order {} belongs to {:?}, not to order {}",
                paypal_order_id,
                capture.reference_id,
                order_id
            );
            return Err(anyhow::anyhow!("Payment does not belong to this order").code(400));
        }

        order.payment = Some(Payment {
            provider: "paypal".to_string(),
            paypal_order_id: capture.id,
            status: capture.status,
            amount: capture.amount,
            captured_at: Utc::now().timestamp_micros(),
        });

        log::info!(
            "Payment {} captured for order {}",
            paypal_order_id,
            order.id
        );
        orders.store(order).await
    }
}
