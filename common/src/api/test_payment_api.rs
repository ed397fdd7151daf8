use std::sync::Mutex;

use async_trait::async_trait;

use crate::error;

use super::paypal::{Capture, CheckoutOrder, PaymentApi};

/// Payment API double. Created orders are kept so captures can report their amount and reference.
#[derive(Default)]
pub struct TestPaymentApi {
    pub orders: Mutex<Vec<(String, f64, String)>>,
}

impl TestPaymentApi {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentApi for TestPaymentApi {
    async fn create_order(&self, amount: f64, reference: &str) -> error::Result<CheckoutOrder> {
        let mut orders = self.orders.lock().unwrap();
        let id = format!("PAYPAL-{}", orders.len() + 1);
        orders.push((id.clone(), amount, reference.to_string()));

        Ok(CheckoutOrder {
            approve_url: Some(format!("https://paypal.test/approve/{}", id)),
            id,
            status: "CREATED".to_string(),
        })
    }

    async fn capture_order(&self, paypal_order_id: &str) -> error::Result<Capture> {
        let orders = self.orders.lock().unwrap();
        let Some((id, amount, reference)) = orders.iter().find(|(id, _, _)| id == paypal_order_id)
        else {
            return Err(anyhow::anyhow!("PayPal order {} not found", paypal_order_id).into());
        };

        Ok(Capture {
            id: id.clone(),
            status: "COMPLETED".to_string(),
            amount: *amount,
            reference_id: Some(reference.clone()),
        })
    }
}
