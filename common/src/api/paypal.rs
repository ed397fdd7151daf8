//! PayPal Orders v2 client used for checkout.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    config::PaypalConfig,
    error::{self, AddCode},
};

use super::{
    first_string,
    token_cache::{CachedToken, TokenCache},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOrder {
    pub id: String,
    pub status: String,
    pub approve_url: Option<String>,
}

impl CheckoutOrder {
    pub fn from_value(raw: &Value) -> error::Result<Self> {
        let id = first_string(raw, &["id"])
            .ok_or_else(|| anyhow::anyhow!("PayPal response has no order id").code(500))?;

        let approve_url = raw
            .get("links")
            .and_then(Value::as_array)
            .and_then(|links| {
                links.iter().find(|link| {
                    matches!(
                        link.get("rel").and_then(Value::as_str),
                        Some("approve") | Some("payer-action")
                    )
                })
            })
            .and_then(|link| first_string(link, &["href"]));

        Ok(Self {
            id,
            status: first_string(raw, &["status"]).unwrap_or_default(),
            approve_url,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Capture {
    pub id: String,
    pub status: String,
    pub amount: f64,
    /// Reference given to `create_order`, echoed back by PayPal.
    pub reference_id: Option<String>,
}

impl Capture {
    pub fn from_value(raw: &Value) -> error::Result<Self> {
        let id = first_string(raw, &["id"])
            .ok_or_else(|| anyhow::anyhow!("PayPal response has no order id").code(500))?;

        let amount = raw
            .pointer("/purchase_units/0/payments/captures/0/amount/value")
            .or_else(|| raw.pointer("/purchase_units/0/amount/value"))
            .and_then(|value| match value {
                Value::String(s) => s.parse().ok(),
                value => value.as_f64(),
            })
            .unwrap_or(0.0);

        Ok(Self {
            id,
            status: first_string(raw, &["status"]).unwrap_or_default(),
            amount,
            reference_id: raw
                .pointer("/purchase_units/0/reference_id")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

#[async_trait]
pub trait PaymentApi: Send + Sync {
    /// Creates a capture-intent order for `amount` US dollars.
    async fn create_order(&self, amount: f64, reference: &str) -> error::Result<CheckoutOrder>;
    async fn capture_order(&self, paypal_order_id: &str) -> error::Result<Capture>;
}

pub type PaymentApiObject = Arc<dyn PaymentApi>;

pub struct PaypalClient {
    client: reqwest::Client,
    config: PaypalConfig,
    tokens: TokenCache,
}

impl PaypalClient {
    pub fn new(client: reqwest::Client, config: PaypalConfig) -> Self {
        Self {
            client,
            config,
            tokens: TokenCache::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.mode.base_url(), path)
    }

    async fn login(&self) -> error::Result<CachedToken> {
        let response = self
            .client
            .post(self.url("/v1/oauth2/token"))
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "PayPal authentication failed with status {}",
                response.status()
            )
            .code(500));
        }

        let body: Value = response.json().await?;
        let token = first_string(&body, &["access_token"])
            .ok_or_else(|| anyhow::anyhow!("PayPal token response has no access_token").code(500))?;
        let expires_in = body
            .get("expires_in")
            .and_then(Value::as_i64)
            .unwrap_or(3600);

        Ok(CachedToken {
            token,
            expires_at: Utc::now().timestamp() + expires_in,
        })
    }

    async fn post(&self, path: &str, body: Value) -> error::Result<Value> {
        let token = self.tokens.get(|| self.login()).await?;
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.tokens.invalidate().await;
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(
                anyhow::anyhow!("PayPal {} failed with status {}: {}", path, status, text)
                    .code(500),
            );
        }

        Ok(response.json().await?)
    }
}

/// Order body for PayPal checkout, amount in USD with two decimals.
pub fn order_body(amount: f64, reference: &str) -> Value {
    json!({
        "intent": "CAPTURE",
        "purchase_units": [{
            "reference_id": reference,
            "amount": {
                "currency_code": "USD",
                "value": format!("{:.2}", amount),
            }
        }]
    })
}

#[async_trait]
impl PaymentApi for PaypalClient {
    async fn create_order(&self, amount: f64, reference: &str) -> error::Result<CheckoutOrder> {
        let raw = self
            .post("/v2/checkout/orders", order_body(amount, reference))
            .await?;
        CheckoutOrder::from_value(&raw)
    }

    async fn capture_order(&self, paypal_order_id: &str) -> error::Result<Capture> {
        let raw = self
            .post(
                &format!("/v2/checkout/orders/{}/capture", paypal_order_id),
                json!({}),
            )
            .await?;
        Capture::from_value(&raw)
    }
}
