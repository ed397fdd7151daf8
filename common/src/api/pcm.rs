//! Client for the PostcardMania (PCM) design and print API.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use mongodb::bson::oid::ObjectId;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    config::PcmConfig,
    entities::{
        address::{Address, Recipient},
        order::{BrochureFold, DesignType, Order},
        product::{MailClass, ProductType},
    },
    error::{self, AddCode},
};

use super::{
    first_string,
    token_cache::{CachedToken, TokenCache},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PcmAddress {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl From<&Address> for PcmAddress {
    fn from(address: &Address) -> Self {
        Self {
            first_name: address.first_name.clone(),
            last_name: address.last_name.clone(),
            company: address.company.clone(),
            address: address.address1.clone(),
            address2: address.address2.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            zip_code: address.zip_code.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PcmVariable {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PcmRecipient {
    #[serde(flatten)]
    pub address: PcmAddress,
    #[serde(rename = "extRefNbr", skip_serializing_if = "Option::is_none")]
    pub ext_ref_nbr: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub variables: Vec<PcmVariable>,
}

impl From<&Recipient> for PcmRecipient {
    fn from(recipient: &Recipient) -> Self {
        Self {
            address: PcmAddress {
                first_name: recipient.first_name.clone(),
                last_name: recipient.last_name.clone(),
                company: recipient.company.clone(),
                address: recipient.address1.clone(),
                address2: recipient.address2.clone(),
                city: recipient.city.clone(),
                state: recipient.state.clone(),
                zip_code: recipient.zip_code.clone(),
            },
            ext_ref_nbr: recipient.external_reference.clone(),
            variables: recipient
                .variables
                .iter()
                .map(|(key, value)| PcmVariable {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PcmOrderRequest {
    #[serde(rename = "extRefNbr")]
    pub ext_ref_nbr: String,
    pub mail_class: MailClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail_date: Option<NaiveDate>,
    pub design_type: DesignType,
    #[serde(rename = "designID", skip_serializing_if = "Option::is_none")]
    pub design_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub front: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brochure_fold: Option<BrochureFold>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_address: Option<PcmAddress>,
    pub recipients: Vec<PcmRecipient>,
}

impl PcmOrderRequest {
    pub fn from_order(order: &Order<ObjectId>, idempotency_key: &str) -> Self {
        Self {
            ext_ref_nbr: order
                .external_reference
                .clone()
                .unwrap_or_else(|| idempotency_key.to_string()),
            mail_class: order.mail_class,
            mail_date: order.mail_date,
            design_type: order.design_type,
            design_id: order.design_id.clone(),
            size: order.design_size.clone(),
            front: order
                .custom_design_url
                .clone()
                .filter(|_| order.is_custom_design),
            brochure_fold: order.brochure_fold,
            return_address: order.return_address.as_ref().map(PcmAddress::from),
            recipients: order.recipients.iter().map(PcmRecipient::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PcmOrderResponse {
    pub order_id: Option<String>,
    pub raw: Value,
}

impl PcmOrderResponse {
    pub fn from_value(raw: Value) -> Self {
        let order_id = first_string(&raw, &["orderID", "orderId", "id"]).or_else(|| {
            raw.get("order")
                .and_then(|o| first_string(o, &["orderID", "orderId", "id"]))
        });
        Self { order_id, raw }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddressingPreferences {
    pub font: String,
    pub font_color: String,
}

impl Default for AddressingPreferences {
    fn default() -> Self {
        Self {
            font: "Arial".to_string(),
            font_color: "#000000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofKind {
    Postcard,
    Letter,
}

impl ProofKind {
    fn path(&self) -> &'static str {
        match self {
            ProofKind::Postcard => "/order/postcard/proof",
            ProofKind::Letter => "/order/letter/proof",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProofRequest {
    pub size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_format: Option<String>,
    pub mail_class: MailClass,
    #[serde(rename = "designID", skip_serializing_if = "Option::is_none")]
    pub design_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub front: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter: Option<String>,
    pub addressing: AddressingPreferences,
    pub recipient: PcmRecipient,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_address: Option<PcmAddress>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProofUrls {
    pub front: Option<String>,
    pub back: Option<String>,
}

impl ProofUrls {
    pub fn from_value(raw: &Value) -> Self {
        Self {
            front: first_string(
                raw,
                &["front", "frontProof", "proofFront", "frontUrl", "pdf", "url"],
            ),
            back: first_string(raw, &["back", "backProof", "proofBack", "backUrl"]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    Admin,
    Personalize,
}

#[async_trait]
pub trait PrintApi: Send + Sync {
    async fn create_order(
        &self,
        product: ProductType,
        order: &PcmOrderRequest,
        idempotency_key: &str,
    ) -> error::Result<PcmOrderResponse>;

    async fn generate_proof(&self, kind: ProofKind, request: &ProofRequest)
        -> error::Result<ProofUrls>;

    async fn delete_design(&self, design_id: &str) -> error::Result<()>;

    async fn editor_url(&self, design_id: &str, mode: EditorMode) -> error::Result<String>;
}

pub type PrintApiObject = Arc<dyn PrintApi>;

pub struct PcmClient {
    client: reqwest::Client,
    config: PcmConfig,
    tokens: TokenCache,
}

impl PcmClient {
    pub fn new(client: reqwest::Client, config: PcmConfig) -> Self {
        Self {
            client,
            config,
            tokens: TokenCache::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn login(&self) -> error::Result<CachedToken> {
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({
                "username": self.config.username,
                "password": self.config.password,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "PCM authentication failed with status {}",
                response.status()
            )
            .code(500));
        }

        let body: Value = response.json().await?;
        let token = first_string(&body, &["token", "accessToken", "access_token"])
            .ok_or_else(|| anyhow::anyhow!("PCM login response has no token").code(500))?;

        let now = Utc::now().timestamp();
        let expires_at = match body.get("expires").and_then(Value::as_i64) {
            // milliseconds
            Some(expires) if expires > 100_000_000_000 => expires / 1000,
            Some(expires) => expires,
            None => body
                .get("expiresIn")
                .or_else(|| body.get("expires_in"))
                .and_then(Value::as_i64)
                .map(|secs| now + secs)
                .unwrap_or(now + 3600),
        };

        log::info!("Authenticated against PCM API");
        Ok(CachedToken { token, expires_at })
    }

    async fn attempt(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
        idempotency_key: Option<&str>,
    ) -> error::Result<reqwest::Response> {
        let token = self.tokens.get(|| self.login()).await?;

        let mut request = self
            .client
            .request(method.clone(), self.url(path))
            .bearer_auth(token);
        if let Some(key) = idempotency_key {
            request = request.header("Idempotency-Key", key);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    /// Sends an authenticated request. A 401 drops the cached token and the request is
    /// repeated once with a fresh login and the same idempotency key.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        idempotency_key: Option<&str>,
    ) -> error::Result<Value> {
        let mut response = self
            .attempt(&method, path, body.as_ref(), idempotency_key)
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            log::warn!(
                "PCM rejected the cached token on {} {}, logging in again",
                method,
                path
            );
            self.tokens.invalidate().await;
            response = self
                .attempt(&method, path, body.as_ref(), idempotency_key)
                .await?;
        }

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.tokens.invalidate().await;
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "PCM {} {} failed with status {}: {}",
                method,
                path,
                status,
                text
            )
            .code(500));
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl PrintApi for PcmClient {
    async fn create_order(
        &self,
        product: ProductType,
        order: &PcmOrderRequest,
        idempotency_key: &str,
    ) -> error::Result<PcmOrderResponse> {
        let path = format!("/order/{}", product.as_str());
        let raw = self
            .send(
                Method::POST,
                &path,
                Some(serde_json::to_value(order)?),
                Some(idempotency_key),
            )
            .await?;
        Ok(PcmOrderResponse::from_value(raw))
    }

    async fn generate_proof(
        &self,
        kind: ProofKind,
        request: &ProofRequest,
    ) -> error::Result<ProofUrls> {
        let raw = self
            .send(
                Method::POST,
                kind.path(),
                Some(serde_json::to_value(request)?),
                None,
            )
            .await?;
        Ok(ProofUrls::from_value(&raw))
    }

    async fn delete_design(&self, design_id: &str) -> error::Result<()> {
        self.send(Method::DELETE, &format!("/design/{}", design_id), None, None)
            .await?;
        Ok(())
    }

    async fn editor_url(&self, design_id: &str, mode: EditorMode) -> error::Result<String> {
        let raw = self
            .send(
                Method::POST,
                &format!("/design/{}/editor", design_id),
                Some(json!({ "mode": mode })),
                None,
            )
            .await?;

        first_string(&raw, &["url", "editorURL", "editorUrl"])
            .ok_or_else(|| anyhow::anyhow!("PCM editor response has no url").code(500))
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::BTreeMap,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
    };

    use actix_web::{dev::ServerHandle, web, App, HttpRequest, HttpResponse, HttpServer};

    use super::*;
    use crate::entities::order::OrderStatus;

    fn order() -> Order<ObjectId> {
        let mut variables = BTreeMap::new();
        variables.insert("coupon".to_string(), "SPRING10".to_string());

        Order {
            id: ObjectId::new(),
            design_type: DesignType::Single,
            design_id: Some("4412".to_string()),
            design_name: Some("Spring Sale".to_string()),
            design_size: Some("68".to_string()),
            product_type: ProductType::Postcard,
            is_custom_design: false,
            custom_design_url: Some("http://localhost/uploads/x.pdf".to_string()),
            mail_class: MailClass::Standard,
            mail_date: NaiveDate::from_ymd_opt(2024, 5, 1),
            brochure_fold: None,
            return_address: Some(Address {
                first_name: "Acme".to_string(),
                address1: "1 Main St".to_string(),
                city: "Tampa".to_string(),
                state: "FL".to_string(),
                zip_code: "33601".to_string(),
                ..Default::default()
            }),
            recipients: vec![Recipient {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                address1: "12 Analytical St".to_string(),
                address2: Some("Apt 2".to_string()),
                city: "Clearwater".to_string(),
                state: "FL".to_string(),
                zip_code: "33755".to_string(),
                external_reference: Some("R-1".to_string()),
                variables,
                ..Default::default()
            }],
            status: OrderStatus::PendingAdminApproval,
            external_reference: None,
            pcm_order_id: None,
            pcm_response: None,
            payment: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn order_is_flattened_to_pcm_names() {
        let request = PcmOrderRequest::from_order(&order(), "approve-1");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["extRefNbr"], "approve-1");
        assert_eq!(value["designID"], "4412");
        assert_eq!(value["mailClass"], "Standard");
        assert_eq!(value["mailDate"], "2024-05-01");
        assert_eq!(value["designType"], "single");
        assert_eq!(value["returnAddress"]["address"], "1 Main St");
        assert!(value.get("front").is_none());

        let recipient = &value["recipients"][0];
        assert_eq!(recipient["firstName"], "Ada");
        assert_eq!(recipient["address"], "12 Analytical St");
        assert_eq!(recipient["address2"], "Apt 2");
        assert_eq!(recipient["zipCode"], "33755");
        assert_eq!(recipient["extRefNbr"], "R-1");
        assert_eq!(
            recipient["variables"],
            json!([{ "key": "coupon", "value": "SPRING10" }])
        );
        assert!(recipient.get("address1").is_none());
    }

    #[test]
    fn external_reference_wins_over_key() {
        let mut order = order();
        order.external_reference = Some("CRM-77".to_string());
        order.is_custom_design = true;
        let request = PcmOrderRequest::from_order(&order, "approve-1");
        assert_eq!(request.ext_ref_nbr, "CRM-77");
        assert_eq!(request.front.as_deref(), Some("http://localhost/uploads/x.pdf"));
    }

    #[test]
    fn response_fields_are_found() {
        let response = PcmOrderResponse::from_value(json!({ "orderID": 991, "status": "ok" }));
        assert_eq!(response.order_id.as_deref(), Some("991"));

        let proof = ProofUrls::from_value(&json!({ "frontProof": "f.png", "backProof": "b.png" }));
        assert_eq!(proof.front.as_deref(), Some("f.png"));
        assert_eq!(proof.back.as_deref(), Some("b.png"));
    }

    /// Fake PCM that rejects every token issued before `accept_from`.
    #[derive(Default)]
    struct FakePcm {
        logins: AtomicUsize,
        accept_from: usize,
        keys: Mutex<Vec<String>>,
    }

    async fn fake_login(pcm: web::Data<FakePcm>) -> HttpResponse {
        let n = pcm.logins.fetch_add(1, Ordering::SeqCst) + 1;
        HttpResponse::Ok().json(json!({ "token": format!("token-{}", n), "expiresIn": 3600 }))
    }

    async fn fake_order(pcm: web::Data<FakePcm>, req: HttpRequest) -> HttpResponse {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };
        pcm.keys.lock().unwrap().push(header("Idempotency-Key"));

        let issued: usize = header("Authorization")
            .trim_start_matches("Bearer token-")
            .parse()
            .unwrap_or(0);
        if issued < pcm.accept_from {
            return HttpResponse::Unauthorized().finish();
        }
        HttpResponse::Ok().json(json!({ "orderID": "pcm-42" }))
    }

    async fn fake_pcm(accept_from: usize) -> (PcmClient, web::Data<FakePcm>, ServerHandle) {
        let pcm = web::Data::new(FakePcm {
            accept_from,
            ..Default::default()
        });
        let data = pcm.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .route("/auth/login", web::post().to(fake_login))
                .route("/order/postcard", web::post().to(fake_order))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let base_url = format!("http://{}", server.addrs()[0]);
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        let client = PcmClient::new(
            reqwest::Client::new(),
            PcmConfig {
                base_url,
                username: "user".to_string(),
                password: "pass".to_string(),
            },
        );
        (client, pcm, handle)
    }

    #[actix_web::test]
    async fn expired_token_is_renewed_once() {
        let (client, pcm, handle) = fake_pcm(2).await;

        let request = PcmOrderRequest::from_order(&order(), "approve-1");
        let response = client
            .create_order(ProductType::Postcard, &request, "approve-1")
            .await
            .unwrap();
        assert_eq!(response.order_id.as_deref(), Some("pcm-42"));
        assert_eq!(pcm.logins.load(Ordering::SeqCst), 2);
        assert_eq!(*pcm.keys.lock().unwrap(), ["approve-1", "approve-1"]);

        handle.stop(false).await;
    }

    #[actix_web::test]
    async fn repeated_401_is_an_error() {
        let (client, pcm, handle) = fake_pcm(usize::MAX).await;

        let request = PcmOrderRequest::from_order(&order(), "approve-1");
        let err = client
            .create_order(ProductType::Postcard, &request, "approve-1")
            .await
            .unwrap_err();
        assert_eq!(err.code, 500);
        assert_eq!(pcm.logins.load(Ordering::SeqCst), 2);
        assert_eq!(pcm.keys.lock().unwrap().len(), 2);

        handle.stop(false).await;
    }
}
