use std::fmt;

use common::{
    api::pcm::{ProofKind, ProofUrls},
    entities::{
        address::Recipient,
        admin_user::{Login, PublicAdmin, Token},
        order::{Order, OrderConfigChange, OrderStatus, Quote, RecipientBatch},
        price::PriceTable,
        template::{ProofInput, Template},
        upload::Upload,
    },
};
use reqwest::{
    multipart::{Form, Part},
    Method, RequestBuilder,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// Non-success answer of the backend, carrying its `{error}` message.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.status)
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    pub fn from_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| {
                if body.is_empty() {
                    "Request failed".to_string()
                } else {
                    body.to_string()
                }
            });

        Self { status, message }
    }

    pub fn is_unauthorized(err: &anyhow::Error) -> bool {
        err.downcast_ref::<ApiError>()
            .map_or(false, |e| e.status == 401)
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            token: None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url.trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> anyhow::Result<T> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = ApiError::from_body(status.as_u16(), &body);
            log::warn!("Backend request failed: {}", err);
            return Err(err.into());
        }

        Ok(response.json::<T>().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        self.send(self.request(Method::GET, path)).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> anyhow::Result<T> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        self.send(self.request(Method::POST, path)).await
    }

    /// Logs in and keeps the token for later admin calls.
    pub async fn login(&mut self, username: &str, password: &str) -> anyhow::Result<Token> {
        let login = Login {
            username: username.to_string(),
            password: password.to_string(),
        };
        let token: Token = self.post("/auth/login", &login).await?;
        self.token = Some(token.token.clone());
        Ok(token)
    }

    pub async fn me(&self) -> anyhow::Result<PublicAdmin> {
        self.get("/auth/me").await
    }

    pub async fn public_templates(&self) -> anyhow::Result<Vec<Template<String>>> {
        self.get("/templates/public").await
    }

    pub async fn prices(&self) -> anyhow::Result<PriceTable<String>> {
        self.get("/templates/prices").await
    }

    pub async fn proof(&self, kind: ProofKind, input: &ProofInput) -> anyhow::Result<ProofUrls> {
        let path = match kind {
            ProofKind::Postcard => "/templates/proof",
            ProofKind::Letter => "/templates/proofletter",
        };
        self.post(path, input).await
    }

    /// Sends a custom letter design as the single `file` part.
    pub async fn upload_letter(&self, bytes: Vec<u8>, filename: &str) -> anyhow::Result<Upload> {
        let form = Form::new().part("file", Part::bytes(bytes).file_name(filename.to_string()));
        self.send(self.request(Method::POST, "/uploads/letter").multipart(form))
            .await
    }

    pub async fn create_order(&self, fields: &OrderConfigChange) -> anyhow::Result<Order<String>> {
        self.post("/orders", fields).await
    }

    pub async fn get_order(&self, id: &str) -> anyhow::Result<Order<String>> {
        self.get(&format!("/orders/{}", id)).await
    }

    pub async fn update_config(
        &self,
        id: &str,
        change: &OrderConfigChange,
    ) -> anyhow::Result<Order<String>> {
        self.send(
            self.request(Method::PUT, &format!("/orders/{}/config", id))
                .json(change),
        )
        .await
    }

    pub async fn add_recipients(
        &self,
        id: &str,
        recipients: Vec<Recipient>,
    ) -> anyhow::Result<Order<String>> {
        self.post(
            &format!("/orders/{}/recipients", id),
            &RecipientBatch { recipients },
        )
        .await
    }

    pub async fn submit(&self, id: &str) -> anyhow::Result<Order<String>> {
        self.post_empty(&format!("/orders/{}/submit", id)).await
    }

    pub async fn quote(&self, id: &str) -> anyhow::Result<Quote> {
        self.get(&format!("/orders/{}/quote", id)).await
    }

    pub async fn admin_orders(
        &self,
        status: Option<OrderStatus>,
    ) -> anyhow::Result<Vec<Order<String>>> {
        match status {
            Some(status) => {
                self.get(&format!("/admin/orders?status={}", status.as_str()))
                    .await
            }
            None => self.get("/admin/orders").await,
        }
    }

    pub async fn approve(&self, id: &str) -> anyhow::Result<Order<String>> {
        self.post_empty(&format!("/admin/orders/{}/approve", id))
            .await
    }

    pub async fn reject(&self, id: &str) -> anyhow::Result<Order<String>> {
        self.post_empty(&format!("/orders/{}/reject", id)).await
    }
}
