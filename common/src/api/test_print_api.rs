use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use async_trait::async_trait;
use serde_json::json;

use crate::{
    entities::product::ProductType,
    error::{self, AddCode},
};

use super::pcm::{
    EditorMode, PcmOrderRequest, PcmOrderResponse, PrintApi, ProofKind, ProofRequest, ProofUrls,
};

#[derive(Debug, Clone, PartialEq)]
pub enum PrintCall {
    CreateOrder {
        product: ProductType,
        request: PcmOrderRequest,
        idempotency_key: String,
    },
    Proof {
        kind: ProofKind,
        request: ProofRequest,
    },
    DeleteDesign(String),
    Editor(String, EditorMode),
}

/// In-memory print API that records every call.
#[derive(Default)]
pub struct TestPrintApi {
    pub calls: Mutex<Vec<PrintCall>>,
    pub fail: AtomicBool,
}

impl TestPrintApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<PrintCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: PrintCall) -> error::Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("PCM is unavailable").code(500));
        }
        Ok(())
    }
}

#[async_trait]
impl PrintApi for TestPrintApi {
    async fn create_order(
        &self,
        product: ProductType,
        order: &PcmOrderRequest,
        idempotency_key: &str,
    ) -> error::Result<PcmOrderResponse> {
        self.record(PrintCall::CreateOrder {
            product,
            request: order.clone(),
            idempotency_key: idempotency_key.to_string(),
        })?;
        Ok(PcmOrderResponse::from_value(json!({
            "orderID": format!("pcm-{}", order.ext_ref_nbr),
            "status": "received",
        })))
    }

    async fn generate_proof(
        &self,
        kind: ProofKind,
        request: &ProofRequest,
    ) -> error::Result<ProofUrls> {
        self.record(PrintCall::Proof {
            kind,
            request: request.clone(),
        })?;
        Ok(ProofUrls {
            front: Some("https://proofs.test/front.png".to_string()),
            back: match kind {
                ProofKind::Postcard => Some("https://proofs.test/back.png".to_string()),
                ProofKind::Letter => None,
            },
        })
    }

    async fn delete_design(&self, design_id: &str) -> error::Result<()> {
        self.record(PrintCall::DeleteDesign(design_id.to_string()))
    }

    async fn editor_url(&self, design_id: &str, mode: EditorMode) -> error::Result<String> {
        self.record(PrintCall::Editor(design_id.to_string(), mode))?;
        Ok(format!("https://editor.test/{}", design_id))
    }
}
