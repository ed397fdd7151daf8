use common::{
    api::pcm::{ProofKind, ProofUrls},
    entities::{
        address::Recipient,
        order::{Order, OrderConfigChange, OrderStatus},
        price::PriceTable,
        product::ProductType,
        template::{ProofInput, Template},
    },
    pricing::total_for,
};
use serde_json::json;

use crate::api::ApiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    Design,
    Configure,
    Recipients,
    Proof,
    Review,
    Submitted,
}

impl WizardStep {
    pub fn next(self) -> Option<WizardStep> {
        match self {
            WizardStep::Design => Some(WizardStep::Configure),
            WizardStep::Configure => Some(WizardStep::Recipients),
            WizardStep::Recipients => Some(WizardStep::Proof),
            WizardStep::Proof => Some(WizardStep::Review),
            WizardStep::Review | WizardStep::Submitted => None,
        }
    }

    pub fn previous(self) -> Option<WizardStep> {
        match self {
            WizardStep::Configure => Some(WizardStep::Design),
            WizardStep::Recipients => Some(WizardStep::Configure),
            WizardStep::Proof => Some(WizardStep::Recipients),
            WizardStep::Review => Some(WizardStep::Proof),
            WizardStep::Design | WizardStep::Submitted => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub quantity: u32,
    pub unit_price: f64,
    pub total: f64,
}

/// State of the order being built in the wizard.
///
/// The server copy of the order is replaced after every call; nothing here is
/// persisted locally.
pub struct OrderStore {
    api: ApiClient,
    step: WizardStep,
    order: Option<Order<String>>,
    template_id: Option<String>,
    proof: Option<ProofUrls>,
}

impl OrderStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            step: WizardStep::Design,
            order: None,
            template_id: None,
            proof: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn order(&self) -> Option<&Order<String>> {
        self.order.as_ref()
    }

    pub fn proof(&self) -> Option<&ProofUrls> {
        self.proof.as_ref()
    }

    pub fn can_advance(&self) -> bool {
        let Some(order) = &self.order else {
            return false;
        };

        match self.step {
            WizardStep::Design => {
                let has_design = if order.is_custom_design {
                    order.custom_design_url.is_some()
                } else {
                    order.design_id.is_some()
                };
                has_design && order.design_size.is_some()
            }
            WizardStep::Configure => order.mail_date.is_some() && order.return_address.is_some(),
            WizardStep::Recipients => !order.recipients.is_empty(),
            WizardStep::Proof => self.proof.as_ref().map_or(false, |p| p.front.is_some()),
            // leaving review happens through submit
            WizardStep::Review | WizardStep::Submitted => false,
        }
    }

    pub fn next(&mut self) -> anyhow::Result<WizardStep> {
        if !self.can_advance() {
            anyhow::bail!("Step {:?} is not complete", self.step);
        }
        if let Some(next) = self.step.next() {
            self.step = next;
        }
        Ok(self.step)
    }

    pub fn back(&mut self) -> WizardStep {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    pub fn reset(&mut self) {
        self.step = WizardStep::Design;
        self.order = None;
        self.template_id = None;
        self.proof = None;
    }

    /// Local total for the current recipient count. `None` until an order with a size exists.
    pub fn estimate<Id>(&self, table: &PriceTable<Id>) -> Option<Estimate> {
        let order = self.order.as_ref()?;
        let size = order.design_size.as_deref()?;
        let quantity = order.recipients.len() as u32;
        let unit_price = table.price_for(order.product_type, size, order.mail_class, quantity);

        Some(Estimate {
            quantity,
            unit_price,
            total: total_for(unit_price, quantity),
        })
    }

    async fn save(&mut self, change: OrderConfigChange) -> anyhow::Result<&Order<String>> {
        let order = match &self.order {
            Some(order) => self.api.update_config(&order.id, &change).await?,
            None => self.api.create_order(&change).await?,
        };
        // any change invalidates the last proof
        self.proof = None;
        Ok(self.order.insert(order))
    }

    pub async fn choose_template(
        &mut self,
        template: &Template<String>,
    ) -> anyhow::Result<&Order<String>> {
        self.template_id = Some(template.id.clone());
        self.save(OrderConfigChange {
            design_id: Some(Some(template.external_design_id.clone())),
            design_name: Some(Some(template.name.clone())),
            design_size: Some(Some(template.size.clone())),
            product_type: Some(template.product_type),
            is_custom_design: Some(false),
            custom_design_url: Some(None),
            ..Default::default()
        })
        .await
    }

    /// Uses an uploaded file instead of a template.
    pub async fn choose_upload(
        &mut self,
        url: String,
        size: String,
        product_type: ProductType,
    ) -> anyhow::Result<&Order<String>> {
        self.template_id = None;
        self.save(OrderConfigChange {
            design_id: Some(None),
            design_name: Some(None),
            design_size: Some(Some(size)),
            product_type: Some(product_type),
            is_custom_design: Some(true),
            custom_design_url: Some(Some(url)),
            ..Default::default()
        })
        .await
    }

    /// Uploads a letter design and uses it for the order.
    pub async fn upload_design(
        &mut self,
        bytes: Vec<u8>,
        filename: &str,
        size: String,
    ) -> anyhow::Result<&Order<String>> {
        let upload = self.api.upload_letter(bytes, filename).await?;
        log::info!("Uploaded {} as {}", filename, upload.url);
        self.choose_upload(upload.url, size, ProductType::Letter)
            .await
    }

    pub async fn configure(&mut self, change: OrderConfigChange) -> anyhow::Result<&Order<String>> {
        self.save(change).await
    }

    pub async fn add_recipients(
        &mut self,
        recipients: Vec<Recipient>,
    ) -> anyhow::Result<&Order<String>> {
        let Some(order) = &self.order else {
            anyhow::bail!("No order in progress");
        };

        for (idx, recipient) in recipients.iter().enumerate() {
            let missing = recipient.missing_fields();
            if !missing.is_empty() {
                anyhow::bail!("Recipient {} is missing {}", idx + 1, missing.join(", "));
            }
        }

        let order = self.api.add_recipients(&order.id, recipients).await?;
        self.proof = None;
        Ok(self.order.insert(order))
    }

    pub fn proof_input(&self) -> anyhow::Result<(ProofKind, ProofInput)> {
        let Some(order) = &self.order else {
            anyhow::bail!("No order in progress");
        };
        let Some(recipient) = order.recipients.first() else {
            anyhow::bail!("A proof needs at least one recipient");
        };
        let Some(size) = order.design_size.clone() else {
            anyhow::bail!("Choose a design size first");
        };

        let kind = match order.product_type {
            ProductType::Letter => ProofKind::Letter,
            _ => ProofKind::Postcard,
        };
        let custom_url = order
            .custom_design_url
            .clone()
            .filter(|_| order.is_custom_design);

        let (front, letter) = match kind {
            ProofKind::Postcard => (custom_url.map(|url| json!(url)), None),
            ProofKind::Letter => (None, custom_url),
        };

        Ok((
            kind,
            ProofInput {
                size,
                format: None,
                template_id: self.template_id.clone(),
                front,
                back: None,
                letter,
                mail_class: order.mail_class,
                recipient: serde_json::to_value(recipient)?,
                return_address: order.return_address.clone(),
            },
        ))
    }

    pub async fn generate_proof(&mut self) -> anyhow::Result<&ProofUrls> {
        let (kind, input) = self.proof_input()?;
        let proof = self.api.proof(kind, &input).await?;
        Ok(self.proof.insert(proof))
    }

    pub async fn refresh(&mut self) -> anyhow::Result<&Order<String>> {
        let Some(order) = &self.order else {
            anyhow::bail!("No order in progress");
        };
        let order = self.api.get_order(&order.id).await?;
        Ok(self.order.insert(order))
    }

    pub async fn submit(&mut self) -> anyhow::Result<&Order<String>> {
        if self.step != WizardStep::Review {
            anyhow::bail!("Orders are submitted from the review step");
        }
        let Some(order) = &self.order else {
            anyhow::bail!("No order in progress");
        };

        let order = self.api.submit(&order.id).await?;
        if order.status == OrderStatus::PendingAdminApproval {
            self.step = WizardStep::Submitted;
        }
        log::info!("Order {} submitted", order.id);
        Ok(self.order.insert(order))
    }
}
