use chrono::NaiveDate;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;

use crate::{
    error::{self, AddCode},
    repository::Entity,
};

use super::{
    address::{Address, Recipient},
    product::{MailClass, ProductType},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DesignType {
    #[default]
    Single,
    Split,
    Drip,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BrochureFold {
    #[serde(rename = "Tri-Fold")]
    TriFold,
    #[serde(rename = "Bi-Fold")]
    BiFold,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Draft,
    PendingAdminApproval,
    #[serde(rename = "submitted_to_pcm")]
    SubmittedToPcm,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    Submit,
    Approve,
    Reject,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "draft",
            OrderStatus::PendingAdminApproval => "pending_admin_approval",
            OrderStatus::SubmittedToPcm => "submitted_to_pcm",
            OrderStatus::Approved => "approved",
            OrderStatus::Rejected => "rejected",
        }
    }

    /// Transition table of the order lifecycle.
    ///
    /// `Submit` and `Reject` are accepted from every status, so a rejected or
    /// already submitted order can be resubmitted. Only a pending order can be
    /// approved.
    pub fn transition(self, event: OrderEvent) -> Option<OrderStatus> {
        match (self, event) {
            (_, OrderEvent::Submit) => Some(OrderStatus::PendingAdminApproval),
            (OrderStatus::PendingAdminApproval, OrderEvent::Approve) => {
                Some(OrderStatus::SubmittedToPcm)
            }
            (_, OrderEvent::Approve) => None,
            (_, OrderEvent::Reject) => Some(OrderStatus::Rejected),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(OrderStatus::Draft),
            "pending_admin_approval" => Ok(OrderStatus::PendingAdminApproval),
            "submitted_to_pcm" => Ok(OrderStatus::SubmittedToPcm),
            "approved" => Ok(OrderStatus::Approved),
            "rejected" => Ok(OrderStatus::Rejected),
            _ => Err(anyhow::anyhow!("Unknown order status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub provider: String,
    pub paypal_order_id: String,
    pub status: String,
    pub amount: f64,
    pub captured_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order<Id> {
    pub id: Id,
    #[serde(default)]
    pub design_type: DesignType,
    #[serde(default)]
    pub design_id: Option<String>,
    #[serde(default)]
    pub design_name: Option<String>,
    #[serde(default)]
    pub design_size: Option<String>,
    #[serde(default)]
    pub product_type: ProductType,
    #[serde(default)]
    pub is_custom_design: bool,
    #[serde(default)]
    pub custom_design_url: Option<String>,
    #[serde(default)]
    pub mail_class: MailClass,
    #[serde(default)]
    pub mail_date: Option<NaiveDate>,
    #[serde(default)]
    pub brochure_fold: Option<BrochureFold>,
    #[serde(default)]
    pub return_address: Option<Address>,
    #[serde(default)]
    pub recipients: Vec<Recipient>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub external_reference: Option<String>,
    #[serde(default)]
    pub pcm_order_id: Option<String>,
    #[serde(default)]
    pub pcm_response: Option<serde_json::Value>,
    #[serde(default)]
    pub payment: Option<Payment>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order<ObjectId> {
    pub fn stringify(self) -> Order<String> {
        Order {
            id: self.id.to_hex(),
            design_type: self.design_type,
            design_id: self.design_id,
            design_name: self.design_name,
            design_size: self.design_size,
            product_type: self.product_type,
            is_custom_design: self.is_custom_design,
            custom_design_url: self.custom_design_url,
            mail_class: self.mail_class,
            mail_date: self.mail_date,
            brochure_fold: self.brochure_fold,
            return_address: self.return_address,
            recipients: self.recipients,
            status: self.status,
            external_reference: self.external_reference,
            pcm_order_id: self.pcm_order_id,
            pcm_response: self.pcm_response,
            payment: self.payment,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl Entity for Order<ObjectId> {
    fn id(&self) -> ObjectId {
        self.id
    }
}

/// Order fields a customer may set while drafting. Absent fields are left
/// untouched; an explicit `null` clears a nullable field.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfigChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_type: Option<DesignType>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub design_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub design_name: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub design_size: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<ProductType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_custom_design: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub custom_design_url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail_class: Option<MailClass>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub mail_date: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub brochure_fold: Option<Option<BrochureFold>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub return_address: Option<Option<Address>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub external_reference: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipients: Option<Vec<Recipient>>,
}

/// Fails with 400 on the first recipient that misses a required field.
pub fn validate_recipients(recipients: &[Recipient]) -> error::Result<()> {
    for (idx, recipient) in recipients.iter().enumerate() {
        let missing = recipient.missing_fields();
        if !missing.is_empty() {
            return Err(anyhow::anyhow!(
                "Recipient {} is missing required fields: {}",
                idx,
                missing.join(", ")
            )
            .code(400));
        }
    }
    Ok(())
}

impl OrderConfigChange {
    pub fn validate(&self) -> error::Result<()> {
        validate_recipients(self.recipients.as_deref().unwrap_or_default())
    }

    pub fn apply(self, order: &mut Order<ObjectId>) {
        if let Some(design_type) = self.design_type {
            order.design_type = design_type;
        }
        if let Some(design_id) = self.design_id {
            order.design_id = design_id;
        }
        if let Some(design_name) = self.design_name {
            order.design_name = design_name;
        }
        if let Some(design_size) = self.design_size {
            order.design_size = design_size;
        }
        if let Some(product_type) = self.product_type {
            order.product_type = product_type;
        }
        if let Some(is_custom_design) = self.is_custom_design {
            order.is_custom_design = is_custom_design;
        }
        if let Some(custom_design_url) = self.custom_design_url {
            order.custom_design_url = custom_design_url;
        }
        if let Some(mail_class) = self.mail_class {
            order.mail_class = mail_class;
        }
        if let Some(mail_date) = self.mail_date {
            order.mail_date = mail_date;
        }
        if let Some(brochure_fold) = self.brochure_fold {
            order.brochure_fold = brochure_fold;
        }
        if let Some(return_address) = self.return_address {
            order.return_address = return_address;
        }
        if let Some(external_reference) = self.external_reference {
            order.external_reference = external_reference;
        }
        if let Some(recipients) = self.recipients {
            order.recipients = recipients;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientBatch {
    pub recipients: Vec<Recipient>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub order_id: String,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub size: String,
    pub mail_class: MailClass,
    pub quantity: u32,
    pub unit_price: f64,
    pub total: f64,
}
