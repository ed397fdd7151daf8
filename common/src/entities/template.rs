use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{api::first_string, repository::Entity};

use super::{
    address::Address,
    product::{MailClass, ProductType},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Template<Id> {
    pub id: Id,
    pub external_design_id: String,
    pub name: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub allow_personalize: bool,
    #[serde(rename = "type", default)]
    pub product_type: ProductType,
    #[serde(default)]
    pub raw_data: Option<Value>,
    #[serde(default)]
    pub deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Template<ObjectId> {
    pub fn stringify(self) -> Template<String> {
        Template {
            id: self.id.to_hex(),
            external_design_id: self.external_design_id,
            name: self.name,
            size: self.size,
            preview_url: self.preview_url,
            is_public: self.is_public,
            allow_personalize: self.allow_personalize,
            product_type: self.product_type,
            raw_data: self.raw_data,
            deleted: self.deleted,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl Entity for Template<ObjectId> {
    fn id(&self) -> ObjectId {
        self.id
    }
}

/// Fields pulled out of a design payload returned by the design API.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignSummary {
    pub design_id: String,
    pub name: String,
    pub size: String,
    pub preview_url: Option<String>,
    pub product_type: ProductType,
}

impl DesignSummary {
    /// Returns `None` when no design id can be found in the payload.
    pub fn extract(payload: &Value) -> Option<Self> {
        // some responses wrap the design in a `design` or `data` object
        let inner = ["design", "data"]
            .iter()
            .find_map(|key| payload.get(*key).filter(|v| v.is_object()))
            .unwrap_or(payload);

        let design_id = first_string(inner, &["designID", "designId", "id", "_id"])?;

        let name = first_string(inner, &["name", "designName", "title"])
            .unwrap_or_else(|| format!("Design {}", design_id));

        let size = first_string(inner, &["size", "designSize", "productSize"]).unwrap_or_default();

        let preview_url = first_string(
            inner,
            &["previewURL", "previewUrl", "preview", "thumbnail", "frontImage"],
        );

        let product_type = first_string(inner, &["type", "productType", "product"])
            .and_then(|t| t.parse().ok())
            .unwrap_or_default();

        Some(Self {
            design_id,
            name,
            size,
            preview_url,
            product_type,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofInput {
    pub size: String,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub front: Option<Value>,
    #[serde(default)]
    pub back: Option<Value>,
    /// Uploaded letter url, only read by letter proofs.
    #[serde(default)]
    pub letter: Option<String>,
    #[serde(default)]
    pub mail_class: MailClass,
    pub recipient: Value,
    #[serde(default)]
    pub return_address: Option<Address>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn extracts_with_fallbacks() {
        let payload = json!({
            "designID": 4412,
            "designName": "Spring Sale",
            "productSize": "68",
            "thumbnail": "https://cdn.example/4412.png",
            "productType": "Letter"
        });

        let summary = DesignSummary::extract(&payload).unwrap();
        assert_eq!(summary.design_id, "4412");
        assert_eq!(summary.name, "Spring Sale");
        assert_eq!(summary.size, "68");
        assert_eq!(
            summary.preview_url.as_deref(),
            Some("https://cdn.example/4412.png")
        );
        assert_eq!(summary.product_type, ProductType::Letter);
    }

    #[test]
    fn reads_wrapped_design() {
        let payload = json!({ "design": { "id": "abc", "size": "46" } });
        let summary = DesignSummary::extract(&payload).unwrap();
        assert_eq!(summary.design_id, "abc");
        assert_eq!(summary.name, "Design abc");
        assert_eq!(summary.product_type, ProductType::Postcard);
    }

    #[test]
    fn payload_without_id_is_rejected() {
        assert!(DesignSummary::extract(&json!({ "name": "No id" })).is_none());
    }
}
