use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::{pricing, repository::Entity};

use super::product::{MailClass, ProductType};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceRule {
    pub size_key: String,
    pub mail_class: MailClass,
    pub single: f64,
    #[serde(rename = "twoToNinetyNine")]
    pub two_to_ninety_nine: f64,
    #[serde(rename = "hundredPlus")]
    pub hundred_plus: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductPricing {
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub rules: Vec<PriceRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceTable<Id> {
    pub id: Id,
    pub products: Vec<ProductPricing>,
    pub updated_at: i64,
}

impl<Id> PriceTable<Id> {
    pub fn rules(&self, product_type: ProductType) -> &[PriceRule] {
        self.products
            .iter()
            .find(|p| p.product_type == product_type)
            .map(|p| p.rules.as_slice())
            .unwrap_or(&[])
    }

    pub fn price_for(
        &self,
        product_type: ProductType,
        size_key: &str,
        mail_class: MailClass,
        quantity: u32,
    ) -> f64 {
        pricing::price_for(self.rules(product_type), size_key, mail_class, quantity)
    }

    /// First (type, sizeKey, mailClass) key that has more than one rule.
    pub fn duplicate_rule(&self) -> Option<(ProductType, String, MailClass)> {
        for product in &self.products {
            for (idx, rule) in product.rules.iter().enumerate() {
                let repeated = product.rules[..idx]
                    .iter()
                    .any(|r| r.size_key == rule.size_key && r.mail_class == rule.mail_class);
                if repeated {
                    return Some((product.product_type, rule.size_key.clone(), rule.mail_class));
                }
            }
        }
        None
    }
}

impl PriceTable<ObjectId> {
    pub fn stringify(self) -> PriceTable<String> {
        PriceTable {
            id: self.id.to_hex(),
            products: self.products,
            updated_at: self.updated_at,
        }
    }
}

impl Entity for PriceTable<ObjectId> {
    fn id(&self) -> ObjectId {
        self.id
    }
}
