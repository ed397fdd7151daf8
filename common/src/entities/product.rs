use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{self, AddCode};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    #[default]
    Postcard,
    Letter,
    Brochure,
    Bookmark,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Postcard => "postcard",
            ProductType::Letter => "letter",
            ProductType::Brochure => "brochure",
            ProductType::Bookmark => "bookmark",
        }
    }
}

impl FromStr for ProductType {
    type Err = error::ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postcard" => Ok(ProductType::Postcard),
            "letter" => Ok(ProductType::Letter),
            "brochure" => Ok(ProductType::Brochure),
            "bookmark" => Ok(ProductType::Bookmark),
            _ => Err(anyhow::anyhow!(
                "Invalid type: {}. Accepted values are: postcard, letter, brochure, bookmark",
                s
            )
            .code(400)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum MailClass {
    #[default]
    FirstClass,
    Standard,
}

impl MailClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            MailClass::FirstClass => "FirstClass",
            MailClass::Standard => "Standard",
        }
    }
}

impl FromStr for MailClass {
    type Err = error::ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FirstClass" => Ok(MailClass::FirstClass),
            "Standard" => Ok(MailClass::Standard),
            _ => Err(anyhow::anyhow!("Invalid mail class: {}", s).code(400)),
        }
    }
}
