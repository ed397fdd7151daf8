use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::{auth::Identity, repository::Entity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: ObjectId,
    pub username: String,
    pub password: String,
    pub salt: String,
    pub role: String,
    pub created_at: i64,
}

impl Entity for AdminUser {
    fn id(&self) -> ObjectId {
        self.id
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Login {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublicAdmin {
    pub id: String,
    pub username: String,
    pub role: String,
}

impl From<&Identity> for PublicAdmin {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.to_hex(),
            username: identity.username.clone(),
            role: identity.role.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Token {
    pub token: String,
    pub user: PublicAdmin,
}
