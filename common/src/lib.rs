pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod entities;
pub mod error;
pub mod pricing;
pub mod repository;
pub mod verification;

use std::str::FromStr;

use mongodb::bson::oid::ObjectId;

use error::AddCode;

/// Parses a path id, answering 404 with `message` when it is not a valid ObjectId.
pub fn parse_id(id: &str, message: &'static str) -> error::Result<ObjectId> {
    ObjectId::from_str(id).map_err(|_| anyhow::anyhow!(message).code(404))
}
