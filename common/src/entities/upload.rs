use serde::{Deserialize, Serialize};

/// Stored custom letter design, served back under `url`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Upload {
    pub url: String,
    pub filename: String,
}
