//! Client-side stores for the order wizard and the admin screens.

pub mod admin_store;
pub mod api;
pub mod order_store;
pub mod template_store;


pub use admin_store::AdminStore;
pub use api::{ApiClient, ApiError};
pub use order_store::{OrderStore, WizardStep};
pub use template_store::TemplateStore;
