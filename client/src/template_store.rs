use common::{
    entities::{price::PriceTable, product::ProductType, template::Template},
    pricing::default_products,
};

use crate::api::ApiClient;

/// Public templates and the price table, fetched once and kept until `refresh`.
pub struct TemplateStore {
    api: ApiClient,
    templates: Vec<Template<String>>,
    prices: Option<PriceTable<String>>,
}

impl TemplateStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            templates: Vec::new(),
            prices: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.prices.is_some()
    }

    pub async fn load(&mut self) -> anyhow::Result<()> {
        if self.is_loaded() {
            return Ok(());
        }
        self.refresh().await
    }

    pub async fn refresh(&mut self) -> anyhow::Result<()> {
        self.templates = self.api.public_templates().await?;
        self.prices = Some(self.api.prices().await?);
        log::debug!("Loaded {} public templates", self.templates.len());
        Ok(())
    }

    pub fn templates(&self) -> &[Template<String>] {
        &self.templates
    }

    pub fn of_type(&self, product_type: ProductType) -> impl Iterator<Item = &Template<String>> {
        self.templates
            .iter()
            .filter(move |t| t.product_type == product_type)
    }

    pub fn find(&self, id: &str) -> Option<&Template<String>> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Loaded table, or the built-in one before the first load.
    pub fn prices(&self) -> PriceTable<String> {
        self.prices.clone().unwrap_or_else(|| PriceTable {
            id: String::new(),
            products: default_products(),
            updated_at: 0,
        })
    }
}
