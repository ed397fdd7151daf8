use chrono::Utc;
use common::{
    context::Context,
    entities::price::{PriceTable, ProductPricing},
    error::{self, AddCode},
    pricing::current_table,
};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct PriceChange {
    pub products: Vec<ProductPricing>,
}

pub struct PriceService {
    context: Context,
}

impl PriceService {
    pub fn new(context: Context) -> Self {
        Self { context }
    }

    pub async fn table(&self) -> error::Result<PriceTable<ObjectId>> {
        let prices = self.context.try_get_repository::<PriceTable<ObjectId>>()?;
        Ok(current_table(&prices).await?.0)
    }

    pub async fn replace(&self, change: PriceChange) -> error::Result<PriceTable<String>> {
        self.context.auth().require_admin()?;

        let prices = self.context.try_get_repository::<PriceTable<ObjectId>>()?;
        let (current, stored) = current_table(&prices).await?;

        let table = PriceTable {
            id: current.id,
            products: change.products,
            updated_at: Utc::now().timestamp_micros(),
        };

        if let Some((product_type, size_key, mail_class)) = table.duplicate_rule() {
            return Err(anyhow::anyhow!(
                "Duplicate price rule for {} size {} {}",
                product_type.as_str(),
                size_key,
                mail_class.as_str()
            )
            .code(400));
        }

        if stored {
            prices.update(&table).await?;
        } else {
            prices.insert(&table).await?;
        }

        log::info!("Price table updated");
        Ok(table.stringify())
    }
}
