use actix_web::{
    get, put,
    web::{self, Json},
};
use common::{context::Context, entities::price::PriceTable, error};

use crate::service::price::{PriceChange, PriceService};

#[get("/api/templates/prices")]
pub async fn get_prices(context: Context) -> error::Result<Json<PriceTable<String>>> {
    Ok(Json(PriceService::new(context).table().await?.stringify()))
}

#[put("/api/templates/prices")]
pub async fn put_prices(
    context: Context,
    Json(change): web::Json<PriceChange>,
) -> error::Result<Json<PriceTable<String>>> {
    Ok(Json(PriceService::new(context).replace(change).await?))
}
