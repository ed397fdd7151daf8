use actix_multipart::Multipart;
use actix_web::{post, web::Json};
use common::{context::Context, entities::upload::Upload, error};

use crate::service::upload::UploadService;

#[post("/api/uploads/letter")]
pub async fn upload_letter(context: Context, payload: Multipart) -> error::Result<Json<Upload>> {
    Ok(Json(UploadService::new(context).store_letter(payload).await?))
}
