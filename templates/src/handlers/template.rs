use actix_web::{
    delete, get, patch, post, put,
    web::{self, Json},
};
use common::{
    api::pcm::EditorMode,
    context::Context,
    entities::{product::ProductType, template::Template},
    error,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::service::template::{CreateTemplate, EditorLink, TemplateChange, TemplateService};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicToggle {
    pub is_public: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizeToggle {
    pub allow_personalize: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TypeChange {
    #[serde(rename = "type")]
    pub product_type: ProductType,
}

#[get("/api/templates")]
pub async fn get_templates(context: Context) -> error::Result<Json<Vec<Template<String>>>> {
    Ok(Json(TemplateService::new(context).list().await?))
}

#[post("/api/templates")]
pub async fn post_template(
    context: Context,
    Json(data): web::Json<CreateTemplate>,
) -> error::Result<Json<Template<String>>> {
    Ok(Json(TemplateService::new(context).create(data).await?))
}

#[get("/api/templates/public")]
pub async fn get_public_templates(
    context: Context,
) -> error::Result<Json<Vec<Template<String>>>> {
    Ok(Json(TemplateService::new(context).list_public().await?))
}

#[post("/api/templates/new")]
pub async fn post_external_design(
    context: Context,
    Json(payload): web::Json<Value>,
) -> error::Result<Json<Template<String>>> {
    Ok(Json(
        TemplateService::new(context)
            .create_from_external(payload)
            .await?,
    ))
}

#[get("/api/templates/{id}")]
pub async fn get_template(
    context: Context,
    id: web::Path<String>,
) -> error::Result<Json<Template<String>>> {
    Ok(Json(TemplateService::new(context).find(&id).await?))
}

#[put("/api/templates/{id}")]
pub async fn put_template(
    context: Context,
    id: web::Path<String>,
    Json(change): web::Json<TemplateChange>,
) -> error::Result<Json<Template<String>>> {
    Ok(Json(TemplateService::new(context).change(&id, change).await?))
}

#[delete("/api/templates/{id}")]
pub async fn delete_template(
    context: Context,
    id: web::Path<String>,
) -> error::Result<Json<Template<String>>> {
    Ok(Json(TemplateService::new(context).soft_delete(&id).await?))
}

#[delete("/api/templates/{id}/external")]
pub async fn delete_template_external(
    context: Context,
    id: web::Path<String>,
) -> error::Result<Json<Template<String>>> {
    Ok(Json(
        TemplateService::new(context).delete_external(&id).await?,
    ))
}

#[patch("/api/templates/{id}/restore")]
pub async fn restore_template(
    context: Context,
    id: web::Path<String>,
) -> error::Result<Json<Template<String>>> {
    Ok(Json(TemplateService::new(context).restore(&id).await?))
}

/// Without a body the flag is flipped.
#[patch("/api/templates/{id}/public")]
pub async fn patch_public(
    context: Context,
    id: web::Path<String>,
    body: Option<Json<PublicToggle>>,
) -> error::Result<Json<Template<String>>> {
    let value = body.and_then(|b| b.into_inner().is_public);
    Ok(Json(TemplateService::new(context).set_public(&id, value).await?))
}

#[patch("/api/templates/{id}/personalize")]
pub async fn patch_personalize(
    context: Context,
    id: web::Path<String>,
    body: Option<Json<PersonalizeToggle>>,
) -> error::Result<Json<Template<String>>> {
    let value = body.and_then(|b| b.into_inner().allow_personalize);
    Ok(Json(
        TemplateService::new(context)
            .set_personalize(&id, value)
            .await?,
    ))
}

#[patch("/api/templates/{id}/type")]
pub async fn patch_type(
    context: Context,
    id: web::Path<String>,
    Json(change): web::Json<TypeChange>,
) -> error::Result<Json<Template<String>>> {
    Ok(Json(
        TemplateService::new(context)
            .set_type(&id, change.product_type)
            .await?,
    ))
}

#[get("/api/templates/{id}/edit")]
pub async fn get_editor(context: Context, id: web::Path<String>) -> error::Result<Json<EditorLink>> {
    Ok(Json(
        TemplateService::new(context)
            .editor(&id, EditorMode::Admin)
            .await?,
    ))
}

#[get("/api/templates/{id}/editme")]
pub async fn get_personal_editor(
    context: Context,
    id: web::Path<String>,
) -> error::Result<Json<EditorLink>> {
    Ok(Json(
        TemplateService::new(context)
            .editor(&id, EditorMode::Personalize)
            .await?,
    ))
}
