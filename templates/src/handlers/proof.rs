use actix_web::{
    post,
    web::{self, Json},
};
use common::{
    api::pcm::{ProofKind, ProofUrls},
    context::Context,
    entities::template::ProofInput,
    error,
};

use crate::service::proof::ProofService;

#[post("/api/templates/proof")]
pub async fn postcard_proof(
    context: Context,
    Json(input): web::Json<ProofInput>,
) -> error::Result<Json<ProofUrls>> {
    Ok(Json(
        ProofService::new(context)
            .generate(ProofKind::Postcard, input)
            .await?,
    ))
}

#[post("/api/templates/proofletter")]
pub async fn letter_proof(
    context: Context,
    Json(input): web::Json<ProofInput>,
) -> error::Result<Json<ProofUrls>> {
    Ok(Json(
        ProofService::new(context)
            .generate(ProofKind::Letter, input)
            .await?,
    ))
}
