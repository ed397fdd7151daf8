use actix_web::{
    get, post,
    web::{self, Json},
};
use common::{
    context::Context,
    entities::admin_user::{Login, PublicAdmin, Token},
    error,
};

use crate::service::auth::AuthService;

#[post("/api/auth/login")]
pub async fn login(context: Context, Json(login): web::Json<Login>) -> error::Result<Json<Token>> {
    Ok(Json(AuthService::new(context).login(&login).await?))
}

#[get("/api/auth/me")]
pub async fn me(context: Context) -> error::Result<Json<PublicAdmin>> {
    Ok(Json(AuthService::new(context).me()?))
}
