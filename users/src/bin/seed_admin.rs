use std::env;

use anyhow::{bail, Context};
use common::{
    entities::admin_user::AdminUser,
    repository::{mongo_repository::MongoRepository, Repository},
};
use mongodb::bson::Bson;
use users::service::auth::new_admin;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let mongo_uri = env::var("MONGOURI").context("MONGOURI must be set")?;
    let database = env::var("MONGO_DATABASE").unwrap_or_else(|_| "directmail".to_string());
    let username = env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
    let password = env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD must be set")?;
    let role = env::var("ADMIN_ROLE").unwrap_or_else(|_| "admin".to_string());

    let admins: MongoRepository<AdminUser> =
        MongoRepository::new(&mongo_uri, &database, "admin_users").await?;
    admins.unique_index("username").await?;

    if admins
        .find("username", &Bson::String(username.clone()))
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?
        .is_some()
    {
        bail!("Admin {} already exists", username);
    }

    admins
        .insert(&new_admin(username.clone(), &password, role))
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    log::info!("Created admin {}", username);
    Ok(())
}
