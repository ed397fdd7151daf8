use std::sync::Arc;

use actix_web::HttpServer;
use anyhow::Context;
use common::{
    api::{
        paypal::{PaymentApiObject, PaypalClient},
        pcm::{PcmClient, PrintApiObject},
    },
    config::Config,
    context::ServiceState,
    entities::{admin_user::AdminUser, order::Order, price::PriceTable, template::Template},
    repository::mongo_repository::MongoRepository,
    verification::verify,
};
use mongodb::bson::oid::ObjectId;
use server::create_app;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;

    verify::<Order<ObjectId>>(&config.mongo_uri, &config.database, "orders", false)
        .await
        .context("Orders collection verification failed")?;
    verify::<Template<ObjectId>>(&config.mongo_uri, &config.database, "templates", false)
        .await
        .context("Templates collection verification failed")?;

    let order_repo: MongoRepository<Order<ObjectId>> =
        MongoRepository::new(&config.mongo_uri, &config.database, "orders").await?;
    let template_repo: MongoRepository<Template<ObjectId>> =
        MongoRepository::new(&config.mongo_uri, &config.database, "templates").await?;
    template_repo.unique_index("externalDesignId").await?;
    let price_repo: MongoRepository<PriceTable<ObjectId>> =
        MongoRepository::new(&config.mongo_uri, &config.database, "prices").await?;
    let admin_repo: MongoRepository<AdminUser> =
        MongoRepository::new(&config.mongo_uri, &config.database, "admin_users").await?;
    admin_repo.unique_index("username").await?;

    std::fs::create_dir_all(&config.upload_dir)
        .with_context(|| format!("Cannot create upload directory {}", config.upload_dir))?;

    let port = config.port;
    let mut state = ServiceState::new(config);

    let pcm = PcmClient::new(state.client.clone(), state.config.pcm.clone());
    let paypal = PaypalClient::new(state.client.clone(), state.config.paypal.clone());

    state.insert::<Order<ObjectId>>(Arc::new(order_repo));
    state.insert::<Template<ObjectId>>(Arc::new(template_repo));
    state.insert::<PriceTable<ObjectId>>(Arc::new(price_repo));
    state.insert::<AdminUser>(Arc::new(admin_repo));
    state.insert_manual::<PrintApiObject>(Arc::new(pcm));
    state.insert_manual::<PaymentApiObject>(Arc::new(paypal));
    let state = Arc::new(state);

    log::info!("Listening on port {}", port);

    HttpServer::new(move || create_app(state.clone()))
        .bind(("0.0.0.0", port))?
        .run()
        .await?;

    Ok(())
}
