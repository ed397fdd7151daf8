use std::sync::Arc;

use actix_cors::Cors;
use actix_web::body::MessageBody;
use actix_web::dev::ServiceFactory;
use actix_web::dev::ServiceRequest;
use actix_web::dev::ServiceResponse;
use actix_web::middleware;
use actix_web::web::{self, Json};
use actix_web::{get, App};
use common::context::ServiceState;
use common::error::ServiceError;
use serde_json::{json, Value};

pub const JSON_LIMIT: usize = 2 * 1024 * 1024;

#[get("/health")]
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn cors(frontend_url: Option<&str>) -> Cors {
    match frontend_url {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allow_any_method()
            .allow_any_header()
            .supports_credentials(),
        None => Cors::permissive(),
    }
}

pub fn create_app(
    state: Arc<ServiceState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Response = ServiceResponse<impl MessageBody>,
        Config = (),
        InitError = (),
        Error = actix_web::Error,
    >,
> {
    let cors = cors(state.config.frontend_url.as_deref());
    let upload_dir = state.config.upload_dir.clone();

    let json_config = web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _| ServiceError::new(400, anyhow::anyhow!("{}", err)).into());
    let query_config = web::QueryConfig::default()
        .error_handler(|err, _| ServiceError::new(400, anyhow::anyhow!("{}", err)).into());

    App::new()
        .wrap(cors)
        .wrap(middleware::Logger::default())
        .app_data(web::Data::new(state))
        .app_data(json_config)
        .app_data(query_config)
        .service(health)
        .configure(users::configure)
        .configure(templates::configure)
        .configure(orders::configure)
        .configure(files::configure)
        .configure(payments::configure)
        .service(files::uploaded_files(&upload_dir))
}
