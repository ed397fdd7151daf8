pub mod handlers;
pub mod service;

use actix_web::web;

pub use handlers::auth::*;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(login).service(me);
}
