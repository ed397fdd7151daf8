pub mod handlers;
pub mod service;

use actix_web::web;

pub use handlers::paypal::*;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_paypal_order).service(capture_paypal_order);
}
