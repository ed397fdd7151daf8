pub mod handlers;
pub mod service;

use actix_web::web;

pub use handlers::admin::*;
pub use handlers::order::*;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(post_order)
        .service(get_orders)
        .service(get_order)
        .service(put_order_config)
        .service(post_recipients)
        .service(submit_order)
        .service(approve_order)
        .service(reject_order)
        .service(get_quote)
        .service(get_admin_orders)
        .service(admin_approve_order);
}
