pub mod handlers;
pub mod service;

use actix_web::web;

pub use handlers::price::*;
pub use handlers::proof::*;
pub use handlers::template::*;

pub fn configure(cfg: &mut web::ServiceConfig) {
    // fixed paths go before `/api/templates/{id}`
    cfg.service(get_templates)
        .service(post_template)
        .service(get_public_templates)
        .service(get_prices)
        .service(put_prices)
        .service(postcard_proof)
        .service(letter_proof)
        .service(post_external_design)
        .service(get_template)
        .service(put_template)
        .service(delete_template)
        .service(delete_template_external)
        .service(restore_template)
        .service(patch_public)
        .service(patch_personalize)
        .service(patch_type)
        .service(get_editor)
        .service(get_personal_editor);
}
