pub mod handlers;
pub mod service;

use actix_web::web;

pub use handlers::upload::*;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(upload_letter);
}

/// Read-only view of the upload directory under `/uploads`.
pub fn uploaded_files(upload_dir: &str) -> actix_files::Files {
    actix_files::Files::new("/uploads", upload_dir)
}
