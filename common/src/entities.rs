pub mod address;
pub mod admin_user;
pub mod order;
pub mod price;
pub mod product;
pub mod template;
pub mod upload;
