pub mod price;
pub mod proof;
pub mod template;
