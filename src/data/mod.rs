pub mod tables;
pub mod validate;
