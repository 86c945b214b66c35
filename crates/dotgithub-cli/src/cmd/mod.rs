pub mod validate;
pub mod version;
