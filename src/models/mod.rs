pub mod category;
pub mod receipt;
