pub mod core;
pub mod error;
pub mod pagination;
pub mod projection;
pub mod records;
