pub mod env;
pub mod error;
pub mod loader;
pub mod settings;
