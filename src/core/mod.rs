pub mod config;
pub mod error;
pub mod layout;
pub mod types;
