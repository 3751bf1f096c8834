pub mod config;
pub mod services;

pub use config::CoreConfig;
