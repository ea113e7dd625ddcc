//! Configuration, domain types and capability traits

pub mod capabilities;
pub mod config;
pub mod models;

pub use capabilities::{ImageGenerator, TextGenerator, Transport};
pub use config::AppConfig;
