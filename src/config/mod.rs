// src/config/mod.rs
mod app;

pub use app::{AppConfig, ENV_CONFIG_PATH};
