// src/lib.rs

pub mod catalog;
pub mod chat;
pub mod config;
pub mod connections;
pub mod constants;
pub mod database;
pub mod error;
pub mod matcher;
pub mod models;
pub mod notifier;
pub mod profiles;
pub mod progress;
pub mod repository;

pub use error::{AppError, AppResult};
pub use models::AppState;
