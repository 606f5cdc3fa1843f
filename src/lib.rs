//! TriPlan tour booking server
//!
//! REST JSON API for booking tours: seat inventory per tour date, atomic
//! booking and payment creation against a hosted payment page gateway, and
//! the booking state machine driven by gateway callbacks.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
