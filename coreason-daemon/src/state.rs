//! Shared application state threaded through every handler.

use std::sync::Arc;

use crate::services::Services;

#[derive(Clone)]
pub struct AppState {
    pub services: Arc<Services>,
}

impl AppState {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}
