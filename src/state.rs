//! Shared application state for all routes. Constructed once at startup.

use crate::config::Settings;
use crate::service::CrudService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub crud: CrudService,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(crud: CrudService, settings: Settings) -> Self {
        AppState {
            crud,
            settings: Arc::new(settings),
        }
    }
}
