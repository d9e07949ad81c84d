use std::sync::Arc;

use shared_config::AppConfig;

use crate::directory::Directory;

/// Router state shared by every cell.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub directory: Arc<dyn Directory>,
}

impl AppState {
    pub fn new(config: AppConfig, directory: Arc<dyn Directory>) -> Self {
        Self {
            config: Arc::new(config),
            directory,
        }
    }
}
