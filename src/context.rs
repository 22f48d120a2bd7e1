use marketplace_config::StorageBackend;
use std::sync::Arc;

use crate::facade::MessagingFacade;

/// Application context containing shared dependencies
#[derive(Clone)]
pub struct AppContext {
    pub facade: Arc<MessagingFacade>,
    pub storage_backend: StorageBackend,
}

impl AppContext {
    pub fn new(facade: Arc<MessagingFacade>, storage_backend: StorageBackend) -> Self {
        Self {
            facade,
            storage_backend,
        }
    }

    pub fn storage_label(&self) -> &'static str {
        match self.storage_backend {
            StorageBackend::Postgres => "postgres",
            StorageBackend::Memory => "memory",
        }
    }
}
