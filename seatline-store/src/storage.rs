use seatline_core::{MemoryReservationStore, ReservationStore, StoreError};
use std::sync::Arc;
use tracing::info;

use crate::app_config::{StorageBackend, StorageConfig};
use crate::{FileReservationStore, RedisReservationStore};

/// Builds the configured reservation store.
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn ReservationStore>, StoreError> {
    match config.backend {
        StorageBackend::File => {
            let store = FileReservationStore::open(&config.path).await?;
            info!("Reservations stored in {}", store.dir().display());
            Ok(Arc::new(store))
        }
        StorageBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .ok_or_else(|| StoreError("storage.redis_url is required for the redis backend".to_string()))?;
            let store = RedisReservationStore::new(url).map_err(|e| StoreError(format!("redis: {}", e)))?;
            info!("Reservations stored in redis");
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            info!("Reservations kept in memory only");
            Ok(Arc::new(MemoryReservationStore::new()))
        }
    }
}
