use async_trait::async_trait;
use redis::AsyncCommands;
use seatline_core::{ReservationStore, StoreError};
use tracing::info;

/// Reservation records in Redis, for clients that share storage across machines.
#[derive(Clone)]
pub struct RedisReservationStore {
    client: redis::Client,
}

impl RedisReservationStore {
    pub fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, StoreError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(redis_error)
    }
}

fn redis_error(e: redis::RedisError) -> StoreError {
    StoreError(format!("redis: {}", e))
}

#[async_trait]
impl ReservationStore for RedisReservationStore {
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        conn.get(key).await.map_err(redis_error)
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        conn.set::<_, _, ()>(key, value).await.map_err(redis_error)?;
        info!("Reservation saved: {}", key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(key).await.map_err(redis_error)?;
        info!("Reservation removed: {}", key);
        Ok(())
    }
}
