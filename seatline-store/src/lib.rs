pub mod app_config;
pub mod events_api;
pub mod file_store;
pub mod redis_repo;
pub mod storage;

pub use events_api::EventsClient;
pub use file_store::FileReservationStore;
pub use redis_repo::RedisReservationStore;
pub use storage::open_store;
