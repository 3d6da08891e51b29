use seatline_core::{Clock, EventsApi, ReservationStore, SystemClock, TrackerSettings};
use seatline_store::app_config::{BusinessRules, Config};
use seatline_store::{open_store, EventsClient};
use std::sync::Arc;
use std::time::Duration;

/// Collaborators shared by a booking session.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn EventsApi>,
    pub store: Arc<dyn ReservationStore>,
    pub clock: Arc<dyn Clock>,
    pub business_rules: BusinessRules,
}

impl AppState {
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api = EventsClient::new(&config.api)?;
        let store = open_store(&config.storage).await?;

        Ok(Self {
            api: Arc::new(api),
            store,
            clock: Arc::new(SystemClock),
            business_rules: config.business_rules.clone(),
        })
    }

    pub fn tracker_settings(&self) -> TrackerSettings {
        TrackerSettings {
            hold: chrono::Duration::seconds(self.business_rules.reservation_hold_seconds as i64),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.business_rules.tick_interval_ms)
    }

    pub fn expiry_refresh_delay(&self) -> Duration {
        Duration::from_millis(self.business_rules.expiry_refresh_delay_ms)
    }

    pub fn confirm_refresh_delay(&self) -> Duration {
        Duration::from_millis(self.business_rules.confirm_refresh_delay_ms)
    }

    pub fn resume_delay(&self) -> Duration {
        Duration::from_millis(self.business_rules.resume_delay_ms)
    }
}
