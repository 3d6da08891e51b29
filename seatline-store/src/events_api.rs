use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Url};
use seatline_core::{ApiError, EventsApi};
use seatline_shared::{
    ApiErrorBody, BookSeatRequest, ConfirmRequest, CreateEventRequest, CreateEventResponse, EventDetails,
    EventSummary, Masked,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::app_config::ApiConfig;

/// HTTP client for the booking API.
#[derive(Clone)]
pub struct EventsClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<Masked<String>>,
}

impl EventsClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::Transport(format!("invalid api base url {}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Transport(format!("invalid api base url {}", config.base_url)));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("seatline/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            token: config.token.clone(),
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.url(segments);
        debug!(%method, %url, "Booking API request");
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = Self::send(builder).await?;
        response.json::<T>().await.map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn send(builder: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorBody>(&text) {
            Ok(body) => body.error,
            Err(_) if !text.trim().is_empty() => text.trim().to_string(),
            Err(_) => status.canonical_reason().unwrap_or("request failed").to_string(),
        };
        debug!(status = status.as_u16(), %message, "Booking API rejected request");

        Err(ApiError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl EventsApi for EventsClient {
    async fn list_events(&self) -> Result<Vec<EventSummary>, ApiError> {
        self.send_json(self.request(Method::GET, &["events", "all"])).await
    }

    async fn event_details(&self, event_id: &str) -> Result<EventDetails, ApiError> {
        self.send_json(self.request(Method::GET, &["events", event_id])).await
    }

    async fn book_seat(&self, event_id: &str, request: &BookSeatRequest) -> Result<(), ApiError> {
        Self::send(self.request(Method::POST, &["events", event_id, "book"]).json(request)).await?;
        Ok(())
    }

    async fn confirm_seat(&self, event_id: &str, request: &ConfirmRequest) -> Result<(), ApiError> {
        Self::send(self.request(Method::POST, &["events", event_id, "confirm"]).json(request)).await?;
        Ok(())
    }

    async fn create_event(&self, request: &CreateEventRequest) -> Result<CreateEventResponse, ApiError> {
        self.send_json(self.request(Method::POST, &["events"]).json(request)).await
    }
}
