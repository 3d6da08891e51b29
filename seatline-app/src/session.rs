use seatline_core::{Reconciliation, ReservationLifecycleTracker, Tick, TrackerState};
use seatline_shared::{BookSeatRequest, ConfirmRequest, CreateEventRequest, EventDetails};
use tracing::{info, warn};

use crate::console::Command;
use crate::error::AppError;
use crate::notice::Notice;
use crate::render;
use crate::scheduler::{CountdownTicker, DeferredRefresh, RefreshReason, ScheduledRefresh};
use crate::state::AppState;

/// Timer work that became due while the session was waiting for input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    Tick,
    Refresh(ScheduledRefresh),
}

/// Page controller of the booking client.
///
/// Owns the signed-in user's reservation tracker (built at login, dropped at
/// logout) together with the countdown ticker and the deferred details reload.
pub struct BookingSession {
    state: AppState,
    tracker: Option<ReservationLifecycleTracker>,
    viewing: Option<String>,
    ticker: CountdownTicker,
    deferred: DeferredRefresh,
}

impl BookingSession {
    pub fn new(state: AppState) -> Self {
        let ticker = CountdownTicker::new(state.tick_interval());
        Self {
            state,
            tracker: None,
            viewing: None,
            ticker,
            deferred: DeferredRefresh::new(),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.tracker.as_ref().map(|t| t.user_id())
    }

    pub fn tracker(&self) -> Option<&ReservationLifecycleTracker> {
        self.tracker.as_ref()
    }

    pub fn viewing(&self) -> Option<&str> {
        self.viewing.as_deref()
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_running()
    }

    pub fn scheduled_refresh(&self) -> Option<&ScheduledRefresh> {
        self.deferred.scheduled()
    }

    pub async fn dispatch(&mut self, command: Command) -> Vec<Notice> {
        match command {
            Command::Login(user_id) => self.login(&user_id).await,
            Command::Logout => self.logout(),
            Command::Events => self.list_events().await,
            Command::View(event_id) => self.view_event(&event_id).await,
            Command::Book(seat_number) => self.book_seat(seat_number).await,
            Command::Confirm => self.confirm().await,
            Command::Create(request) => self.create_event(request).await,
            Command::Overview => self.overview().await,
            Command::Status => vec![self.status()],
            Command::Help => vec![Notice::info(Command::help())],
            Command::Quit => Vec::new(),
        }
    }

    pub async fn login(&mut self, user_id: &str) -> Vec<Notice> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return vec![Notice::error("Enter a user id")];
        }
        if self.tracker.is_some() {
            self.logout();
        }

        let mut tracker = ReservationLifecycleTracker::new(
            user_id,
            self.state.store.clone(),
            self.state.clock.clone(),
            self.state.tracker_settings(),
        );
        let mut notices = vec![Notice::success(format!("Signed in as {}", user_id))];
        info!(user_id, "Signed in");

        match tracker.resume().await {
            Ok(Some(record)) => {
                notices.push(Notice::info(format!(
                    "Found your reservation of seat {} for event {}, checking it with the server",
                    record.seat_number, record.event_id
                )));
                self.deferred
                    .schedule(record.event_id, RefreshReason::Resume, self.state.resume_delay());
            }
            Ok(None) => {}
            Err(e) => notices.push(AppError::from(e).into_notice("Could not read saved reservation")),
        }

        self.tracker = Some(tracker);
        notices.extend(self.list_events().await);
        notices
    }

    pub fn logout(&mut self) -> Vec<Notice> {
        let Some(mut tracker) = self.tracker.take() else {
            return vec![Notice::error(AppError::NotSignedIn.to_string())];
        };
        tracker.release();
        self.ticker.cancel();
        self.deferred.cancel();
        self.viewing = None;
        info!(user_id = tracker.user_id(), "Signed out");
        vec![Notice::info(format!("Signed out {}", tracker.user_id()))]
    }

    pub async fn list_events(&mut self) -> Vec<Notice> {
        if self.tracker.is_none() {
            return vec![AppError::NotSignedIn.into_notice("Loading events failed")];
        }
        match self.state.api.list_events().await {
            Ok(events) if events.is_empty() => vec![Notice::info("No events found")],
            Ok(events) => vec![Notice::info(render::event_list(&events))],
            Err(e) => vec![AppError::from(e).into_notice("Loading events failed")],
        }
    }

    /// Loads an event's seat map and reconciles the tracked reservation against it.
    pub async fn view_event(&mut self, event_id: &str) -> Vec<Notice> {
        if self.tracker.is_none() {
            return vec![AppError::NotSignedIn.into_notice("Loading event failed")];
        }
        let details = match self.state.api.event_details(event_id).await {
            Ok(details) => details,
            Err(e) => return vec![AppError::from(e).into_notice("Loading event failed")],
        };

        self.viewing = Some(event_id.to_string());
        let mut notices = vec![Notice::info(render::event_details(&details))];
        notices.extend(self.reconcile(event_id, &details).await);
        notices
    }

    async fn reconcile(&mut self, event_id: &str, details: &EventDetails) -> Vec<Notice> {
        let Some(tracker) = self.tracker.as_mut() else {
            return Vec::new();
        };

        let outcome = match tracker.reconcile(event_id, &details.seats).await {
            Ok(outcome) => outcome,
            Err(e) => {
                if !tracker.is_pending() {
                    self.ticker.cancel();
                }
                return vec![AppError::from(e).into_notice("Could not check reservation")];
            }
        };

        match outcome {
            Reconciliation::Tracking { record, remaining } => {
                if !self.ticker.is_running() {
                    self.ticker.start();
                }
                vec![Notice::timer(format!(
                    "Seat {} is on hold for you, awaiting confirmation. Time left to confirm: {}",
                    record.seat_number, remaining
                ))]
            }
            Reconciliation::Discarded { record, status } => {
                self.ticker.cancel();
                let status = status.map(|s| s.label()).unwrap_or("missing");
                vec![Notice::info(format!(
                    "Your hold on seat {} is no longer active (seat is {})",
                    record.seat_number,
                    status.to_lowercase()
                ))]
            }
            Reconciliation::Lapsed(record) => {
                self.ticker.cancel();
                vec![Notice::info(format!("Your hold on seat {} has expired", record.seat_number))]
            }
            Reconciliation::OtherEvent(_) | Reconciliation::Untracked => {
                self.ticker.cancel();
                Vec::new()
            }
        }
    }

    pub async fn book_seat(&mut self, seat_number: u32) -> Vec<Notice> {
        let Some(tracker) = self.tracker.as_ref() else {
            return vec![AppError::NotSignedIn.into_notice("Booking failed")];
        };
        let Some(event_id) = self.viewing.clone() else {
            return vec![AppError::NoEventSelected.into_notice("Booking failed")];
        };

        let request = BookSeatRequest {
            seat_number,
            user_id: tracker.user_id().to_string(),
        };
        if let Err(e) = self.state.api.book_seat(&event_id, &request).await {
            return vec![AppError::from(e).into_notice("Booking failed")];
        }

        let minutes = self.state.business_rules.reservation_hold_seconds / 60;
        let mut notices = vec![Notice::success(format!(
            "Seat {} reserved! You have {} minutes to confirm payment.",
            seat_number, minutes
        ))];

        if let Some(tracker) = self.tracker.as_mut() {
            if let Err(e) = tracker.begin(event_id.as_str(), seat_number).await {
                // Still tracked in memory for this session
                notices.push(AppError::from(e).into_notice("Could not save reservation"));
            }
        }
        self.deferred.cancel();
        self.ticker.start();

        notices.extend(self.view_event(&event_id).await);
        notices
    }

    pub async fn confirm(&mut self) -> Vec<Notice> {
        let Some(tracker) = self.tracker.as_ref() else {
            return vec![AppError::NotSignedIn.into_notice("Confirmation failed")];
        };
        let Some(record) = tracker.pending().cloned() else {
            return vec![AppError::NoReservation.into_notice("Confirmation failed")];
        };

        let request = ConfirmRequest {
            user_id: record.user_id.clone(),
            seat_number: record.seat_number,
        };
        if let Err(e) = self.state.api.confirm_seat(&record.event_id, &request).await {
            // Left as is until the next reload reconciles it
            return vec![AppError::from(e).into_notice("Confirmation failed")];
        }

        self.ticker.cancel();
        let confirmed = match self.tracker.as_mut() {
            Some(tracker) => tracker.confirm().await,
            None => return Vec::new(),
        };
        match confirmed {
            Ok(record) => {
                self.deferred.schedule(
                    record.event_id.clone(),
                    RefreshReason::Confirmed,
                    self.state.confirm_refresh_delay(),
                );
                vec![Notice::success(format!("Booking of seat {} confirmed!", record.seat_number))]
            }
            Err(e) => vec![AppError::from(e).into_notice("Confirmation failed")],
        }
    }

    pub async fn create_event(&mut self, request: CreateEventRequest) -> Vec<Notice> {
        let created = match self.state.api.create_event(&request).await {
            Ok(created) => created,
            Err(e) => return vec![AppError::from(e).into_notice("Creating event failed")],
        };
        info!(event_id = %created.event_id, "Event created");

        let mut notices = vec![Notice::success(format!(
            "Event \"{}\" created! ID: {}",
            request.event.title, created.event_id
        ))];
        notices.extend(self.overview().await);
        notices
    }

    /// Admin overview: tallies every event's seats, one details call per event.
    pub async fn overview(&self) -> Vec<Notice> {
        let events = match self.state.api.list_events().await {
            Ok(events) if events.is_empty() => return vec![Notice::info("No events found")],
            Ok(events) => events,
            Err(e) => return vec![AppError::from(e).into_notice("Loading events failed")],
        };

        let mut entries = Vec::with_capacity(events.len());
        for event in events {
            let counts = match self.state.api.event_details(&event.id).await {
                Ok(details) => Some(details.counts()),
                Err(e) => {
                    warn!(event_id = %event.id, "Seat tally unavailable: {}", e);
                    None
                }
            };
            entries.push((event, counts));
        }
        vec![Notice::info(render::event_overview(&entries))]
    }

    pub fn status(&self) -> Notice {
        let Some(tracker) = self.tracker.as_ref() else {
            return Notice::info("Not signed in");
        };
        let viewing = self.viewing.as_deref().unwrap_or("none");
        let reservation = match tracker.state() {
            TrackerState::Pending(record) => format!(
                "seat {} of event {}, {} left",
                record.seat_number,
                record.event_id,
                tracker.remaining().unwrap_or_default()
            ),
            TrackerState::Expired { event_id } => format!("expired (event {})", event_id),
            TrackerState::Idle | TrackerState::Confirmed => "none".to_string(),
        };
        Notice::info(format!(
            "User: {}  Viewing: {}  Reservation: {}",
            tracker.user_id(),
            viewing,
            reservation
        ))
    }

    /// Waits for the next countdown tick or deferred reload.
    pub async fn next_timer(&mut self) -> TimerEvent {
        tokio::select! {
            _ = self.ticker.tick() => TimerEvent::Tick,
            refresh = self.deferred.fired() => TimerEvent::Refresh(refresh),
        }
    }

    pub async fn handle_timer(&mut self, event: TimerEvent) -> Vec<Notice> {
        match event {
            TimerEvent::Tick => self.on_tick().await,
            TimerEvent::Refresh(refresh) => self.on_refresh(refresh).await,
        }
    }

    async fn on_tick(&mut self) -> Vec<Notice> {
        let Some(tracker) = self.tracker.as_mut() else {
            self.ticker.cancel();
            return Vec::new();
        };

        match tracker.tick().await {
            Tick::Remaining(remaining) => vec![Notice::timer(format!("Time left to confirm: {}", remaining))],
            Tick::Expired { record } => {
                self.ticker.cancel();
                self.deferred.schedule(
                    record.event_id,
                    RefreshReason::Expired,
                    self.state.expiry_refresh_delay(),
                );
                vec![Notice::error(format!(
                    "Time is up. The hold on seat {} will be released automatically.",
                    record.seat_number
                ))]
            }
            Tick::Idle => {
                self.ticker.cancel();
                Vec::new()
            }
        }
    }

    async fn on_refresh(&mut self, refresh: ScheduledRefresh) -> Vec<Notice> {
        if self.tracker.is_none() {
            warn!(event_id = %refresh.event_id, "Dropping refresh scheduled before sign-out");
            return Vec::new();
        }

        let notices = self.view_event(&refresh.event_id).await;
        if refresh.reason == RefreshReason::Expired {
            if let Some(tracker) = self.tracker.as_mut() {
                tracker.settle();
            }
        }
        notices
    }
}
