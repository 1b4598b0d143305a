//! # PagerDuty Events
//!
//! A Rust client library for the [PagerDuty Events API v2](https://developer.pagerduty.com/docs/events-api-v2/overview/).
//!
//! ## Features
//!
//! - Trigger, acknowledge and resolve alerts
//! - Typed event builders with an escape hatch for extra top-level fields
//! - Optional dedup key derived from the alert summary
//! - Configurable headers, timeouts, proxy and client certificates
//!
//! Each send is a single request. Rate limiting (HTTP 403) is returned as a
//! status for the caller to handle; a rejected event (HTTP 400) is returned
//! as [`PagerDutyError::ServiceRejected`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use pagerduty_events::{Connection, Event, EventFields, ResolveEvent, Severity, TriggerEvent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut connection = Connection::new();
//!
//!     let mut trigger: Event = TriggerEvent::new(
//!         "R0UT1NGKEY",
//!         "Memory usage is above 90%",
//!         "web-1.example.com",
//!         Severity::Warning,
//!     )
//!     .with_component("my-app")
//!     .with_auto_dedup(true)
//!     .into();
//!
//!     connection.send(&mut trigger).await?;
//!
//!     let dedup_key = trigger.dedup_key().unwrap_or_default().to_string();
//!     let mut resolve: Event = ResolveEvent::new("R0UT1NGKEY", dedup_key).into();
//!     connection.send(&mut resolve).await?;
//!     Ok(())
//! }
//! ```

mod client;
mod errors;
mod event;
mod options;
mod types;

pub use client::{Connection, SendResponse};
pub use errors::{PagerDutyError, Result};
pub use event::{
    AcknowledgeEvent, Event, EventFields, EventHeader, ResolveEvent, TriggerEvent, TriggerPayload,
    MAX_DEDUP_KEY_LEN,
};
pub use options::{
    TransportOptions, DEFAULT_CONNECT_TIMEOUT, DEFAULT_EVENTS_URL, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_USER_AGENT,
};
pub use types::{ApiResponse, EventAction, Image, Link, Severity};
