use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{PagerDutyError, Result};
use crate::types::{EventAction, Image, Link};

/// Longest dedup key PagerDuty accepts, in characters
pub const MAX_DEDUP_KEY_LEN: usize = 255;

/// Top-level keys owned by typed fields that cannot be written through
/// [`EventFields::set`]
const READ_ONLY_KEYS: &[&str] = &["routing_key", "event_action", "payload", "links", "images"];

fn truncate_dedup_key(mut key: String) -> String {
    if let Some((idx, _)) = key.char_indices().nth(MAX_DEDUP_KEY_LEN) {
        key.truncate(idx);
    }
    key
}

/// Fields shared by every event: routing key, action, dedup key, and any
/// extra top-level keys
///
/// Extra keys are serialized next to the typed ones, which lets callers send
/// fields this crate does not model yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventHeader {
    routing_key: String,

    event_action: EventAction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    dedup_key: Option<String>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl EventHeader {
    fn new(routing_key: impl Into<String>, event_action: EventAction) -> Self {
        Self {
            routing_key: routing_key.into(),
            event_action,
            dedup_key: None,
            extra: Map::new(),
        }
    }

    /// Integration routing key
    pub fn routing_key(&self) -> &str {
        &self.routing_key
    }

    /// Lifecycle verb, fixed at construction
    pub fn event_action(&self) -> EventAction {
        self.event_action
    }

    /// Current dedup key
    pub fn dedup_key(&self) -> Option<&str> {
        self.dedup_key.as_deref()
    }

    /// Extra top-level keys, in insertion order
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    fn set_dedup_key(&mut self, key: String) {
        self.dedup_key = Some(truncate_dedup_key(key));
    }

    fn get(&self, key: &str) -> Option<Value> {
        match key {
            "routing_key" => Some(Value::String(self.routing_key.clone())),
            "event_action" => Some(Value::String(self.event_action.to_string())),
            "dedup_key" => self.dedup_key.clone().map(Value::String),
            _ => self.extra.get(key).cloned(),
        }
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        if key.is_empty() {
            return Err(PagerDutyError::InvalidArgument(
                "event key must not be empty".to_string(),
            ));
        }
        if READ_ONLY_KEYS.contains(&key) {
            return Err(PagerDutyError::InvalidArgument(format!(
                "'{key}' cannot be set through generic key access"
            )));
        }
        if key == "dedup_key" {
            return match value {
                Value::String(dedup_key) => {
                    self.set_dedup_key(dedup_key);
                    Ok(())
                }
                other => Err(PagerDutyError::InvalidArgument(format!(
                    "'dedup_key' must be a string, got {other}"
                ))),
            };
        }
        self.extra.insert(key.to_string(), value);
        Ok(())
    }

    fn unset(&mut self, key: &str) -> Option<Value> {
        if key == "dedup_key" {
            return self.dedup_key.take().map(Value::String);
        }
        self.extra.shift_remove(key)
    }
}

/// Access shared by all event variants
///
/// Besides the typed accessors this exposes the event as a flat dictionary
/// of top-level keys. Reads never fail; missing keys return `None`.
pub trait EventFields {
    fn header(&self) -> &EventHeader;

    fn header_mut(&mut self) -> &mut EventHeader;

    fn routing_key(&self) -> &str {
        self.header().routing_key()
    }

    fn event_action(&self) -> EventAction {
        self.header().event_action()
    }

    fn dedup_key(&self) -> Option<&str> {
        self.header().dedup_key()
    }

    /// Set the dedup key, truncated to [`MAX_DEDUP_KEY_LEN`] characters
    fn set_dedup_key(&mut self, key: impl Into<String>) -> &mut Self
    where
        Self: Sized,
    {
        self.header_mut().set_dedup_key(key.into());
        self
    }

    /// Read a top-level key
    fn get(&self, key: &str) -> Option<Value> {
        self.header().get(key)
    }

    /// Write a top-level key
    ///
    /// # Errors
    ///
    /// Returns [`PagerDutyError::InvalidArgument`] if the key is empty,
    /// names a field that is fixed or managed by typed setters, or is
    /// `dedup_key` with a non-string value.
    fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<&mut Self>
    where
        Self: Sized,
    {
        self.header_mut().set(key, value.into())?;
        Ok(self)
    }

    /// Remove a top-level key, returning its previous value
    fn unset(&mut self, key: &str) -> Option<Value> {
        self.header_mut().unset(key)
    }

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// Details of a trigger event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TriggerPayload {
    /// Human-readable description, also the auto-dedup hash input
    pub summary: String,

    /// Host or system the alert originates from
    pub source: String,

    /// One of `critical`, `error`, `warning`, `info` (not enforced)
    pub severity: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_details: Option<Map<String, Value>>,
}

/// Event that opens or updates an alert
///
/// # Example
///
/// ```rust
/// use pagerduty_events::{EventFields, Severity, TriggerEvent};
///
/// let mut event = TriggerEvent::new("R0UT1NGKEY", "Disk full on db-1", "db-1", Severity::Critical)
///     .with_component("postgres")
///     .with_auto_dedup(true);
/// event.add_link("https://grafana.example.com/d/disk", Some("Dashboard"));
///
/// event.finalize();
/// assert!(event.dedup_key().unwrap().starts_with("md5-"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TriggerEvent {
    #[serde(flatten)]
    header: EventHeader,

    payload: TriggerPayload,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    links: Vec<Link>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    images: Vec<Image>,

    #[serde(skip)]
    auto_dedup: bool,
}

impl TriggerEvent {
    /// Create a trigger event with its required payload fields
    ///
    /// Auto-dedup is off; see [`TriggerEvent::with_auto_dedup`].
    pub fn new(
        routing_key: impl Into<String>,
        summary: impl Into<String>,
        source: impl Into<String>,
        severity: impl Into<String>,
    ) -> Self {
        Self {
            header: EventHeader::new(routing_key, EventAction::Trigger),
            payload: TriggerPayload {
                summary: summary.into(),
                source: source.into(),
                severity: severity.into(),
                timestamp: None,
                component: None,
                group: None,
                class: None,
                custom_details: None,
            },
            links: Vec::new(),
            images: Vec::new(),
            auto_dedup: false,
        }
    }

    /// Derive the dedup key from the summary on every [`finalize`](Self::finalize)
    pub fn with_auto_dedup(mut self, enabled: bool) -> Self {
        self.auto_dedup = enabled;
        self
    }

    /// Enable or disable the summary-derived dedup key
    pub fn set_auto_dedup(&mut self, enabled: bool) -> &mut Self {
        self.auto_dedup = enabled;
        self
    }

    /// Whether the dedup key is derived from the summary
    pub fn auto_dedup(&self) -> bool {
        self.auto_dedup
    }

    /// Set the dedup key, truncated to [`MAX_DEDUP_KEY_LEN`] characters
    pub fn with_dedup_key(mut self, key: impl Into<String>) -> Self {
        self.set_dedup_key(key);
        self
    }

    /// Set when the condition was detected
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.payload.timestamp = Some(timestamp);
        self
    }

    /// Set the affected component
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.payload.component = Some(component.into());
        self
    }

    /// Set the logical grouping of components
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.payload.group = Some(group.into());
        self
    }

    /// Set the class or type of the event
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.payload.class = Some(class.into());
        self
    }

    /// Attach free-form details
    pub fn with_custom_details(mut self, details: Map<String, Value>) -> Self {
        self.payload.custom_details = Some(details);
        self
    }

    /// Replace the summary; also changes an auto-derived dedup key on the next finalize
    pub fn set_summary(&mut self, summary: impl Into<String>) -> &mut Self {
        self.payload.summary = summary.into();
        self
    }

    /// Replace the source
    pub fn set_source(&mut self, source: impl Into<String>) -> &mut Self {
        self.payload.source = source.into();
        self
    }

    /// Replace the severity; any string is accepted
    pub fn set_severity(&mut self, severity: impl Into<String>) -> &mut Self {
        self.payload.severity = severity.into();
        self
    }

    /// Set when the condition was detected
    pub fn set_timestamp(&mut self, timestamp: DateTime<Utc>) -> &mut Self {
        self.payload.timestamp = Some(timestamp);
        self
    }

    /// Set the affected component
    pub fn set_component(&mut self, component: impl Into<String>) -> &mut Self {
        self.payload.component = Some(component.into());
        self
    }

    /// Set the logical grouping of components
    pub fn set_group(&mut self, group: impl Into<String>) -> &mut Self {
        self.payload.group = Some(group.into());
        self
    }

    /// Set the class or type of the event
    pub fn set_class(&mut self, class: impl Into<String>) -> &mut Self {
        self.payload.class = Some(class.into());
        self
    }

    /// Attach free-form details
    pub fn set_custom_details(&mut self, details: Map<String, Value>) -> &mut Self {
        self.payload.custom_details = Some(details);
        self
    }

    /// Append a link; absent text is omitted from the JSON
    pub fn add_link(&mut self, href: impl Into<String>, text: Option<&str>) -> &mut Self {
        self.links.push(Link {
            href: href.into(),
            text: text.map(str::to_string),
        });
        self
    }

    /// Append an image; absent href and alt are omitted from the JSON
    pub fn add_image(
        &mut self,
        src: impl Into<String>,
        href: Option<&str>,
        alt: Option<&str>,
    ) -> &mut Self {
        self.images.push(Image {
            src: src.into(),
            href: href.map(str::to_string),
            alt: alt.map(str::to_string),
        });
        self
    }

    /// Trigger-specific details
    pub fn payload(&self) -> &TriggerPayload {
        &self.payload
    }

    /// Links in insertion order
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Images in insertion order
    pub fn images(&self) -> &[Image] {
        &self.images
    }

    /// Prepare the event for encoding
    ///
    /// With auto-dedup enabled this overwrites the dedup key with
    /// `md5-<hex digest of summary>`, so each call reflects the summary at
    /// that moment. Without auto-dedup it does nothing.
    pub fn finalize(&mut self) -> &mut Self {
        if self.auto_dedup {
            let digest = Md5::digest(self.payload.summary.as_bytes());
            self.header
                .set_dedup_key(format!("md5-{}", hex::encode(digest)));
        }
        self
    }

    /// JSON body as sent to PagerDuty
    ///
    /// Pure: call [`finalize`](Self::finalize) first to refresh an
    /// auto-derived dedup key.
    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(PagerDutyError::Serialize)
    }
}

impl EventFields for TriggerEvent {
    fn header(&self) -> &EventHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut EventHeader {
        &mut self.header
    }

    fn get(&self, key: &str) -> Option<Value> {
        match key {
            "payload" => serde_json::to_value(&self.payload).ok(),
            "links" if !self.links.is_empty() => serde_json::to_value(&self.links).ok(),
            "images" if !self.images.is_empty() => serde_json::to_value(&self.images).ok(),
            "links" | "images" => None,
            _ => self.header.get(key),
        }
    }
}

/// Event that acknowledges an open alert
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AcknowledgeEvent {
    #[serde(flatten)]
    header: EventHeader,
}

impl AcknowledgeEvent {
    /// Create an acknowledge event for the alert with `dedup_key`
    pub fn new(routing_key: impl Into<String>, dedup_key: impl Into<String>) -> Self {
        let mut header = EventHeader::new(routing_key, EventAction::Acknowledge);
        header.set_dedup_key(dedup_key.into());
        Self { header }
    }

    /// JSON body as sent to PagerDuty
    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(PagerDutyError::Serialize)
    }
}

impl EventFields for AcknowledgeEvent {
    fn header(&self) -> &EventHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut EventHeader {
        &mut self.header
    }
}

/// Event that resolves an open alert
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolveEvent {
    #[serde(flatten)]
    header: EventHeader,
}

impl ResolveEvent {
    /// Create a resolve event for the alert with `dedup_key`
    pub fn new(routing_key: impl Into<String>, dedup_key: impl Into<String>) -> Self {
        let mut header = EventHeader::new(routing_key, EventAction::Resolve);
        header.set_dedup_key(dedup_key.into());
        Self { header }
    }

    /// JSON body as sent to PagerDuty
    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(PagerDutyError::Serialize)
    }
}

impl EventFields for ResolveEvent {
    fn header(&self) -> &EventHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut EventHeader {
        &mut self.header
    }
}

/// Any event accepted by the Events API
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Event {
    Trigger(TriggerEvent),
    Acknowledge(AcknowledgeEvent),
    Resolve(ResolveEvent),
}

impl Event {
    /// See [`TriggerEvent::finalize`]; a no-op for other actions
    pub fn finalize(&mut self) -> &mut Self {
        if let Event::Trigger(trigger) = self {
            trigger.finalize();
        }
        self
    }

    /// JSON body as sent to PagerDuty
    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(PagerDutyError::Serialize)
    }

    pub(crate) fn to_body(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(PagerDutyError::Serialize)
    }
}

impl EventFields for Event {
    fn header(&self) -> &EventHeader {
        match self {
            Event::Trigger(event) => event.header(),
            Event::Acknowledge(event) => event.header(),
            Event::Resolve(event) => event.header(),
        }
    }

    fn header_mut(&mut self) -> &mut EventHeader {
        match self {
            Event::Trigger(event) => event.header_mut(),
            Event::Acknowledge(event) => event.header_mut(),
            Event::Resolve(event) => event.header_mut(),
        }
    }

    fn get(&self, key: &str) -> Option<Value> {
        match self {
            Event::Trigger(event) => event.get(key),
            Event::Acknowledge(event) => event.get(key),
            Event::Resolve(event) => event.get(key),
        }
    }
}

impl From<TriggerEvent> for Event {
    fn from(event: TriggerEvent) -> Self {
        Event::Trigger(event)
    }
}

impl From<AcknowledgeEvent> for Event {
    fn from(event: AcknowledgeEvent) -> Self {
        Event::Acknowledge(event)
    }
}

impl From<ResolveEvent> for Event {
    fn from(event: ResolveEvent) -> Self {
        Event::Resolve(event)
    }
}
