//! Streaming events and their decoding from websocket frames.

use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::model::{Notification, Status};

/// Error when decode a frame as client event
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)), module(error), context(suffix(false)))]
pub enum DecodeError {
    /// frame is not a valid event envelope
    #[snafu(display("parse stream envelope failed: {source}"))]
    InvalidEnvelope {
        /// raw frame, lossy utf-8
        frame: String,
        /// source error
        source: serde_json::Error,
    },

    /// envelope carries an event type this client does not know
    #[snafu(display("stream envelope has unknown event type {event}"))]
    UnknownEventType {
        /// received event type
        event: String,
    },

    /// envelope of an event type that needs a payload has none
    #[snafu(display("stream envelope of {event} event has no payload"))]
    MissingPayload {
        /// received event type
        event: String,
    },

    /// inner payload is not valid for its event type
    #[snafu(display("parse payload of {event} event failed: {source}"))]
    InvalidPayload {
        /// received event type
        event: String,
        /// source error
        source: serde_json::Error,
    },
}

/// Outer wrapper of one stream message, the payload is itself a json document in a string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEnvelope {
    /// event type
    pub event: String,
    /// json encoded payload
    #[serde(default)]
    pub payload: Option<String>,
}

/// Event received from the streaming api
#[derive(Debug, Clone, PartialEq, Eq, EnumAsInner)]
pub enum ClientEvent {
    /// a new status in the subscribed timeline
    Update(Status),
    /// a new notification
    Notification(Notification),
    /// a status was deleted
    Delete {
        /// id of the deleted status
        status_id: String,
    },
    /// the keyword filters of the user changed
    KeywordFiltersChanged,
}

impl ClientEvent {
    /// event type name as sent by the server
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Update(_) => "update",
            Self::Notification(_) => "notification",
            Self::Delete { .. } => "delete",
            Self::KeywordFiltersChanged => "filters_changed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventType {
    Update,
    Notification,
    Delete,
    FiltersChanged,
}

impl EventType {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "update" => Some(Self::Update),
            "notification" => Some(Self::Notification),
            "delete" => Some(Self::Delete),
            "filters_changed" => Some(Self::FiltersChanged),
            _ => None,
        }
    }
}

impl StreamEnvelope {
    /// Decode the payload according to the event type
    pub fn parse_event(self) -> Result<ClientEvent, DecodeError> {
        let Self { event, payload } = self;

        let t = match EventType::from_tag(&event) {
            Some(t) => t,
            None => return error::UnknownEventType { event }.fail(),
        };

        if t == EventType::FiltersChanged {
            return Ok(ClientEvent::KeywordFiltersChanged);
        }

        let payload = payload.with_context(|| error::MissingPayload { event: &event })?;

        match t {
            EventType::Update => serde_json::from_str(&payload)
                .map(ClientEvent::Update)
                .context(error::InvalidPayload { event }),
            EventType::Notification => serde_json::from_str(&payload)
                .map(ClientEvent::Notification)
                .context(error::InvalidPayload { event }),
            EventType::Delete => Ok(ClientEvent::Delete { status_id: payload }),
            EventType::FiltersChanged => Ok(ClientEvent::KeywordFiltersChanged),
        }
    }
}

/// Decode a text or binary frame.
///
/// Empty frames are heartbeats and decode to `None`.
pub fn decode_frame(data: &[u8]) -> Result<Option<ClientEvent>, DecodeError> {
    if data.is_empty() {
        return Ok(None);
    }

    let envelope: StreamEnvelope = serde_json::from_slice(data).with_context(|_| {
        error::InvalidEnvelope {
            frame: String::from_utf8_lossy(data),
        }
    })?;

    log::trace!("Decoding {} event", envelope.event);

    envelope.parse_event().map(Some)
}
