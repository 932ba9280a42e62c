//! Wire types for the streaming completion protocol.
//!
//! Frames arrive as newline-delimited JSON objects, optionally prefixed with
//! `data: `. Each decoded frame is a [`ProtocolEvent`] carrying an event type
//! tag and a data block with an incremental text delta and a phase tag.
//! Events are ephemeral: consumed immediately, never persisted.

use serde::Deserialize;

/// Completion event type emitted by the endpoint.
pub const EVENT_CHAT_COMPLETION: &str = "chat:completion";

/// Phase tag on intermediate reasoning deltas.
pub const PHASE_THINKING: &str = "thinking";

/// Phase tag on the terminal event.
pub const PHASE_DONE: &str = "done";

/// One decoded unit from the response stream.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProtocolEvent {
    /// Event type tag, e.g. `"chat:completion"`.
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub data: EventData,
}

/// Payload of a [`ProtocolEvent`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventData {
    /// Incremental text delta, absent on keepalive/terminal events.
    #[serde(default)]
    pub delta_content: Option<String>,
    /// Phase tag: `"thinking"`, the final answer phase, or `"done"`.
    #[serde(default)]
    pub phase: Option<String>,
    /// Explicit completion flag, an alternative terminal signal.
    #[serde(default)]
    pub done: Option<bool>,
}

impl ProtocolEvent {
    /// Whether this is a completion event (anything else is ignored).
    pub fn is_completion(&self) -> bool {
        self.event_type == EVENT_CHAT_COMPLETION
    }

    /// Whether the delta belongs to the intermediate thinking phase.
    pub fn is_thinking(&self) -> bool {
        self.data.phase.as_deref() == Some(PHASE_THINKING)
    }

    /// Whether this event signals the end of the assistant response.
    pub fn is_terminal(&self) -> bool {
        self.data.phase.as_deref() == Some(PHASE_DONE) || self.data.done == Some(true)
    }
}
