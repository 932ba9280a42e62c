//! Conversation identity and per-turn state.
//!
//! [`ConversationState`] owns the conversation id, model, system prompt,
//! feature flags, and the per-turn message identifiers that let the remote
//! server reconstruct conversation history: each turn's assistant-message id
//! becomes the parent id recorded for the following turn. It also builds the
//! two outbound payload shapes the client sends.
//!
//! The id generator and clock are injected at construction so tests can
//! substitute deterministic values.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

/// Produces globally unique message identifiers.
pub type IdGenerator = Box<dyn Fn() -> String + Send>;

/// Supplies the current wall-clock time.
pub type Clock = Box<dyn Fn() -> DateTime<Local> + Send>;

/// Programming-contract violations in turn orchestration.
///
/// These are loud and immediate; correct orchestration never hits them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("begin_turn must be called before building a payload")]
    TurnNotStarted,
    #[error("conversation id is required before building a completion payload")]
    MissingConversationId,
    #[error("conversation id is already set and cannot change")]
    ConversationIdAlreadySet,
}

/// Named feature toggles plus opaque flag strings, snapshotted per turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlags {
    #[serde(default = "default_true")]
    pub preview_mode: bool,
    #[serde(default)]
    pub enable_thinking: bool,
    #[serde(default)]
    pub image_generation: bool,
    #[serde(default)]
    pub web_search: bool,
    #[serde(default)]
    pub auto_web_search: bool,
    #[serde(default)]
    pub flags: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            preview_mode: true,
            enable_thinking: false,
            image_generation: false,
            web_search: false,
            auto_web_search: false,
            flags: Vec::new(),
        }
    }
}

/// Mutable per-conversation state, owned by exactly one orchestration loop.
pub struct ConversationState {
    model: String,
    conversation_id: Option<String>,
    system_prompt: Option<String>,
    features: FeatureFlags,
    user_name: String,
    user_language: String,
    user_timezone: String,
    current_user_message_id: Option<String>,
    current_assistant_message_id: Option<String>,
    parent_message_id: Option<String>,
    assistant_content: String,
    id_gen: IdGenerator,
    clock: Clock,
}

impl ConversationState {
    /// Creates state with UUIDv4 message ids and the system clock.
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_deps(
            model,
            Box::new(|| Uuid::new_v4().to_string()),
            Box::new(Local::now),
        )
    }

    /// Creates state with an explicit id generator and clock.
    pub fn with_deps(model: impl Into<String>, id_gen: IdGenerator, clock: Clock) -> Self {
        Self {
            model: model.into(),
            conversation_id: None,
            system_prompt: None,
            features: FeatureFlags::default(),
            user_name: "User".to_string(),
            user_language: "en-US".to_string(),
            user_timezone: "UTC".to_string(),
            current_user_message_id: None,
            current_assistant_message_id: None,
            parent_message_id: None,
            assistant_content: String::new(),
            id_gen,
            clock,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    /// Records the server-assigned conversation id. Once set it never changes;
    /// assigning a different id is a contract violation.
    pub fn set_conversation_id(&mut self, id: impl Into<String>) -> Result<(), StateError> {
        let id = id.into();
        match &self.conversation_id {
            Some(existing) if *existing != id => Err(StateError::ConversationIdAlreadySet),
            _ => {
                self.conversation_id = Some(id);
                Ok(())
            }
        }
    }

    pub fn set_system_prompt(&mut self, prompt: Option<String>) {
        self.system_prompt = prompt.filter(|p| !p.is_empty());
    }

    pub fn set_features(&mut self, features: FeatureFlags) {
        self.features = features;
    }

    pub fn set_user(
        &mut self,
        name: impl Into<String>,
        language: impl Into<String>,
        timezone: impl Into<String>,
    ) {
        self.user_name = name.into();
        self.user_language = language.into();
        self.user_timezone = timezone.into();
    }

    /// Text accumulated from the in-flight assistant response.
    pub fn assistant_content(&self) -> &str {
        &self.assistant_content
    }

    pub fn current_user_message_id(&self) -> Option<&str> {
        self.current_user_message_id.as_deref()
    }

    pub fn current_assistant_message_id(&self) -> Option<&str> {
        self.current_assistant_message_id.as_deref()
    }

    /// The previous turn's assistant id, threaded as the next parent link.
    pub fn parent_message_id(&self) -> Option<&str> {
        self.parent_message_id.as_deref()
    }

    /// Allocates fresh user and assistant message ids for a new turn and
    /// resets the accumulated assistant content. Must be called exactly once
    /// before building either payload variant for the turn.
    pub fn begin_turn(&mut self) -> (String, String) {
        let user_id = (self.id_gen)();
        let assistant_id = (self.id_gen)();
        self.current_user_message_id = Some(user_id.clone());
        self.current_assistant_message_id = Some(assistant_id.clone());
        self.assistant_content.clear();
        (user_id, assistant_id)
    }

    /// Appends a final-answer delta to the accumulated assistant content.
    /// Thinking-phase deltas are display-only and must not be passed here.
    pub fn apply_delta(&mut self, delta: &str) {
        self.assistant_content.push_str(delta);
    }

    /// Threads the current assistant id into the parent slot for the next
    /// turn. Idempotent: with no state change in between, a second call is
    /// observably identical to the first.
    pub fn finish_turn(&mut self) {
        self.parent_message_id = self.current_assistant_message_id.clone();
    }

    /// System prompt duplicated across the aliased keys the endpoint accepts.
    /// Empty object when no system prompt is configured.
    fn system_params(&self) -> Value {
        match &self.system_prompt {
            Some(p) => json!({
                "system": p,
                "system_prompt": p,
                "assistant_system_prompt": p,
            }),
            None => json!({}),
        }
    }

    /// Like [`system_params`](Self::system_params) with the extra
    /// `instructions` alias used in the `extra` block.
    fn system_extra(&self) -> Value {
        match &self.system_prompt {
            Some(p) => json!({
                "system": p,
                "system_prompt": p,
                "assistant_system_prompt": p,
                "instructions": p,
            }),
            None => json!({}),
        }
    }

    /// Builds the new-conversation payload: the first user message keyed by
    /// its message id with no parent, plus conversation-level configuration.
    pub fn build_new_conversation_payload(&self, prompt: &str) -> Result<Value, StateError> {
        let user_id = self
            .current_user_message_id
            .as_ref()
            .ok_or(StateError::TurnNotStarted)?;
        let now = (self.clock)();
        let timestamp_secs = now.timestamp();

        // The history map is keyed by the message id itself.
        let mut messages = serde_json::Map::new();
        messages.insert(
            user_id.clone(),
            json!({
                "id": user_id,
                "parentId": null,
                "childrenIds": [],
                "role": "user",
                "content": prompt,
                "timestamp": timestamp_secs,
                "models": [&self.model],
            }),
        );

        Ok(json!({
            "chat": {
                "id": "",
                "title": "New Chat",
                "models": [&self.model],
                "params": self.system_params(),
                "history": {
                    "messages": messages,
                    "currentId": user_id,
                },
                "tags": [],
                "flags": &self.features.flags,
                "features": [
                    {"type": "mcp", "server": "vibe-coding", "status": "hidden"},
                    {"type": "mcp", "server": "ppt-maker", "status": "hidden"},
                    {"type": "mcp", "server": "image-search", "status": "hidden"},
                    {"type": "mcp", "server": "deep-research", "status": "hidden"},
                    {"type": "tool_selector", "server": "tool_selector", "status": "hidden"},
                ],
                "mcp_servers": [],
                "enable_thinking": self.features.enable_thinking,
                "auto_web_search": self.features.auto_web_search,
                "message_version": 1,
                "extra": self.system_extra(),
                "timestamp": timestamp_secs * 1000,
            }
        }))
    }

    /// Builds the completion payload for the current turn: the literal prompt
    /// as the sole message, a feature snapshot, templated variables from the
    /// current wall clock, the turn's identifiers, and the parent link.
    pub fn build_completion_payload(&self, prompt: &str) -> Result<Value, StateError> {
        let conversation_id = self
            .conversation_id
            .as_ref()
            .ok_or(StateError::MissingConversationId)?;
        let (user_id, assistant_id) = match (
            &self.current_user_message_id,
            &self.current_assistant_message_id,
        ) {
            (Some(u), Some(a)) => (u, a),
            _ => return Err(StateError::TurnNotStarted),
        };
        let now = (self.clock)();

        let mut variables = serde_json::Map::new();
        variables.insert("{{USER_NAME}}".into(), json!(&self.user_name));
        variables.insert("{{USER_LOCATION}}".into(), json!("Unknown"));
        variables.insert(
            "{{CURRENT_DATETIME}}".into(),
            json!(now.format("%Y-%m-%d %H:%M:%S").to_string()),
        );
        variables.insert(
            "{{CURRENT_DATE}}".into(),
            json!(now.format("%Y-%m-%d").to_string()),
        );
        variables.insert(
            "{{CURRENT_TIME}}".into(),
            json!(now.format("%H:%M:%S").to_string()),
        );
        variables.insert(
            "{{CURRENT_WEEKDAY}}".into(),
            json!(now.format("%A").to_string()),
        );
        variables.insert("{{CURRENT_TIMEZONE}}".into(), json!(&self.user_timezone));
        variables.insert("{{USER_LANGUAGE}}".into(), json!(&self.user_language));
        if let Some(p) = &self.system_prompt {
            variables.insert("{{SYSTEM_PROMPT}}".into(), json!(p));
        }

        Ok(json!({
            "stream": true,
            "model": &self.model,
            "messages": [{"role": "user", "content": prompt}],
            "signature_prompt": prompt,
            "params": self.system_params(),
            "extra": self.system_extra(),
            "features": {
                "preview_mode": self.features.preview_mode,
                "enable_thinking": self.features.enable_thinking,
                "image_generation": self.features.image_generation,
                "web_search": self.features.web_search,
                "auto_web_search": self.features.auto_web_search,
                "flags": &self.features.flags,
            },
            "variables": variables,
            "chat_id": conversation_id,
            "id": assistant_id,
            "current_user_message_id": user_id,
            "current_user_message_parent_id": &self.parent_message_id,
            "background_tasks": {
                "title_generation": true,
                "tags_generation": true,
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_ids() -> IdGenerator {
        let counter = AtomicUsize::new(0);
        Box::new(move || format!("id-{}", counter.fetch_add(1, Ordering::SeqCst)))
    }

    fn fixed_clock() -> Clock {
        // 2024-05-04 was a Saturday.
        Box::new(|| Local.with_ymd_and_hms(2024, 5, 4, 12, 30, 45).unwrap())
    }

    fn test_state() -> ConversationState {
        ConversationState::with_deps(crate::constants::DEFAULT_MODEL, counting_ids(), fixed_clock())
    }

    #[test]
    fn begin_turn_allocates_ids_and_resets_content() {
        let mut state = test_state();
        let (user, assistant) = state.begin_turn();
        assert_eq!(user, "id-0");
        assert_eq!(assistant, "id-1");
        state.apply_delta("partial");
        state.begin_turn();
        assert_eq!(state.assistant_content(), "");
        assert_eq!(state.current_user_message_id(), Some("id-2"));
        assert_eq!(state.current_assistant_message_id(), Some("id-3"));
    }

    #[test]
    fn deltas_accumulate_in_order() {
        let mut state = test_state();
        state.begin_turn();
        state.apply_delta("Hel");
        state.apply_delta("lo");
        state.apply_delta("!");
        assert_eq!(state.assistant_content(), "Hello!");
    }

    #[test]
    fn parent_link_threads_across_turns() {
        let mut state = test_state();
        state.set_conversation_id("conv-1").unwrap();

        let (_, assistant_1) = state.begin_turn();
        // No terminal event observed; the safety net still runs.
        state.finish_turn();

        state.begin_turn();
        assert_eq!(state.parent_message_id(), Some(assistant_1.as_str()));

        let payload = state.build_completion_payload("next").unwrap();
        assert_eq!(
            payload["current_user_message_parent_id"],
            json!(assistant_1)
        );
    }

    #[test]
    fn finish_turn_is_idempotent() {
        let mut state = test_state();
        let (_, assistant) = state.begin_turn();
        state.finish_turn();
        state.finish_turn();
        assert_eq!(state.parent_message_id(), Some(assistant.as_str()));
    }

    #[test]
    fn completion_payload_requires_conversation_id_and_turn() {
        let mut state = test_state();
        assert_eq!(
            state.build_completion_payload("hi").unwrap_err(),
            StateError::MissingConversationId
        );
        state.set_conversation_id("conv-1").unwrap();
        assert_eq!(
            state.build_completion_payload("hi").unwrap_err(),
            StateError::TurnNotStarted
        );
    }

    #[test]
    fn completion_payload_carries_exact_identifiers() {
        let mut state = test_state();
        state.set_conversation_id("conv-1").unwrap();
        let (user, assistant) = state.begin_turn();

        let payload = state.build_completion_payload("hello").unwrap();
        assert_eq!(payload["stream"], json!(true));
        assert_eq!(payload["chat_id"], json!("conv-1"));
        assert_eq!(payload["id"], json!(assistant));
        assert_eq!(payload["current_user_message_id"], json!(user));
        assert_eq!(payload["current_user_message_parent_id"], json!(null));
        assert_eq!(payload["signature_prompt"], json!("hello"));
        assert_eq!(payload["messages"][0]["content"], json!("hello"));
        assert_eq!(payload["background_tasks"]["title_generation"], json!(true));
    }

    #[test]
    fn variables_substitute_from_injected_clock() {
        let mut state = test_state();
        state.set_conversation_id("conv-1").unwrap();
        state.begin_turn();

        let payload = state.build_completion_payload("hi").unwrap();
        let vars = &payload["variables"];
        assert_eq!(vars["{{CURRENT_DATE}}"], json!("2024-05-04"));
        assert_eq!(vars["{{CURRENT_TIME}}"], json!("12:30:45"));
        assert_eq!(vars["{{CURRENT_WEEKDAY}}"], json!("Saturday"));
        assert_eq!(vars["{{USER_NAME}}"], json!("User"));
        assert_eq!(vars["{{USER_LANGUAGE}}"], json!("en-US"));
    }

    #[test]
    fn new_conversation_payload_requires_begin_turn() {
        let state = test_state();
        assert_eq!(
            state.build_new_conversation_payload("hi").unwrap_err(),
            StateError::TurnNotStarted
        );
    }

    #[test]
    fn new_conversation_payload_embeds_first_message() {
        let mut state = test_state();
        let (user, _) = state.begin_turn();
        let payload = state.build_new_conversation_payload("first prompt").unwrap();

        let chat = &payload["chat"];
        assert_eq!(chat["id"], json!(""));
        assert_eq!(chat["models"], json!([crate::constants::DEFAULT_MODEL]));
        assert_eq!(chat["history"]["currentId"], json!(user));
        let msg = &chat["history"]["messages"][&user];
        assert_eq!(msg["content"], json!("first prompt"));
        assert_eq!(msg["parentId"], json!(null));
        assert_eq!(msg["role"], json!("user"));
    }

    #[test]
    fn system_prompt_aliases_duplicate_or_vanish() {
        let mut state = test_state();
        state.begin_turn();

        let payload = state.build_new_conversation_payload("hi").unwrap();
        assert_eq!(payload["chat"]["params"], json!({}));
        assert_eq!(payload["chat"]["extra"], json!({}));

        state.set_system_prompt(Some("be brief".into()));
        let payload = state.build_new_conversation_payload("hi").unwrap();
        let params = &payload["chat"]["params"];
        assert_eq!(params["system"], json!("be brief"));
        assert_eq!(params["system_prompt"], json!("be brief"));
        assert_eq!(params["assistant_system_prompt"], json!("be brief"));
        assert_eq!(payload["chat"]["extra"]["instructions"], json!("be brief"));
    }

    #[test]
    fn conversation_id_set_once() {
        let mut state = test_state();
        state.set_conversation_id("conv-1").unwrap();
        // Re-setting the same id is a no-op.
        state.set_conversation_id("conv-1").unwrap();
        assert_eq!(
            state.set_conversation_id("conv-2").unwrap_err(),
            StateError::ConversationIdAlreadySet
        );
        assert_eq!(state.conversation_id(), Some("conv-1"));
    }

    #[test]
    fn empty_system_prompt_is_treated_as_absent() {
        let mut state = test_state();
        state.set_system_prompt(Some(String::new()));
        state.begin_turn();
        let payload = state.build_new_conversation_payload("hi").unwrap();
        assert_eq!(payload["chat"]["params"], json!({}));
    }
}
