//! Turn orchestration: streaming, state threading, and the bounded tool loop.
//!
//! [`Agent`] owns the conversation state and the tool registry, and drives
//! turns against a [`ChatTransport`]. A human turn streams one assistant
//! response; if the accumulated response triggers a tool, the rendered tool
//! result is fed back as the next turn, up to a fixed iteration cap. Each
//! feedback turn is a full protocol turn with fresh message ids, so the
//! parent chain stays intact across tool iterations.

use anyhow::Result;
use futures::StreamExt;

use crate::client::ChatTransport;
use crate::output::Renderer;
use crate::state::{ConversationState, StateError};
use crate::tools::ToolRegistry;

/// Drives conversation turns against a transport.
pub struct Agent<C: ChatTransport> {
    transport: C,
    state: ConversationState,
    tools: ToolRegistry,
    max_tool_iterations: usize,
}

impl<C: ChatTransport> Agent<C> {
    pub fn new(
        transport: C,
        state: ConversationState,
        tools: ToolRegistry,
        max_tool_iterations: usize,
    ) -> Self {
        Self {
            transport,
            state,
            tools,
            max_tool_iterations,
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Creates the remote conversation from the first prompt, records its
    /// server-assigned id, then streams the first turn and any tool
    /// iterations it triggers.
    pub async fn open_conversation(
        &mut self,
        renderer: &mut dyn Renderer,
        prompt: &str,
    ) -> Result<()> {
        self.state.begin_turn();
        let payload = self.state.build_new_conversation_payload(prompt)?;
        let conversation_id = self.transport.create_conversation(&payload).await?;
        self.state.set_conversation_id(conversation_id)?;

        self.stream_turn(renderer, prompt).await?;
        self.run_tool_loop(renderer).await
    }

    /// Runs one human turn: stream the response, then the bounded tool loop.
    pub async fn run_user_turn(&mut self, renderer: &mut dyn Renderer, prompt: &str) -> Result<()> {
        self.run_turn(renderer, prompt).await?;
        self.run_tool_loop(renderer).await
    }

    /// One full protocol turn: fresh message ids, then the streamed response.
    async fn run_turn(&mut self, renderer: &mut dyn Renderer, prompt: &str) -> Result<()> {
        self.state.begin_turn();
        self.stream_turn(renderer, prompt).await
    }

    /// Streams one completion and folds its events into state and display.
    ///
    /// Thinking deltas are rendered but never recorded; answer deltas are
    /// both recorded and rendered. The turn is finished on the terminal
    /// event, and again unconditionally once the stream ends, so a stream
    /// that dies mid-response still threads the parent link.
    async fn stream_turn(&mut self, renderer: &mut dyn Renderer, prompt: &str) -> Result<()> {
        let payload = self.state.build_completion_payload(prompt)?;
        let conversation_id = self
            .state
            .conversation_id()
            .ok_or(StateError::MissingConversationId)?
            .to_string();

        let mut events = self
            .transport
            .stream_completion(&conversation_id, &payload)
            .await?;

        while let Some(event) = events.next().await {
            if !event.is_completion() {
                continue;
            }
            if let Some(delta) = &event.data.delta_content {
                if event.is_thinking() {
                    renderer.render_thinking(delta);
                } else {
                    self.state.apply_delta(delta);
                    renderer.render_token(delta);
                }
            }
            if event.is_terminal() {
                self.state.finish_turn();
            }
        }

        // Safety net for streams that end without a terminal event.
        self.state.finish_turn();
        renderer.render_done();
        Ok(())
    }

    /// Feeds tool results back into the conversation, at most
    /// `max_tool_iterations` times per human turn.
    async fn run_tool_loop(&mut self, renderer: &mut dyn Renderer) -> Result<()> {
        for iteration in 0..self.max_tool_iterations {
            let Some(result) = self.tools.dispatch(self.state.assistant_content()).await else {
                break;
            };
            renderer.tool_iteration(iteration + 1, self.max_tool_iterations);
            self.run_turn(renderer, &result).await?;
        }
        Ok(())
    }
}
