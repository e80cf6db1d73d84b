//! Agent execution loop.
//!
//! `Agent` runs the sequential model/tool loop: stream a model turn, run any
//! requested tools one at a time, feed the results back, and repeat until
//! the model ends its turn or the round limit is hit. Hooks fire after every
//! appended message and once at the end. GenAI spans instrument every model
//! call.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::{Stream, StreamExt};
use pin_project_lite::pin_project;
use tracing::{Span, debug, info, info_span, warn};

use firecmd_types::agent::{AgentConfig, AgentEvent, AgentState};
use firecmd_types::llm::{
    CompletionRequest, ContentBlock, LlmError, Message, MessageRole, StopReason, StreamEvent,
};

use crate::hooks::HookProvider;
use crate::llm::box_provider::BoxLlmProvider;
use crate::tool::ToolRegistry;

use super::context::AgentContext;

/// A configured agent bound to one conversation.
pub struct Agent {
    config: AgentConfig,
    provider: Arc<BoxLlmProvider>,
    tools: Arc<ToolRegistry>,
    hooks: Vec<Arc<dyn HookProvider>>,
    context: AgentContext,
}

impl Agent {
    pub fn new(
        config: AgentConfig,
        provider: Arc<BoxLlmProvider>,
        tools: Arc<ToolRegistry>,
        hooks: Vec<Arc<dyn HookProvider>>,
        state: AgentState,
    ) -> Self {
        let context = AgentContext::new(config.system_prompt.clone(), state);
        Self {
            config,
            provider,
            tools,
            hooks,
            context,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn context(&self) -> &AgentContext {
        &self.context
    }

    /// Run every hook's initialization callback.
    pub async fn initialize(&mut self) {
        for hook in &self.hooks {
            debug!(hook = hook.name(), "Running initialization hook");
            hook.on_agent_initialized(&mut self.context).await;
        }
    }

    /// Append a message and notify hooks.
    async fn push_message(&mut self, message: Message) {
        self.context.messages.push(message);
        for hook in &self.hooks {
            hook.on_message_added(&mut self.context).await;
        }
    }

    async fn finish_invocation(&mut self) {
        for hook in &self.hooks {
            hook.after_invocation(&mut self.context).await;
        }
    }

    fn build_request(&self) -> CompletionRequest {
        CompletionRequest {
            model: self.config.model.clone(),
            messages: self.context.messages.clone(),
            system: Some(self.context.system_prompt.clone()),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            tools: self.tools.definitions(),
            stop_sequences: None,
        }
    }

    fn model_stream(
        &self,
        request: CompletionRequest,
        round: u32,
    ) -> StreamInSpan<Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>> {
        let span = info_span!(
            "gen_ai.chat",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            gen_ai.agent.name = %self.config.name,
            gen_ai.agent.round = round,
        );
        StreamInSpan::new(self.provider.stream(request), span)
    }

    /// Process one user prompt, streaming agent events.
    ///
    /// Consumes the agent: each invocation gets a freshly built agent.
    pub fn stream(self, prompt: impl Into<String>) -> Pin<Box<dyn Stream<Item = AgentEvent> + Send>> {
        let prompt = prompt.into();
        Box::pin(async_stream::stream! {
            let mut agent = self;
            agent.push_message(Message::user(prompt)).await;

            let mut rounds = 0u32;
            loop {
                if rounds >= agent.config.max_tool_rounds {
                    warn!(
                        agent = %agent.config.name,
                        rounds,
                        "Tool round limit reached, ending turn"
                    );
                    yield AgentEvent::Complete { stop_reason: None, rounds };
                    break;
                }
                rounds += 1;

                let request = agent.build_request();
                let mut events = agent.model_stream(request, rounds);

                let mut text = String::new();
                let mut tool_calls: Vec<ContentBlock> = Vec::new();
                let mut stop_reason = StopReason::EndTurn;
                let mut failure: Option<LlmError> = None;

                while let Some(event) = events.next().await {
                    match event {
                        Ok(StreamEvent::TextDelta { text: delta, .. }) => {
                            text.push_str(&delta);
                            yield AgentEvent::Text { data: delta };
                        }
                        Ok(StreamEvent::ToolUseComplete { id, name, input }) => {
                            tool_calls.push(ContentBlock::ToolUse { id, name, input });
                        }
                        Ok(StreamEvent::MessageDelta { stop_reason: reason }) => {
                            stop_reason = reason;
                        }
                        Ok(StreamEvent::Usage(usage)) => {
                            debug!(
                                input_tokens = usage.input_tokens,
                                output_tokens = usage.output_tokens,
                                "Model usage"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => {
                            failure = Some(e);
                            break;
                        }
                    }
                }

                if let Some(e) = failure {
                    warn!(agent = %agent.config.name, error = %e, "Model stream failed");
                    yield AgentEvent::Error { message: e.to_string() };
                    break;
                }

                let mut content = Vec::with_capacity(tool_calls.len() + 1);
                if !text.is_empty() {
                    content.push(ContentBlock::Text { text });
                }
                content.extend(tool_calls.iter().cloned());
                if content.is_empty() {
                    debug!("Model returned an empty turn");
                    yield AgentEvent::Complete { stop_reason: Some(stop_reason), rounds };
                    break;
                }
                agent
                    .push_message(Message {
                        role: MessageRole::Assistant,
                        content,
                    })
                    .await;

                if tool_calls.is_empty() {
                    yield AgentEvent::Complete { stop_reason: Some(stop_reason), rounds };
                    break;
                }

                let mut results = Vec::with_capacity(tool_calls.len());
                for call in tool_calls {
                    let ContentBlock::ToolUse { id, name, input } = call else {
                        continue;
                    };
                    yield AgentEvent::ToolStart { tool_use_id: id.clone(), name: name.clone() };
                    let outcome = agent.tools.dispatch(&name, input).await;
                    yield AgentEvent::ToolEnd {
                        tool_use_id: id.clone(),
                        name,
                        is_error: outcome.is_error,
                    };
                    results.push(ContentBlock::ToolResult {
                        tool_use_id: id,
                        content: outcome.content,
                        is_error: outcome.is_error,
                    });
                }
                agent.push_message(Message::tool_results(results)).await;
            }

            agent.finish_invocation().await;
            info!(agent = %agent.config.name, rounds, "Invocation finished");
        })
    }

    /// Process one user prompt and return the final assistant text.
    ///
    /// Text streamed before a tool call is dropped; only the answer after
    /// the last tool round is kept.
    pub async fn invoke(self, prompt: impl Into<String>) -> Result<String, LlmError> {
        let mut events = self.stream(prompt);
        let mut answer = String::new();
        while let Some(event) = events.next().await {
            match event {
                AgentEvent::Text { data } => answer.push_str(&data),
                AgentEvent::ToolStart { .. } => answer.clear(),
                AgentEvent::Error { message } => return Err(LlmError::Provider { message }),
                _ => {}
            }
        }
        Ok(answer)
    }
}

pin_project! {
    /// Keeps a tracing span entered while the inner stream is polled.
    pub struct StreamInSpan<S> {
        #[pin]
        inner: S,
        span: Span,
    }
}

impl<S> StreamInSpan<S> {
    pub fn new(inner: S, span: Span) -> Self {
        Self { inner, span }
    }
}

impl<S: Stream> Stream for StreamInSpan<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        let _enter = this.span.enter();
        this.inner.poll_next(cx)
    }
}
