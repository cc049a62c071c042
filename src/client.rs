//! Streaming chat client.
//!
//! [`StreamingChatClient`] owns the transcript, the input text and the
//! in-flight phase. Every mutation is published as a whole [`ChatSnapshot`]
//! through a `watch` channel, so a view never observes a half-applied update.
//!
//! # Lifecycle of one exchange
//!
//! ```text
//! Idle -> Sending -> Streaming -> Idle   (streamed reply)
//! Idle -> Sending -> Idle                (whole-body reply, or failure before streaming)
//! ```
//!
//! A submit that arrives while the phase is not [`Phase::Idle`] is ignored.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::decode::Utf8StreamDecoder;
use crate::message::{Message, Role, Transcript};
use crate::session::SessionId;
use crate::transport::{ChatReply, ChatRequest, ChatTransport, TransportError};

/// Reply shown in place of the assistant message when an exchange fails.
pub const APOLOGY: &str = "Sorry, something went wrong.";

/// Where the client is in the request lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// No request in flight; input is accepted.
    #[default]
    Idle,
    /// Request issued, waiting for response headers.
    Sending,
    /// Reading a streamed body.
    Streaming,
}

/// Complete view state at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatSnapshot {
    /// Conversation so far.
    pub transcript: Transcript,
    /// Current contents of the input field.
    pub input: String,
    /// Request lifecycle phase.
    pub phase: Phase,
}

impl ChatSnapshot {
    /// Check if a request is in flight.
    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Whether the submit control should be enabled.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.in_flight()
    }

    /// Whether to show the "thinking" indicator: in flight with nothing
    /// received yet for the trailing assistant message.
    #[must_use]
    pub fn is_thinking(&self) -> bool {
        self.in_flight()
            && self
                .transcript
                .last()
                .is_some_and(|m| m.role == Role::Assistant && m.content.is_empty())
    }
}

/// Why a submit was not acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Text was empty or whitespace only.
    EmptyInput,
    /// Another request is still in flight.
    Busy,
}

/// Result of a call to [`StreamingChatClient::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing was sent and the transcript is unchanged.
    Ignored(IgnoreReason),
    /// Reply received in full.
    Completed,
    /// Transport failed; the apology replaced the pending reply.
    Failed,
}

/// Chat client that renders replies progressively as they arrive.
pub struct StreamingChatClient {
    transport: Arc<dyn ChatTransport>,
    session_id: SessionId,
    state: watch::Sender<ChatSnapshot>,
}

impl std::fmt::Debug for StreamingChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingChatClient")
            .field("session_id", &self.session_id)
            .field("phase", &self.state.borrow().phase)
            .finish()
    }
}

impl StreamingChatClient {
    /// Create a client with a fresh session and an empty transcript.
    #[must_use]
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self::with_session(transport, SessionId::generate(), Transcript::new())
    }

    /// Create a client with an explicit session id and starting transcript.
    #[must_use]
    pub fn with_session(
        transport: Arc<dyn ChatTransport>,
        session_id: SessionId,
        transcript: Transcript,
    ) -> Self {
        let (state, _) = watch::channel(ChatSnapshot {
            transcript,
            ..ChatSnapshot::default()
        });
        Self {
            transport,
            session_id,
            state,
        }
    }

    /// Session id attached to every request.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Receive every published state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.state.subscribe()
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> ChatSnapshot {
        self.state.borrow().clone()
    }

    /// Replace the input field contents.
    pub fn set_input(&self, text: impl Into<String>) {
        let text = text.into();
        self.state.send_modify(|s| s.input = text);
    }

    /// Submit whatever is currently in the input field.
    pub async fn submit_input(&self) -> SubmitOutcome {
        let text = self.state.borrow().input.clone();
        self.submit(&text).await
    }

    /// Send `text` and stream the reply into the transcript.
    ///
    /// Resolves once the exchange has settled and the phase is back to
    /// [`Phase::Idle`].
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        if text.trim().is_empty() {
            return SubmitOutcome::Ignored(IgnoreReason::EmptyInput);
        }

        let mut accepted = false;
        self.state.send_if_modified(|s| {
            if s.in_flight() {
                return false;
            }
            s.transcript.push(Message::user(text));
            s.transcript.push(Message::placeholder());
            s.input.clear();
            s.phase = Phase::Sending;
            accepted = true;
            true
        });

        if !accepted {
            debug!(name: "chat.submit.ignored", "Submit ignored while a reply is in flight");
            return SubmitOutcome::Ignored(IgnoreReason::Busy);
        }

        let _settle = SettleGuard(&self.state);

        info!(
            name: "chat.request.sent",
            session_id = %self.session_id,
            prompt_len = text.len(),
            "Chat request sent"
        );

        let request = ChatRequest {
            prompt: text.to_string(),
            session_id: self.session_id.clone(),
        };

        match self.exchange(request).await {
            Ok(()) => {
                info!(name: "chat.reply.completed", session_id = %self.session_id, "Reply completed");
                SubmitOutcome::Completed
            }
            Err(err) => {
                error!(
                    name: "chat.reply.failed",
                    session_id = %self.session_id,
                    error = %err,
                    "Chat request failed"
                );
                self.state.send_modify(|s| {
                    s.transcript.replace_last_content(APOLOGY);
                });
                SubmitOutcome::Failed
            }
        }
    }

    async fn exchange(&self, request: ChatRequest) -> Result<(), TransportError> {
        match self.transport.send(request).await? {
            ChatReply::Full(text) => {
                self.state.send_modify(|s| {
                    s.transcript.replace_last_content(text);
                });
                Ok(())
            }
            ChatReply::Stream(mut body) => {
                self.state.send_modify(|s| s.phase = Phase::Streaming);

                let mut decoder = Utf8StreamDecoder::new();
                let mut reply = String::new();
                let mut chunks = 0usize;

                while let Some(chunk) = body.next().await {
                    let chunk = chunk?;
                    chunks += 1;
                    let text = decoder.decode(&chunk);
                    if !text.is_empty() {
                        reply.push_str(&text);
                        self.publish_reply(&reply);
                    }
                }

                let tail = decoder.finish();
                if !tail.is_empty() {
                    reply.push_str(&tail);
                    self.publish_reply(&reply);
                }

                debug!(name: "chat.stream.finished", chunks, chars = reply.chars().count(), "Stream exhausted");

                // Same outcome as a `Content-Length: 0` reply.
                if reply.is_empty() {
                    return Err(TransportError::MissingBody);
                }
                Ok(())
            }
        }
    }

    fn publish_reply(&self, reply: &str) {
        self.state.send_modify(|s| {
            s.transcript.replace_last_content(reply);
        });
    }
}

/// Returns the client to [`Phase::Idle`] however the exchange ends,
/// including when the submit future is dropped.
struct SettleGuard<'a>(&'a watch::Sender<ChatSnapshot>);

impl Drop for SettleGuard<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|s| s.phase = Phase::Idle);
    }
}
