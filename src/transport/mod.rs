//! Chat backend transport.
//!
//! The client never talks to the network directly. It goes through the
//! [`ChatTransport`] capability so tests can substitute a fake backend and the
//! streamed and whole-body reply paths can be exercised independently.
//!
//! - [`HttpTransport`]: `reqwest` implementation posting JSON to the backend

pub mod http;

pub use http::{HttpTransport, ResponseMode};

use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::SessionId;

/// Raw reply body, one network chunk per item.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Outbound request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Text the user submitted.
    pub prompt: String,
    /// Session the backend should attach this turn to.
    pub session_id: SessionId,
}

/// Whole-body reply shape: `{ "response": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponseBody {
    /// Complete assistant reply.
    pub response: String,
}

/// Successful reply from the backend.
pub enum ChatReply {
    /// Body delivered incrementally as raw bytes.
    Stream(ByteStream),
    /// Body delivered at once and already extracted.
    Full(String),
}

impl std::fmt::Debug for ChatReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stream(_) => f.write_str("ChatReply::Stream(..)"),
            Self::Full(text) => f.debug_tuple("ChatReply::Full").field(text).finish(),
        }
    }
}

/// Any failure between issuing a request and finishing its body.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Request could not be sent or the response could not be read.
    #[error("HTTP error: {0}")]
    Network(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("backend error ({status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        body: String,
    },

    /// Response carried no readable body.
    #[error("response has no readable body")]
    MissingBody,

    /// Whole-body reply was not `{ "response": string }`.
    #[error("invalid JSON reply: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Reading a body chunk failed mid-stream.
    #[error("stream interrupted: {0}")]
    Stream(String),
}

/// Capability to deliver one chat request to the backend.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send `request` and return the reply once headers have arrived.
    ///
    /// For streamed replies the body has not been read yet when this returns.
    async fn send(&self, request: ChatRequest) -> Result<ChatReply, TransportError>;
}
