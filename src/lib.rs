//! Medibot streaming chat client
//!
//! Posts user prompts to a chat backend and renders the reply progressively
//! as the response body streams in.
//!
//! # Architecture
//!
//! - **Client**: [`StreamingChatClient`] owns the transcript and request phase
//!   and publishes whole-state snapshots to views
//! - **Transport**: [`ChatTransport`] capability, with a `reqwest` implementation
//! - **UI**: line-oriented terminal renderer with a thinking spinner
//!
//! # Modules
//!
//! - [`client`]: submit/stream state machine
//! - [`config`]: CLI and layered configuration
//! - [`decode`]: incremental UTF-8 decoding of body chunks
//! - [`message`]: messages and transcript
//! - [`session`]: session identifiers
//! - [`transport`]: backend transport trait and HTTP implementation
//! - [`ui`]: terminal rendering
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use medibot_chat::{HttpTransport, ResponseMode, StreamingChatClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoint = url::Url::parse("http://127.0.0.1:8000/chat")?;
//! let transport = HttpTransport::new(endpoint, ResponseMode::Auto, Duration::from_secs(60))?;
//! let client = StreamingChatClient::new(Arc::new(transport));
//!
//! client.submit("What are the symptoms of flu?").await;
//! println!("{:?}", client.snapshot().transcript.last());
//! # Ok(())
//! # }
//! ```

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]

pub mod client;
pub mod config;
pub mod decode;
pub mod message;
pub mod session;
pub mod telemetry;
pub mod transport;
pub mod ui;

pub use client::{APOLOGY, ChatSnapshot, IgnoreReason, Phase, StreamingChatClient, SubmitOutcome};
pub use message::{Message, Role, Transcript};
pub use session::SessionId;
pub use transport::{ChatReply, ChatRequest, ChatTransport, HttpTransport, ResponseMode, TransportError};
