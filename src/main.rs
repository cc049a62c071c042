//! Medibot terminal chat
//!
//! Reads one prompt per line from stdin and streams each reply to stdout.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use dotenvy::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;
use tracing::info;

use medibot_chat::config::AppConfig;
use medibot_chat::ui::{self, ConsoleRenderer, ThinkingIndicator};
use medibot_chat::{HttpTransport, SessionId, StreamingChatClient, SubmitOutcome, Transcript};

const QUIT_COMMAND: &str = "/quit";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenv();

    let config = AppConfig::load().context("failed to load configuration")?;
    medibot_chat::telemetry::init(&config.logging).context("failed to initialise logging")?;

    let endpoint = config.chat.endpoint_url()?;
    let transport = HttpTransport::new(endpoint, config.chat.response_mode, config.chat.timeout())
        .context("failed to build HTTP client")?;

    let session_id = config
        .chat
        .session_id
        .clone()
        .map_or_else(SessionId::generate, SessionId::from);
    let transcript = config
        .chat
        .greeting
        .clone()
        .map_or_else(Transcript::new, Transcript::with_greeting);

    info!(
        name: "chat.client.ready",
        endpoint = %config.chat.endpoint,
        mode = config.chat.response_mode.as_str(),
        session_id = %session_id,
        "Chat client ready"
    );

    let client = StreamingChatClient::with_session(Arc::new(transport), session_id, transcript);

    print_banner(&config);

    let renderer = ConsoleRenderer::new(std::io::stdout(), &config.ui);
    let view = tokio::spawn(ui::run_view(
        client.subscribe(),
        renderer,
        ThinkingIndicator::new(),
    ));

    // Lines typed while a reply streams wait until it settles.
    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    while let Some(line) = lines.next().await {
        let line = line.context("failed to read stdin")?;
        if line.trim() == QUIT_COMMAND {
            break;
        }

        client.set_input(line);
        if let SubmitOutcome::Ignored(reason) = client.submit_input().await {
            info!(name: "chat.input.ignored", ?reason, "Input ignored");
        }
    }

    drop(client);
    view.await??;
    Ok(())
}

fn print_banner(config: &AppConfig) {
    let ui = &config.ui;
    if ui.color {
        println!("{}", ui.title.as_str().bold());
    } else {
        println!("{}", ui.title);
    }
    println!("{} (type {QUIT_COMMAND} to exit)\n", ui.placeholder);
}
