//! Terminal front end.
//!
//! # Structure
//!
//! - [`console`]: incremental transcript renderer
//! - [`ThinkingIndicator`]: spinner shown while a reply has not started
//! - [`run_view`]: drives both from the client's published snapshots

pub mod console;

pub use console::ConsoleRenderer;

use std::io::{self, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::watch;

use crate::client::ChatSnapshot;

/// "Thinking..." spinner on stderr.
#[derive(Default)]
pub struct ThinkingIndicator {
    bar: Option<ProgressBar>,
    hidden: bool,
}

impl std::fmt::Debug for ThinkingIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThinkingIndicator")
            .field("active", &self.bar.is_some())
            .field("hidden", &self.hidden)
            .finish()
    }
}

impl ThinkingIndicator {
    /// Create an indicator that draws when stderr is a terminal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an indicator that never draws.
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            bar: None,
            hidden: true,
        }
    }

    /// Show or clear the spinner.
    pub fn set(&mut self, thinking: bool) {
        match (thinking, self.bar.take()) {
            (true, Some(bar)) => self.bar = Some(bar),
            (true, None) => self.bar = Some(self.spawn()),
            (false, Some(bar)) => bar.finish_and_clear(),
            (false, None) => {}
        }
    }

    /// Whether the spinner is currently running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.bar.is_some()
    }

    fn spawn(&self) -> ProgressBar {
        let bar = if self.hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        bar.set_style(ProgressStyle::default_spinner());
        bar.set_message("Thinking...");
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    }
}

/// Render every snapshot published on `updates` until the client is dropped.
pub async fn run_view<W: Write>(
    mut updates: watch::Receiver<ChatSnapshot>,
    mut renderer: ConsoleRenderer<W>,
    mut thinking: ThinkingIndicator,
) -> io::Result<()> {
    loop {
        let snapshot = updates.borrow_and_update().clone();
        thinking.set(snapshot.is_thinking());
        renderer.render(&snapshot)?;

        if updates.changed().await.is_err() {
            break;
        }
    }
    thinking.set(false);
    Ok(())
}
