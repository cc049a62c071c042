//! Line-oriented transcript renderer.

use std::io::{self, Write};

use colored::Colorize;

use crate::client::ChatSnapshot;
use crate::config::UiConfig;
use crate::message::{Message, Role};

/// Writes transcript changes to a terminal as they are published.
///
/// Snapshots carry the full content of the trailing reply. The renderer keeps
/// what it has already written and prints only the new suffix; when the
/// content is replaced by something that does not extend it (the apology
/// after a partial reply), the message is printed again on a fresh line.
#[derive(Debug)]
pub struct ConsoleRenderer<W: Write> {
    out: W,
    assistant_name: String,
    color: bool,
    echo_user: bool,
    /// Messages fully or partially written so far.
    written: usize,
    /// Content already written for the last message while it may still grow.
    open: Option<String>,
}

impl<W: Write> ConsoleRenderer<W> {
    /// Create a renderer writing to `out`.
    pub fn new(out: W, ui: &UiConfig) -> Self {
        Self {
            out,
            assistant_name: ui.assistant_name.clone(),
            color: ui.color,
            echo_user: false,
            written: 0,
            open: None,
        }
    }

    /// Also print user messages (off by default, since the terminal already
    /// shows what was typed).
    #[must_use]
    pub fn echo_user(mut self, echo: bool) -> Self {
        self.echo_user = echo;
        self
    }

    /// Get the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Write whatever changed since the previous snapshot.
    pub fn render(&mut self, snapshot: &ChatSnapshot) -> io::Result<()> {
        let messages = snapshot.transcript.messages();

        if let Some(shown) = self.open.take() {
            let index = self.written - 1;
            match messages.get(index) {
                Some(message) if message.content.starts_with(shown.as_str()) => {
                    self.out.write_all(message.content[shown.len()..].as_bytes())?;
                    self.open = Some(message.content.clone());
                }
                Some(message) => {
                    writeln!(self.out)?;
                    self.write_message(message)?;
                    self.open = Some(message.content.clone());
                }
                None => {}
            }
        }

        while self.written < messages.len() {
            let index = self.written;
            let message = &messages[index];
            let trailing = index + 1 == messages.len();

            // Hold back the empty placeholder while the reply is pending.
            if trailing && message.content.is_empty() && snapshot.in_flight() {
                break;
            }

            self.close_open()?;
            self.written += 1;

            if message.role == Role::User && !self.echo_user {
                continue;
            }
            self.write_message(message)?;
            self.open = Some(message.content.clone());
        }

        let settled = !snapshot.in_flight() && self.written == messages.len();
        if settled {
            self.close_open()?;
        }

        self.out.flush()
    }

    fn close_open(&mut self) -> io::Result<()> {
        if self.open.take().is_some() {
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn write_message(&mut self, message: &Message) -> io::Result<()> {
        let label = match message.role {
            Role::User => "You",
            Role::Assistant => self.assistant_name.as_str(),
        };
        let label = format!("{label}:");
        if self.color {
            let styled = match message.role {
                Role::User => label.blue().bold(),
                Role::Assistant => label.green().bold(),
            };
            write!(self.out, "{styled} {}", message.content)
        } else {
            write!(self.out, "{label} {}", message.content)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{APOLOGY, Phase};
    use crate::message::Transcript;

    fn ui() -> UiConfig {
        UiConfig {
            color: false,
            ..UiConfig::default()
        }
    }

    fn snapshot(messages: &[Message], phase: Phase) -> ChatSnapshot {
        let mut transcript = Transcript::new();
        for m in messages {
            transcript.push(m.clone());
        }
        ChatSnapshot {
            transcript,
            input: String::new(),
            phase,
        }
    }

    fn output(renderer: ConsoleRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn test_streamed_reply_is_written_incrementally() {
        let mut r = ConsoleRenderer::new(Vec::new(), &ui());
        let user = Message::user("Hello");

        r.render(&snapshot(&[user.clone(), Message::placeholder()], Phase::Sending))
            .unwrap();
        r.render(&snapshot(&[user.clone(), Message::assistant("Hi")], Phase::Streaming))
            .unwrap();
        r.render(&snapshot(&[user.clone(), Message::assistant("Hi there")], Phase::Streaming))
            .unwrap();
        r.render(&snapshot(&[user, Message::assistant("Hi there")], Phase::Idle))
            .unwrap();

        assert_eq!(output(r), "Medibot: Hi there\n");
    }

    #[test]
    fn test_apology_after_partial_reply_starts_new_line() {
        let mut r = ConsoleRenderer::new(Vec::new(), &ui());
        let user = Message::user("Hello");

        r.render(&snapshot(&[user.clone(), Message::assistant("Hi")], Phase::Streaming))
            .unwrap();
        r.render(&snapshot(&[user, Message::assistant(APOLOGY)], Phase::Idle))
            .unwrap();

        assert_eq!(output(r), format!("Medibot: Hi\nMedibot: {APOLOGY}\n"));
    }

    #[test]
    fn test_greeting_and_echoed_user_lines() {
        let mut r = ConsoleRenderer::new(Vec::new(), &ui()).echo_user(true);
        let greeting = Message::assistant("How can I help?");

        r.render(&snapshot(&[greeting.clone()], Phase::Idle)).unwrap();
        r.render(&snapshot(
            &[greeting.clone(), Message::user("Hello"), Message::placeholder()],
            Phase::Sending,
        ))
        .unwrap();
        r.render(&snapshot(
            &[greeting, Message::user("Hello"), Message::assistant("Hi")],
            Phase::Idle,
        ))
        .unwrap();

        assert_eq!(output(r), "Medibot: How can I help?\nYou: Hello\nMedibot: Hi\n");
    }

    #[test]
    fn test_empty_reply_does_not_stall_later_messages() {
        let mut r = ConsoleRenderer::new(Vec::new(), &ui());
        let first = [Message::user("a"), Message::assistant("")];

        r.render(&snapshot(&first, Phase::Idle)).unwrap();
        let mut next = first.to_vec();
        next.extend([Message::user("b"), Message::assistant("done")]);
        r.render(&snapshot(&next, Phase::Idle)).unwrap();

        assert_eq!(output(r), "Medibot: \nMedibot: done\n");
    }
}
