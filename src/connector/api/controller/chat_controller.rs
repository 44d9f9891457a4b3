use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::{EntryKind, SharedSession, TranscriptEntry, LOADING_MESSAGE};
use crate::domain::{ChatSession, CompletionModel, CompletionParams, Side};

use super::super::Container;

const HELP: &str = "Commands:
  /model [name]  show or switch the model for this conversation
  /reset         start a new conversation
  /history       print the conversation so far
  /help          show this help
  /quit          leave the chat";

enum Flow {
    Continue,
    Quit,
}

/// Line-oriented chat loop over any async reader. Each line is one message;
/// lines starting with `/` are commands.
pub struct ChatController<'a> {
    container: &'a Container,
}

impl<'a> ChatController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn run<R, W>(&self, input: R, output: &mut W, interactive: bool) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let credential = self.container.credential()?;
        let submit = self.container.submit_use_case();
        let render = self.container.render_use_case();
        let session: SharedSession = Arc::new(Mutex::new(ChatSession::new()));

        for entry in render.execute(&*session.lock().await) {
            writeln!(output, "{}", format_entry(&entry))?;
        }

        let mut lines = input.lines();
        loop {
            if interactive {
                write!(output, "\n> ")?;
                output.flush()?;
            }

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(command) = line.strip_prefix('/') {
                match self.command(&session, command, output).await? {
                    Flow::Continue => continue,
                    Flow::Quit => break,
                }
            }

            let spinner = spinner(interactive);
            let outcome = submit.execute(&session, credential, line).await;
            spinner.finish_and_clear();

            match outcome {
                Ok(_) => {
                    // Print from the session so the reply reads the same as /history.
                    let guard = session.lock().await;
                    if let Some(entry) = render.execute(&guard).last() {
                        writeln!(output, "{}", format_entry(entry))?;
                    }
                }
                Err(e) => writeln!(output, "Error: {}", e)?,
            }
        }

        debug!("Chat loop finished");
        Ok(())
    }

    async fn command<W: Write>(
        &self,
        session: &Mutex<ChatSession>,
        command: &str,
        output: &mut W,
    ) -> Result<Flow> {
        let mut parts = command.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let argument = parts.next();

        match name {
            "quit" | "exit" | "bye" => return Ok(Flow::Quit),
            "help" => writeln!(output, "{}", HELP)?,
            "reset" => {
                session.lock().await.reset();
                writeln!(output, "Started a new conversation.")?;
            }
            "history" => {
                let guard = session.lock().await;
                if guard.conversation().is_empty() {
                    writeln!(output, "No messages yet.")?;
                }
                for entry in self.container.render_use_case().execute(&guard).iter().skip(2) {
                    let id = entry.id.as_deref().map(|id| format!(" [{}]", id));
                    writeln!(output, "{}{}", format_entry(entry), id.unwrap_or_default())?;
                }
            }
            "model" => {
                let mut guard = session.lock().await;
                match argument {
                    None => {
                        let current = guard
                            .completion_params()
                            .and_then(|p| p.model)
                            .map(|m| m.as_str())
                            .unwrap_or_else(|| self.container.model());
                        writeln!(output, "Model: {}", current)?;
                    }
                    Some(raw) => match CompletionModel::from_str(raw) {
                        Ok(model) => {
                            guard.set_completion_params(Some(CompletionParams::with_model(model)));
                            writeln!(output, "Model set to {}", model)?;
                        }
                        Err(e) => writeln!(output, "Error: {}", e)?,
                    },
                }
            }
            other => writeln!(output, "Unknown command /{}. Type /help for the list.", other)?,
        }

        Ok(Flow::Continue)
    }
}

fn spinner(interactive: bool) -> ProgressBar {
    if !interactive {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(LOADING_MESSAGE);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn format_entry(entry: &TranscriptEntry) -> String {
    if let Some(error) = &entry.error {
        let mut line = format!("ChatGPT: [error] {}", error.message);
        if let Some(payload) = &error.payload {
            line.push_str(&format!("\n  {}", payload));
        }
        return line;
    }

    match (entry.kind, entry.side) {
        (EntryKind::Notice, _) => format!("Note: {}", entry.text),
        (_, Side::User) => format!("You: {}", entry.text),
        (_, Side::System) => format!("System: {}", entry.text),
        (_, Side::Assistant) => format!("ChatGPT: {}", entry.text),
    }
}
