//! [`Dialog`] on the real terminal.

use crate::modal::{Modal, Reply};
use crate::render::draw;
use anyhow::{anyhow, Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use tn_workflow::Dialog;

/// Raw mode plus alternate screen for as long as it lives.
struct Session {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl Session {
    fn open() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(err).context("Failed to enter alternate screen");
        }
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Show `modal` until it produces a reply. Blocks the calling thread.
pub fn run_modal(title: &str, text: &str, mut modal: Modal) -> Result<Reply> {
    let mut session = Session::open()?;
    loop {
        session
            .terminal
            .draw(|frame| draw(frame, title, text, &modal))
            .context("Failed to draw dialog")?;
        if let Event::Key(key) = event::read().context("Failed to read terminal input")? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(reply) = modal.handle_key(key) {
                return Ok(reply);
            }
        }
    }
}

/// Dialogs drawn with ratatui on the installer console.
///
/// Prompts run on tokio's blocking pool so other tasks on the runtime keep
/// going while the operator reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleDialog;

impl ConsoleDialog {
    pub fn new() -> Self {
        Self
    }

    async fn show(&self, title: &str, text: &str, modal: Modal) -> Result<Reply> {
        let title = title.to_string();
        let text = text.to_string();
        tokio::task::spawn_blocking(move || run_modal(&title, &text, modal))
            .await
            .context("Dialog task panicked")?
    }
}

fn unexpected(reply: Reply) -> anyhow::Error {
    anyhow!("dialog returned unexpected reply {:?}", reply)
}

impl Dialog for ConsoleDialog {
    async fn menu(&self, title: &str, items: &[&str]) -> Result<Option<usize>> {
        match self.show(title, "", Modal::menu(items)).await? {
            Reply::Index(choice) => Ok(choice),
            other => Err(unexpected(other)),
        }
    }

    async fn checklist(
        &self,
        title: &str,
        text: &str,
        items: &[(String, String)],
    ) -> Result<Option<Vec<String>>> {
        match self.show(title, text, Modal::checklist(items)).await? {
            Reply::Tags(tags) => Ok(tags),
            other => Err(unexpected(other)),
        }
    }

    async fn yesno(&self, title: &str, text: &str) -> Result<bool> {
        match self.show(title, text, Modal::yesno()).await? {
            Reply::YesNo(yes) => Ok(yes),
            other => Err(unexpected(other)),
        }
    }

    async fn msgbox(&self, title: &str, text: &str) -> Result<()> {
        log::info!("{}: {}", title, text);
        match self.show(title, text, Modal::Message).await? {
            Reply::Ack => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    async fn password(&self, title: &str) -> Result<Option<String>> {
        match self.show(title, "", Modal::password()).await? {
            Reply::Secret(value) => Ok(value),
            other => Err(unexpected(other)),
        }
    }
}
