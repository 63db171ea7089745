/// Synchronous "Enter URL" prompt on the bottom terminal row
use std::io::{self, stdout, Write};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use cubedeck_core::host::UrlPrompt;
use tracing::warn;

const LABEL: &str = "Enter URL: ";

/// Outcome of one key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Pending,
    Submit(String),
    Cancel,
}

/// Single-line text input
#[derive(Debug, Default)]
pub struct LineEditor {
    buffer: String,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn key(&mut self, code: KeyCode) -> Edit {
        match code {
            KeyCode::Enter => Edit::Submit(std::mem::take(&mut self.buffer)),
            KeyCode::Esc => Edit::Cancel,
            KeyCode::Backspace => {
                self.buffer.pop();
                Edit::Pending
            }
            KeyCode::Char(c) => {
                self.buffer.push(c);
                Edit::Pending
            }
            _ => Edit::Pending,
        }
    }
}

/// Blocks the frame loop until the user submits or cancels
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    fn read(&self) -> io::Result<Option<String>> {
        let (_, height) = terminal::size()?;
        let row = height.saturating_sub(1);
        let mut editor = LineEditor::new();
        let mut out = stdout();
        loop {
            queue!(
                out,
                cursor::MoveTo(0, row),
                terminal::Clear(ClearType::CurrentLine),
                SetForegroundColor(Color::Yellow),
                Print(LABEL),
                ResetColor,
                Print(editor.buffer()),
            )?;
            out.flush()?;

            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                if kind == KeyEventKind::Release {
                    continue;
                }
                match editor.key(code) {
                    Edit::Pending => {}
                    Edit::Submit(url) => return Ok(Some(url)),
                    Edit::Cancel => return Ok(None),
                }
            }
        }
    }
}

impl UrlPrompt for TerminalPrompt {
    fn prompt_url(&mut self) -> Option<String> {
        match self.read() {
            Ok(url) => url,
            Err(err) => {
                warn!(error = %err, "url prompt failed");
                None
            }
        }
    }
}
