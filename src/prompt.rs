use std::io;
use std::time::Duration;

use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Alignment;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::app::Confirm;
use crate::error::PortalError;

/// Full-screen y/n prompt on the controlling terminal.
pub struct TerminalPrompt;

/// Restores the terminal even when drawing fails part-way.
struct ScreenGuard;

impl ScreenGuard {
    fn enter() -> Result<Self, PortalError> {
        enable_raw_mode().map_err(prompt_error)?;
        io::stdout()
            .execute(EnterAlternateScreen)
            .map_err(prompt_error)?;
        Ok(Self)
    }
}

impl Drop for ScreenGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = io::stdout().execute(LeaveAlternateScreen);
    }
}

impl Confirm for TerminalPrompt {
    fn confirm(&self, prompt: &str) -> Result<bool, PortalError> {
        let _guard = ScreenGuard::enter()?;
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend).map_err(prompt_error)?;

        let answer = loop {
            terminal
                .draw(|frame| {
                    let block = Block::default()
                        .borders(Borders::ALL)
                        .title("Confirm")
                        .border_style(Style::default().fg(Color::Cyan));
                    let text = Paragraph::new(vec![
                        Line::from(prompt.to_string()),
                        Line::from(""),
                        Line::from("Press y to confirm, n to cancel."),
                    ])
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true })
                    .block(block);
                    frame.render_widget(text, frame.area());
                })
                .map_err(prompt_error)?;

            if event::poll(Duration::from_millis(100)).map_err(prompt_error)? {
                if let Event::Key(key) = event::read().map_err(prompt_error)? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    match key.code {
                        KeyCode::Char('y') | KeyCode::Char('Y') => break true,
                        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => break false,
                        _ => {}
                    }
                }
            }
        };

        tracing::debug!(prompt, answer, "prompt answered");
        Ok(answer)
    }
}

fn prompt_error(err: io::Error) -> PortalError {
    PortalError::Prompt(err.to_string())
}
