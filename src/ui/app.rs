//! Full-screen terminal front end.

use std::io::{Stdout, stdout};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, DisableBracketedPaste, EnableBracketedPaste};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::events::TuiEvent;
use crate::ui::conversation::{ConversationAction, ConversationManager};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Run the chat UI until the user quits
pub async fn run(mut manager: ConversationManager, tick_rate: Duration) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, &mut manager, tick_rate).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = stdout();
    crossterm::execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)
        .context("Failed to enter alternate screen")?;

    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableBracketedPaste)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

async fn event_loop(terminal: &mut Tui, manager: &mut ConversationManager, tick_rate: Duration) -> Result<()> {
    loop {
        manager.poll_controller();
        terminal.draw(|frame| frame.render_widget(&*manager, frame.size()))?;

        let event = if event::poll(tick_rate)? {
            match TuiEvent::from_crossterm(event::read()?) {
                Some(event) => event,
                None => continue,
            }
        } else {
            TuiEvent::Tick
        };

        if manager.handle_event(event) == ConversationAction::Exit {
            tracing::info!("exit requested");
            return Ok(());
        }

        // Let request tasks make progress between frames
        tokio::task::yield_now().await;
    }
}
