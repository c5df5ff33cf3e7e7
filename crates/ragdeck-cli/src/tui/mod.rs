//! Interactive terminal UI.
//!
//! Provides:
//! - A chat tab with streaming answers and an optional graph side panel
//! - A full-size knowledge graph tab with mouse selection
//! - A document list
//! - Slash commands for upload and delete

mod app;
mod commands;
mod components;
mod event;
mod ui;

use std::io::stdout;
use std::sync::Arc;

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

use app::App;
use ragdeck_core::{Config, RagApi};

/// Run the TUI application.
pub async fn run(config: Config, api: Arc<dyn RagApi>) -> color_eyre::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, api);
    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}
