pub mod app;
pub mod ui;

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::api::TodoApi;
use crate::dispatch::{Dispatcher, Settled};
use crate::tui::app::App;

const TICK: Duration = Duration::from_millis(100);

/// Runs the interactive list until the user quits.
///
/// Must be called from outside the runtime that `handle` points to; the
/// loop blocks on terminal input while requests run on the runtime.
pub fn run(api: TodoApi, handle: Handle) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (dispatcher, mut rx) = Dispatcher::new(api, handle);
    let mut app = App::new();
    let res = run_app(&mut terminal, &mut app, &dispatcher, &mut rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        tracing::error!(error = %err, "tui exited with an error");
    }
    res
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    dispatcher: &Dispatcher,
    rx: &mut UnboundedReceiver<Settled>,
) -> Result<()> {
    dispatcher.dispatch(app.start());

    while !app.should_quit {
        while let Ok(settled) = rx.try_recv() {
            let phase = app.settle(settled);
            tracing::trace!(?phase, "applied reply");
        }

        terminal
            .draw(|f| ui::draw(f, app))
            .map_err(|e| io::Error::other(e.to_string()))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(request) = app.on_key(key) {
                    dispatcher.dispatch(request);
                }
            }
        }
    }

    let in_flight = app.todos.pending_count();
    if in_flight > 0 {
        tracing::warn!(in_flight, "quitting with unconfirmed changes");
    }
    Ok(())
}
