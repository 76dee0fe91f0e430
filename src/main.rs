mod app;
mod config;
mod error;
mod logging;
mod pump;
mod ui;

use std::io;
use std::process::ExitCode;
use std::sync::mpsc::{self, Sender};
use std::thread;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::{cursor, execute, terminal};
use stopwatch_core::StopwatchEngine;

use crate::app::{AppOp, StopwatchApp};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::pump::{pump_thread, PumpScheduler, SystemClock};
use crate::ui::TerminalDisplay;

/// Raw mode and the alternate screen for as long as this lives.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self, AppError> {
        terminal::enable_raw_mode()?;
        let guard = TerminalGuard;
        execute!(io::stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        execute!(io::stdout(), cursor::Show, terminal::LeaveAlternateScreen).ok();
        terminal::disable_raw_mode().ok();
    }
}

fn key_thread(main: Sender<AppOp>) {
    loop {
        let op = match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => AppOp::Key(key),
            Ok(Event::Resize(_, rows)) => AppOp::Redraw { rows },
            Ok(_) => continue,
            Err(e) => {
                log::error!("terminal input failed: {}", e);
                AppOp::Quit
            }
        };
        let quit = matches!(op, AppOp::Quit);
        if main.send(op).is_err() || quit {
            break;
        }
    }
}

fn run(config: &AppConfig) -> Result<(), AppError> {
    let (main_tx, main_rx) = mpsc::channel();
    let (pump_tx, pump_rx) = mpsc::channel();

    let pump_main = main_tx.clone();
    thread::Builder::new()
        .name("pump".into())
        .spawn(move || pump_thread(pump_rx, pump_main))?;

    let _guard = TerminalGuard::enter()?;
    let (_, rows) = terminal::size()?;

    thread::Builder::new()
        .name("keys".into())
        .spawn(move || key_thread(main_tx))?;

    let display = TerminalDisplay::new(io::stdout(), rows);
    let engine = StopwatchEngine::with_config(
        config.engine,
        SystemClock,
        PumpScheduler::new(pump_tx),
        display,
    );
    let mut app = StopwatchApp::new(engine);
    app.engine.display_mut().redraw();

    let result = loop {
        let op = match main_rx.recv() {
            Ok(op) => op,
            Err(_) => break Err(AppError::ChannelClosed),
        };
        match op {
            AppOp::Redraw { rows } => app.engine.display_mut().resize(rows),
            AppOp::Key(key) => {
                if !app.handle_key(&key) {
                    break Ok(());
                }
            }
            AppOp::Pump(generation) => app.handle_pump(generation),
            AppOp::Quit => break Ok(()),
        }
    };

    // Clean up
    app.engine.scheduler().shutdown();
    result
}

fn main() -> ExitCode {
    let config = AppConfig::default();
    if let Err(e) = logging::init_logging(&config) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }
    log::info!("Stopwatch PID is {}", std::process::id());

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("stopwatch failed: {}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
