use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use stopwatch_core::{Clock, Display, Scheduler, StopwatchEngine};

use crate::pump::PumpScheduler;

/// Messages delivered to the main loop.
#[derive(Debug)]
pub enum AppOp {
    /// Repaint everything, e.g. after the terminal was resized.
    Redraw { rows: u16 },
    Key(KeyEvent),
    /// One tick from the pump, tagged with the generation that produced it.
    Pump(u64),
    Quit,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Control {
    Start,
    Lap,
    Reset,
    Quit,
}

pub fn control_for_key(key: &KeyEvent) -> Option<Control> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Control::Quit),
        KeyCode::Char('s') | KeyCode::Enter => Some(Control::Start),
        KeyCode::Char('l') | KeyCode::Char(' ') => Some(Control::Lap),
        KeyCode::Char('r') => Some(Control::Reset),
        KeyCode::Char('q') | KeyCode::Esc => Some(Control::Quit),
        _ => None,
    }
}

pub struct StopwatchApp<C, S: Scheduler, D> {
    pub engine: StopwatchEngine<C, S, D>,
}

impl<C: Clock, S: Scheduler, D: Display> StopwatchApp<C, S, D> {
    pub fn new(engine: StopwatchEngine<C, S, D>) -> Self {
        Self { engine }
    }

    pub fn on_start_clicked(&mut self) {
        self.engine.start();
    }

    pub fn on_lap_clicked(&mut self) {
        self.engine.lap();
    }

    pub fn on_reset_clicked(&mut self) {
        self.engine.reset();
    }

    /// Returns `false` once the user asked to quit.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        match control_for_key(key) {
            Some(Control::Start) => self.on_start_clicked(),
            Some(Control::Lap) => self.on_lap_clicked(),
            Some(Control::Reset) => self.on_reset_clicked(),
            Some(Control::Quit) => return false,
            None => log::trace!("unmapped key: {:?}", key.code),
        }
        true
    }
}

impl<C: Clock, D: Display> StopwatchApp<C, PumpScheduler, D> {
    /// Deliver a pump tick unless it belongs to a cancelled run.
    pub fn handle_pump(&mut self, generation: u64) {
        if self.engine.scheduler().is_current(generation) {
            self.engine.tick();
        } else {
            log::trace!("dropping stale tick from generation {}", generation);
        }
    }
}
