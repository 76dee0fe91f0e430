//! Deterministic stand-ins for the engine's collaborators.
//!
//! `SimClock` and `SimScheduler` are cheap shared handles, so a test can keep
//! a clone while the engine owns the other one. [`advance`] walks simulated
//! time forward and delivers every tick that falls due on the way.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::{Clock, Display, Scheduler, StopwatchEngine, TimeParts};

#[derive(Clone, Default, Debug)]
pub struct SimClock {
    now: Rc<Cell<u64>>,
}

impl SimClock {
    pub fn new(now_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(now_ms)),
        }
    }

    pub fn now(&self) -> u64 {
        self.now.get()
    }

    pub fn set(&self, now_ms: u64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SimHandle(u64);

#[derive(Debug)]
struct SimTimer {
    handle: SimHandle,
    interval_ms: u64,
    next_due_ms: u64,
}

#[derive(Default, Debug)]
struct SimTimers {
    next_id: u64,
    active: Vec<SimTimer>,
    scheduled: usize,
    cancel_calls: usize,
}

#[derive(Clone, Debug)]
pub struct SimScheduler {
    clock: SimClock,
    timers: Rc<RefCell<SimTimers>>,
}

impl SimScheduler {
    /// Due times are computed against `clock`.
    pub fn new(clock: &SimClock) -> Self {
        Self {
            clock: clock.clone(),
            timers: Rc::new(RefCell::new(SimTimers::default())),
        }
    }

    pub fn active_count(&self) -> usize {
        self.timers.borrow().active.len()
    }

    /// Total `schedule_repeating` calls so far.
    pub fn scheduled_count(&self) -> usize {
        self.timers.borrow().scheduled
    }

    /// Total `cancel` calls so far, including ones for unknown handles.
    pub fn cancel_calls(&self) -> usize {
        self.timers.borrow().cancel_calls
    }

    /// Intervals of the timers that are still active.
    pub fn intervals(&self) -> Vec<u64> {
        self.timers
            .borrow()
            .active
            .iter()
            .map(|t| t.interval_ms)
            .collect()
    }

    pub fn next_due(&self) -> Option<u64> {
        self.timers
            .borrow()
            .active
            .iter()
            .map(|t| t.next_due_ms)
            .min()
    }

    /// Consume every firing due at or before `now_ms`; returns how many.
    fn fire_due(&self, now_ms: u64) -> usize {
        let mut timers = self.timers.borrow_mut();
        let mut fired = 0;
        for timer in timers.active.iter_mut() {
            while timer.next_due_ms <= now_ms {
                timer.next_due_ms += timer.interval_ms;
                fired += 1;
            }
        }
        fired
    }
}

impl Scheduler for SimScheduler {
    type Handle = SimHandle;

    fn schedule_repeating(&mut self, interval_ms: u64) -> SimHandle {
        let interval_ms = interval_ms.max(1);
        let mut timers = self.timers.borrow_mut();
        timers.next_id += 1;
        timers.scheduled += 1;
        let handle = SimHandle(timers.next_id);
        timers.active.push(SimTimer {
            handle,
            interval_ms,
            next_due_ms: self.clock.now() + interval_ms,
        });
        handle
    }

    fn cancel(&mut self, handle: SimHandle) {
        let mut timers = self.timers.borrow_mut();
        timers.cancel_calls += 1;
        timers.active.retain(|t| t.handle != handle);
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum DisplayEvent {
    Time(TimeParts),
    Laps(Vec<String>),
    Controls {
        start_enabled: bool,
        lap_enabled: bool,
    },
}

/// Display that records every notification in order.
#[derive(Default, Debug)]
pub struct RecordingDisplay {
    pub events: Vec<DisplayEvent>,
}

impl RecordingDisplay {
    /// Drain the recorded events.
    pub fn take(&mut self) -> Vec<DisplayEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn last_time(&self) -> Option<TimeParts> {
        self.events.iter().rev().find_map(|e| match e {
            DisplayEvent::Time(parts) => Some(*parts),
            _ => None,
        })
    }

    pub fn last_laps(&self) -> Option<&[String]> {
        self.events.iter().rev().find_map(|e| match e {
            DisplayEvent::Laps(laps) => Some(laps.as_slice()),
            _ => None,
        })
    }

    pub fn last_controls(&self) -> Option<(bool, bool)> {
        self.events.iter().rev().find_map(|e| match e {
            DisplayEvent::Controls {
                start_enabled,
                lap_enabled,
            } => Some((*start_enabled, *lap_enabled)),
            _ => None,
        })
    }

    pub fn time_renders(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, DisplayEvent::Time(_)))
            .count()
    }
}

impl Display for RecordingDisplay {
    fn render_time(&mut self, minutes: u64, seconds: u64, hundredths: u64) {
        self.events.push(DisplayEvent::Time(TimeParts {
            minutes,
            seconds,
            hundredths,
        }));
    }

    fn render_laps(&mut self, laps: &[String]) {
        self.events.push(DisplayEvent::Laps(laps.to_vec()));
    }

    fn set_controls_enabled(&mut self, start_enabled: bool, lap_enabled: bool) {
        self.events.push(DisplayEvent::Controls {
            start_enabled,
            lap_enabled,
        });
    }
}

pub type SimEngine<D = RecordingDisplay> = StopwatchEngine<SimClock, SimScheduler, D>;

/// Fresh engine on simulated time starting at `now_ms`.
pub fn engine_at(now_ms: u64) -> SimEngine {
    let clock = SimClock::new(now_ms);
    let scheduler = SimScheduler::new(&clock);
    StopwatchEngine::new(clock, scheduler, RecordingDisplay::default())
}

/// Move simulated time forward by `ms`, calling `tick` for every firing due
/// on the way. Returns the number of ticks delivered.
pub fn advance<D: Display>(engine: &mut SimEngine<D>, ms: u64) -> usize {
    let target = engine.clock().now() + ms;
    let mut delivered = 0;
    while let Some(due) = engine.scheduler().next_due().filter(|&due| due <= target) {
        if due > engine.clock().now() {
            engine.clock().set(due);
        }
        let fired = engine.scheduler().fire_due(due);
        for _ in 0..fired {
            engine.tick();
            delivered += 1;
        }
    }
    engine.clock().set(target.max(engine.clock().now()));
    delivered
}
