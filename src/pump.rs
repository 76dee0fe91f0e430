use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use stopwatch_core::{Clock, Scheduler, DEFAULT_TICK_INTERVAL_MS};

use crate::app::AppOp;

/// Wall-clock milliseconds since the Unix epoch.
#[derive(Clone, Copy, Default, Debug)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

#[derive(Debug)]
pub enum PumpCtl {
    Start { generation: u64, interval_ms: u64 },
    Stop,
    Quit,
}

/// Posts `AppOp::Pump` to the main loop every interval while started.
/// Blocks on the control channel while stopped.
pub fn pump_thread(ctl: Receiver<PumpCtl>, main: Sender<AppOp>) {
    let mut interval = Duration::from_millis(DEFAULT_TICK_INTERVAL_MS);
    let mut running: Option<u64> = None;

    loop {
        if let Some(generation) = running {
            thread::sleep(interval);
            if main.send(AppOp::Pump(generation)).is_err() {
                break;
            }
        }

        let msg = if running.is_some() {
            match ctl.try_recv() {
                Ok(msg) => Some(msg),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => break,
            }
        } else {
            match ctl.recv() {
                Ok(msg) => Some(msg),
                Err(_) => break,
            }
        };

        match msg {
            Some(PumpCtl::Start {
                generation,
                interval_ms,
            }) => {
                interval = Duration::from_millis(interval_ms.max(1));
                running = Some(generation);
            }
            Some(PumpCtl::Stop) => running = None,
            Some(PumpCtl::Quit) => break,
            None => {}
        }
    }
    log::debug!("pump thread exiting");
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PumpHandle(u64);

/// Scheduler backed by the pump thread. Each schedule gets a new generation
/// so ticks still in the channel from a cancelled run can be told apart.
pub struct PumpScheduler {
    ctl: Sender<PumpCtl>,
    next_generation: u64,
    active: Option<u64>,
}

impl PumpScheduler {
    pub fn new(ctl: Sender<PumpCtl>) -> Self {
        Self {
            ctl,
            next_generation: 0,
            active: None,
        }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.active == Some(generation)
    }

    pub fn shutdown(&self) {
        self.send(PumpCtl::Quit);
    }

    fn send(&self, msg: PumpCtl) {
        if let Err(e) = self.ctl.send(msg) {
            log::warn!("pump control channel closed: {:?}", e.0);
        }
    }
}

impl Scheduler for PumpScheduler {
    type Handle = PumpHandle;

    fn schedule_repeating(&mut self, interval_ms: u64) -> PumpHandle {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.active = Some(generation);
        self.send(PumpCtl::Start {
            generation,
            interval_ms,
        });
        PumpHandle(generation)
    }

    fn cancel(&mut self, handle: PumpHandle) {
        if self.active == Some(handle.0) {
            self.active = None;
            self.send(PumpCtl::Stop);
        }
    }
}
