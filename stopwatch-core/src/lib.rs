//! Pure stopwatch logic with no platform dependencies.
//! The clock, the tick source and the display are injected, so the engine
//! runs the same on a terminal host and under simulated time in tests.

pub mod format;
pub mod sim;

pub use format::{format_lap, split_elapsed, TimeParts};

/// Live display refresh cadence while running.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 10;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TimerState {
    Idle,
    Running,
}

impl TimerState {
    pub fn start_enabled(self) -> bool {
        self == TimerState::Idle
    }

    pub fn lap_enabled(self) -> bool {
        self == TimerState::Running
    }
}

/// Source of absolute time in milliseconds.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Repeating tick source. The host delivers each tick by calling
/// [`StopwatchEngine::tick`].
pub trait Scheduler {
    type Handle;

    fn schedule_repeating(&mut self, interval_ms: u64) -> Self::Handle;

    fn cancel(&mut self, handle: Self::Handle);
}

/// Outbound notifications from the engine to whatever draws it.
pub trait Display {
    fn render_time(&mut self, minutes: u64, seconds: u64, hundredths: u64);

    /// `laps` is most-recent-first.
    fn render_laps(&mut self, laps: &[String]);

    fn set_controls_enabled(&mut self, start_enabled: bool, lap_enabled: bool);
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EngineConfig {
    pub tick_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

impl EngineConfig {
    /// Interval handed to the scheduler, never zero.
    pub fn tick_interval(&self) -> u64 {
        self.tick_interval_ms.max(1)
    }
}

/// Pair each lap with its displayed number: the newest lap (index 0) gets the
/// highest number, the oldest gets 1.
pub fn number_laps(laps: &[String]) -> impl Iterator<Item = (usize, &str)> + '_ {
    let count = laps.len();
    laps.iter()
        .enumerate()
        .map(move |(index, lap)| (count - index, lap.as_str()))
}

pub struct StopwatchEngine<C, S: Scheduler, D> {
    clock: C,
    scheduler: S,
    display: D,
    config: EngineConfig,
    state: TimerState,
    start_ms: u64,
    // Highest elapsed value reported this session; keeps ticks and laps
    // non-decreasing if the clock steps backwards.
    last_elapsed_ms: u64,
    laps: Vec<String>,
    ticker: Option<S::Handle>,
}

impl<C: Clock, S: Scheduler, D: Display> StopwatchEngine<C, S, D> {
    pub fn new(clock: C, scheduler: S, display: D) -> Self {
        Self::with_config(EngineConfig::default(), clock, scheduler, display)
    }

    pub fn with_config(config: EngineConfig, clock: C, scheduler: S, display: D) -> Self {
        let mut engine = Self {
            clock,
            scheduler,
            display,
            config,
            state: TimerState::Idle,
            start_ms: 0,
            last_elapsed_ms: 0,
            laps: Vec::new(),
            ticker: None,
        };
        engine.display.render_time(0, 0, 0);
        engine.publish_controls();
        engine
    }

    /// Begin timing. Returns `false` without side effects if already running.
    pub fn start(&mut self) -> bool {
        if self.state == TimerState::Running {
            log::debug!("start ignored: already running");
            return false;
        }
        self.start_ms = self.clock.now_ms();
        self.last_elapsed_ms = 0;
        self.state = TimerState::Running;
        self.ticker = Some(self.scheduler.schedule_repeating(self.config.tick_interval()));
        log::info!("stopwatch started at {}", self.start_ms);
        self.publish_controls();
        true
    }

    /// Periodic refresh of the live display. Ignored while idle, so a tick
    /// that was already queued when the timer got cancelled draws nothing.
    pub fn tick(&mut self) -> Option<TimeParts> {
        if self.state != TimerState::Running {
            return None;
        }
        let parts = split_elapsed(self.observe_elapsed());
        self.display
            .render_time(parts.minutes, parts.seconds, parts.hundredths);
        Some(parts)
    }

    /// Record the current elapsed time at the head of the lap list.
    /// Returns the recorded entry, or `None` while idle.
    pub fn lap(&mut self) -> Option<&str> {
        if self.state != TimerState::Running {
            log::debug!("lap ignored: not running");
            return None;
        }
        let elapsed = self.observe_elapsed();
        self.laps.insert(0, format_lap(elapsed));
        log::info!("lap {} recorded at {} ms", self.laps.len(), elapsed);
        self.display.render_laps(&self.laps);
        self.laps.first().map(String::as_str)
    }

    /// Stop ticking and return to the initial idle state from anywhere.
    pub fn reset(&mut self) {
        if let Some(handle) = self.ticker.take() {
            self.scheduler.cancel(handle);
        }
        self.state = TimerState::Idle;
        self.start_ms = 0;
        self.last_elapsed_ms = 0;
        self.laps.clear();
        log::info!("stopwatch reset");
        self.display.render_laps(&self.laps);
        self.display.render_time(0, 0, 0);
        self.publish_controls();
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Timestamp of the current session's start; 0 while idle.
    pub fn start_timestamp(&self) -> u64 {
        self.start_ms
    }

    pub fn laps(&self) -> &[String] {
        &self.laps
    }

    pub fn numbered_laps(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        number_laps(&self.laps)
    }

    pub fn elapsed_ms(&self) -> u64 {
        match self.state {
            TimerState::Running => self.raw_elapsed().max(self.last_elapsed_ms),
            TimerState::Idle => 0,
        }
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    fn raw_elapsed(&self) -> u64 {
        self.clock.now_ms().saturating_sub(self.start_ms)
    }

    fn observe_elapsed(&mut self) -> u64 {
        let elapsed = self.raw_elapsed().max(self.last_elapsed_ms);
        self.last_elapsed_ms = elapsed;
        elapsed
    }

    fn publish_controls(&mut self) {
        self.display
            .set_controls_enabled(self.state.start_enabled(), self.state.lap_enabled());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{advance, engine_at, DisplayEvent, RecordingDisplay, SimClock, SimScheduler};
    use proptest::prelude::*;

    const T0: u64 = 1_700_000_000_000;

    fn controls(start_enabled: bool, lap_enabled: bool) -> DisplayEvent {
        DisplayEvent::Controls {
            start_enabled,
            lap_enabled,
        }
    }

    #[test]
    fn test_initial_render() {
        let mut sw = engine_at(T0);
        assert_eq!(sw.state(), TimerState::Idle);
        assert_eq!(sw.start_timestamp(), 0);
        assert_eq!(
            sw.display_mut().take(),
            vec![DisplayEvent::Time(TimeParts::ZERO), controls(true, false)]
        );
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut sw = engine_at(T0);
        sw.display_mut().take();

        assert!(sw.start());
        assert_eq!(sw.state(), TimerState::Running);
        assert_eq!(sw.start_timestamp(), T0);
        assert_eq!(sw.display_mut().take(), vec![controls(false, true)]);

        advance(&mut sw, 250);
        sw.display_mut().take();

        assert!(!sw.start());
        assert_eq!(sw.start_timestamp(), T0);
        assert_eq!(sw.scheduler().scheduled_count(), 1);
        assert_eq!(sw.scheduler().active_count(), 1);
        assert!(sw.display().events.is_empty());
        assert_eq!(sw.elapsed_ms(), 250);
    }

    #[test]
    fn test_lap_while_idle_is_noop() {
        let mut sw = engine_at(T0);
        sw.display_mut().take();

        assert_eq!(sw.lap(), None);
        assert!(sw.laps().is_empty());
        assert!(sw.display().events.is_empty());

        // also after a reset
        sw.reset();
        sw.display_mut().take();
        assert_eq!(sw.lap(), None);
        assert!(sw.display().events.is_empty());
    }

    #[test]
    fn test_lap_ordering() {
        let mut sw = engine_at(T0);
        sw.start();

        advance(&mut sw, 500);
        assert_eq!(sw.lap(), Some("0:00.50"));
        advance(&mut sw, 1_000);
        assert_eq!(sw.lap(), Some("0:01.50"));
        advance(&mut sw, 63_500);
        assert_eq!(sw.lap(), Some("1:05.00"));

        assert_eq!(sw.laps(), ["1:05.00", "0:01.50", "0:00.50"]);
        let numbers: Vec<usize> = sw.numbered_laps().map(|(n, _)| n).collect();
        assert_eq!(numbers, vec![3, 2, 1]);
        assert_eq!(
            sw.display().last_laps(),
            Some(&["1:05.00".to_string(), "0:01.50".into(), "0:00.50".into()][..])
        );
        // lapping does not restart the clock
        assert_eq!(sw.elapsed_ms(), 65_000);
    }

    #[test]
    fn test_live_and_lap_formats_differ() {
        let mut sw = engine_at(T0);
        sw.start();
        advance(&mut sw, 605_230);

        let parts = sw.display().last_time().unwrap();
        assert_eq!(parts, TimeParts { minutes: 10, seconds: 5, hundredths: 23 });
        assert_eq!(parts.main_text(), "10:05");
        assert_eq!(parts.fraction_text(), ".23");
        assert_eq!(sw.lap(), Some("10:05.23"));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut sw = engine_at(T0);
        sw.start();
        advance(&mut sw, 1_230);
        sw.lap();
        advance(&mut sw, 700);
        sw.lap();
        sw.display_mut().take();

        sw.reset();
        assert_eq!(sw.state(), TimerState::Idle);
        assert_eq!(sw.start_timestamp(), 0);
        assert!(sw.laps().is_empty());
        assert!(!sw.is_ticking());
        assert_eq!(sw.scheduler().active_count(), 0);
        assert_eq!(sw.scheduler().cancel_calls(), 1);
        assert_eq!(
            sw.display_mut().take(),
            vec![
                DisplayEvent::Laps(vec![]),
                DisplayEvent::Time(TimeParts::ZERO),
                controls(true, false),
            ]
        );

        assert_eq!(advance(&mut sw, 5_000), 0);
        assert!(sw.display().events.is_empty());
        assert_eq!(sw.elapsed_ms(), 0);
    }

    #[test]
    fn test_reset_cancels_at_most_once() {
        let mut sw = engine_at(T0);
        sw.reset();
        assert_eq!(sw.scheduler().cancel_calls(), 0);

        sw.start();
        sw.reset();
        sw.reset();
        assert_eq!(sw.scheduler().cancel_calls(), 1);
        assert_eq!(sw.scheduler().active_count(), 0);
    }

    #[test]
    fn test_stale_tick_after_reset() {
        let mut sw = engine_at(T0);
        sw.start();
        advance(&mut sw, 100);
        sw.reset();
        sw.display_mut().take();

        assert_eq!(sw.tick(), None);
        assert!(sw.display().events.is_empty());
    }

    #[test]
    fn test_restart_after_reset() {
        let mut sw = engine_at(T0);
        sw.start();
        advance(&mut sw, 3_000);
        sw.reset();
        advance(&mut sw, 10_000);

        assert!(sw.start());
        assert_eq!(sw.start_timestamp(), T0 + 13_000);
        assert_eq!(sw.scheduler().scheduled_count(), 2);
        advance(&mut sw, 420);
        assert_eq!(sw.display().last_time(), Some(split_elapsed(420)));
        assert_eq!(sw.lap(), Some("0:00.42"));
    }

    #[test]
    fn test_ticks_follow_interval() {
        let mut sw = engine_at(T0);
        sw.start();
        sw.display_mut().take();

        assert_eq!(advance(&mut sw, 1_000), 100);
        assert_eq!(sw.display().time_renders(), 100);
        assert_eq!(sw.scheduler().intervals(), vec![DEFAULT_TICK_INTERVAL_MS]);
    }

    #[test]
    fn test_configured_interval() {
        let clock = SimClock::new(T0);
        let scheduler = SimScheduler::new(&clock);
        let config = EngineConfig { tick_interval_ms: 250 };
        let mut sw =
            StopwatchEngine::with_config(config, clock, scheduler, RecordingDisplay::default());
        sw.start();
        assert_eq!(advance(&mut sw, 1_000), 4);

        let zero = EngineConfig { tick_interval_ms: 0 };
        assert_eq!(zero.tick_interval(), 1);
    }

    #[test]
    fn test_clock_stepping_back() {
        let mut sw = engine_at(T0);
        sw.start();
        advance(&mut sw, 100);
        assert_eq!(sw.tick(), Some(split_elapsed(100)));

        sw.clock().set(T0 + 40);
        assert_eq!(sw.tick(), Some(split_elapsed(100)));
        assert_eq!(sw.lap(), Some("0:00.10"));

        // before the start timestamp entirely
        sw.clock().set(T0 - 5_000);
        assert_eq!(sw.elapsed_ms(), 100);
    }

    #[test]
    fn test_controls_follow_state() {
        let mut sw = engine_at(T0);
        assert_eq!(sw.display().last_controls(), Some((true, false)));
        sw.start();
        assert_eq!(sw.display().last_controls(), Some((false, true)));
        sw.lap();
        assert_eq!(sw.display().last_controls(), Some((false, true)));
        sw.reset();
        assert_eq!(sw.display().last_controls(), Some((true, false)));
    }

    #[test]
    fn test_number_laps() {
        let laps: Vec<String> = vec!["0:03.00".into(), "0:02.00".into(), "0:01.00".into()];
        let numbered: Vec<(usize, &str)> = number_laps(&laps).collect();
        assert_eq!(numbered, vec![(3, "0:03.00"), (2, "0:02.00"), (1, "0:01.00")]);
        assert_eq!(number_laps(&[]).count(), 0);
    }

    // "m:ss.hh" back to hundredths of a second
    fn lap_hundredths(lap: &str) -> u64 {
        let (minutes, rest) = lap.split_once(':').unwrap();
        let (seconds, hundredths) = rest.split_once('.').unwrap();
        minutes.parse::<u64>().unwrap() * 6_000
            + seconds.parse::<u64>().unwrap() * 100
            + hundredths.parse::<u64>().unwrap()
    }

    #[test]
    fn test_lap_hundredths() {
        assert_eq!(lap_hundredths("10:05.23"), 60_523);
        assert_eq!(lap_hundredths("0:00.50"), 50);
    }

    proptest! {
        #[test]
        fn reported_time_never_decreases(steps in proptest::collection::vec((-2_000i64..5_000, any::<bool>()), 1..60)) {
            let mut sw = engine_at(T0);
            sw.start();
            let mut previous = 0u64;
            for (delta, record_lap) in steps {
                let now = sw.clock().now() as i64 + delta;
                sw.clock().set(now as u64);
                let reported = if record_lap {
                    lap_hundredths(sw.lap().unwrap())
                } else {
                    let parts = sw.tick().unwrap();
                    (parts.minutes * 60 + parts.seconds) * 100 + parts.hundredths
                };
                prop_assert!(reported >= previous);
                previous = reported;
            }
            // newest first, so the recorded laps read non-increasing top to bottom
            let recorded: Vec<u64> = sw.laps().iter().map(|l| lap_hundredths(l)).collect();
            prop_assert!(recorded.windows(2).all(|w| w[0] >= w[1]));
        }
    }
}
