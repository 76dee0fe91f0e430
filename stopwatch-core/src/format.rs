use core::fmt;

/// Elapsed time broken down for the live display.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct TimeParts {
    pub minutes: u64,
    pub seconds: u64,
    pub hundredths: u64,
}

impl TimeParts {
    pub const ZERO: TimeParts = TimeParts {
        minutes: 0,
        seconds: 0,
        hundredths: 0,
    };

    /// Live display main text, "MM:SS". Minutes are never folded into hours.
    pub fn main_text(&self) -> String {
        format!("{:02}:{:02}", self.minutes, self.seconds)
    }

    /// Live display fractional text, ".hh"
    pub fn fraction_text(&self) -> String {
        format!(".{:02}", self.hundredths)
    }
}

impl fmt::Display for TimeParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}.{:02}", self.minutes, self.seconds, self.hundredths)
    }
}

/// Split milliseconds into minutes, seconds and hundredths
pub fn split_elapsed(ms: u64) -> TimeParts {
    let total_secs = ms / 1000;
    TimeParts {
        minutes: total_secs / 60,
        seconds: total_secs % 60,
        hundredths: (ms % 1000) / 10,
    }
}

/// Format milliseconds as a lap entry, "m:SS.hh".
///
/// Unlike the live display, minutes are not zero-padded here.
pub fn format_lap(ms: u64) -> String {
    let parts = split_elapsed(ms);
    format!("{}:{:02}.{:02}", parts.minutes, parts.seconds, parts.hundredths)
}
