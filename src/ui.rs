use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal::{Clear, ClearType};
use crossterm::queue;
use stopwatch_core::{number_laps, Display, TimeParts};

const TITLE_ROW: u16 = 0;
const TIME_ROW: u16 = 2;
const CONTROLS_ROW: u16 = 4;
const LAPS_TOP: u16 = 6;
const LEFT: u16 = 2;

const FOOTER: &str = "s/Enter=start  l/Space=lap  r=reset  q=quit";

/// Terminal rendition of the stopwatch screen. Keeps a copy of what it was
/// last told so the whole screen can be repainted at any time.
pub struct TerminalDisplay<W: Write> {
    out: W,
    rows: u16,
    time: TimeParts,
    laps: Vec<String>,
    start_enabled: bool,
    lap_enabled: bool,
}

impl<W: Write> TerminalDisplay<W> {
    pub fn new(out: W, rows: u16) -> Self {
        Self {
            out,
            rows,
            time: TimeParts::ZERO,
            laps: Vec::new(),
            start_enabled: true,
            lap_enabled: false,
        }
    }

    #[cfg(test)]
    pub fn controls(&self) -> (bool, bool) {
        (self.start_enabled, self.lap_enabled)
    }

    #[cfg(test)]
    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn resize(&mut self, rows: u16) {
        self.rows = rows;
        self.redraw();
    }

    pub fn redraw(&mut self) {
        if let Err(e) = self.draw_all() {
            log::warn!("can't redraw screen: {}", e);
        }
    }

    fn footer_row(&self) -> u16 {
        self.rows.saturating_sub(1).max(LAPS_TOP)
    }

    fn max_visible_laps(&self) -> usize {
        // one row for the footer, one spare above it
        self.rows.saturating_sub(LAPS_TOP + 2) as usize
    }

    fn draw_all(&mut self) -> io::Result<()> {
        let footer = self.footer_row();
        queue!(
            self.out,
            Clear(ClearType::All),
            MoveTo(LEFT, TITLE_ROW),
            SetAttribute(Attribute::Bold),
            Print("STOPWATCH"),
            SetAttribute(Attribute::Reset),
            MoveTo(LEFT, footer),
            Print(FOOTER),
        )?;
        self.queue_time()?;
        self.queue_controls()?;
        self.queue_laps()?;
        self.out.flush()
    }

    fn queue_time(&mut self) -> io::Result<()> {
        queue!(
            self.out,
            MoveTo(LEFT, TIME_ROW),
            Clear(ClearType::CurrentLine),
            SetAttribute(Attribute::Bold),
            Print(self.time.main_text()),
            SetAttribute(Attribute::Reset),
            Print(self.time.fraction_text()),
        )
    }

    fn queue_controls(&mut self) -> io::Result<()> {
        queue!(
            self.out,
            MoveTo(LEFT, CONTROLS_ROW),
            Clear(ClearType::CurrentLine)
        )?;
        for (label, enabled) in [("[ START ]", self.start_enabled), ("[ LAP ]", self.lap_enabled)] {
            let attr = if enabled {
                Attribute::Reverse
            } else {
                Attribute::Dim
            };
            queue!(
                self.out,
                SetAttribute(attr),
                Print(label),
                SetAttribute(Attribute::Reset),
                Print("  ")
            )?;
        }
        // reset is always available
        queue!(
            self.out,
            SetAttribute(Attribute::Reverse),
            Print("[ RESET ]"),
            SetAttribute(Attribute::Reset)
        )
    }

    fn queue_laps(&mut self) -> io::Result<()> {
        let visible = self.max_visible_laps();
        for row in LAPS_TOP..self.footer_row() {
            queue!(self.out, MoveTo(LEFT, row), Clear(ClearType::CurrentLine))?;
        }
        // most recent first
        let mut row = LAPS_TOP;
        for (number, lap) in number_laps(&self.laps).take(visible) {
            queue!(self.out, MoveTo(LEFT, row), Print(format!("Lap {:2}  {}", number, lap)))?;
            row += 1;
        }
        let hidden = self.laps.len().saturating_sub(visible);
        if hidden > 0 && row < self.footer_row() {
            queue!(self.out, MoveTo(LEFT, row), Print(format!("+{} older", hidden)))?;
        }
        Ok(())
    }
}

impl<W: Write> Display for TerminalDisplay<W> {
    fn render_time(&mut self, minutes: u64, seconds: u64, hundredths: u64) {
        self.time = TimeParts {
            minutes,
            seconds,
            hundredths,
        };
        if let Err(e) = self.queue_time().and_then(|_| self.out.flush()) {
            log::warn!("can't draw time: {}", e);
        }
    }

    fn render_laps(&mut self, laps: &[String]) {
        self.laps = laps.to_vec();
        if let Err(e) = self.queue_laps().and_then(|_| self.out.flush()) {
            log::warn!("can't draw laps: {}", e);
        }
    }

    fn set_controls_enabled(&mut self, start_enabled: bool, lap_enabled: bool) {
        self.start_enabled = start_enabled;
        self.lap_enabled = lap_enabled;
        if let Err(e) = self.queue_controls().and_then(|_| self.out.flush()) {
            log::warn!("can't draw controls: {}", e);
        }
    }
}
