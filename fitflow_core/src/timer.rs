//! Workout timer: elapsed session time plus a rest countdown.
//!
//! The timer is tick-driven. Whoever owns it calls [`Timer::tick`] once per
//! second; each tick advances exactly one of the two clocks.

use serde::{Deserialize, Serialize};

/// Snapshot of the timer
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimerState {
    pub is_running: bool,
    pub time_elapsed: u32,
    pub is_resting: bool,
    pub rest_time_left: u32,
}

/// Signals produced by a tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    /// The rest countdown reached zero
    RestComplete,
}

/// Audible cue played at workout transitions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    Start,
    Rest,
    Finish,
}

impl Cue {
    /// Tone frequency in Hz
    pub fn frequency(&self) -> u32 {
        match self {
            Cue::Start => 800,
            Cue::Rest => 600,
            Cue::Finish => 1000,
        }
    }
}

/// Something that can play cues (speaker, terminal bell, log)
pub trait CueSink {
    fn play(&mut self, cue: Cue);
}

/// Cue sink that only logs
#[derive(Debug, Default)]
pub struct TracingCues;

impl CueSink for TracingCues {
    fn play(&mut self, cue: Cue) {
        tracing::debug!("Cue {:?} ({} Hz)", cue, cue.frequency());
    }
}

/// Elapsed/rest timer
#[derive(Clone, Debug, Default)]
pub struct Timer {
    state: TimerState,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn start(&mut self) {
        self.state.is_running = true;
    }

    pub fn pause(&mut self) {
        self.state.is_running = false;
    }

    pub fn reset(&mut self) {
        self.state = TimerState::default();
    }

    /// Begin a rest countdown; also starts the timer
    pub fn start_rest(&mut self, duration_seconds: u32) {
        self.state.is_resting = true;
        self.state.rest_time_left = duration_seconds;
        self.state.is_running = true;
    }

    /// Abandon the countdown; running state is left alone
    pub fn skip_rest(&mut self) {
        self.state.is_resting = false;
        self.state.rest_time_left = 0;
    }

    /// Advance one second
    ///
    /// While resting only the countdown moves; `RestComplete` is returned on
    /// the tick that brings it to zero and resting ends with it.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if !self.state.is_running {
            return None;
        }

        if self.state.is_resting {
            if self.state.rest_time_left > 0 {
                self.state.rest_time_left -= 1;
                if self.state.rest_time_left == 0 {
                    self.state.is_resting = false;
                    return Some(TimerEvent::RestComplete);
                }
            }
            return None;
        }

        self.state.time_elapsed += 1;
        None
    }

    /// Restore a previously running timer
    pub(crate) fn restore(&mut self, time_elapsed: u32, rest_time_left: Option<u32>) {
        self.state = TimerState {
            is_running: true,
            time_elapsed,
            is_resting: rest_time_left.is_some(),
            rest_time_left: rest_time_left.unwrap_or(0),
        };
    }
}

/// Format seconds as `MM:SS`
///
/// Minutes are not rolled into hours: 3661 seconds is `61:01`.
pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(65), "01:05");
        assert_eq!(format_time(3661), "61:01");
        assert_eq!(format_time(4500), "75:00");
    }

    #[test]
    fn test_paused_timer_does_not_advance() {
        let mut timer = Timer::new();
        assert_eq!(timer.tick(), None);
        assert_eq!(timer.state().time_elapsed, 0);
    }

    #[test]
    fn test_elapsed_advances_while_running() {
        let mut timer = Timer::new();
        timer.start();
        for _ in 0..3 {
            timer.tick();
        }
        timer.pause();
        timer.tick();
        assert_eq!(timer.state().time_elapsed, 3);
    }

    #[test]
    fn test_rest_countdown_fires_once() {
        let mut timer = Timer::new();
        timer.start();
        timer.tick();
        timer.start_rest(2);

        assert_eq!(timer.tick(), None);
        assert_eq!(timer.state().rest_time_left, 1);
        assert_eq!(timer.state().time_elapsed, 1);

        assert_eq!(timer.tick(), Some(TimerEvent::RestComplete));
        assert!(!timer.state().is_resting);

        // Back to counting elapsed time, no second signal
        assert_eq!(timer.tick(), None);
        assert_eq!(timer.state().time_elapsed, 2);
    }

    #[test]
    fn test_start_rest_starts_timer() {
        let mut timer = Timer::new();
        timer.start_rest(30);
        assert!(timer.state().is_running);
        assert!(timer.state().is_resting);
    }

    #[test]
    fn test_skip_rest_keeps_running_flag() {
        let mut timer = Timer::new();
        timer.start_rest(30);
        timer.pause();
        timer.skip_rest();

        let state = timer.state();
        assert!(!state.is_resting);
        assert_eq!(state.rest_time_left, 0);
        assert!(!state.is_running);
    }

    #[test]
    fn test_zero_length_rest_never_fires() {
        let mut timer = Timer::new();
        timer.start_rest(0);
        assert_eq!(timer.tick(), None);
        assert!(timer.state().is_resting);
    }

    #[test]
    fn test_reset() {
        let mut timer = Timer::new();
        timer.start_rest(10);
        timer.tick();
        timer.reset();
        assert_eq!(timer.state(), TimerState::default());
    }
}
