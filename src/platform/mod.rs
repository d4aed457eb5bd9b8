//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Logging setup
//! - Frame timing (animation-frame timestamps to whole session milliseconds)
//! - The JS-facing game handle (wasm32 only)

#[cfg(target_arch = "wasm32")]
pub mod web;

use crate::sim::Millis;

/// Install the logger for this platform. Safe to call more than once.
pub fn init_logging() {
    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            log::debug!("logger already installed");
        }
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let env = env_logger::Env::default().default_filter_or("info");
        if let Err(err) = env_logger::Builder::from_env(env).try_init() {
            log::debug!("logger already installed: {}", err);
        }
    }
}

/// Turns fractional frame timestamps into whole-millisecond steps,
/// carrying the remainder so no time is lost between frames
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_frame: Option<f64>,
    accumulator: f64,
}

impl FrameClock {
    /// Longest step a single frame may advance (after a hidden tab, say)
    pub const MAX_FRAME_MS: f64 = 1000.0;

    pub fn new() -> Self {
        Self::default()
    }

    /// Whole milliseconds to advance for a frame stamped `now_ms`
    pub fn step(&mut self, now_ms: f64) -> Millis {
        let dt = match self.last_frame {
            Some(last) => (now_ms - last).clamp(0.0, Self::MAX_FRAME_MS),
            None => 0.0,
        };
        self.last_frame = Some(now_ms);

        self.accumulator += dt;
        let whole = self.accumulator.floor();
        self.accumulator -= whole;
        whole as Millis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice() {
        init_logging();
        init_logging();
        log::info!("still logging");
    }

    #[test]
    fn test_fractional_frames_keep_full_time() {
        let mut clock = FrameClock::new();
        let frame = 1000.0 / 60.0;
        let mut total = 0;
        for i in 0..=600 {
            total += clock.step(i as f64 * frame);
        }
        // 600 intervals of 16.67ms is 10s; at most the sub-ms remainder is held back
        assert!((9999..=10_000).contains(&total), "advanced {}", total);
    }

    #[test]
    fn test_high_refresh_frames() {
        let mut clock = FrameClock::new();
        let frame = 1000.0 / 144.0;
        let mut total = 0;
        for i in 0..=1440 {
            total += clock.step(i as f64 * frame);
        }
        assert!((9999..=10_000).contains(&total), "advanced {}", total);
    }

    #[test]
    fn test_first_frame_and_long_gaps() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.step(12_345.6), 0);
        assert_eq!(clock.step(12_345.6 + 30_000.0), 1000);
        // Timestamps going backwards advance nothing
        assert_eq!(clock.step(100.0), 0);
    }

    #[test]
    fn test_session_clock_tracks_wall_time() {
        use crate::persistence::MemoryStore;
        use crate::sim::GameSession;

        let mut session = GameSession::new(3, Box::new(MemoryStore::new()));
        session.open_setup().unwrap();
        session.start_with_settings().unwrap();

        let mut clock = FrameClock::new();
        let frame = 1000.0 / 60.0;
        // Just short of 10s: nine countdown ticks
        for i in 0..=599 {
            session.advance(clock.step(i as f64 * frame));
        }
        assert_eq!(session.now(), 9983);
        assert_eq!(session.time_remaining_secs(), 51);
    }
}
