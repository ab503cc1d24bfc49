use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    /// The user is active; nothing to do.
    #[default]
    Watching,
    /// Idle threshold crossed (or a burst is still covering the current
    /// interval); the machine is being kept awake.
    KeepingAwake,
}

/// A single simulated-activity burst decided by [`Engine::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Burst {
    /// Idle seconds observed at the moment the burst was triggered.
    pub idle_secs: f64,
}

/// Decides, once per poll, whether a simulated-activity burst is due.
///
/// The decision is pure state over injected `(idle_secs, now)` samples so it
/// can be tested without touching the OS: a burst fires iff the loop is not
/// paused, the idle time has reached the threshold and at least one full
/// interval has passed since the previous burst. A threshold of zero disables
/// the idle gate entirely, which degenerates into "caffeinate every interval".
/// Pausing suppresses bursts only; state tracking continues so the display
/// keeps reflecting idleness.
pub struct Engine {
    pub interval_secs: u64,
    pub threshold_secs: u64,
    pub state: EngineState,
    pub state_since: DateTime<Utc>,
    pub burst_count: u64,
    pub last_burst: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
}

impl Engine {
    pub fn new(
        interval_secs: u64,
        threshold_secs: u64,
        timeout: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            interval_secs,
            threshold_secs,
            state: EngineState::Watching,
            state_since: now,
            burst_count: 0,
            last_burst: None,
            deadline: timeout.map(|t| now + t),
        }
    }

    pub fn tick(&mut self, idle_secs: f64, paused: bool, now: DateTime<Utc>) -> Option<Burst> {
        let idle_enough = self.threshold_secs == 0 || idle_secs >= self.threshold_secs as f64;

        // Our own synthetic events reset the OS idle counter, so "keeping
        // awake" stays on for the interval a burst covers even though the
        // sampled idle time drops back to zero right after the wiggle.
        let covered = self
            .last_burst
            .is_some_and(|last| now - last < Duration::seconds(self.interval_secs as i64));

        let next_state = if idle_enough || covered {
            EngineState::KeepingAwake
        } else {
            EngineState::Watching
        };
        if next_state != self.state {
            self.state = next_state;
            self.state_since = now;
        }

        if paused || !idle_enough || covered {
            return None;
        }

        self.last_burst = Some(now);
        self.burst_count += 1;
        Some(Burst { idle_secs })
    }

    /// Seconds until the next burst becomes eligible again, counted from the
    /// last burst. `None` before the first burst, `Some(0)` once the interval
    /// has fully elapsed.
    pub fn next_burst_due_in(&self, now: DateTime<Utc>) -> Option<i64> {
        let last = self.last_burst?;
        let remaining = Duration::seconds(self.interval_secs as i64) - (now - last);
        Some(remaining.num_seconds().max(0))
    }

    pub fn should_stop(&self, now: DateTime<Utc>) -> bool {
        match self.deadline {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn engine(interval_secs: u64, threshold_secs: u64) -> (Engine, DateTime<Utc>) {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 10, 0, 0).unwrap();
        (Engine::new(interval_secs, threshold_secs, None, start), start)
    }

    #[test]
    fn test_no_burst_below_threshold() {
        let (mut engine, start) = engine(120, 60);

        assert_eq!(engine.tick(0.0, false, start), None);
        assert_eq!(engine.tick(59.9, false, start + Duration::seconds(1)), None);
        assert_eq!(engine.state, EngineState::Watching);
        assert_eq!(engine.burst_count, 0);
    }

    #[test]
    fn test_burst_at_threshold() {
        let (mut engine, start) = engine(120, 60);

        let burst = engine.tick(60.0, false, start);
        assert_eq!(burst, Some(Burst { idle_secs: 60.0 }));
        assert_eq!(engine.state, EngineState::KeepingAwake);
        assert_eq!(engine.burst_count, 1);
        assert_eq!(engine.last_burst, Some(start));
    }

    #[test]
    fn test_one_burst_per_interval() {
        let (mut engine, start) = engine(120, 60);
        let mut now = start;
        let mut bursts = 0;

        // Poll every second for 6 minutes with the idle gate continuously
        // satisfied; only the interval gate should limit burst frequency.
        for _ in 0..360 {
            if engine.tick(300.0, false, now).is_some() {
                bursts += 1;
            }
            now += Duration::seconds(1);
        }

        // t=0s, t=120s, t=240s
        assert_eq!(bursts, 3);
        assert_eq!(engine.burst_count, 3);
    }

    #[test]
    fn test_idle_reset_after_burst_keeps_state() {
        let (mut engine, start) = engine(120, 60);

        assert!(engine.tick(60.0, false, start).is_some());

        // The wiggle reset the OS idle counter, but the burst still covers
        // the current interval.
        assert_eq!(engine.tick(0.5, false, start + Duration::seconds(1)), None);
        assert_eq!(engine.state, EngineState::KeepingAwake);

        // Once the interval runs out with no renewed idleness, we go back
        // to watching.
        assert_eq!(engine.tick(10.0, false, start + Duration::seconds(121)), None);
        assert_eq!(engine.state, EngineState::Watching);
    }

    #[test]
    fn test_zero_threshold_bursts_every_interval() {
        let (mut engine, start) = engine(30, 0);

        assert!(engine.tick(0.0, false, start).is_some());
        assert_eq!(engine.tick(0.0, false, start + Duration::seconds(29)), None);
        assert!(engine.tick(0.0, false, start + Duration::seconds(30)).is_some());
        assert_eq!(engine.burst_count, 2);
    }

    #[test]
    fn test_user_returns_between_bursts() {
        let (mut engine, start) = engine(120, 60);

        assert!(engine.tick(60.0, false, start).is_some());

        // Interval elapsed, but the user is back at the keyboard.
        assert_eq!(engine.tick(3.0, false, start + Duration::seconds(150)), None);
        assert_eq!(engine.state, EngineState::Watching);

        // They walk away again.
        assert!(engine.tick(60.0, false, start + Duration::seconds(300)).is_some());
        assert_eq!(engine.burst_count, 2);
    }

    #[test]
    fn test_paused_suppresses_bursts() {
        let (mut engine, start) = engine(120, 60);
        let mut now = start;

        // Deeply idle across several intervals, but paused the whole time.
        for _ in 0..360 {
            assert_eq!(engine.tick(600.0, true, now), None);
            now += Duration::seconds(1);
        }
        assert_eq!(engine.burst_count, 0);
        assert_eq!(engine.last_burst, None);

        // Pause does not hide idleness from the display state.
        assert_eq!(engine.state, EngineState::KeepingAwake);
    }

    #[test]
    fn test_resume_after_pause_bursts_immediately() {
        let (mut engine, start) = engine(120, 60);

        assert_eq!(engine.tick(600.0, true, start), None);

        let resumed = start + Duration::seconds(30);
        assert!(engine.tick(630.0, false, resumed).is_some());
        assert_eq!(engine.burst_count, 1);
        assert_eq!(engine.last_burst, Some(resumed));
    }

    #[test]
    fn test_next_burst_due_in() {
        let (mut engine, start) = engine(120, 60);

        assert_eq!(engine.next_burst_due_in(start), None);

        engine.tick(60.0, false, start);
        assert_eq!(engine.next_burst_due_in(start + Duration::seconds(20)), Some(100));
        assert_eq!(engine.next_burst_due_in(start + Duration::seconds(120)), Some(0));
        assert_eq!(engine.next_burst_due_in(start + Duration::seconds(500)), Some(0));
    }

    #[test]
    fn test_should_stop_with_deadline() {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 10, 0, 0).unwrap();
        let engine = Engine::new(120, 60, Some(Duration::hours(8)), start);

        assert!(!engine.should_stop(start));
        assert!(!engine.should_stop(start + Duration::hours(8) - Duration::seconds(1)));
        assert!(engine.should_stop(start + Duration::hours(8)));
    }

    #[test]
    fn test_should_stop_without_deadline() {
        let (engine, start) = engine(120, 60);
        assert!(!engine.should_stop(start + Duration::days(365)));
    }

    #[test]
    fn test_state_since_tracks_transitions() {
        let (mut engine, start) = engine(120, 60);
        assert_eq!(engine.state_since, start);

        let t1 = start + Duration::seconds(10);
        engine.tick(60.0, false, t1);
        assert_eq!(engine.state_since, t1);

        // Staying in the same state does not move the marker.
        engine.tick(0.0, false, t1 + Duration::seconds(5));
        assert_eq!(engine.state_since, t1);
    }
}
