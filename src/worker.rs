use crate::caffeinate;
use crate::engine::{Engine, EngineState};
use crate::input::InputSimulator;
use crate::sound;
use crate::system::get_idle_time;
use chrono::{DateTime, Duration, Local, Utc};
use std::process::Child;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration as StdDuration;

const POLL_INTERVAL: StdDuration = StdDuration::from_secs(1);

pub struct WorkerParams {
    pub interval_secs: u64,
    pub threshold_secs: u64,
    pub beep_enabled: bool,
    pub key_tap_enabled: bool,
    pub timeout: Option<Duration>,
    /// Print a line per burst instead of relying on the TUI.
    pub log_to_stdout: bool,
}

/// Point-in-time view of the loop, published for the status display.
#[derive(Debug, Clone)]
pub struct Status {
    pub interval_secs: u64,
    pub threshold_secs: u64,
    pub state: EngineState,
    pub state_since: DateTime<Utc>,
    pub idle_secs: f64,
    pub burst_count: u64,
    pub failed_bursts: u64,
    pub last_burst: Option<DateTime<Utc>>,
    pub next_burst_in: Option<i64>,
    pub run_start: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    pub ended: bool,
}

/// Toggles shared between the worker thread and the front end.
#[derive(Default)]
pub struct Controls {
    pub paused: AtomicBool,
    pub beep_enabled: AtomicBool,
    pub shutdown: AtomicBool,
}

pub struct WorkerHandle {
    pub status: Arc<Mutex<Status>>,
    pub controls: Arc<Controls>,
    handle: JoinHandle<()>,
}

impl WorkerHandle {
    pub fn snapshot(&self) -> Option<Status> {
        self.status.lock().ok().map(|s| s.clone())
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn stop(self) -> Option<Status> {
        self.controls.shutdown.store(true, Ordering::SeqCst);
        let _ = self.handle.join();
        self.status.lock().ok().map(|s| s.clone())
    }
}

/// Start the wiggle loop on its own thread.
///
/// The simulator is created by the caller so that a missing Accessibility
/// permission aborts startup instead of failing silently in the background.
pub fn spawn(params: WorkerParams, simulator: InputSimulator) -> WorkerHandle {
    let now = Utc::now();
    let engine = Engine::new(params.interval_secs, params.threshold_secs, params.timeout, now);

    let status = Arc::new(Mutex::new(Status {
        interval_secs: params.interval_secs,
        threshold_secs: params.threshold_secs,
        state: EngineState::Watching,
        state_since: now,
        idle_secs: 0.0,
        burst_count: 0,
        failed_bursts: 0,
        last_burst: None,
        next_burst_in: None,
        run_start: now,
        deadline: engine.deadline,
        ended: false,
    }));

    let controls = Arc::new(Controls::default());
    controls
        .beep_enabled
        .store(params.beep_enabled, Ordering::SeqCst);

    let handle = {
        let status = Arc::clone(&status);
        let controls = Arc::clone(&controls);
        thread::spawn(move || run_loop(params, engine, simulator, status, controls))
    };

    WorkerHandle {
        status,
        controls,
        handle,
    }
}

fn run_loop(
    params: WorkerParams,
    mut engine: Engine,
    mut simulator: InputSimulator,
    status: Arc<Mutex<Status>>,
    controls: Arc<Controls>,
) {
    // The previous interval's caffeinate helper; reaped before each burst.
    let mut sleep_inhibitor: Option<Child> = None;
    let mut failed_bursts: u64 = 0;

    loop {
        if controls.shutdown.load(Ordering::SeqCst) {
            break;
        }

        let now = Utc::now();
        if engine.should_stop(now) {
            if params.log_to_stdout {
                println!(
                    "[{}] session timeout reached, stopping",
                    Local::now().format("%Y-%m-%d %H:%M:%S")
                );
            }
            publish(&status, &engine, get_idle_time(), failed_bursts, now, true);
            break;
        }

        let idle_secs = get_idle_time();
        let paused = controls.paused.load(Ordering::SeqCst);

        if let Some(burst) = engine.tick(idle_secs, paused, now) {
            release_inhibitor(&mut sleep_inhibitor);

            match run_burst(&params, &mut simulator, &controls, &mut sleep_inhibitor) {
                Ok(()) => {
                    if params.log_to_stdout {
                        println!(
                            "[{}] screen caffeinated (burst #{}, idle {:.0}s)",
                            Local::now().format("%Y-%m-%d %H:%M:%S"),
                            engine.burst_count,
                            burst.idle_secs
                        );
                    }
                }
                Err(err) => {
                    failed_bursts += 1;
                    if params.log_to_stdout {
                        eprintln!(
                            "[{}] activity burst failed: {err:#}",
                            Local::now().format("%Y-%m-%d %H:%M:%S")
                        );
                    }
                }
            }
        }

        publish(&status, &engine, idle_secs, failed_bursts, now, false);
        thread::sleep(POLL_INTERVAL);
    }

    release_inhibitor(&mut sleep_inhibitor);
}

/// Reap the previous caffeinate helper. If it is somehow still running
/// (its `-t` lifetime matches the burst interval, so the race is real),
/// kill it and wait so no zombie accumulates across bursts.
fn release_inhibitor(inhibitor: &mut Option<Child>) {
    if let Some(mut child) = inhibitor.take() {
        if let Ok(None) = child.try_wait() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn run_burst(
    params: &WorkerParams,
    simulator: &mut InputSimulator,
    controls: &Controls,
    sleep_inhibitor: &mut Option<Child>,
) -> anyhow::Result<()> {
    *sleep_inhibitor = caffeinate::inhibit_sleep(params.interval_secs)?;
    simulator.wiggle()?;
    if params.key_tap_enabled {
        simulator.tap_shift()?;
    }
    if controls.beep_enabled.load(Ordering::SeqCst) {
        sound::play_beep();
    }
    Ok(())
}

fn publish(
    status: &Arc<Mutex<Status>>,
    engine: &Engine,
    idle_secs: f64,
    failed_bursts: u64,
    now: DateTime<Utc>,
    ended: bool,
) {
    if let Ok(mut s) = status.lock() {
        s.state = engine.state;
        s.state_since = engine.state_since;
        s.idle_secs = idle_secs;
        s.burst_count = engine.burst_count;
        s.failed_bursts = failed_bursts;
        s.last_burst = engine.last_burst;
        s.next_burst_in = engine.next_burst_due_in(now);
        s.ended = ended;
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn test_release_inhibitor_kills_running_child() {
        let child = Command::new("sleep").arg("30").spawn().unwrap();
        let mut inhibitor = Some(child);

        release_inhibitor(&mut inhibitor);
        assert!(inhibitor.is_none());
    }

    #[test]
    fn test_release_inhibitor_reaps_exited_child() {
        let mut child = Command::new("true").spawn().unwrap();
        let _ = child.wait();
        let mut inhibitor = Some(child);

        release_inhibitor(&mut inhibitor);
        assert!(inhibitor.is_none());
    }

    #[test]
    fn test_release_inhibitor_empty() {
        let mut inhibitor: Option<Child> = None;
        release_inhibitor(&mut inhibitor);
        assert!(inhibitor.is_none());
    }
}
