use anyhow::Result;
use std::process::Child;
#[cfg(target_os = "macos")]
use std::process::{Command, Stdio};

/// Ask macOS to hold off display and idle sleep for the next `secs` seconds.
///
/// Spawns the system `caffeinate` helper with a self-expiring timeout, so a
/// killed perk never leaves the machine permanently caffeinated. The returned
/// child should be reaped with `try_wait` before the next burst.
pub fn inhibit_sleep(secs: u64) -> Result<Option<Child>> {
    #[cfg(target_os = "macos")]
    {
        let child = Command::new("/usr/bin/caffeinate")
            .args(["-d", "-i", "-t", &secs.to_string()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(Some(child))
    }
    #[cfg(not(target_os = "macos"))]
    {
        let _ = secs;
        Ok(None)
    }
}
