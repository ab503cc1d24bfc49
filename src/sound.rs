/// Play a short confirmation sound. Failures are ignored; a missing sound
/// file or player must never interrupt the wiggle loop.
#[cfg(target_os = "macos")]
pub fn play_beep() {
    use std::process::{Command, Stdio};

    let _ = Command::new("afplay")
        .arg("/System/Library/Sounds/Tink.aiff")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

#[cfg(not(target_os = "macos"))]
pub fn play_beep() {}
