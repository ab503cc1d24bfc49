use anyhow::Result;
#[cfg(target_os = "macos")]
use anyhow::Context;
#[cfg(target_os = "macos")]
use enigo::{Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};

#[cfg(target_os = "macos")]
const WIGGLE_OFFSET: i32 = 1;
#[cfg(target_os = "macos")]
const WIGGLE_PAUSE: std::time::Duration = std::time::Duration::from_millis(100);

pub struct InputSimulator {
    #[cfg(target_os = "macos")]
    enigo: Enigo,
}

#[cfg(target_os = "macos")]
impl InputSimulator {
    pub fn new() -> Result<Self> {
        let settings = Settings::default();
        let enigo = Enigo::new(&settings).context(
            "failed to initialize the input driver (is Accessibility permission granted?)",
        )?;
        Ok(Self { enigo })
    }

    /// Nudge the pointer one pixel and move it straight back, leaving the
    /// cursor where the user left it.
    pub fn wiggle(&mut self) -> Result<()> {
        self.enigo.move_mouse(WIGGLE_OFFSET, 0, Coordinate::Rel)?;
        std::thread::sleep(WIGGLE_PAUSE);
        self.enigo.move_mouse(-WIGGLE_OFFSET, 0, Coordinate::Rel)?;
        Ok(())
    }

    /// Press and release Shift. A modifier on its own types nothing, so the
    /// tap is invisible to whatever window has focus.
    pub fn tap_shift(&mut self) -> Result<()> {
        self.enigo.key(Key::Shift, Direction::Press)?;
        self.enigo.key(Key::Shift, Direction::Release)?;
        Ok(())
    }
}

// Fallback for non-macOS systems (e.g. for development/testing on Linux)
#[cfg(not(target_os = "macos"))]
impl InputSimulator {
    pub fn new() -> Result<Self> {
        Ok(Self {})
    }

    pub fn wiggle(&mut self) -> Result<()> {
        Ok(())
    }

    pub fn tap_shift(&mut self) -> Result<()> {
        Ok(())
    }
}
