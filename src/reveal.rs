//! Revealing the quarantine directory in the host file browser.
//!
//! The pipeline only knows the [`Revealer`] trait. [`SystemRevealer`] is the
//! real implementation used by the binary; tests inject their own.

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

/// Something that can show a directory to the user.
pub trait Revealer: Send + Sync {
    /// Show `path`, which is absolute and exists.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file browser could not be launched.
    fn reveal(&self, path: &Path) -> io::Result<()>;
}

/// Launches the platform file browser without waiting for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRevealer;

impl SystemRevealer {
    /// Program used to open a folder on this platform.
    #[must_use]
    pub fn program() -> &'static str {
        if cfg!(target_os = "windows") {
            "explorer"
        } else if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        }
    }
}

impl Revealer for SystemRevealer {
    fn reveal(&self, path: &Path) -> io::Result<()> {
        let program = Self::program();
        log::debug!("Revealing {} with {}", path.display(), program);

        // The child is not waited on; it outlives the run
        Command::new(program)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(drop)
    }
}
