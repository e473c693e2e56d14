use std::time::Duration;

/// Something that restarts the device. Never returns.
pub trait Restart {
    fn restart(&self) -> !;
}

/// Restarts by re-executing the current binary with the same arguments,
/// which is what a supervisor-less host install needs to pick up a new
/// image. Exits non-zero if that is impossible, leaving the restart to the
/// service manager.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRestart;

impl Restart for ProcessRestart {
    fn restart(&self) -> ! {
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;

            match std::env::current_exe() {
                Ok(exe) => {
                    let err = std::process::Command::new(exe)
                        .args(std::env::args_os().skip(1))
                        .exec();
                    tracing::error!(error = %err, "re-exec failed");
                }
                Err(e) => tracing::error!(error = %e, "cannot locate current executable"),
            }
        }
        std::process::exit(1)
    }
}

#[derive(Debug, Clone)]
pub struct RebootController<R> {
    restart: R,
    grace: Duration,
}

impl<R: Restart> RebootController<R> {
    pub fn new(restart: R, grace: Duration) -> Self {
        Self { restart, grace }
    }

    /// Logs `reason`, waits out the grace period so pending writes and log
    /// output can land, then restarts.
    pub fn reboot(&self, reason: &str) -> ! {
        tracing::warn!(%reason, grace_ms = self.grace.as_millis() as u64, "rebooting");
        std::thread::sleep(self.grace);
        self.restart.restart()
    }
}
