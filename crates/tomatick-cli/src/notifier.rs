//! Terminal notifier: rings the bell and optionally spawns a sound command.

use std::io::Write;
use std::process::{Command, Stdio};

use tomatick_core::storage::NotificationsConfig;
use tomatick_core::{Notifier, NotifyError, SilentNotifier};

pub struct TerminalNotifier {
    bell: bool,
    command: Option<String>,
}

impl TerminalNotifier {
    pub fn from_config(config: &NotificationsConfig) -> Box<dyn Notifier> {
        if !config.enabled {
            return Box::new(SilentNotifier);
        }
        Box::new(Self {
            bell: config.bell,
            command: config.command.clone(),
        })
    }
}

impl Notifier for TerminalNotifier {
    fn play_completion_sound(&self) -> Result<(), NotifyError> {
        if self.bell {
            let mut stderr = std::io::stderr();
            stderr
                .write_all(b"\x07")
                .and_then(|_| stderr.flush())
                .map_err(|e| NotifyError::Unavailable(e.to_string()))?;
        }
        if let Some(command) = &self.command {
            // Spawned, never waited on.
            shell(command)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()?;
        }
        Ok(())
    }
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", command]);
    cmd
}

#[cfg(not(windows))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", command]);
    cmd
}
