//! Notification channels for the watch loop.

use std::io::Write;
use std::process::{Command, Stdio};

use slotwatch_core::{Notification, Notifier, NotifyError};

/// Writes `title: message` to stdout. Always installed.
#[derive(Debug, Default)]
pub struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}: {}", notification.title, notification.message)
            .and_then(|()| out.flush())
            .map_err(|e| NotifyError(format!("stdout: {e}")))
    }
}

/// Runs `<program> <title> <message>` (e.g. `notify-send`) and waits for it.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    program: String,
}

impl CommandNotifier {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Notifier for CommandNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let output = Command::new(&self.program)
            .arg(&notification.title)
            .arg(&notification.message)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| NotifyError(format!("{}: {e}", self.program)))?;
        if output.status.success() {
            tracing::debug!(program = %self.program, "notification command succeeded");
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(NotifyError(format!(
            "{} exited with {}: {}",
            self.program,
            output.status,
            stderr.trim()
        )))
    }
}

/// Stdout plus the optional external command.
pub fn channels(notify_cmd: Option<&str>) -> Vec<Box<dyn Notifier + Send>> {
    let mut channels: Vec<Box<dyn Notifier + Send>> = vec![Box::new(StdoutNotifier)];
    if let Some(program) = notify_cmd {
        channels.push(Box::new(CommandNotifier::new(program)));
    }
    channels
}
