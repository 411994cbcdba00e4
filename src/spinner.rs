//! A minimal terminal spinner with a live, updatable message.
//!
//! The job flow pushes phase changes into the spinner so the user sees
//! `submitting` become `queued`, `running`, and so on without new lines.

use std::io::Write;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Braille spinner frames.
const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Frame interval.
const INTERVAL: Duration = Duration::from_millis(80);

/// A terminal spinner that runs in a background task.
///
/// Writes to stderr so itinerary JSON on stdout stays clean.
pub struct Spinner {
    handle: JoinHandle<()>,
    message: tokio::sync::watch::Sender<Option<String>>,
}

impl Spinner {
    /// Start a spinner with the given message (e.g. `"submitting"`).
    pub fn start(message: &str) -> Self {
        let (message_tx, mut message_rx) =
            tokio::sync::watch::channel(Some(message.to_string()));

        let handle = tokio::spawn(async move {
            let mut i = 0;
            let mut current = message_rx.borrow().clone().unwrap_or_default();
            loop {
                let frame = FRAMES[i % FRAMES.len()];
                // \r moves to start of line, \x1b[2K clears the line
                eprint!("\x1b[2K\r{frame} {current}");
                let _ = std::io::stderr().flush();

                tokio::select! {
                    _ = tokio::time::sleep(INTERVAL) => {}
                    changed = message_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        match message_rx.borrow().clone() {
                            // None is the stop signal.
                            None => break,
                            Some(next) => current = next,
                        }
                    }
                }
                i += 1;
            }
            // Clear the spinner line
            eprint!("\x1b[2K\r");
            let _ = std::io::stderr().flush();
        });

        Self {
            handle,
            message: message_tx,
        }
    }

    /// Replace the spinner's message in place.
    pub fn update(&self, message: &str) {
        let _ = self.message.send(Some(message.to_string()));
    }

    /// Stop the spinner and clear its line.
    pub async fn stop(self) {
        let _ = self.message.send(None);
        let _ = self.handle.await;
    }
}
