use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

const INPUT_BUFFER: usize = 64;

/// Coalesces search input: a term is emitted once input has been quiet for `window` and only
/// if it differs from the previously emitted term.
pub struct SearchDebouncer {
    window: Duration,
    input: mpsc::Receiver<String>,
    last_emitted: Option<String>,
}

impl SearchDebouncer {
    pub fn channel(window: Duration) -> (mpsc::Sender<String>, Self) {
        let (sender, input) = mpsc::channel(INPUT_BUFFER);
        (sender, Self { window, input, last_emitted: None })
    }

    /// Waits for the next settled term. `None` once every sender is dropped.
    pub async fn next_term(&mut self) -> Option<String> {
        loop {
            let mut pending = self.input.recv().await?;

            loop {
                match timeout(self.window, self.input.recv()).await {
                    Ok(Some(newer)) => pending = newer,
                    Ok(None) | Err(_) => break,
                }
            }

            if self.last_emitted.as_deref() != Some(pending.as_str()) {
                self.last_emitted = Some(pending.clone());
                return Some(pending);
            }
        }
    }
}
