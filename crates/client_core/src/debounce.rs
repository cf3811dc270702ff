//! Coalescing of rapid request changes into a single downstream effect.

use std::time::Duration;

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{sleep_until, Instant},
};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebouncePolicy {
    pub delay: Duration,
    /// Abort the outstanding fetch when a newer request is released.
    pub supersede_in_flight: bool,
}

impl Default for DebouncePolicy {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DEBOUNCE,
            supersede_in_flight: true,
        }
    }
}

impl DebouncePolicy {
    pub fn immediate() -> Self {
        Self {
            delay: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }
}

/// Clock-injected trailing-edge debouncer.
#[derive(Debug)]
pub struct Coalescer<T> {
    delay: Duration,
    pending: Option<T>,
    deadline: Option<Instant>,
}

impl<T> Coalescer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            deadline: None,
        }
    }

    /// Replaces any pending value and restarts the quiet window.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some(value);
        self.deadline = Some(now + self.delay);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.deadline {
            Some(deadline) if deadline <= now => self.flush(),
            _ => None,
        }
    }

    pub fn flush(&mut self) -> Option<T> {
        self.deadline = None;
        self.pending.take()
    }
}

/// Spawns a task that forwards only the last value of each burst.
///
/// A value still pending when `input` closes is flushed before the output closes.
pub fn spawn_debouncer<T>(
    policy: DebouncePolicy,
    mut input: mpsc::UnboundedReceiver<T>,
) -> (mpsc::UnboundedReceiver<T>, JoinHandle<()>)
where
    T: Send + 'static,
{
    let (output, released) = mpsc::unbounded_channel();
    let handle = tokio::spawn(async move {
        let mut coalescer = Coalescer::new(policy.delay);
        loop {
            let deadline = coalescer.deadline();
            let wake_at = deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));
            tokio::select! {
                received = input.recv() => match received {
                    Some(value) => {
                        coalescer.push(value, Instant::now());
                        if policy.delay.is_zero() {
                            if let Some(value) = coalescer.flush() {
                                if output.send(value).is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    None => {
                        if let Some(value) = coalescer.flush() {
                            let _ = output.send(value);
                        }
                        break;
                    }
                },
                _ = sleep_until(wake_at), if deadline.is_some() => {
                    if let Some(value) = coalescer.poll(Instant::now()) {
                        if output.send(value).is_err() {
                            break;
                        }
                    }
                }
            }
        }
    });
    (released, handle)
}

#[cfg(test)]
#[path = "tests/debounce_tests.rs"]
mod tests;
