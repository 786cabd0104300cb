//! Rate-limited outbound chat.
//!
//! Remote servers kick clients that chat faster than roughly one message per
//! second. `OutboundQueue` sends a message straight away when the last send
//! is at least one interval old and nothing is waiting; otherwise the message
//! joins a FIFO that a background drain task empties one message per tick.
//!
//! The drain task is owned by the queue: it starts in [`OutboundQueue::spawn`]
//! and stops on [`OutboundQueue::shutdown`] or drop.

use crate::app::config::Config;
use eyre::{Context, eyre};
use parking_lot::Mutex;
use serde::Serialize;
use std::{collections::VecDeque, fmt::Display, sync::Arc, time::Duration};
use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};

pub const DEFAULT_SEND_INTERVAL: Duration = Duration::from_millis(1000);

/// Delivers one chat line to the connection.
pub trait ChatTransport: Send + Sync + 'static {
    fn send(&self, text: &str) -> Result<(), eyre::Report>;
}

impl<F> ChatTransport for F
where
    F: Fn(&str) -> Result<(), eyre::Report> + Send + Sync + 'static,
{
    fn send(&self, text: &str) -> Result<(), eyre::Report> {
        self(text)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueOptions {
    pub interval: Duration,
    /// Put a message that failed to send back at the head of the queue
    /// instead of dropping it.
    pub retry_failed_sends: bool,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SEND_INTERVAL,
            retry_failed_sends: true,
        }
    }
}

impl From<&Config> for QueueOptions {
    fn from(config: &Config) -> Self {
        Self {
            interval: config.send_interval(),
            retry_failed_sends: config.retry_failed_sends,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueuedMessage {
    pub text: String,
    pub enqueued_at: Instant,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<QueuedMessage>,
    last_sent_at: Option<Instant>,
}

impl QueueState {
    fn window_open(&self, now: Instant, interval: Duration) -> bool {
        self.last_sent_at
            .is_none_or(|last| now.saturating_duration_since(last) >= interval)
    }

    fn mark_sent(&mut self, now: Instant) {
        if self.last_sent_at.is_none_or(|last| now > last) {
            self.last_sent_at = Some(now);
        }
    }
}

struct Shared {
    state: Mutex<QueueState>,
    transport: Box<dyn ChatTransport>,
    options: QueueOptions,
}

impl Shared {
    /// `scheduled` is the tick's deadline, not the wake time, so a late wake
    /// does not shift the window and cost the following tick its send.
    fn drain_tick(&self, scheduled: Instant) {
        let message = {
            let mut state = self.state.lock();

            // An immediate send earlier in this window still counts.
            if !state.window_open(scheduled, self.options.interval) {
                return;
            }
            let Some(message) = state.pending.pop_front() else {
                return;
            };
            state.mark_sent(scheduled);
            message
        };
        self.deliver(message, scheduled);
    }

    /// Calls the transport without holding the state lock. The window has
    /// already been claimed by the caller.
    fn deliver(&self, message: QueuedMessage, sent_at: Instant) {
        match self.transport.send(&message.text) {
            Ok(()) => {
                tracing::debug!(
                    waited_ms = sent_at.saturating_duration_since(message.enqueued_at).as_millis() as u64,
                    "Chat message sent"
                );
            }
            Err(e) if self.options.retry_failed_sends => {
                let mut state = self.state.lock();
                state.pending.push_front(message);
                tracing::warn!(
                    error = %e,
                    pending = state.pending.len(),
                    "Failed to send chat message, retrying next tick"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, text = %message.text, "Failed to send chat message, dropping it");
            }
        }
    }
}

pub struct OutboundQueue {
    shared: Arc<Shared>,
    drain_task: Option<JoinHandle<()>>,
}

impl OutboundQueue {
    /// Creates the queue and starts its drain task. Must be called from
    /// within a tokio runtime.
    pub fn spawn(
        options: QueueOptions,
        transport: impl ChatTransport,
    ) -> Result<Self, eyre::Report> {
        if options.interval.is_zero() {
            return Err(eyre!("Message send interval must be greater than zero"));
        }

        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState::default()),
            transport: Box::new(transport),
            options,
        });

        let mut ticker = interval_at(Instant::now() + options.interval, options.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let task_shared = Arc::clone(&shared);
        let drain_task = tokio::spawn(async move {
            loop {
                let scheduled = ticker.tick().await;
                task_shared.drain_tick(scheduled);
            }
        });

        tracing::info!(
            interval_ms = options.interval.as_millis() as u64,
            retry_failed_sends = options.retry_failed_sends,
            "Outbound chat queue started"
        );

        Ok(Self {
            shared,
            drain_task: Some(drain_task),
        })
    }

    /// Sends `text` now if the rate limit allows and nothing is waiting,
    /// otherwise appends it to the queue.
    pub fn queue_message(&self, text: impl Into<String>) {
        let now = Instant::now();
        let message = QueuedMessage {
            text: text.into(),
            enqueued_at: now,
        };

        let mut state = self.shared.state.lock();
        if !state.pending.is_empty() || !state.window_open(now, self.shared.options.interval) {
            state.pending.push_back(message);
            tracing::debug!(pending = state.pending.len(), "Chat message queued");
            return;
        }
        state.mark_sent(now);
        drop(state);

        self.shared.deliver(message, now);
    }

    /// Queues the JSON text of `value`. Plain strings should go through
    /// [`queue_message`](Self::queue_message) to avoid being quoted.
    pub fn queue_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), eyre::Report> {
        let text = serde_json::to_string(value).context("Failed to serialize chat message")?;
        self.queue_message(text);
        Ok(())
    }

    pub fn queue_display<T: Display + ?Sized>(&self, value: &T) {
        self.queue_message(value.to_string());
    }

    /// Sends `text` right away, bypassing the queue. Only for high-priority
    /// messages: the rate limit is the caller's problem here.
    pub fn send_immediately(&self, text: &str) -> Result<(), eyre::Report> {
        self.shared
            .transport
            .send(text)
            .context("Failed to send chat message")?;
        self.shared.state.lock().mark_sent(Instant::now());
        Ok(())
    }

    pub fn pending(&self) -> Vec<String> {
        let state = self.shared.state.lock();
        state.pending.iter().map(|m| m.text.clone()).collect()
    }

    pub fn pending_len(&self) -> usize {
        self.shared.state.lock().pending.len()
    }

    pub fn time_since_last_send(&self) -> Option<Duration> {
        let state = self.shared.state.lock();
        state.last_sent_at.map(|last| last.elapsed())
    }

    pub fn interval(&self) -> Duration {
        self.shared.options.interval
    }

    /// Stops the drain task and hands back whatever was still waiting, oldest
    /// first. Delivering those is up to the caller.
    pub fn shutdown(mut self) -> Vec<QueuedMessage> {
        self.stop_drain();
        let remaining: Vec<_> = self.shared.state.lock().pending.drain(..).collect();
        tracing::info!(remaining = remaining.len(), "Outbound chat queue stopped");
        remaining
    }

    fn stop_drain(&mut self) {
        if let Some(task) = self.drain_task.take() {
            task.abort();
        }
    }
}

impl Drop for OutboundQueue {
    fn drop(&mut self) {
        self.stop_drain();
    }
}
