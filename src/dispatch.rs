// src/dispatch.rs
//
// Ordered, paced, retried delivery to the broadcast channel. One dispatcher
// per channel; the pacing lock also serializes sends, which preserves
// message order and keeps bursts under the channel's rate limit.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::{DeliveryError, SendError};
use crate::telegram::{MessageId, Transport};
use crate::types::Notification;

const DEFAULT_MIN_GAP: Duration = Duration::from_secs(2);
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub enum Outcome {
    Delivered { message_id: MessageId },
    Failed { error: DeliveryError },
}

impl Outcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Outcome::Delivered { .. })
    }
}

pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    chat_id: String,
    min_gap: Duration,
    max_attempts: u32,
    base_backoff: Duration,
    last_send: Mutex<Option<Instant>>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, chat_id: impl Into<String>) -> Self {
        Self {
            transport,
            chat_id: chat_id.into(),
            min_gap: DEFAULT_MIN_GAP,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_backoff: DEFAULT_BASE_BACKOFF,
            last_send: Mutex::new(None),
        }
    }

    pub fn with_min_gap(mut self, gap: Duration) -> Self {
        self.min_gap = gap;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    /// Deliver a batch in input order, one outcome per notification. A
    /// failed item never aborts the rest.
    pub async fn deliver(&self, batch: &[Notification]) -> Vec<Outcome> {
        let mut outcomes = Vec::with_capacity(batch.len());
        for notification in batch {
            outcomes.push(self.deliver_one(notification).await);
        }
        outcomes
    }

    pub async fn deliver_one(&self, notification: &Notification) -> Outcome {
        match self.send_paced(&notification.text).await {
            Ok(message_id) => Outcome::Delivered { message_id },
            Err(error) => {
                counter!("delivery_failures_total").increment(1);
                Outcome::Failed { error }
            }
        }
    }

    /// Out-of-band message (startup announcement). Same pacing and retry
    /// policy as item delivery, no seen-store involvement.
    pub async fn announce(&self, text: &str) -> Result<MessageId, DeliveryError> {
        self.send_paced(text).await
    }

    async fn send_paced(&self, text: &str) -> Result<MessageId, DeliveryError> {
        // Holding the lock across the send serializes delivery per channel.
        let mut last_send = self.last_send.lock().await;
        if let Some(prev) = *last_send {
            tokio::time::sleep_until(prev + self.min_gap).await;
        }

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.transport.send(&self.chat_id, text).await {
                Ok(message_id) => {
                    *last_send = Some(Instant::now());
                    return Ok(message_id);
                }
                Err(e) if !e.is_transient() => {
                    return Err(DeliveryError::Permanent(e));
                }
                Err(e) => {
                    if attempt >= self.max_attempts {
                        return Err(DeliveryError::Exhausted {
                            attempts: attempt,
                            last: e,
                        });
                    }
                    let backoff = match &e {
                        SendError::RateLimited { retry_after } => {
                            Duration::from_secs((*retry_after).max(1))
                        }
                        _ => self.base_backoff * (1u32 << (attempt - 1)),
                    };
                    tracing::debug!(
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "transient send failure; backing off"
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}
