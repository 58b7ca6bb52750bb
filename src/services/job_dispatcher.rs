use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::recurring_transaction_service::{self, ApplyOutcome};

/// Payload of a recurring-transaction processing event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RecurringTransactionEvent {
    pub transaction_id: Uuid,
    pub user_id: Uuid,
}

/// Process-wide handle for enqueueing processing events. Created once at
/// startup and passed explicitly to whatever needs to emit events; the
/// paired worker drains the queue.
#[derive(Clone)]
pub struct JobDispatcher {
    tx: mpsc::UnboundedSender<RecurringTransactionEvent>,
}

impl JobDispatcher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RecurringTransactionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn dispatch(&self, event: RecurringTransactionEvent) -> Result<(), AppError> {
        self.tx
            .send(event)
            .map_err(|_| AppError::External("event worker is not running".to_string()))
    }
}

/// Sliding-window throttle keyed by user: at most `max_per_window` event
/// executions per user within `window`. Excess acquisitions wait for the
/// window to roll over instead of failing, matching a job platform that
/// delays rather than drops throttled runs.
pub struct UserThrottle {
    windows: RwLock<HashMap<Uuid, WindowEntry>>,
    max_per_window: usize,
    window: Duration,
}

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: usize,
    started: Instant,
}

impl UserThrottle {
    pub fn new(max_per_window: usize, window: Duration) -> Self {
        Self {
            windows: RwLock::new(HashMap::new()),
            max_per_window,
            window,
        }
    }

    pub async fn acquire(&self, user_id: Uuid) {
        loop {
            let wait = {
                let mut windows = self.windows.write().await;
                let now = Instant::now();
                let entry = windows.entry(user_id).or_insert(WindowEntry {
                    count: 0,
                    started: now,
                });

                if now.duration_since(entry.started) >= self.window {
                    entry.count = 0;
                    entry.started = now;
                }

                if entry.count < self.max_per_window {
                    entry.count += 1;
                    None
                } else {
                    Some(self.window.saturating_sub(now.duration_since(entry.started)))
                }
            };

            match wait {
                None => return,
                Some(delay) => sleep(delay).await,
            }
        }
    }
}

/// Consume processing events until the dispatcher side is dropped. Each
/// event runs in its own task so one user's throttle delay never holds up
/// another user's events.
pub fn spawn_worker(
    mut rx: mpsc::UnboundedReceiver<RecurringTransactionEvent>,
    pool: Arc<PgPool>,
    throttle: Arc<UserThrottle>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("🏃 Recurring-transaction event worker started");

        while let Some(event) = rx.recv().await {
            let pool = pool.clone();
            let throttle = throttle.clone();

            tokio::spawn(async move {
                throttle.acquire(event.user_id).await;

                match recurring_transaction_service::process_recurring_transaction(
                    pool.as_ref(),
                    event.transaction_id,
                    event.user_id,
                )
                .await
                {
                    Ok(ApplyOutcome::Applied) => {}
                    Ok(ApplyOutcome::Skipped) => {
                        debug!(
                            "Event for transaction {} was a no-op",
                            event.transaction_id
                        );
                    }
                    Err(e) => {
                        error!(
                            "Failed to process recurring transaction {}: {}",
                            event.transaction_id, e
                        );
                    }
                }
            });
        }

        info!("Recurring-transaction event worker stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn throttle_admits_up_to_limit_immediately() {
        let throttle = UserThrottle::new(3, Duration::from_secs(60));
        let user = Uuid::new_v4();

        let start = std::time::Instant::now();
        for _ in 0..3 {
            throttle.acquire(user).await;
        }
        assert!(start.elapsed().as_millis() < 100);
    }

    #[tokio::test]
    async fn throttle_delays_beyond_limit() {
        let throttle = UserThrottle::new(2, Duration::from_millis(200));
        let user = Uuid::new_v4();

        let start = std::time::Instant::now();
        throttle.acquire(user).await;
        throttle.acquire(user).await;
        throttle.acquire(user).await; // must wait for the window to roll
        assert!(start.elapsed().as_millis() >= 150);
    }

    #[tokio::test]
    async fn throttle_is_per_user() {
        let throttle = UserThrottle::new(1, Duration::from_secs(60));

        let start = std::time::Instant::now();
        throttle.acquire(Uuid::new_v4()).await;
        throttle.acquire(Uuid::new_v4()).await;
        assert!(start.elapsed().as_millis() < 100);
    }

    #[tokio::test]
    async fn dispatch_fails_once_receiver_is_gone() {
        let (dispatcher, rx) = JobDispatcher::new();
        drop(rx);

        let result = dispatcher.dispatch(RecurringTransactionEvent {
            transaction_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
        });
        assert!(result.is_err());
    }
}
