use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::group_id::EphemeralGroupId;
use crate::config::types::CleanupConfig;
use crate::kafka::{KafkaAdmin, SessionConsumer};

#[derive(Debug, Clone)]
pub struct CleanupPolicy {
    /// Total delete attempts, including the first.
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for CleanupPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            retry_delay: Duration::from_millis(300),
        }
    }
}

impl From<&CleanupConfig> for CleanupPolicy {
    fn from(config: &CleanupConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            retry_delay: config.retry_delay,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupState {
    Stopping,
    Deleting { attempts_left: u32 },
    Done,
    /// Left for broker-side group expiry.
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupReport {
    pub state: CleanupState,
    pub attempts: u32,
}

/// Stops a session's consumer and deletes its ephemeral group.
///
/// Consumed by `run`, so a group id is cleaned up at most once.
pub struct GroupCleanup {
    consumer: Option<Box<dyn SessionConsumer>>,
    group_id: EphemeralGroupId,
    admin: Arc<dyn KafkaAdmin>,
    policy: CleanupPolicy,
}

impl GroupCleanup {
    pub fn new(
        consumer: Box<dyn SessionConsumer>,
        group_id: EphemeralGroupId,
        admin: Arc<dyn KafkaAdmin>,
        policy: CleanupPolicy,
    ) -> Self {
        Self {
            consumer: Some(consumer),
            group_id,
            admin,
            policy,
        }
    }

    /// Run on a detached task. Fetch paths drop the handle; nobody observes the outcome.
    pub fn spawn(self) -> JoinHandle<CleanupReport> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) -> CleanupReport {
        let mut state = CleanupState::Stopping;
        let mut attempts = 0;

        loop {
            state = match state {
                CleanupState::Stopping => {
                    self.stop_consumer().await;
                    CleanupState::Deleting {
                        attempts_left: self.policy.max_attempts.max(1),
                    }
                }
                CleanupState::Deleting { attempts_left } => {
                    attempts += 1;
                    match self.admin.delete_group(self.group_id.as_str()).await {
                        Ok(()) => {
                            info!(group_id = %self.group_id, attempt = attempts, "Deleted consumer group");
                            CleanupState::Done
                        }
                        Err(e) if attempts_left > 1 => {
                            warn!(
                                group_id = %self.group_id,
                                attempt = attempts,
                                delay_ms = self.policy.retry_delay.as_millis() as u64,
                                error = %e,
                                "Failed to delete consumer group, retrying"
                            );
                            tokio::time::sleep(self.policy.retry_delay).await;
                            CleanupState::Deleting {
                                attempts_left: attempts_left - 1,
                            }
                        }
                        Err(e) => {
                            error!(
                                group_id = %self.group_id,
                                attempts = attempts,
                                error = %e,
                                "Abandoning consumer group after final delete attempt"
                            );
                            CleanupState::Abandoned
                        }
                    }
                }
                CleanupState::Done | CleanupState::Abandoned => {
                    return CleanupReport { state, attempts };
                }
            };
        }
    }

    async fn stop_consumer(&mut self) {
        if let Some(mut consumer) = self.consumer.take() {
            if let Err(e) = consumer.stop().await {
                warn!(group_id = %self.group_id, error = %e, "Failed to stop session consumer");
            }
            // Dropping closes the broker connections before the group is deleted.
            drop(consumer);
        }
    }
}
