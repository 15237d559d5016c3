use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::{OutboxEvent, OutboxMessage, OutboxRepository, OutboxStatus};
use crate::clients::{MessagingClient, RecipientListEntry, TeamClient};
use crate::config::OutboxConfig;
use crate::error::UserResult;

const MAX_BACKOFF_SECS: u64 = 30;

/// Polls the outbox and delivers each event to the Team/Messaging services.
pub struct OutboxRelay<O: OutboxRepository> {
    outbox: Arc<O>,
    teams: Arc<dyn TeamClient>,
    messaging: Arc<dyn MessagingClient>,
    config: OutboxConfig,
}

impl<O: OutboxRepository + 'static> OutboxRelay<O> {
    pub fn new(
        outbox: Arc<O>,
        teams: Arc<dyn TeamClient>,
        messaging: Arc<dyn MessagingClient>,
        config: OutboxConfig,
    ) -> Self {
        Self {
            outbox,
            teams,
            messaging,
            config,
        }
    }

    /// Runs until `shutdown` flips to `true`.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            batch_size = self.config.batch_size,
            max_attempts = self.config.max_attempts,
            "Starting outbox relay"
        );

        let mut consecutive_errors: u32 = 0;

        loop {
            if *shutdown.borrow() {
                break;
            }

            let wait = match self.process_batch().await {
                Ok(delivered) => {
                    if consecutive_errors > 0 {
                        info!("Outbox relay recovered after {} errors", consecutive_errors);
                        consecutive_errors = 0;
                    }
                    if delivered > 0 {
                        debug!(delivered, "Outbox batch processed");
                    }
                    self.config.poll_interval
                }
                Err(e) => {
                    consecutive_errors += 1;
                    let backoff_secs = 2u64.pow(consecutive_errors.min(5)).min(MAX_BACKOFF_SECS);
                    warn!(
                        error = %e,
                        consecutive_errors,
                        backoff_secs,
                        "Outbox poll failed, backing off"
                    );
                    Duration::from_secs(backoff_secs)
                }
            };

            tokio::select! {
                changed = shutdown.changed() => {
                    // A dropped sender counts as shutdown.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }

        info!("Outbox relay stopped");
    }

    /// Attempts every pending message once. Returns how many were delivered.
    pub async fn process_batch(&self) -> UserResult<usize> {
        let pending = self.outbox.fetch_pending(self.config.batch_size).await?;
        let mut delivered = 0;

        for message in pending {
            match self.deliver(&message).await {
                Ok(()) => {
                    self.outbox.mark_delivered(message.id).await?;
                    delivered += 1;
                }
                Err(e) => {
                    let status = self
                        .outbox
                        .mark_failed(message.id, &e.to_string(), self.config.max_attempts)
                        .await?;

                    if status == OutboxStatus::Dead {
                        error!(
                            message_id = %message.id,
                            kind = message.event.kind(),
                            error = %e,
                            "Outbox message exhausted its attempts"
                        );
                    } else {
                        warn!(
                            message_id = %message.id,
                            kind = message.event.kind(),
                            attempt = message.attempts + 1,
                            error = %e,
                            "Outbox delivery failed, will retry"
                        );
                    }
                }
            }
        }

        Ok(delivered)
    }

    async fn deliver(&self, message: &OutboxMessage) -> UserResult<()> {
        match &message.event {
            OutboxEvent::RegisterCarpoolRecipient {
                user_id,
                team_id,
                bearer_token,
            } => {
                let team = self.teams.get_team(*team_id, bearer_token).await?;
                let entry = RecipientListEntry {
                    recipient_list_id: team.carpool_id,
                    recipient_id: *user_id,
                };
                self.messaging.add_recipient(&entry, bearer_token).await?;

                info!(%user_id, %team_id, carpool_id = %team.carpool_id, "Registered carpool recipient");
                Ok(())
            }
            OutboxEvent::SendEmail(email) => {
                self.messaging.send_email(email).await?;
                debug!(recipients = email.to.len(), "Email handed to messaging service");
                Ok(())
            }
        }
    }
}
