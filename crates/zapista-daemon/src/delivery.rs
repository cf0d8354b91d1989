//! Wires a fired [`CronJob`] to actual delivery: an `AgentTurn` payload is
//! replayed through the agent loop so the reply is phrased the same way a
//! live message would be; a `SystemEvent` payload is delivered verbatim.
//! Also the injected [`RestartExecutor`] for `/restart`'s second confirmation.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use zapista_agent::AgentLoop;
use zapista_bus::MessageBus;
use zapista_channels::deps::RestartExecutor;
use zapista_core::message::OutboundMessage;
use zapista_core::reminder::CronPayloadKind;
use zapista_core::types::Owner;
use zapista_scheduler::{CronJob, JobHandler, JobOutcome};
use zapista_users::{ReminderHistoryStore, ResolvedUser, UserResolver};

pub struct ReminderDeliveryHandler {
    bus: Arc<MessageBus>,
    agent: Arc<AgentLoop>,
    users: Arc<UserResolver>,
    reminder_history: Arc<ReminderHistoryStore>,
}

impl ReminderDeliveryHandler {
    pub fn new(
        bus: Arc<MessageBus>,
        agent: Arc<AgentLoop>,
        users: Arc<UserResolver>,
        reminder_history: Arc<ReminderHistoryStore>,
    ) -> Self {
        Self {
            bus,
            agent,
            users,
            reminder_history,
        }
    }
}

#[async_trait]
impl JobHandler for ReminderDeliveryHandler {
    async fn handle(&self, job: &CronJob) -> JobOutcome {
        if !job.payload.deliver {
            return JobOutcome::Ok { reply: None };
        }

        let owner = Owner::new(&job.payload.target_channel, &job.payload.target_chat_id);

        let reply = match job.payload.kind {
            CronPayloadKind::SystemEvent => job.payload.message.clone(),
            CronPayloadKind::AgentTurn => {
                let user = match self.users.resolve(&owner.chat_id) {
                    Ok(ResolvedUser::Known(u)) => u,
                    Ok(ResolvedUser::NewlyCreated { user, .. }) => user,
                    Err(e) => {
                        warn!(error = %e, job_id = %job.id, "could not resolve user for due job");
                        return JobOutcome::Error { message: e.to_string() };
                    }
                };
                self.agent
                    .process_turn(owner.clone(), user, &job.payload.message)
                    .await
            }
        };

        info!(job_id = %job.id, owner = %owner, "delivering due job");
        if let Err(e) = self.reminder_history.add_delivered(&owner.key(), &reply) {
            warn!(error = %e, job_id = %job.id, "failed to record delivered reminder history");
        }
        self.bus
            .publish_outbound(
                OutboundMessage::new(&owner.channel, &owner.chat_id, reply)
                    .high_priority()
                    .with_job_id(&job.id),
            )
            .await;

        JobOutcome::Ok { reply: None }
    }
}

/// `/restart`'s second confirmation. Exits the process; a supervisor
/// (systemd, docker, a process manager) is expected to bring it back up.
pub struct ProcessRestartExecutor;

#[async_trait]
impl RestartExecutor for ProcessRestartExecutor {
    async fn restart(&self) {
        warn!("restart requested, exiting for supervisor restart");
        std::process::exit(0);
    }
}
