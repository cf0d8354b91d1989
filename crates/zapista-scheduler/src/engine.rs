use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{watch, Notify};
use tracing::{error, info};
use zapista_core::config::{MAX_EVERY_MS, MIN_EVERY_MS};
use zapista_core::reminder::{CronPayload, CronRunStatus};
use zapista_core::types::Owner;

use crate::error::{Result, SchedulerError};
use crate::friendly_id;
use crate::schedule::compute_next_run_ms;
use crate::store::JobStore;
use crate::types::CronJob;
use crate::types::CronSchedule;

/// Longest a poll will ever sleep when no job is due. Keeps the engine
/// responsive to jobs added while it is asleep without needing a wake
/// signal on every single mutation path.
const MAX_IDLE_SLEEP: StdDuration = StdDuration::from_secs(60);

/// Maximum number of times a job may be snoozed before `snooze_job` refuses.
pub const MAX_SNOOZES: u32 = 3;

const SNOOZE_DURATION_MS: i64 = 5 * 60 * 1000;

/// What a fired job produced. Mirrors the spec's "injected `on_job(job)`
/// that produces optional text; mark status ok/error".
pub enum JobOutcome {
    Ok { reply: Option<String> },
    Error { message: String },
}

/// Executes a due job. Implemented by whatever wires the scheduler to the
/// agent loop and the outbound bus — the scheduler itself knows nothing
/// about delivery.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &CronJob) -> JobOutcome;
}

struct SchedulerCore {
    store: Mutex<JobStore>,
    wake: Notify,
}

/// Cheap, cloneable handle for job management (add/remove/list/snooze).
/// Shares the same store as the [`SchedulerEngine`] driving the poll loop,
/// so a mutation made through the handle is visible on the engine's very
/// next wake.
#[derive(Clone)]
pub struct SchedulerHandle {
    core: Arc<SchedulerCore>,
}

impl SchedulerHandle {
    /// Add a new job, merging into an existing one when (owner, normalized
    /// message, schedule kind+params) already match.
    pub fn add_job(
        &self,
        owner: Owner,
        name: &str,
        schedule: CronSchedule,
        payload: CronPayload,
        delete_after_run: bool,
    ) -> Result<CronJob> {
        validate_schedule(&schedule)?;

        let now = Utc::now().timestamp_millis();
        let candidate_key = (
            owner.key(),
            crate::types::normalize_message(&payload.message),
            schedule_merge_key(&schedule),
        );

        let mut store = self.core.store.lock().unwrap();

        if let Some(existing) = store.jobs().iter().find(|j| j.merge_key() == candidate_key) {
            info!(job_id = %existing.id, "duplicate job suppressed, returning existing");
            return Ok(existing.clone());
        }

        let next_run_at_ms = compute_next_run_ms(&schedule, now)?;
        let id = friendly_id::generate_friendly_job_id(&payload.message, &store.existing_ids());

        let job = CronJob {
            id,
            owner,
            name: name.to_string(),
            enabled: true,
            schedule,
            payload,
            state: zapista_core::reminder::CronJobState {
                next_run_at_ms,
                ..Default::default()
            },
            created_at_ms: now,
            updated_at_ms: now,
            delete_after_run,
        };

        store.insert(job.clone())?;
        self.core.wake.notify_one();
        info!(job_id = %job.id, "job added");
        Ok(job)
    }

    /// Create a primary `at` job plus up to 3 pre-event lead siblings, each
    /// firing `lead_secs` earlier and linked via `parent_job_id`. Leads that
    /// would fire in the past (>= the time remaining until the event) are
    /// skipped.
    pub fn add_event_with_leads(
        &self,
        owner: Owner,
        name: &str,
        message: &str,
        at_ms: i64,
        channel: &str,
        chat_id: &str,
        leads_secs: &[i64],
    ) -> Result<CronJob> {
        let primary = self.add_job(
            owner.clone(),
            name,
            CronSchedule::At { at_ms },
            CronPayload::agent_turn(message, channel, chat_id),
            true,
        )?;

        let now = Utc::now().timestamp_millis();
        let time_until_secs = (at_ms - now) / 1000;

        for &lead in leads_secs.iter().take(3) {
            if lead <= 0 || lead >= time_until_secs {
                continue;
            }
            let lead_at_ms = at_ms - lead * 1000;
            let mut payload = CronPayload::agent_turn(
                format!("[lembrete antecipado] {message}"),
                channel,
                chat_id,
            );
            payload.parent_job_id = Some(primary.id.clone());
            // Each lead has a distinct schedule, so it is never merged with
            // the primary or with another lead.
            self.add_job(
                owner.clone(),
                &format!("{name} (lead {lead}s)"),
                CronSchedule::At { at_ms: lead_at_ms },
                payload,
                true,
            )?;
        }

        Ok(primary)
    }

    pub fn remove_job(&self, owner: &Owner, id: &str) -> Result<()> {
        let mut store = self.core.store.lock().unwrap();
        match store.get(id) {
            None => Err(SchedulerError::JobNotFound { id: id.to_string() }),
            Some(job) if !job.owned_by(owner) => Err(SchedulerError::ForeignJob { id: id.to_string() }),
            Some(_) => {
                store.remove(id)?;
                info!(job_id = %id, "job removed");
                Ok(())
            }
        }
    }

    /// List jobs owned by `owner`, ordered by creation time.
    pub fn list_jobs(&self, owner: &Owner) -> Vec<CronJob> {
        let store = self.core.store.lock().unwrap();
        let mut jobs: Vec<CronJob> = store
            .jobs()
            .iter()
            .filter(|j| j.owned_by(owner))
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.created_at_ms);
        jobs
    }

    /// Snooze a job: create a 5-minute `at` child linked to `id` and bump
    /// the parent's snooze counter. Refuses past [`MAX_SNOOZES`].
    pub fn snooze_job(&self, owner: &Owner, id: &str) -> Result<CronJob> {
        let (channel, chat_id, message, snooze_count) = {
            let store = self.core.store.lock().unwrap();
            let job = store
                .get(id)
                .ok_or_else(|| SchedulerError::JobNotFound { id: id.to_string() })?;
            if !job.owned_by(owner) {
                return Err(SchedulerError::ForeignJob { id: id.to_string() });
            }
            (
                job.payload.target_channel.clone(),
                job.payload.target_chat_id.clone(),
                job.payload.message.clone(),
                job.state.snooze_count,
            )
        };

        if snooze_count >= MAX_SNOOZES {
            return Err(SchedulerError::InvalidSchedule(format!(
                "job {id} has already been snoozed {MAX_SNOOZES} times"
            )));
        }

        let now = Utc::now().timestamp_millis();
        let mut payload = CronPayload::agent_turn(message, &channel, &chat_id);
        payload.parent_job_id = Some(id.to_string());

        let child = self.add_job(
            owner.clone(),
            "snooze",
            CronSchedule::At {
                at_ms: now + SNOOZE_DURATION_MS,
            },
            payload,
            true,
        )?;

        let mut store = self.core.store.lock().unwrap();
        if let Some(job) = store.get_mut(id) {
            job.state.snooze_count += 1;
            job.updated_at_ms = now;
        }
        store.save()?;

        Ok(child)
    }
}

/// Drives the timer loop; delegates all job CRUD to the shared
/// [`SchedulerHandle`].
pub struct SchedulerEngine {
    core: Arc<SchedulerCore>,
}

impl SchedulerEngine {
    /// Load (or create) the durable store at `path` and return the engine
    /// plus a handle sharing the same underlying state.
    pub fn new(path: impl AsRef<Path>) -> Result<(Self, SchedulerHandle)> {
        let store = JobStore::load(path)?;
        let core = Arc::new(SchedulerCore {
            store: Mutex::new(store),
            wake: Notify::new(),
        });
        Ok((
            Self { core: core.clone() },
            SchedulerHandle { core },
        ))
    }

    /// Main event loop. Sleeps until the earliest enabled job's next-run,
    /// or `MAX_IDLE_SLEEP`, whichever is sooner; wakes early when a job is
    /// added or removed via the handle. Runs until `shutdown` broadcasts
    /// `true`.
    pub async fn run<H: JobHandler>(self, handler: Arc<H>, mut shutdown: watch::Receiver<bool>) {
        info!("scheduler engine started");

        loop {
            let sleep_for = self.next_wake_delay();
            tokio::select! {
                _ = tokio::time::sleep(sleep_for) => {
                    if let Err(e) = self.run_due_jobs(handler.as_ref()).await {
                        error!("scheduler tick error: {e}");
                    }
                }
                _ = self.core.wake.notified() => {
                    // A job was added/removed; loop around to recompute the sleep.
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("scheduler engine shutting down");
                        break;
                    }
                }
            }
        }
    }

    fn next_wake_delay(&self) -> StdDuration {
        let now = Utc::now().timestamp_millis();
        let store = self.core.store.lock().unwrap();
        let earliest = store
            .jobs()
            .iter()
            .filter(|j| j.enabled)
            .filter_map(|j| j.state.next_run_at_ms)
            .min();

        match earliest {
            Some(next) if next <= now => StdDuration::from_millis(0),
            Some(next) => {
                let delta = StdDuration::from_millis((next - now) as u64);
                delta.min(MAX_IDLE_SLEEP)
            }
            None => MAX_IDLE_SLEEP,
        }
    }

    async fn run_due_jobs<H: JobHandler>(&self, handler: &H) -> Result<()> {
        let now = Utc::now().timestamp_millis();

        let due_ids: Vec<String> = {
            let store = self.core.store.lock().unwrap();
            store
                .jobs()
                .iter()
                .filter(|j| j.enabled)
                .filter(|j| j.state.next_run_at_ms.is_some_and(|t| t <= now))
                .map(|j| j.id.clone())
                .collect()
        };

        for id in due_ids {
            let job = {
                let store = self.core.store.lock().unwrap();
                match store.get(&id) {
                    Some(j) => j.clone(),
                    None => continue,
                }
            };

            info!(job_id = %job.id, kind = job.schedule.kind(), "executing due job");
            let outcome = handler.handle(&job).await;
            self.apply_outcome(&id, &job, outcome, now)?;
        }

        Ok(())
    }

    fn apply_outcome(
        &self,
        id: &str,
        job: &CronJob,
        outcome: JobOutcome,
        now: i64,
    ) -> Result<()> {
        let mut store = self.core.store.lock().unwrap();
        let Some(stored) = store.get_mut(id) else {
            return Ok(());
        };

        stored.state.last_run_at_ms = Some(now);
        match outcome {
            JobOutcome::Ok { .. } => stored.state.last_status = Some(CronRunStatus::Ok),
            JobOutcome::Error { message } => {
                stored.state.last_status = Some(CronRunStatus::Error);
                stored.state.last_error = Some(message);
            }
        }

        let recurring = job.schedule.is_recurring();
        let succeeded = matches!(stored.state.last_status, Some(CronRunStatus::Ok));

        if recurring {
            // every/cron: recompute next_run regardless of outcome.
            stored.state.next_run_at_ms = compute_next_run_ms(&job.schedule, now).ok().flatten();
        } else if succeeded {
            // at + ok: one-shot jobs are removed once fired. Pre-event
            // leads and snooze children are always one-shot.
            stored.state.next_run_at_ms = None;
            if job.delete_after_run {
                let id = id.to_string();
                drop(store);
                let mut store = self.core.store.lock().unwrap();
                store.remove(&id)?;
                return Ok(());
            }
        } else {
            // at + error: disable, keep the record for debugging.
            stored.enabled = false;
            stored.state.next_run_at_ms = None;
        }

        stored.updated_at_ms = now;
        store.save()?;
        Ok(())
    }
}

fn validate_schedule(schedule: &CronSchedule) -> Result<()> {
    if let CronSchedule::Every { every_ms, .. } = schedule {
        if *every_ms < MIN_EVERY_MS || *every_ms > MAX_EVERY_MS {
            return Err(SchedulerError::InvalidSchedule(format!(
                "every_ms must be within [{MIN_EVERY_MS}, {MAX_EVERY_MS}], got {every_ms}"
            )));
        }
    }
    if let CronSchedule::Cron { expression, .. } = schedule {
        // Cheap sanity check; the `cron` crate is the source of truth at
        // next-run computation time.
        if expression.split_whitespace().count() != 5 {
            return Err(SchedulerError::InvalidSchedule(format!(
                "expected a 5-field cron expression, got: {expression}"
            )));
        }
    }
    Ok(())
}

fn schedule_merge_key(schedule: &CronSchedule) -> String {
    // Re-derive the same key CronJob::merge_key uses, before a CronJob
    // struct exists to call it on.
    match schedule {
        CronSchedule::At { at_ms } => format!("at:{at_ms}"),
        CronSchedule::Every {
            every_ms,
            not_before_ms,
        } => format!("every:{every_ms}:{not_before_ms:?}"),
        CronSchedule::Cron {
            expression,
            timezone,
            not_before_ms,
        } => format!("cron:{expression}:{timezone}:{not_before_ms:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tempdir(label: &str) -> std::path::PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!(
            "zapista-scheduler-engine-test-{}-{}",
            std::process::id(),
            label
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn add_job_merges_duplicates() {
        let dir = tempdir("merge");
        let (_engine, handle) = SchedulerEngine::new(dir.join("jobs.json")).unwrap();
        let owner = Owner::new("whatsapp", "555");

        let a = handle
            .add_job(
                owner.clone(),
                "r1",
                CronSchedule::At { at_ms: 999_999_999_999 },
                CronPayload::agent_turn("tomar remedio", "whatsapp", "555"),
                false,
            )
            .unwrap();
        let b = handle
            .add_job(
                owner.clone(),
                "r2",
                CronSchedule::At { at_ms: 999_999_999_999 },
                CronPayload::agent_turn("  Tomar Remedio  ", "whatsapp", "555"),
                false,
            )
            .unwrap();

        assert_eq!(a.id, b.id);
        assert_eq!(handle.list_jobs(&owner).len(), 1);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn remove_job_rejects_foreign_owner() {
        let dir = tempdir("foreign");
        let (_engine, handle) = SchedulerEngine::new(dir.join("jobs.json")).unwrap();
        let owner = Owner::new("whatsapp", "555");
        let other = Owner::new("whatsapp", "666");

        let job = handle
            .add_job(
                owner,
                "r1",
                CronSchedule::At { at_ms: 999_999_999_999 },
                CronPayload::agent_turn("tomar remedio", "whatsapp", "555"),
                false,
            )
            .unwrap();

        let err = handle.remove_job(&other, &job.id).unwrap_err();
        assert!(matches!(err, SchedulerError::ForeignJob { .. }));

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn snooze_caps_at_max_snoozes() {
        let dir = tempdir("snooze");
        let (_engine, handle) = SchedulerEngine::new(dir.join("jobs.json")).unwrap();
        let owner = Owner::new("whatsapp", "555");

        let job = handle
            .add_job(
                owner.clone(),
                "r1",
                CronSchedule::At { at_ms: Utc::now().timestamp_millis() + 3_600_000 },
                CronPayload::agent_turn("tomar remedio", "whatsapp", "555"),
                false,
            )
            .unwrap();

        for _ in 0..MAX_SNOOZES {
            handle.snooze_job(&owner, &job.id).unwrap();
        }
        let err = handle.snooze_job(&owner, &job.id).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidSchedule(_)));

        std::fs::remove_dir_all(dir).ok();
    }
}
