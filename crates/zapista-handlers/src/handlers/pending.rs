//! Resolves generic "sim"/"nao" replies against a pending confirmation
//! (spec §4.4: pending-confirmation resolution runs first in the chain).
//! Registered ahead of [`crate::handlers::reminder::ReminderHandler`], which
//! owns its own `lembrete_aguarda_tempo` tag and is left alone here — this
//! handler only acts on tags it recognizes and passes through otherwise.

use async_trait::async_trait;

use crate::context::HandlerContext;
use crate::error::Result;
use crate::registry::Handler;

const COMPLETE_JOB: &str = "complete_job";

pub struct PendingConfirmationHandler;

impl PendingConfirmationHandler {
    pub fn new() -> Self {
        Self
    }
}

fn is_affirmative(text: &str) -> bool {
    matches!(
        text.trim().to_lowercase().as_str(),
        "sim" | "s" | "yes" | "ok" | "beleza" | "claro"
    )
}

fn is_negative(text: &str) -> bool {
    matches!(
        text.trim().to_lowercase().as_str(),
        "nao" | "não" | "n" | "no" | "cancela" | "cancelar"
    )
}

#[async_trait]
impl Handler for PendingConfirmationHandler {
    fn name(&self) -> &str {
        "pending_confirmation"
    }

    async fn handle(&self, ctx: &HandlerContext, text: &str) -> Result<Option<String>> {
        let owner_key = ctx.owner_key();
        let Some(pending) = ctx.pending.get(&owner_key) else {
            return Ok(None);
        };

        if pending.action != COMPLETE_JOB {
            // Not ours; leave it for whichever handler owns this tag
            // (e.g. the reminder handler's own vague-time flow).
            return Ok(None);
        }

        if is_negative(text) {
            ctx.pending.clear(&owner_key);
            return Ok(Some("Ok, cancelado.".to_string()));
        }

        if !is_affirmative(text) {
            return Ok(None);
        }

        ctx.pending.clear(&owner_key);
        let Some(job_id) = pending.args.get("job_id").and_then(|v| v.as_str()) else {
            return Ok(Some("Nao encontrei o que confirmar.".to_string()));
        };

        Ok(Some(match ctx.scheduler.remove_job(&ctx.owner, job_id) {
            Ok(()) => format!("Lembrete {job_id} marcado como concluido."),
            Err(e) => format!("Nao encontrei o lembrete {job_id}: {e}"),
        }))
    }
}
