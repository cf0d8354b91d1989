//! Creates one-shot reminders from `/lembrete` and the natural-language
//! "lembra-me de X em Y" pattern. Vague requests (no time expression) are
//! parked in the pending store and resolved on the user's next message —
//! spec §4.4's "vague-time/recurrence prompts before generic reminder
//! creation" ordering rule, applied inside this single handler rather than
//! as two chain entries.

use async_trait::async_trait;
use chrono::Utc;
use zapista_core::reminder::CronPayload;
use zapista_scheduler::CronSchedule;

use crate::context::HandlerContext;
use crate::error::Result;
use crate::registry::Handler;
use crate::time_expr;

const PENDING_ACTION: &str = "lembrete_aguarda_tempo";

pub struct ReminderHandler;

impl ReminderHandler {
    pub fn new() -> Self {
        Self
    }

    fn extract_message(text: &str) -> String {
        let mut s = text.trim();
        for prefix in [
            "/lembrete",
            "me lembra de",
            "me lembra",
            "lembra-me de",
            "lembra-me",
            "lembrete:",
            "lembrete",
        ] {
            if let Some(rest) = strip_ci_prefix(s, prefix) {
                s = rest.trim();
                break;
            }
        }
        let without_time = match regex::Regex::new(
            r"(?i)\bem\s+\d+\s*(segundos?|segs?|minutos?|mins?|horas?|hrs?|h|dias?|d)\b",
        ) {
            Ok(re) => re.replace(s, "").to_string(),
            Err(_) => s.to_string(),
        };
        without_time.trim().trim_end_matches(',').trim().to_string()
    }
}

fn strip_ci_prefix<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() < prefix.len() {
        return None;
    }
    if s[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

#[async_trait]
impl Handler for ReminderHandler {
    fn name(&self) -> &str {
        "reminder"
    }

    async fn handle(&self, ctx: &HandlerContext, text: &str) -> Result<Option<String>> {
        let owner_key = ctx.owner_key();

        // Resolve a parked "what time?" prompt first.
        if let Some(pending) = ctx.pending.get(&owner_key) {
            if pending.action == PENDING_ACTION {
                if let Some(secs) = time_expr::parse_relative_seconds(&format!("em {}", text.trim())) {
                    ctx.pending.clear(&owner_key);
                    let message = pending
                        .args
                        .get("message")
                        .and_then(|v| v.as_str())
                        .unwrap_or("lembrete")
                        .to_string();
                    return Ok(Some(self.schedule(ctx, &message, secs)));
                }
                // Still vague; re-prompt rather than falling through to
                // generic reminder creation.
                return Ok(Some(
                    "Para quando? Responda algo como \"em 10 min\" ou \"em 2 horas\".".to_string(),
                ));
            }
        }

        if !time_expr::mentions_reminder(text) {
            return Ok(None);
        }

        let message = Self::extract_message(text);
        match time_expr::parse_relative_seconds(text) {
            Some(secs) => Ok(Some(self.schedule(ctx, &message, secs))),
            None => {
                let message = if message.is_empty() {
                    "lembrete".to_string()
                } else {
                    message
                };
                ctx.pending.set(
                    &owner_key,
                    PENDING_ACTION,
                    serde_json::json!({ "message": message }),
                );
                Ok(Some(
                    "Para quando é esse lembrete? Responda \"em 10 min\" ou \"em 2 horas\".".to_string(),
                ))
            }
        }
    }
}

impl ReminderHandler {
    fn schedule(&self, ctx: &HandlerContext, message: &str, in_seconds: i64) -> String {
        let at_ms = Utc::now().timestamp_millis() + in_seconds * 1000;
        let schedule = CronSchedule::At { at_ms };
        let payload = CronPayload::agent_turn(message, &ctx.owner.channel, &ctx.owner.chat_id);

        match ctx
            .scheduler
            .add_job(ctx.owner.clone(), message, schedule, payload, true)
        {
            Ok(job) => {
                if let Err(e) = ctx.reminder_history.add_scheduled(&ctx.owner_key(), message) {
                    tracing::warn!(error = %e, job_id = %job.id, "failed to record scheduled reminder history");
                }
                let local = chrono_tz_local_hhmm(at_ms, &ctx.user.timezone);
                format!("Lembrete agendado ({}): \"{}\" as {}", job.id, message, local)
            }
            Err(e) => format!("Nao consegui agendar o lembrete: {e}"),
        }
    }
}

fn chrono_tz_local_hhmm(at_ms: i64, tz_name: &str) -> String {
    use chrono::TimeZone;
    let utc = chrono::Utc.timestamp_millis_opt(at_ms).single();
    let Some(utc) = utc else {
        return "horario invalido".to_string();
    };
    match tz_name.parse::<chrono_tz::Tz>() {
        Ok(tz) => utc.with_timezone(&tz).format("%H:%M").to_string(),
        Err(_) => utc.format("%H:%M UTC").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_bare_message_from_slash_command() {
        assert_eq!(
            ReminderHandler::extract_message("/lembrete beber agua em 2 min"),
            "beber agua"
        );
    }

    #[test]
    fn extracts_message_from_natural_language() {
        assert_eq!(
            ReminderHandler::extract_message("me lembra de ligar pro dentista em 1 hora"),
            "ligar pro dentista"
        );
    }
}
