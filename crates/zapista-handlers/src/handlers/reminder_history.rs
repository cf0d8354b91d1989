//! Answers "rever lembretes"-style review queries against the user's
//! reminder history. Registered ahead of [`crate::handlers::reminder::ReminderHandler`]
//! so a review phrase (which itself mentions "lembrete") is never misread
//! as a new reminder missing a time expression.

use async_trait::async_trait;

use crate::context::HandlerContext;
use crate::error::Result;
use crate::registry::Handler;

const REVIEW_PHRASES: &[&str] = &[
    "rever lembrete",
    "revisar lembrete",
    "ultimo lembrete",
    "último lembrete",
    "meus lembretes",
];

pub struct ReminderHistoryHandler;

impl ReminderHistoryHandler {
    pub fn new() -> Self {
        Self
    }

    fn matches_review_phrase(text: &str) -> bool {
        let lower = text.trim().to_lowercase();
        REVIEW_PHRASES.iter().any(|phrase| lower.contains(phrase))
    }
}

#[async_trait]
impl Handler for ReminderHistoryHandler {
    fn name(&self) -> &str {
        "reminder_history"
    }

    async fn handle(&self, ctx: &HandlerContext, text: &str) -> Result<Option<String>> {
        if !Self::matches_review_phrase(text) {
            return Ok(None);
        }

        let owner_key = ctx.owner_key();
        let scheduled = ctx.reminder_history.get_last_scheduled(&owner_key).unwrap_or(None);
        let delivered = ctx.reminder_history.get_last_delivered(&owner_key).unwrap_or(None);

        let mut lines = Vec::new();
        match scheduled {
            Some(message) => lines.push(format!("Ultimo pedido: \"{message}\"")),
            None => lines.push("Nenhum lembrete agendado ainda.".to_string()),
        }
        match delivered {
            Some(message) => lines.push(format!("Ultima entrega: \"{message}\"")),
            None => lines.push("Nenhum lembrete entregue ainda.".to_string()),
        }
        Ok(Some(lines.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_unrelated_text() {
        assert!(!ReminderHistoryHandler::matches_review_phrase("oi tudo bem"));
    }

    #[test]
    fn matches_plain_and_accented_phrasing() {
        assert!(ReminderHistoryHandler::matches_review_phrase("rever lembretes"));
        assert!(ReminderHistoryHandler::matches_review_phrase("qual meu ultimo lembrete?"));
        assert!(ReminderHistoryHandler::matches_review_phrase("qual foi meu último lembrete"));
    }

    #[test]
    fn is_case_insensitive() {
        assert!(ReminderHistoryHandler::matches_review_phrase("MEUS LEMBRETES"));
    }
}
