//! Scope filter (spec §4.3 step 3): decide whether an inbound message is
//! organizer-scope (reminders/lists/events) before running the handler
//! chain or the LLM fallback. Fast regex path when the circuit breaker is
//! open; a cheap SIM/NAO LLM probe otherwise, falling back to the regex on
//! error or an ambiguous answer.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use zapista_core::llm::{ChatRequest, LlmProvider, Message};

use crate::circuit_breaker::CircuitBreaker;

static SCOPE_KEYWORDS: OnceLock<Regex> = OnceLock::new();

fn scope_keywords() -> &'static Regex {
    SCOPE_KEYWORDS.get_or_init(|| {
        Regex::new(
            r"(?i)\b(lembrete|lembrar|lembra|lista|listar|list|mercado|compras|pendentes|\
add|remover|remove|feito|delete|filme|livro|musica|evento|\
agendar|agenda|daqui a|em\s+\d+\s*(min|hora|dia)|todo dia|toda semana|\
/lembrete|/list|/feito|/filme)\b",
        )
        .unwrap()
    })
}

/// Quick keyword check, no LLM involved.
pub fn is_in_scope_fast(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    scope_keywords().is_match(trimmed)
}

const SCOPE_PROMPT: &str = "Analise se a mensagem do usuario e sobre: agenda, lembrete, lista \
(compras/pendentes), evento, filme/livro/musica a anotar, ou comando organizacional (/lembrete, \
/list, /feito, /filme).\nResponda apenas: SIM ou NAO\n\nMensagem: \"{input}\"";

/// Full scope decision: uses the LLM when the circuit is closed/half-open,
/// otherwise the fast regex. A provider error records a circuit failure
/// and falls back to the regex rather than failing the turn.
pub async fn is_in_scope(
    text: &str,
    provider: Option<&Arc<dyn LlmProvider>>,
    breaker: &CircuitBreaker,
) -> bool {
    if text.trim().is_empty() {
        return false;
    }

    let Some(provider) = provider else {
        return is_in_scope_fast(text);
    };

    if breaker.is_open() {
        return is_in_scope_fast(text);
    }

    let prompt = SCOPE_PROMPT.replace("{input}", text.trim());
    let request = ChatRequest::probe(vec![Message::user(prompt)]);

    match provider.send(&request).await {
        Ok(response) => {
            breaker.record_success();
            let raw = response.content.trim().to_uppercase();
            if raw.starts_with("SIM") || raw.starts_with('S') {
                true
            } else if raw.starts_with("NAO") || raw.starts_with("NÃO") || raw.starts_with('N') {
                false
            } else {
                // Ambiguous: don't block an organizer intent.
                is_in_scope_fast(text)
            }
        }
        Err(_) => {
            breaker.record_failure();
            is_in_scope_fast(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_reminder_keywords() {
        assert!(is_in_scope_fast("me lembra de beber agua"));
        assert!(is_in_scope_fast("/list mercado add leite"));
    }

    #[test]
    fn rejects_unrelated_chatter() {
        assert!(!is_in_scope_fast("qual sua opiniao sobre politica"));
    }
}
